//! Picks the one entry to record out of a feed response.

use common::CompositeEntry;

const FALLBACK_CITY: &str = "London";
const FALLBACK_COUNTRY: &str = "GB";

/// Exact `id` match first, then the first London/GB entry, else nothing.
///
/// The feed does not key entries consistently between requests, so the city
/// check keeps sampling alive when the id drifts.
pub fn select_entry<'a>(entries: &'a [CompositeEntry], target_id: &str) -> Option<&'a CompositeEntry> {
    entries
        .iter()
        .find(|e| e.id.as_deref() == Some(target_id))
        .or_else(|| {
            entries.iter().find(|e| {
                e.location
                    .as_ref()
                    .is_some_and(|loc| loc.is(FALLBACK_CITY, FALLBACK_COUNTRY))
            })
        })
}
