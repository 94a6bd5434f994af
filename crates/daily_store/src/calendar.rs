//! Calendar-day keys in a fixed IANA zone.
//!
//! The key partitions both per-day files, so it has to follow the zone's
//! civil calendar (DST included) rather than truncating UTC.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

/// `YYYY-MM-DD` of `instant` in `tz`. A missing instant means now.
pub fn resolve_local_date(instant: Option<DateTime<Utc>>, tz: Tz) -> String {
    instant
        .unwrap_or_else(Utc::now)
        .with_timezone(&tz)
        .format("%Y-%m-%d")
        .to_string()
}

/// Like [`resolve_local_date`], taking the zone by name. An unknown zone
/// resolves in UTC instead of failing.
pub fn resolve_local_date_named(instant: Option<DateTime<Utc>>, timezone: &str) -> String {
    resolve_local_date(instant, parse_timezone(timezone).unwrap_or(Tz::UTC))
}

pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

/// Read a feed timestamp: epoch seconds (integer or float, bare or as a
/// string) or an RFC 3339 / `%Y-%m-%dT%H:%M:%S%z` string.
pub fn parse_instant(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                DateTime::from_timestamp(secs, 0)
            } else {
                n.as_f64().and_then(from_epoch_f64)
            }
        }
        Value::String(s) => parse_instant_str(s),
        _ => None,
    }
}

fn parse_instant_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn from_epoch_f64(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}
