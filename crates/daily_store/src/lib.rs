//! Per-day files: calendar-day keys, the sample log, and the daily aggregate.

pub mod aggregate;
pub mod calendar;
pub mod journal;

pub use aggregate::{AggregateStore, FoldResult, LoadOutcome};
pub use calendar::{parse_instant, parse_timezone, resolve_local_date, resolve_local_date_named};
pub use journal::SampleJournal;

use std::path::{Path, PathBuf};

/// `wu_current_london_<date>.jsonl`
pub fn sample_log_path(dir: &Path, date_local: &str) -> PathBuf {
    dir.join(format!("wu_current_london_{}.jsonl", date_local))
}

/// `wu_daily_high_<date>.json`
pub fn aggregate_path(dir: &Path, date_local: &str) -> PathBuf {
    dir.join(format!("wu_daily_high_{}.json", date_local))
}
