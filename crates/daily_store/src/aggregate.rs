//! Daily high-temperature rollup, one JSON file per calendar day.
//!
//! The rollup is derived state: a missing or unreadable file starts the day
//! over from zero instead of failing the cycle.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use common::{DailyAggregate, Result};
use tracing::{debug, warn};

use crate::aggregate_path;

/// What was found on disk for a day's rollup.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(DailyAggregate),
    /// No file yet; the normal state for the first sample of a day.
    Absent,
    /// A file exists but could not be read or parsed.
    Corrupt(String),
}

impl LoadOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            LoadOutcome::Loaded(_) => "loaded",
            LoadOutcome::Absent => "absent",
            LoadOutcome::Corrupt(_) => "corrupt",
        }
    }
}

pub fn load_outcome(path: &Path) -> LoadOutcome {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadOutcome::Absent,
        Err(e) => return LoadOutcome::Corrupt(format!("read failed: {}", e)),
    };
    match serde_json::from_str::<DailyAggregate>(&raw) {
        Ok(aggregate) => LoadOutcome::Loaded(aggregate),
        Err(e) => LoadOutcome::Corrupt(format!("parse failed: {}", e)),
    }
}

/// Load the rollup at `path`, or a zero-valued one seeded with the given
/// day and zone when the file is absent or corrupt.
pub fn load(path: &Path, fallback_date: &str, fallback_timezone: &str) -> DailyAggregate {
    load_with_outcome(path, fallback_date, fallback_timezone).0
}

pub fn load_with_outcome(
    path: &Path,
    fallback_date: &str,
    fallback_timezone: &str,
) -> (DailyAggregate, LoadOutcome) {
    let outcome = load_outcome(path);
    let aggregate = match &outcome {
        LoadOutcome::Loaded(aggregate) => aggregate.clone(),
        LoadOutcome::Absent => {
            debug!("No aggregate at {}; starting fresh", path.display());
            DailyAggregate::fresh(fallback_date, fallback_timezone)
        }
        LoadOutcome::Corrupt(reason) => {
            warn!(
                "Aggregate at {} unusable ({}); starting fresh",
                path.display(),
                reason
            );
            DailyAggregate::fresh(fallback_date, fallback_timezone)
        }
    };
    (aggregate, outcome)
}

/// Overwrite `path` with `aggregate`. Written to a sibling temp file first,
/// then renamed into place.
pub fn save(path: &Path, aggregate: &DailyAggregate) -> Result<()> {
    let data = serde_json::to_string_pretty(aggregate)?;
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp_path)?;
        file.write_all(data.as_bytes())?;
        file.flush()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Read-modify-write access to the rollups under one output directory.
#[derive(Debug, Clone)]
pub struct AggregateStore {
    dir: PathBuf,
}

/// Result of folding one reading into a day's rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldResult {
    pub aggregate: DailyAggregate,
    pub new_high: bool,
    pub previous: &'static str,
}

impl AggregateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, date_local: &str) -> PathBuf {
        aggregate_path(&self.dir, date_local)
    }

    /// Fold one reading into the rollup for `date_local` and persist it.
    pub fn record(
        &self,
        date_local: &str,
        timezone: &str,
        temperature_c: Option<f64>,
        valid_time_local: Option<&str>,
    ) -> Result<FoldResult> {
        let path = self.path_for(date_local);
        let (mut aggregate, outcome) = load_with_outcome(&path, date_local, timezone);
        let new_high = aggregate.fold(temperature_c, valid_time_local);
        save(&path, &aggregate)?;
        Ok(FoldResult {
            aggregate,
            new_high,
            previous: outcome.label(),
        })
    }
}
