//! Append-only per-day sample log (JSONL).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use common::{NormalizedSample, Result};

use crate::sample_log_path;

/// Appends samples to `wu_current_london_<date>.jsonl` under one directory.
#[derive(Debug, Clone)]
pub struct SampleJournal {
    dir: PathBuf,
}

impl SampleJournal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, date_local: &str) -> PathBuf {
        sample_log_path(&self.dir, date_local)
    }

    /// Append one sample to the log for `date_local`.
    pub fn record(&self, date_local: &str, sample: &NormalizedSample) -> Result<PathBuf> {
        let path = self.path_for(date_local);
        append(&path, sample)?;
        Ok(path)
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Write `sample` as one line at the end of `path`, creating it if needed.
pub fn append(path: &Path, sample: &NormalizedSample) -> Result<()> {
    let line = serde_json::to_string(sample)?;
    let mut file = open_append(path)?;
    writeln!(file, "{}", line)?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(temp: Option<f64>) -> NormalizedSample {
        NormalizedSample {
            captured_at_utc: "2024-05-01T11:00:00.000Z".into(),
            location_id: Some("51.50999832,-0.13".into()),
            city: Some("London".into()),
            timezone: Some("Europe/London".into()),
            station_id: None,
            temperature_c: temp,
            relative_humidity: None,
            wind_speed_kph: None,
            wind_direction_deg: None,
            wind_direction_cardinal: None,
            pressure_mb: None,
            condition: None,
            valid_time_utc: None,
            valid_time_local: Some("2024-05-01T12:00:00".into()),
        }
    }

    #[test]
    fn test_append_creates_file_and_adds_lines() {
        let tmp = tempfile::TempDir::new().expect("tempdir");
        let journal = SampleJournal::new(tmp.path());

        let path = journal.record("2024-05-01", &sample(Some(18.2))).unwrap();
        journal.record("2024-05-01", &sample(None)).unwrap();

        assert!(path.ends_with("wu_current_london_2024-05-01.jsonl"));
        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(raw.ends_with('\n'));

        let first: NormalizedSample = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, sample(Some(18.2)));
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert!(second["temperatureC"].is_null());
        assert!(second["stationId"].is_null());
    }

    #[test]
    fn test_append_keeps_existing_content() {
        let tmp = tempfile::TempDir::new().expect("tempdir");
        let path = tmp.path().join("log.jsonl");
        std::fs::write(&path, "not json but still kept\n").unwrap();

        append(&path, &sample(Some(1.0))).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("not json but still kept\n"));
        assert_eq!(raw.lines().count(), 2);
    }
}
