//! One sampling cycle: fetch → select → record → aggregate.

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use common::{Error, LoggerConfig, NormalizedSample, Result};
use daily_store::{parse_instant, resolve_local_date, AggregateStore, SampleJournal};
use tracing::info;
use wu_client::{select_entry, WuClient};

/// What one successful cycle wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub date_local: String,
    pub temperature_c: Option<f64>,
    pub samples: u64,
    pub high_temperature_c: Option<f64>,
    pub new_high: bool,
    pub log_path: PathBuf,
}

/// Everything a cycle needs; cheap to clone into the scheduler.
#[derive(Debug, Clone)]
pub struct SamplingCycle {
    client: WuClient,
    target_id: String,
    timezone: Tz,
    timezone_name: String,
    journal: SampleJournal,
    store: AggregateStore,
}

impl SamplingCycle {
    pub fn new(cfg: &LoggerConfig, client: WuClient) -> Self {
        let timezone = daily_store::parse_timezone(&cfg.timezone).unwrap_or(Tz::UTC);
        Self {
            client,
            target_id: cfg.target_id.clone(),
            timezone,
            timezone_name: timezone.name().to_string(),
            journal: SampleJournal::new(&cfg.output_dir),
            store: AggregateStore::new(&cfg.output_dir),
        }
    }

    pub async fn run_once(&self) -> Result<CycleReport> {
        let entries = self.client.fetch_entries().await?;
        self.record(&entries, Utc::now())
    }

    /// Record an already fetched response as captured at `captured_at`.
    pub fn record(
        &self,
        entries: &[common::CompositeEntry],
        captured_at: DateTime<Utc>,
    ) -> Result<CycleReport> {
        let entry = select_entry(entries, &self.target_id).ok_or_else(|| {
            Error::LocationNotFound(format!(
                "{} (and no London/GB entry among {} entries)",
                self.target_id,
                entries.len()
            ))
        })?;
        let location = entry
            .location
            .as_ref()
            .ok_or_else(|| Error::ResponseShape("selected entry has no location record".into()))?;
        let observation = entry.observation.as_ref().ok_or_else(|| {
            Error::ResponseShape("selected entry has no observation record".into())
        })?;

        let observed_at = observation
            .valid_time_utc
            .as_ref()
            .and_then(parse_instant)
            .unwrap_or(captured_at);
        let date_local = resolve_local_date(Some(observed_at), self.timezone);

        let sample = NormalizedSample::from_entry(
            captured_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            entry,
            location,
            observation,
            &self.timezone_name,
        );
        let log_path = self.journal.record(&date_local, &sample)?;

        let folded = self.store.record(
            &date_local,
            &self.timezone_name,
            observation.temperature,
            observation.valid_time_local.as_deref(),
        )?;

        let report = CycleReport {
            date_local,
            temperature_c: observation.temperature,
            samples: folded.aggregate.samples,
            high_temperature_c: folded.aggregate.high_temperature_c,
            new_high: folded.new_high,
            log_path,
        };
        info!(
            "Sample {}: temp={} high={}{} samples={} (aggregate {})",
            report.date_local,
            fmt_temp(report.temperature_c),
            fmt_temp(report.high_temperature_c),
            if report.new_high { " (new)" } else { "" },
            report.samples,
            folded.previous,
        );
        Ok(report)
    }
}

fn fmt_temp(t: Option<f64>) -> String {
    t.map(|t| format!("{:.1}°C", t))
        .unwrap_or_else(|| "n/a".into())
}
