//! Logger configuration types.

use serde::{Deserialize, Serialize};

pub const DEFAULT_GEOCODE: &str = "51.50999832,-0.13";
pub const DEFAULT_TIMEZONE: &str = "Europe/London";
/// Longest accepted poll interval: one day.
pub const MAX_POLL_INTERVAL_MINUTES: u64 = 24 * 60;

/// Top-level logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// weather.com API key.
    #[serde(default)]
    pub api_key: String,

    /// Geocodes sent with every request ("lat,lon").
    #[serde(default = "default_geocodes")]
    pub geocodes: Vec<String>,

    /// Identifier of the entry to record; matched against each entry's `id`.
    #[serde(default = "default_geocode")]
    pub target_id: String,

    /// Language tag passed to the feed.
    #[serde(default = "default_language")]
    pub language: String,

    /// Feed base URL, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory that receives the per-day files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// IANA zone used for the calendar-day key.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub timing: TimingConfig,
}

/// Poll and fetch timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Poll interval; cycles align to multiples of it.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,

    /// Per-attempt request timeout.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_ms: u64,

    /// Attempts per cycle before the cycle is skipped.
    #[serde(default = "default_fetch_attempts")]
    pub fetch_max_attempts: u32,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_geocode() -> String {
    DEFAULT_GEOCODE.into()
}
fn default_geocodes() -> Vec<String> {
    vec![default_geocode()]
}
fn default_language() -> String {
    "en-GB".into()
}
fn default_base_url() -> String {
    "https://api.weather.com".into()
}
fn default_output_dir() -> String {
    "data".into()
}
fn default_timezone() -> String {
    DEFAULT_TIMEZONE.into()
}

pub fn default_poll_interval() -> u64 {
    10
}
pub fn default_fetch_timeout() -> u64 {
    15_000
}
pub fn default_fetch_attempts() -> u32 {
    3
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_minutes: default_poll_interval(),
            fetch_timeout_ms: default_fetch_timeout(),
            fetch_max_attempts: default_fetch_attempts(),
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            geocodes: default_geocodes(),
            target_id: default_geocode(),
            language: default_language(),
            base_url: default_base_url(),
            output_dir: default_output_dir(),
            timezone: default_timezone(),
            timing: TimingConfig::default(),
        }
    }
}

impl LoggerConfig {
    /// API key with all but the last four characters masked, for logs.
    pub fn redacted_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_fills_missing_fields_with_defaults() {
        let cfg: LoggerConfig = serde_json::from_str(r#"{"api_key": "abc"}"#).unwrap();
        assert_eq!(cfg.geocodes, vec![DEFAULT_GEOCODE.to_string()]);
        assert_eq!(cfg.timezone, DEFAULT_TIMEZONE);
        assert_eq!(cfg.timing.poll_interval_minutes, 10);
        assert_eq!(cfg.timing.fetch_max_attempts, 3);
    }

    #[test]
    fn test_redacted_api_key() {
        let mut cfg = LoggerConfig::default();
        cfg.api_key = "0123456789".into();
        assert_eq!(cfg.redacted_api_key(), "******6789");
        cfg.api_key = "abc".into();
        assert_eq!(cfg.redacted_api_key(), "***");
    }
}
