//! Configuration loader: merges env vars, .env file, and config.toml.

use std::path::Path;

use common::config::{
    default_fetch_attempts, default_fetch_timeout, default_poll_interval, DEFAULT_TIMEZONE,
    MAX_POLL_INTERVAL_MINUTES,
};
use common::{Error, LoggerConfig};
use tracing::warn;

/// Parse a positive integer; anything else falls back to `default`.
fn parse_positive_or<T>(raw: &str, env_name: &str, default: T) -> T
where
    T: std::str::FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => v,
        _ => {
            warn!(
                "{env_name}={:?} is not a positive integer; using default {}",
                raw, default
            );
            default
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split([';', '|'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Replace out-of-range values from config.toml with defaults.
fn sanitize(config: &mut LoggerConfig) {
    if daily_store::parse_timezone(&config.timezone).is_none() {
        warn!(
            "Unknown timezone {:?}; using {}",
            config.timezone, DEFAULT_TIMEZONE
        );
        config.timezone = DEFAULT_TIMEZONE.into();
    }
    let minutes = config.timing.poll_interval_minutes;
    if minutes == 0 || minutes > MAX_POLL_INTERVAL_MINUTES {
        warn!(
            "poll_interval_minutes={} outside 1..={}; using default",
            minutes, MAX_POLL_INTERVAL_MINUTES
        );
        config.timing.poll_interval_minutes = default_poll_interval();
    }
    if config.timing.fetch_timeout_ms == 0 {
        warn!("fetch_timeout_ms must be > 0; using default");
        config.timing.fetch_timeout_ms = default_fetch_timeout();
    }
    if config.timing.fetch_max_attempts == 0 {
        warn!("fetch_max_attempts must be > 0; using default");
        config.timing.fetch_max_attempts = default_fetch_attempts();
    }
    config.geocodes.retain(|g| !g.trim().is_empty());
    if config.geocodes.is_empty() {
        warn!("No geocodes configured; using target id {}", config.target_id);
        config.geocodes = vec![config.target_id.clone()];
    }
}

/// Build the config from an optional TOML file and an env lookup.
pub fn load_config_from<F>(config_path: &Path, env: F) -> Result<LoggerConfig, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = LoggerConfig::default();

    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", config_path.display(), e))
        })?;
        config = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;
    }

    let non_empty = |name: &str| env(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(key) = non_empty("WU_API_KEY") {
        config.api_key = key;
    }
    if let Some(raw) = non_empty("WU_GEOCODES") {
        config.geocodes = split_list(&raw);
    }
    if let Some(id) = non_empty("WU_TARGET_ID") {
        config.target_id = id;
    }
    if let Some(lang) = non_empty("WU_LANGUAGE") {
        config.language = lang;
    }
    if let Some(url) = non_empty("WU_BASE_URL") {
        config.base_url = url;
    }
    if let Some(dir) = non_empty("OUTPUT_DIR") {
        config.output_dir = dir;
    }
    if let Some(tz) = non_empty("LOCAL_TIMEZONE") {
        config.timezone = tz;
    }
    if let Some(raw) = non_empty("POLL_INTERVAL_MINUTES") {
        config.timing.poll_interval_minutes =
            parse_positive_or(&raw, "POLL_INTERVAL_MINUTES", default_poll_interval());
    }
    if let Some(raw) = non_empty("FETCH_TIMEOUT_MS") {
        config.timing.fetch_timeout_ms =
            parse_positive_or(&raw, "FETCH_TIMEOUT_MS", default_fetch_timeout());
    }
    if let Some(raw) = non_empty("FETCH_MAX_ATTEMPTS") {
        config.timing.fetch_max_attempts =
            parse_positive_or(&raw, "FETCH_MAX_ATTEMPTS", default_fetch_attempts());
    }

    sanitize(&mut config);

    if config.api_key.trim().is_empty() {
        return Err(Error::Config(
            "WU_API_KEY is required (set in .env or environment)".into(),
        ));
    }

    Ok(config)
}

/// Load logger configuration from environment and optional config file.
pub fn load_config() -> Result<LoggerConfig, Error> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }
    load_config_from(Path::new("config.toml"), |name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn no_file() -> &'static Path {
        Path::new("definitely-not-here/config.toml")
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = load_config_from(no_file(), env_of(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = load_config_from(no_file(), env_of(&[("WU_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_defaults_when_only_key_set() {
        let cfg = load_config_from(no_file(), env_of(&[("WU_API_KEY", "k")])).unwrap();
        assert_eq!(cfg.api_key, "k");
        assert_eq!(cfg.geocodes, vec!["51.50999832,-0.13".to_string()]);
        assert_eq!(cfg.target_id, "51.50999832,-0.13");
        assert_eq!(cfg.timezone, "Europe/London");
        assert_eq!(cfg.output_dir, "data");
        assert_eq!(cfg.timing.poll_interval_minutes, 10);
        assert_eq!(cfg.timing.fetch_timeout_ms, 15_000);
    }

    #[test]
    fn test_env_overrides_and_invalid_values_fall_back() {
        let cfg = load_config_from(
            no_file(),
            env_of(&[
                ("WU_API_KEY", "k"),
                ("WU_GEOCODES", "51.5,-0.1; 48.8,2.3"),
                ("LOCAL_TIMEZONE", "Nowhere/Special"),
                ("POLL_INTERVAL_MINUTES", "abc"),
                ("FETCH_TIMEOUT_MS", "2500"),
                ("FETCH_MAX_ATTEMPTS", "0"),
                ("OUTPUT_DIR", "/tmp/wx"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.geocodes, vec!["51.5,-0.1".to_string(), "48.8,2.3".to_string()]);
        assert_eq!(cfg.timezone, "Europe/London");
        assert_eq!(cfg.timing.poll_interval_minutes, 10);
        assert_eq!(cfg.timing.fetch_timeout_ms, 2500);
        assert_eq!(cfg.timing.fetch_max_attempts, 3);
        assert_eq!(cfg.output_dir, "/tmp/wx");
    }

    #[test]
    fn test_toml_file_then_env_priority() {
        let tmp = tempfile::TempDir::new().expect("tempdir");
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
api_key = "from-file"
timezone = "America/New_York"

[timing]
poll_interval_minutes = 5
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path, env_of(&[])).unwrap();
        assert_eq!(cfg.api_key, "from-file");
        assert_eq!(cfg.timezone, "America/New_York");
        assert_eq!(cfg.timing.poll_interval_minutes, 5);

        let cfg = load_config_from(&path, env_of(&[("WU_API_KEY", "from-env")])).unwrap();
        assert_eq!(cfg.api_key, "from-env");
    }

    #[test]
    fn test_oversized_poll_interval_falls_back() {
        let cfg = load_config_from(
            no_file(),
            env_of(&[
                ("WU_API_KEY", "k"),
                ("POLL_INTERVAL_MINUTES", "400000000000000000"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.timing.poll_interval_minutes, 10);

        let cfg = load_config_from(
            no_file(),
            env_of(&[("WU_API_KEY", "k"), ("POLL_INTERVAL_MINUTES", "1440")]),
        )
        .unwrap();
        assert_eq!(cfg.timing.poll_interval_minutes, 1440);

        let tmp = tempfile::TempDir::new().expect("tempdir");
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "api_key = \"k\"\n\n[timing]\npoll_interval_minutes = 1441\n",
        )
        .unwrap();
        let cfg = load_config_from(&path, env_of(&[])).unwrap();
        assert_eq!(cfg.timing.poll_interval_minutes, 10);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let tmp = tempfile::TempDir::new().expect("tempdir");
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "timing = [").unwrap();
        assert!(matches!(
            load_config_from(&path, env_of(&[("WU_API_KEY", "k")])),
            Err(Error::Config(_))
        ));
    }
}
