//! Domain types shared across the logger.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ── Feed types ────────────────────────────────────────────────────────

/// One location's bundle of sub-feeds from the aggregated endpoint.
///
/// Every field is optional; the provider omits sub-records freely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompositeEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(
        rename = "v3-location-point",
        alias = "location",
        default,
        deserialize_with = "deserialize_location"
    )]
    pub location: Option<LocationRecord>,
    #[serde(rename = "v3-wx-observations-current", alias = "observation", default)]
    pub observation: Option<ObservationRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LocationRecord {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(rename = "displayContext", default)]
    pub display_context: Option<String>,
    #[serde(rename = "ianaTimeZone", default)]
    pub iana_time_zone: Option<String>,
    #[serde(rename = "stationId", alias = "icaoCode", default)]
    pub station_id: Option<String>,
    #[serde(rename = "countryCode", default)]
    pub country_code: Option<String>,
}

impl LocationRecord {
    pub fn is(&self, city: &str, country_code: &str) -> bool {
        self.city.as_deref() == Some(city) && self.country_code.as_deref() == Some(country_code)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ObservationRecord {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(rename = "relativeHumidity", default)]
    pub relative_humidity: Option<f64>,
    #[serde(rename = "windSpeed", default)]
    pub wind_speed: Option<f64>,
    #[serde(rename = "windDirection", default)]
    pub wind_direction: Option<f64>,
    #[serde(rename = "windDirectionCardinal", default)]
    pub wind_direction_cardinal: Option<String>,
    #[serde(rename = "pressureMeanSeaLevel", alias = "pressure", default)]
    pub pressure: Option<f64>,
    #[serde(rename = "wxPhraseLong", alias = "condition", default)]
    pub condition: Option<String>,
    /// Epoch seconds or an RFC 3339 string, kept as sent.
    #[serde(rename = "validTimeUtc", default)]
    pub valid_time_utc: Option<Value>,
    #[serde(rename = "validTimeLocal", default)]
    pub valid_time_local: Option<String>,
}

/// `v3-location-point` arrives wrapped as `{"location": {...}}`; the short
/// `location` key carries the record directly.
#[derive(Deserialize)]
#[serde(untagged)]
enum LocationShape {
    Wrapped { location: LocationRecord },
    Flat(LocationRecord),
}

fn deserialize_location<'de, D>(deserializer: D) -> Result<Option<LocationRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let shape: Option<LocationShape> = Option::deserialize(deserializer)?;
    Ok(shape.map(|s| match s {
        LocationShape::Wrapped { location } => location,
        LocationShape::Flat(location) => location,
    }))
}

// ── Persisted records ─────────────────────────────────────────────────

/// One line of the per-day sample log. Absent source fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSample {
    #[serde(rename = "capturedAtUtc")]
    pub captured_at_utc: String,
    #[serde(rename = "locationId")]
    pub location_id: Option<String>,
    pub city: Option<String>,
    pub timezone: Option<String>,
    #[serde(rename = "stationId")]
    pub station_id: Option<String>,
    #[serde(rename = "temperatureC")]
    pub temperature_c: Option<f64>,
    #[serde(rename = "relativeHumidity")]
    pub relative_humidity: Option<f64>,
    #[serde(rename = "windSpeedKph")]
    pub wind_speed_kph: Option<f64>,
    #[serde(rename = "windDirectionDeg")]
    pub wind_direction_deg: Option<f64>,
    #[serde(rename = "windDirectionCardinal")]
    pub wind_direction_cardinal: Option<String>,
    #[serde(rename = "pressureMb")]
    pub pressure_mb: Option<f64>,
    pub condition: Option<String>,
    #[serde(rename = "validTimeUtc")]
    pub valid_time_utc: Option<Value>,
    #[serde(rename = "validTimeLocal")]
    pub valid_time_local: Option<String>,
}

impl NormalizedSample {
    /// Build a log record from a selected entry. `fallback_timezone` fills
    /// the zone when the location sub-record has none.
    pub fn from_entry(
        captured_at_utc: String,
        entry: &CompositeEntry,
        location: &LocationRecord,
        observation: &ObservationRecord,
        fallback_timezone: &str,
    ) -> Self {
        Self {
            captured_at_utc,
            location_id: entry.id.clone(),
            city: location.city.clone(),
            timezone: Some(
                location
                    .iana_time_zone
                    .clone()
                    .unwrap_or_else(|| fallback_timezone.to_string()),
            ),
            station_id: location.station_id.clone(),
            temperature_c: observation.temperature,
            relative_humidity: observation.relative_humidity,
            wind_speed_kph: observation.wind_speed,
            wind_direction_deg: observation.wind_direction,
            wind_direction_cardinal: observation.wind_direction_cardinal.clone(),
            pressure_mb: observation.pressure,
            condition: observation.condition.clone(),
            valid_time_utc: observation.valid_time_utc.clone(),
            valid_time_local: observation.valid_time_local.clone(),
        }
    }
}

/// Per-calendar-day rollup, one file per `date_local`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date_local: String,
    pub timezone: String,
    pub samples: u64,
    #[serde(rename = "high_temperatureC")]
    pub high_temperature_c: Option<f64>,
    #[serde(rename = "high_at_validTimeLocal")]
    pub high_at_valid_time_local: Option<String>,
    #[serde(rename = "last_seen_temperatureC")]
    pub last_seen_temperature_c: Option<f64>,
    #[serde(rename = "last_seen_validTimeLocal")]
    pub last_seen_valid_time_local: Option<String>,
}

impl DailyAggregate {
    /// Zero-valued aggregate for a day with no samples yet.
    pub fn fresh(date_local: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            date_local: date_local.into(),
            timezone: timezone.into(),
            samples: 0,
            high_temperature_c: None,
            high_at_valid_time_local: None,
            last_seen_temperature_c: None,
            last_seen_valid_time_local: None,
        }
    }

    /// Fold one reading into the rollup. Returns true when it set a new high.
    ///
    /// Only a strictly greater temperature replaces the high, so the recorded
    /// time is that of the first occurrence. Last-seen is always overwritten,
    /// nulls included.
    pub fn fold(&mut self, temperature_c: Option<f64>, valid_time_local: Option<&str>) -> bool {
        self.samples = self.samples.saturating_add(1);

        let new_high = match (temperature_c, self.high_temperature_c) {
            (Some(_), None) => true,
            (Some(t), Some(high)) => t > high,
            (None, _) => false,
        };
        if new_high {
            self.high_temperature_c = temperature_c;
            self.high_at_valid_time_local = valid_time_local.map(str::to_string);
        }

        self.last_seen_temperature_c = temperature_c;
        self.last_seen_valid_time_local = valid_time_local.map(str::to_string);
        new_high
    }
}
