//! Application configuration: TOML file plus `ATRIUM_*` environment
//! overrides, validated at load. The building profile answers the open
//! question of where sensor validity sets, retention windows, and threshold
//! bounds come from: they are injected here, never guessed from topology.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{SensorId, TimeRange};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub sensor_api: SensorApiConfig,
    pub building: BuildingProfile,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SensorApiConfig {
    pub base_url: String,
    pub api_token: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// One known sensor, as enumerated to the LLM and checked by the planner.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SensorInfo {
    pub id: SensorId,
    pub location: String,
    pub kind: String,
    pub unit: String,
}

/// Injected building metadata: the closed sensor set, the retention window,
/// and sane threshold bounds.
#[derive(Clone, Debug)]
pub struct BuildingProfile {
    pub sensors: Vec<SensorInfo>,
    pub retention_days: i64,
    pub threshold_min: f64,
    pub threshold_max: f64,
}

impl BuildingProfile {
    pub fn sensor(&self, id: &SensorId) -> Option<&SensorInfo> {
        self.sensors.iter().find(|sensor| &sensor.id == id)
    }

    /// Resolves a raw mention to a sensor: exact id first, then a unique
    /// location match (full location or one of its tokens, so `"204"` finds
    /// the one sensor in `"room 204"`). Ambiguous mentions resolve to nothing.
    pub fn resolve(&self, mention: &str) -> Option<&SensorInfo> {
        let needle = mention.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return None;
        }
        if let Some(sensor) =
            self.sensors.iter().find(|sensor| sensor.id.as_str().to_ascii_lowercase() == needle)
        {
            return Some(sensor);
        }

        let mut matches = self.sensors.iter().filter(|sensor| {
            let location = sensor.location.to_ascii_lowercase();
            location == needle || location.split_whitespace().any(|token| token == needle)
        });
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// Oldest queryable window ending at `now`.
    pub fn retention_window(&self, now: DateTime<Utc>) -> Option<TimeRange> {
        TimeRange::new(now - Duration::days(self.retention_days), now)
    }

    /// Deterministic fixture profile used by the demo store and tests.
    pub fn demo() -> Self {
        let sensor = |id: &str, location: &str, kind: &str, unit: &str| SensorInfo {
            id: SensorId(id.to_string()),
            location: location.to_string(),
            kind: kind.to_string(),
            unit: unit.to_string(),
        };
        Self {
            sensors: vec![
                sensor("temp-204", "room 204", "temperature", "°F"),
                sensor("temp-301", "room 301", "temperature", "°F"),
                sensor("hum-117", "room 117", "humidity", "%"),
                sensor("co2-lobby", "lobby", "co2", "ppm"),
                sensor("energy-main", "electrical main", "energy", "kWh"),
            ],
            retention_days: 90,
            threshold_min: -1.0e6,
            threshold_max: 1.0e6,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("configuration validation failed: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    llm: Option<LlmSection>,
    sensor_api: Option<SensorApiSection>,
    building: Option<BuildingSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LlmSection {
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SensorApiSection {
    base_url: Option<String>,
    api_token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildingSection {
    sensors: Option<Vec<SensorInfo>>,
    retention_days: Option<i64>,
    threshold_min: Option<f64>,
    threshold_max: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingSection {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                base_url: "http://localhost:11434".to_string(),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
            },
            sensor_api: SensorApiConfig {
                base_url: "http://localhost:8000".to_string(),
                api_token: None,
                timeout_secs: 10,
            },
            building: BuildingProfile::demo(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl AppConfig {
    /// Loads config from the given path, `ATRIUM_CONFIG`, or `atrium.toml` in
    /// the working directory, in that order; missing files fall back to
    /// defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = resolve_config_path(path) {
            let raw = fs::read_to_string(&path)
                .map_err(|source| ConfigError::ReadFile { path: path.clone(), source })?;
            let file: FileConfig = toml::from_str(&raw)
                .map_err(|source| ConfigError::ParseFile { path: path.clone(), source })?;
            config.apply_file(file);
        }

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(llm) = file.llm {
            apply(&mut self.llm.base_url, llm.base_url);
            apply(&mut self.llm.model, llm.model);
            apply(&mut self.llm.timeout_secs, llm.timeout_secs);
        }
        if let Some(sensor_api) = file.sensor_api {
            apply(&mut self.sensor_api.base_url, sensor_api.base_url);
            if let Some(token) = sensor_api.api_token {
                self.sensor_api.api_token = Some(SecretString::from(token));
            }
            apply(&mut self.sensor_api.timeout_secs, sensor_api.timeout_secs);
        }
        if let Some(building) = file.building {
            apply(&mut self.building.sensors, building.sensors);
            apply(&mut self.building.retention_days, building.retention_days);
            apply(&mut self.building.threshold_min, building.threshold_min);
            apply(&mut self.building.threshold_max, building.threshold_max);
        }
        if let Some(logging) = file.logging {
            apply(&mut self.logging.level, logging.level);
            apply(&mut self.logging.format, logging.format);
        }
    }

    fn apply_env(&mut self) {
        if let Ok(value) = env::var("ATRIUM_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Ok(value) = env::var("ATRIUM_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Ok(value) = env::var("ATRIUM_SENSOR_API_URL") {
            self.sensor_api.base_url = value;
        }
        if let Ok(value) = env::var("ATRIUM_SENSOR_API_TOKEN") {
            self.sensor_api.api_token = Some(SecretString::from(value));
        }
        if let Ok(value) = env::var("ATRIUM_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Ok(value) = env::var("ATRIUM_LOG_FORMAT") {
            if let Some(format) = LogFormat::parse(&value) {
                self.logging.format = format;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.timeout_secs == 0 || self.sensor_api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be greater than zero".to_string()));
        }
        if self.building.retention_days <= 0 {
            return Err(ConfigError::Invalid("retention_days must be positive".to_string()));
        }
        if self.building.threshold_min >= self.building.threshold_max {
            return Err(ConfigError::Invalid(
                "threshold_min must be below threshold_max".to_string(),
            ));
        }
        if self.building.sensors.is_empty() {
            return Err(ConfigError::Invalid("building profile has no sensors".to_string()));
        }
        for sensor in &self.building.sensors {
            if sensor.id.as_str().trim().is_empty() {
                return Err(ConfigError::Invalid("sensor with empty id".to_string()));
            }
        }
        Ok(())
    }
}

fn apply<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = env::var("ATRIUM_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let fallback = PathBuf::from("atrium.toml");
    fallback.exists().then_some(fallback)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{AppConfig, BuildingProfile, FileConfig, LogFormat};
    use crate::domain::SensorId;

    #[test]
    fn file_sections_override_defaults() {
        let file: FileConfig = toml::from_str(
            r#"
            [llm]
            model = "mistral"

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.apply_file(file);

        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn validation_rejects_inverted_threshold_bounds() {
        let mut config = AppConfig::default();
        config.building.threshold_min = 10.0;
        config.building.threshold_max = -10.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_zero_timeouts() {
        let mut config = AppConfig::default();
        config.llm.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn demo_profile_resolves_room_mentions_uniquely() {
        let profile = BuildingProfile::demo();

        assert_eq!(profile.resolve("temp-204").map(|s| s.id.as_str()), Some("temp-204"));
        assert_eq!(profile.resolve("204").map(|s| s.id.as_str()), Some("temp-204"));
        assert_eq!(profile.resolve("Room 301").map(|s| s.id.as_str()), Some("temp-301"));
        // "room" alone matches several locations.
        assert!(profile.resolve("room").is_none());
        assert!(profile.resolve("basement").is_none());
    }

    #[test]
    fn retention_window_ends_at_now() {
        let profile = BuildingProfile::demo();
        let now = Utc.with_ymd_and_hms(2026, 8, 21, 12, 0, 0).unwrap();
        let window = profile.retention_window(now).unwrap();
        assert_eq!(window.end, now);
        assert!(window.contains(now - chrono::Duration::days(89)));
    }

    #[test]
    fn demo_profile_knows_sensor_units() {
        let profile = BuildingProfile::demo();
        let sensor = profile.sensor(&SensorId("temp-204".to_string())).unwrap();
        assert_eq!(sensor.unit, "°F");
        assert_eq!(sensor.location, "room 204");
    }
}
