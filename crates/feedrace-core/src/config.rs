//! Configuration loading and typed config structures for the feed race player.
//!
//! The configuration lives in a YAML file (by default
//! `feedrace-config.yaml` next to the binary's working directory). This
//! module defines strongly-typed structs that mirror the YAML structure and
//! a loader that reads and validates the file. Every field has a default, so
//! an empty document is a valid configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Largest accepted `playback.feed_length`.
pub const MAX_FEED_LENGTH: usize = 10_000;

/// Environment variable that overrides `data.path`.
pub const DATA_PATH_ENV: &str = "FEEDRACE_DATA";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level player configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlayerConfig {
    /// Timeline pacing and buffer sizes.
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Where the dataset lives and which sources to race.
    #[serde(default)]
    pub data: DataConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PlayerConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `FEEDRACE_DATA` overrides `data.path` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.data.apply_env_overrides();
        config.playback.validate()?;
        Ok(config)
    }
}

/// Timeline pacing and display sizes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaybackConfig {
    /// Maximum number of entries kept in each feed buffer.
    #[serde(default = "default_feed_length")]
    pub feed_length: usize,

    /// Simulated time that maps onto the whole playback duration.
    #[serde(default = "default_scaled_end_time")]
    pub scaled_end_time: f64,

    /// Real playback duration, in milliseconds, for `scaled_end_time`.
    #[serde(default = "default_max_real_time_ms")]
    pub max_real_time_ms: f64,

    /// Time offset of the held-value point before each step edge.
    #[serde(default = "default_step_epsilon")]
    pub step_epsilon: f64,

    /// Floor for the running maximum handed to the performance renderer.
    #[serde(default = "default_initial_max_value")]
    pub initial_max_value: f64,

    /// Replay the first event at load time so the charts have a first point.
    #[serde(default = "default_true")]
    pub prime_on_load: bool,

    /// Start playback immediately instead of waiting for a `play` command.
    #[serde(default)]
    pub autoplay: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            feed_length: default_feed_length(),
            scaled_end_time: default_scaled_end_time(),
            max_real_time_ms: default_max_real_time_ms(),
            step_epsilon: default_step_epsilon(),
            initial_max_value: default_initial_max_value(),
            prime_on_load: true,
            autoplay: false,
        }
    }
}

impl PlaybackConfig {
    /// Check that every value is usable by the scheduler and interpolator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_length == 0 {
            return Err(invalid("feed_length must be at least 1"));
        }
        if self.feed_length > MAX_FEED_LENGTH {
            return Err(ConfigError::Invalid {
                reason: format!("feed_length must be at most {MAX_FEED_LENGTH}"),
            });
        }
        if !self.scaled_end_time.is_finite() || self.scaled_end_time <= 0.0 {
            return Err(invalid("scaled_end_time must be a positive finite number"));
        }
        if !self.max_real_time_ms.is_finite() || self.max_real_time_ms < 0.0 {
            return Err(invalid("max_real_time_ms must be a non-negative finite number"));
        }
        if !self.step_epsilon.is_finite() || self.step_epsilon <= 0.0 {
            return Err(invalid("step_epsilon must be a positive finite number"));
        }
        if !self.initial_max_value.is_finite() {
            return Err(invalid("initial_max_value must be finite"));
        }
        Ok(())
    }
}

/// Dataset location and source selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataConfig {
    /// Path of the JSON dataset.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    /// Wall to replay. Defaults to the first wall in the file.
    #[serde(default)]
    pub wall_id: Option<String>,

    /// Broadcasts to race. Defaults to the first two in the file.
    #[serde(default)]
    pub broadcast_ids: Option<[String; 2]>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            wall_id: None,
            broadcast_ids: None,
        }
    }
}

impl DataConfig {
    /// Apply `FEEDRACE_DATA` on top of the parsed path.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(DATA_PATH_ENV) {
            if !path.is_empty() {
                self.path = PathBuf::from(path);
            }
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_feed_length() -> usize {
    50
}

const fn default_scaled_end_time() -> f64 {
    100.0
}

const fn default_max_real_time_ms() -> f64 {
    60_000.0
}

const fn default_step_epsilon() -> f64 {
    1e-6
}

const fn default_initial_max_value() -> f64 {
    5.0
}

const fn default_true() -> bool {
    true
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/example1.json")
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PlayerConfig::default();
        assert_eq!(config.playback.feed_length, 50);
        assert_eq!(config.playback.scaled_end_time, 100.0);
        assert_eq!(config.playback.max_real_time_ms, 60_000.0);
        assert_eq!(config.playback.step_epsilon, 1e-6);
        assert_eq!(config.playback.initial_max_value, 5.0);
        assert!(config.playback.prime_on_load);
        assert!(!config.playback.autoplay);
        assert!(config.playback.validate().is_ok());
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
playback:
  feed_length: 20
  scaled_end_time: 50.0
  max_real_time_ms: 30000
  step_epsilon: 0.001
  initial_max_value: 3
  prime_on_load: false
  autoplay: true

data:
  path: "fixtures/race.json"
  wall_id: "wall-7"
  broadcast_ids: ["opt", "poisson"]

logging:
  level: "debug"
  format: "json"
"#;
        let config = PlayerConfig::parse(yaml).unwrap();
        assert_eq!(config.playback.feed_length, 20);
        assert_eq!(config.playback.scaled_end_time, 50.0);
        assert_eq!(config.playback.max_real_time_ms, 30_000.0);
        assert!(!config.playback.prime_on_load);
        assert!(config.playback.autoplay);
        assert_eq!(config.data.wall_id.as_deref(), Some("wall-7"));
        assert_eq!(
            config.data.broadcast_ids,
            Some(["opt".to_owned(), "poisson".to_owned()])
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = PlayerConfig::parse("playback:\n  feed_length: 3\n").unwrap();
        assert_eq!(config.playback.feed_length, 3);
        assert_eq!(config.playback.scaled_end_time, 100.0);
        assert!(config.data.wall_id.is_none());
    }

    #[test]
    fn zero_feed_length_is_rejected() {
        let result = PlayerConfig::parse("playback:\n  feed_length: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn oversized_feed_length_is_rejected() {
        let result = PlayerConfig::parse("playback:\n  feed_length: 1000000000000000000\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        let limit = format!("playback:\n  feed_length: {MAX_FEED_LENGTH}\n");
        assert_eq!(PlayerConfig::parse(&limit).unwrap().playback.feed_length, MAX_FEED_LENGTH);
    }

    #[test]
    fn non_positive_scaled_end_time_is_rejected() {
        let result = PlayerConfig::parse("playback:\n  scaled_end_time: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn non_positive_epsilon_is_rejected() {
        let result = PlayerConfig::parse("playback:\n  step_epsilon: -1.0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn broadcast_ids_need_exactly_two_entries() {
        let result = PlayerConfig::parse("data:\n  broadcast_ids: [\"only-one\"]\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let result = PlayerConfig::parse("playback: [unterminated");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
