// Configuration for warpfield

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::constants;

// =============================================================================
// CONFIGURATION STRUCTURES
// =============================================================================

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingSettings {
    /// Mirror log output to stdout
    #[serde(default)]
    pub console: bool,
    /// Log file path (relative to the working directory or absolute).
    /// Empty = no file logging.
    #[serde(default)]
    pub log_file: String,
}

/// Transition timing overrides, all in milliseconds.
///
/// Defaults match the tuned values the state machines ship with; hosts
/// override these for accessibility (longer fades) or testing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    #[serde(default = "default_warp_cooldown_ms")]
    pub warp_cooldown_ms: u64,
    #[serde(default = "default_fade_duration_ms")]
    pub fade_duration_ms: u64,
    #[serde(default = "default_quick_fade_duration_ms")]
    pub quick_fade_duration_ms: u64,
    #[serde(default = "default_door_dwell_ms")]
    pub door_dwell_ms: u64,
    #[serde(default = "default_door_fade_duration_ms")]
    pub door_fade_duration_ms: u64,
    #[serde(default = "default_load_retry_interval_ms")]
    pub load_retry_interval_ms: u64,
    #[serde(default = "default_max_load_retries")]
    pub max_load_retries: u32,
}

fn default_warp_cooldown_ms() -> u64 {
    constants::WARP_COOLDOWN_MS
}
fn default_fade_duration_ms() -> u64 {
    constants::FADE_DEFAULT_DURATION_MS
}
fn default_quick_fade_duration_ms() -> u64 {
    constants::FADE_QUICK_DURATION_MS
}
fn default_door_dwell_ms() -> u64 {
    constants::DOOR_WAIT_BEFORE_FADE_MS
}
fn default_door_fade_duration_ms() -> u64 {
    constants::DOOR_FADE_DURATION_MS
}
fn default_load_retry_interval_ms() -> u64 {
    constants::SCRIPTED_WARP_LOAD_RETRY_INTERVAL_MS
}
fn default_max_load_retries() -> u32 {
    constants::SCRIPTED_WARP_MAX_LOAD_RETRIES
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            warp_cooldown_ms: default_warp_cooldown_ms(),
            fade_duration_ms: default_fade_duration_ms(),
            quick_fade_duration_ms: default_quick_fade_duration_ms(),
            door_dwell_ms: default_door_dwell_ms(),
            door_fade_duration_ms: default_door_fade_duration_ms(),
            load_retry_interval_ms: default_load_retry_interval_ms(),
            max_load_retries: default_max_load_retries(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub timing: TimingSettings,
}

// =============================================================================
// CONFIG LOADING
// =============================================================================

#[derive(Debug)]
pub enum ConfigError {
    ReadError(std::io::Error),
    ParseError(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::ParseError(e) => write!(f, "Failed to parse config file: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub const CONFIG_FILENAME: &'static str = "warpfield.toml";

    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(ConfigError::ParseError)
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "[config] No config found, using defaults");
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config = Self::from_str(&contents)?;
        info!(path = %path.display(), "[config] Loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.timing.warp_cooldown_ms, 350);
        assert_eq!(config.timing.fade_duration_ms, 500);
        assert_eq!(config.timing.quick_fade_duration_ms, 250);
        assert_eq!(config.timing.door_dwell_ms, 200);
        assert_eq!(config.timing.max_load_retries, 3);
        assert!(!config.logging.console);
        assert!(config.logging.log_file.is_empty());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = Config::from_str(
            r#"
            [logging]
            console = true

            [timing]
            fade_duration_ms = 800
        "#,
        )
        .expect("valid config");
        assert!(config.logging.console);
        assert_eq!(config.timing.fade_duration_ms, 800);
        // Untouched fields keep their defaults
        assert_eq!(config.timing.warp_cooldown_ms, 350);
        assert_eq!(config.timing.load_retry_interval_ms, 1500);
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let err = Config::from_str("timing = 12").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config = Config::from_str("").expect("empty config");
        assert_eq!(config.timing.door_fade_duration_ms, 500);
    }
}
