//! Configuration file support.
//!
//! This module provides serialization and deserialization of application
//! settings. A missing or unreadable config file falls back to defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_IMAGE_EXTENSIONS, DEFAULT_PALETTE_SIZE, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_SAVE_INTERVAL_MS,
};
use crate::keybindings::KeyBindings;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,

    /// Keybinding configuration
    #[serde(default)]
    pub keybindings: KeyBindings,
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Milliseconds between periodic tag file saves
    #[serde(default = "default_save_interval_ms")]
    pub save_interval_ms: u64,

    /// Milliseconds between cursor readout polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Number of distinct tag colors
    #[serde(default = "default_palette_size")]
    pub palette_size: usize,

    /// Image extensions listed when loading a folder (without dots)
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_save_interval_ms() -> u64 {
    DEFAULT_SAVE_INTERVAL_MS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_palette_size() -> usize {
    DEFAULT_PALETTE_SIZE
}

fn default_image_extensions() -> Vec<String> {
    DEFAULT_IMAGE_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            save_interval_ms: default_save_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            palette_size: default_palette_size(),
            image_extensions: default_image_extensions(),
        }
    }
}

impl UserPreferences {
    /// Interval between periodic saves.
    pub fn save_interval(&self) -> Duration {
        Duration::from_millis(self.save_interval_ms)
    }

    /// Interval between cursor polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: UserPreferences::default(),
            keybindings: KeyBindings::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Read configuration from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "pairtag-config.json"
    }

    /// Get the default config file path for auto-load/save.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("pairtag").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("pairtag")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from_path(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(&path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keybindings::{Key, KeyAction};

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.preferences.save_interval(), Duration::from_secs(2));
        assert_eq!(config.preferences.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.preferences.palette_size, 10);
        assert_eq!(config.preferences.image_extensions, vec!["jpg", "jpeg", "png"]);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = AppConfig::new();
        config.preferences.palette_size = 6;
        config.preferences.log_level = LogLevel::Trace;

        let loaded = AppConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config =
            AppConfig::from_json(r#"{"version": 1, "preferences": {"save_interval_ms": 500}}"#)
                .unwrap();
        assert_eq!(config.preferences.save_interval(), Duration::from_millis(500));
        assert_eq!(config.preferences.palette_size, 10);
        assert_eq!(
            config.keybindings.action_for_key(Key::Space),
            Some(KeyAction::ConfirmPending)
        );
    }

    #[test]
    fn test_newer_version_rejected() {
        let json = format!(r#"{{"version": {}}}"#, CONFIG_VERSION + 1);
        assert!(matches!(
            AppConfig::from_json(&json),
            Err(ConfigError::VersionTooNew { .. })
        ));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(AppConfig::default_filename());
        std::fs::write(&path, r#"{"version": 1, "preferences": {"log_level": "debug"}}"#).unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.preferences.log_level, LogLevel::Debug);
        assert!(matches!(
            AppConfig::load_from_path(&dir.path().join("missing.json")),
            Err(ConfigError::IoError(_))
        ));
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::default().name(), "Info");
    }
}
