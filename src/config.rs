//! Configuration file support.
//!
//! This module provides serialization and deserialization of user settings:
//! data roots, thumbnail grid geometry, the default label list and the log level.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONTAINER_ROOT, DEFAULT_LABELS, DEFAULT_PROBABILITY_THRESHOLD, DEFAULT_ROWS_PER_PAGE,
    DEFAULT_THUMBNAIL_COLUMNS, HOST_ROOT_ENV, MAX_THUMBNAIL_COLUMNS, OUTPUT_DIR_NAME,
};
use crate::paths::PathNamespace;

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

/// User configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,

    /// Label list a manual session starts with
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
}

fn default_app_name() -> String {
    "labelmaker".to_string()
}

fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|l| l.to_string()).collect()
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Data root as seen by the tool
    #[serde(default = "default_container_root")]
    pub container_root: PathBuf,

    /// Data root as mounted on the user's machine (defaults to the container root)
    #[serde(default)]
    pub host_root: Option<PathBuf>,

    /// Show host paths instead of container paths
    #[serde(default)]
    pub show_host_paths: bool,

    /// Thumbnails per row (1-5)
    #[serde(default = "default_thumbnail_columns")]
    pub thumbnail_columns: usize,

    /// Thumbnail rows per page
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: usize,

    /// Default score threshold for MLCoach labeling, in percent
    #[serde(default = "default_probability_threshold")]
    pub probability_threshold: f64,

    /// Export directory (defaults to `<container_root>/labelmaker_outputs`)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_container_root() -> PathBuf {
    PathBuf::from(DEFAULT_CONTAINER_ROOT)
}

fn default_thumbnail_columns() -> usize {
    DEFAULT_THUMBNAIL_COLUMNS
}

fn default_rows_per_page() -> usize {
    DEFAULT_ROWS_PER_PAGE
}

fn default_probability_threshold() -> f64 {
    DEFAULT_PROBABILITY_THRESHOLD
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            container_root: default_container_root(),
            host_root: None,
            show_host_paths: false,
            thumbnail_columns: default_thumbnail_columns(),
            rows_per_page: default_rows_per_page(),
            probability_threshold: default_probability_threshold(),
            output_dir: None,
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            preferences: UserPreferences::default(),
            labels: default_labels(),
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

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefs = &self.preferences;
        if !(1..=MAX_THUMBNAIL_COLUMNS).contains(&prefs.thumbnail_columns) {
            return Err(ConfigError::Invalid(format!(
                "thumbnail_columns must be between 1 and {}, got {}",
                MAX_THUMBNAIL_COLUMNS, prefs.thumbnail_columns
            )));
        }
        if prefs.rows_per_page == 0 {
            return Err(ConfigError::Invalid("rows_per_page must be at least 1".into()));
        }
        if !(0.0..=100.0).contains(&prefs.probability_threshold) {
            return Err(ConfigError::Invalid(format!(
                "probability_threshold must be between 0 and 100, got {}",
                prefs.probability_threshold
            )));
        }
        Ok(())
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "labelmaker-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("labelmaker").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("labelmaker")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from a file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from_file(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Load from `path` if given, else from the default path, else defaults.
    /// The `DATA_DIR` environment variable overrides the host root.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_from_default_path().unwrap_or_default(),
        };
        config.apply_host_root_override(std::env::var(HOST_ROOT_ENV).ok());
        Ok(config)
    }

    /// Replace the host root with `value` when it is set and not blank.
    pub fn apply_host_root_override(&mut self, value: Option<String>) {
        if let Some(root) = value.filter(|v| !v.trim().is_empty()) {
            log::debug!("Host root from {}: {}", HOST_ROOT_ENV, root);
            self.preferences.host_root = Some(PathBuf::from(root));
        }
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to_file(&path)
    }

    /// The container/host namespace pair.
    pub fn namespace(&self) -> PathNamespace {
        let prefs = &self.preferences;
        match &prefs.host_root {
            Some(host) => PathNamespace::new(&prefs.container_root, host),
            None => PathNamespace::identity(&prefs.container_root),
        }
    }

    /// Where exports are written.
    pub fn output_dir(&self) -> PathBuf {
        self.preferences
            .output_dir
            .clone()
            .unwrap_or_else(|| self.preferences.container_root.join(OUTPUT_DIR_NAME))
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

    /// A setting is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
