/*!
 * Configuration support for the turnover library
 *
 * Provides runtime configuration, including the headcount baseline that the
 * turnover ratio is measured against.
 */

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HEADCOUNT_BASELINE, DEFAULT_SHEET_NAME, MAX_TRAILING_WINDOW_DAYS, TRAILING_WINDOW_DAYS};
use crate::session::Credentials;
use crate::{Result, TurnoverError};

/// Configuration for loading and reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnoverConfig {
    /// Active headcount the trailing-window count is divided by
    #[serde(default = "default_headcount_baseline")]
    pub headcount_baseline: u32,

    /// Length of the trailing window in days
    #[serde(default = "default_trailing_window_days")]
    pub trailing_window_days: i64,

    /// Sheet read from spreadsheet files
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Field delimiter for text files (None = sniff from the header line)
    #[serde(default)]
    pub delimiter: Option<char>,

    /// Whether to check the header row for required columns
    #[serde(default = "default_validate_headers")]
    pub validate_headers: bool,

    /// Whether to show a spinner while reading
    #[serde(default)]
    pub enable_progress_bar: bool,

    /// Login credentials; without them the login gate is open
    #[serde(default)]
    pub credentials: Option<Credentials>,

    /// Default tracing filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TurnoverConfig {
    fn default() -> Self {
        Self {
            headcount_baseline: default_headcount_baseline(),
            trailing_window_days: default_trailing_window_days(),
            sheet_name: default_sheet_name(),
            delimiter: None,
            validate_headers: default_validate_headers(),
            enable_progress_bar: false,
            credentials: None,
            log_level: default_log_level(),
        }
    }
}

// Default value functions for serde
fn default_headcount_baseline() -> u32 {
    DEFAULT_HEADCOUNT_BASELINE
}

fn default_trailing_window_days() -> i64 {
    TRAILING_WINDOW_DAYS
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.to_string()
}

fn default_validate_headers() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TurnoverConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - `TURNOVER_HEADCOUNT`: headcount baseline
    /// - `TURNOVER_WINDOW_DAYS`: trailing window length
    /// - `TURNOVER_SHEET`: spreadsheet sheet name
    /// - `TURNOVER_DELIMITER`: single character, or "auto"
    /// - `TURNOVER_VALIDATE_HEADERS`: "true" or "false"
    /// - `TURNOVER_PROGRESS_BAR`: "true" or "false"
    /// - `TURNOVER_USERNAME` / `TURNOVER_PASSWORD`: login credentials
    /// - `TURNOVER_LOG`: tracing filter directive
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("TURNOVER_HEADCOUNT") {
            if let Ok(headcount) = val.trim().parse() {
                config.headcount_baseline = headcount;
            }
        }

        if let Some(val) = lookup("TURNOVER_WINDOW_DAYS") {
            if let Ok(days) = val.trim().parse() {
                config.trailing_window_days = days;
            }
        }

        if let Some(val) = lookup("TURNOVER_SHEET") {
            config.sheet_name = val;
        }

        if let Some(val) = lookup("TURNOVER_DELIMITER") {
            config.delimiter = match val.as_str() {
                "auto" | "" => None,
                "\\t" | "tab" => Some('\t'),
                other => other.chars().next(),
            };
        }

        if let Some(val) = lookup("TURNOVER_VALIDATE_HEADERS") {
            config.validate_headers = val.to_lowercase() == "true";
        }

        if let Some(val) = lookup("TURNOVER_PROGRESS_BAR") {
            config.enable_progress_bar = val.to_lowercase() == "true";
        }

        if let (Some(username), Some(password)) = (lookup("TURNOVER_USERNAME"), lookup("TURNOVER_PASSWORD")) {
            config.credentials = Some(Credentials::new(username, password));
        }

        if let Some(val) = lookup("TURNOVER_LOG") {
            config.log_level = val;
        }

        config
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| TurnoverError::Configuration {
                message: format!("Failed to parse config file: {}", e),
                suggestion: Some("Check that the file is valid TOML format".to_string()),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| TurnoverError::Configuration {
                message: format!("Failed to serialize config: {}", e),
                suggestion: None,
            })?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/turnover/config.toml` on Unix-like systems
    /// or `%APPDATA%\turnover\config.toml` on Windows
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "turnover")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location, environment, or defaults
    ///
    /// Priority order:
    /// 1. Default config file (if exists)
    /// 2. Environment variables
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(config_path) = Self::default_config_path() {
            if config_path.exists() {
                match Self::from_file(&config_path) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!(path = %config_path.display(), "ignoring config file: {}", e),
                }
            }
        }

        Self::from_env()
    }

    /// Reject values the report cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.trailing_window_days < 0 {
            return Err(TurnoverError::Configuration {
                message: format!("trailing_window_days must not be negative, got {}", self.trailing_window_days),
                suggestion: Some("Use 365 for a twelve-month window".to_string()),
            });
        }
        if self.trailing_window_days > MAX_TRAILING_WINDOW_DAYS {
            return Err(TurnoverError::Configuration {
                message: format!(
                    "trailing_window_days must be at most {}, got {}",
                    MAX_TRAILING_WINDOW_DAYS, self.trailing_window_days
                ),
                suggestion: Some("Use 365 for a twelve-month window".to_string()),
            });
        }
        if self.sheet_name.trim().is_empty() {
            return Err(TurnoverError::Configuration {
                message: "sheet_name must not be empty".to_string(),
                suggestion: Some(format!("Use '{}'", DEFAULT_SHEET_NAME)),
            });
        }
        if let Some(delimiter) = self.delimiter {
            if !delimiter.is_ascii() {
                return Err(TurnoverError::Configuration {
                    message: format!("delimiter must be a single ASCII character, got '{}'", delimiter),
                    suggestion: Some("Use ',', ';' or a tab".to_string()),
                });
            }
        }
        Ok(())
    }

    /// Delimiter as the byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.filter(|c| c.is_ascii()).map(|c| c as u8)
    }
}

/// Builder for customizing configuration
#[derive(Default)]
pub struct ConfigBuilder {
    config: TurnoverConfig,
}

impl ConfigBuilder {
    /// Start building a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the headcount baseline
    pub fn headcount_baseline(mut self, headcount: u32) -> Self {
        self.config.headcount_baseline = headcount;
        self
    }

    /// Set the trailing window length
    pub fn trailing_window_days(mut self, days: i64) -> Self {
        self.config.trailing_window_days = days;
        self
    }

    /// Set the sheet name
    pub fn sheet_name<S: Into<String>>(mut self, sheet: S) -> Self {
        self.config.sheet_name = sheet.into();
        self
    }

    /// Set the delimiter
    pub fn delimiter(mut self, delimiter: Option<char>) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// Set header validation
    pub fn validate_headers(mut self, validate: bool) -> Self {
        self.config.validate_headers = validate;
        self
    }

    /// Set progress bar enabled
    pub fn progress_bar(mut self, enabled: bool) -> Self {
        self.config.enable_progress_bar = enabled;
        self
    }

    /// Set login credentials
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = Some(credentials);
        self
    }

    /// Set the log level directive
    pub fn log_level<S: Into<String>>(mut self, level: S) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> TurnoverConfig {
        self.config
    }
}
