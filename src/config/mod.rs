//! Configuration management for briefscope
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Every stage receives its settings explicitly from
//! a [`Config`]; there is no process-wide state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analytics::TrendThresholds;
use crate::error::{Error, Result};
use crate::models::Period;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Trend classification thresholds
    pub trends: TrendThresholds,

    /// Co-occurrence analysis configuration
    pub cooccurrence: CooccurrenceConfig,

    /// Output table configuration
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/db/briefs.sqlite"),
        }
    }
}

/// Co-occurrence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CooccurrenceConfig {
    /// Minimum number of shared publications for a pair to be reported
    pub min_freq: u64,

    /// Period to analyze; defaults to the last period in the matrix
    pub period: Option<Period>,
}

impl Default for CooccurrenceConfig {
    fn default() -> Self {
        Self {
            min_freq: 3,
            period: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the derived CSV tables
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("outputs/tables"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("BRIEFSCOPE_SQLITE_PATH") {
            config.database.sqlite_path = path.into();
        }

        if let Ok(dir) = std::env::var("BRIEFSCOPE_OUTPUT_DIR") {
            config.output.dir = dir.into();
        }

        if let Some(min_freq) = std::env::var("BRIEFSCOPE_COOCCUR_MIN_FREQ")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.cooccurrence.min_freq = min_freq;
        }

        if let Ok(period) = std::env::var("BRIEFSCOPE_COOCCUR_PERIOD") {
            let period = period
                .parse::<Period>()
                .map_err(|e| Error::config(format!("BRIEFSCOPE_COOCCUR_PERIOD: {e}")))?;
            config.cooccurrence.period = Some(period);
        }

        if let Ok(level) = std::env::var("BRIEFSCOPE_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(format) = std::env::var("BRIEFSCOPE_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::with_source(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.cooccurrence.min_freq == 0 {
            return Err(Error::config("cooccurrence.min_freq must be greater than 0"));
        }

        self.trends.validate()?;

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(Error::config(format!(
                "logging.format must be 'text' or 'json', got '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }
}
