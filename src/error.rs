//! Unified error handling for the briefscope crate
//!
//! Domain modules define their own error enums; this module folds them into a
//! single [`Error`] so stages can be chained with `?` across module boundaries.
//!
//! # Architecture
//!
//! - [`BriefscopeErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! Only configuration problems abort a pipeline run. Missing mapping variants
//! and degenerate trend input are absorbed by the stages and reported through
//! counts and logs, so they never surface here.

use std::io;
use thiserror::Error;

pub use crate::analytics::AnalyticsError;
pub use crate::normalize::MappingError;
pub use crate::storage::StoreError;

/// Common trait for all briefscope error types
pub trait BriefscopeErrorTrait: std::error::Error {
    /// Check if this error is recoverable (the run may be retried as-is)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid configuration, mappings or an unloaded store
    Config,
    /// SQLite and filesystem errors
    Storage,
    /// Malformed input records
    Input,
    /// Trend and co-occurrence analysis errors
    Analysis,
    /// Writing derived tables
    Output,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "configuration error",
            Self::Storage => "storage error",
            Self::Input => "input error",
            Self::Analysis => "analysis error",
            Self::Output => "output error",
            Self::Other => "other error",
        }
    }
}

/// Unified error type for the briefscope crate
#[derive(Error, Debug)]
pub enum Error {
    /// Relational store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Canonical mapping errors
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Trend analysis errors
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV read/write errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BriefscopeErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_recoverable(),
            Self::Mapping(e) => e.is_recoverable(),
            Self::Analytics(e) => e.is_recoverable(),
            // SQLITE_BUSY and friends clear up once the other handle goes away
            Self::Database(e) => matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
            Self::Io(_) => true,
            Self::Json(_) | Self::Csv(_) | Self::Toml(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Store(e) => e.category(),
            Self::Mapping(e) => e.category(),
            Self::Analytics(e) => e.category(),
            Self::Database(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) | Self::Csv(_) => ErrorCategory::Input,
            Self::Toml(_) | Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error must abort the whole pipeline run
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Config
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err)
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
