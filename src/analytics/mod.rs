//! Temporal keyword trend analysis
//!
//! - [`matrix`] - dense keyword × period frequency matrix built from the store
//! - [`classifier`] - emerging / declining / stable term sets from the matrix
//! - [`cooccurrence`] - keyword pairs sharing publications within one period
//!
//! All three are read-only over the store and recomputed from scratch on
//! every run.

pub mod classifier;
pub mod cooccurrence;
pub mod matrix;

use thiserror::Error;

use crate::error::{BriefscopeErrorTrait, ErrorCategory};

pub use classifier::{
    DecliningTerm, EmergingTerm, StableTerm, TrendClassification, TrendClassifier,
    TrendThresholds,
};
pub use cooccurrence::{CooccurrenceAnalyzer, CooccurrencePair};
pub use matrix::TrendMatrix;

/// Errors that can occur during trend analysis
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Invalid threshold {name}: {value}")]
    InvalidThreshold { name: &'static str, value: String },

    #[error("Row for '{term}' has {got} cells, expected {expected}")]
    DimensionMismatch {
        term: String,
        expected: usize,
        got: usize,
    },

    #[error("Duplicate term in matrix: {0}")]
    DuplicateTerm(String),
}

impl BriefscopeErrorTrait for AnalyticsError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidThreshold { .. } => ErrorCategory::Config,
            Self::DimensionMismatch { .. } | Self::DuplicateTerm(_) => ErrorCategory::Analysis,
        }
    }
}
