//! briefscope - research brief metadata normalization and keyword trends
//!
//! Loads harvested publication metadata into SQLite, collapses vocabulary
//! variants onto canonical forms and derives temporal keyword trends from the
//! cleaned store.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`error`] - Unified error type and categories
//! - [`models`] - Core data structures and types
//! - [`storage`] - SQLite schema, bulk loader and summary queries
//! - [`normalize`] - Canonical mapping tables and the merge engine
//! - [`analytics`] - Keyword × period matrix, trend classifier, co-occurrence
//! - [`output`] - CSV and JSON writers for derived tables
//! - [`pipeline`] - Runs the stages in order
//!
//! # Example
//!
//! ```no_run
//! use briefscope::config::Config;
//! use briefscope::pipeline::Pipeline;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let pipeline = Pipeline::new(config)?;
//!     let report = pipeline.run(None, None)?;
//!     println!("{} emerging keywords", report.trends.emerging);
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{
        CooccurrenceAnalyzer, TrendClassification, TrendClassifier, TrendMatrix, TrendThresholds,
    };
    pub use crate::config::Config;
    pub use crate::error::{BriefscopeErrorTrait, Error, ErrorCategory, Result};
    pub use crate::models::{Period, PublicationRecord};
    pub use crate::normalize::{Canonicalizer, CanonicalMap, MappingSet};
    pub use crate::pipeline::{Pipeline, PipelineReport};
    pub use crate::storage::Store;
}

// Direct re-exports for convenience
pub use models::{Period, PublicationRecord};
