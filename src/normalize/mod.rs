//! Vocabulary canonicalization
//!
//! Multi-valued attributes arrive with casing, spelling and bilingual
//! variants. This module rewrites every reference to a variant so it points at
//! the variant's canonical form instead:
//!
//! - [`mapping`] - validated variant→canonical tables and mapping files
//! - [`builtin`] - the stock SDG, impact area and keyword tables
//! - [`engine`] - applies a table to the store, per attribute class
//!
//! Applying the same table twice is a no-op: the second pass finds no variant
//! rows and reports zero merges.

pub mod builtin;
pub mod engine;
pub mod mapping;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::error::{BriefscopeErrorTrait, ErrorCategory};
use crate::models::{FundingType, GeoType, TagType};

pub use engine::{Canonicalizer, EntryOutcome, MergeReport, NormalizationReport};
pub use mapping::{CanonicalMap, MappingSet};

/// Errors raised while building canonical mappings
#[derive(Error, Debug)]
pub enum MappingError {
    /// A canonical value is itself a variant key elsewhere in the same table
    #[error("[{class}] mapping '{variant}' -> '{canonical}' is chained: '{canonical}' is also a variant")]
    ChainedMapping {
        class: String,
        variant: String,
        canonical: String,
    },

    /// A variant maps to itself
    #[error("[{class}] variant '{variant}' maps to itself")]
    SelfMapping { class: String, variant: String },

    /// A variant or canonical value is blank
    #[error("[{class}] mapping entries must not be empty")]
    EmptyEntry { class: String },

    /// The same variant is given two different canonical values
    #[error("[{class}] variant '{variant}' maps to both '{first}' and '{second}'")]
    Conflict {
        class: String,
        variant: String,
        first: String,
        second: String,
    },

    /// A mapping file names a tag, geo or funding type that does not exist
    #[error("unknown attribute class '{0}' in mapping file")]
    UnknownClass(String),
}

impl BriefscopeErrorTrait for MappingError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Config
    }
}

/// The attribute a mapping is scoped to
///
/// Tags are rewritten by literal value. Every other class goes through a
/// dictionary and is matched on the normalized surface form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeClass {
    Tag(TagType),
    Keyword,
    Geo(GeoType),
    Funding(FundingType),
}

impl AttributeClass {
    /// Whether values of this class live in a dictionary table
    pub fn is_dictionary(&self) -> bool {
        !matches!(self, Self::Tag(_))
    }
}

impl fmt::Display for AttributeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(t) => write!(f, "tag:{}", t.as_str()),
            Self::Keyword => f.write_str("keyword"),
            Self::Geo(t) => write!(f, "geo:{}", t.as_str()),
            Self::Funding(t) => write!(f, "funding:{}", t.as_str()),
        }
    }
}

impl Serialize for AttributeClass {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
