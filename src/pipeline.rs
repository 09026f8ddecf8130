//! End-to-end batch pipeline
//!
//! Runs the stages in order against one store. Every stage is also callable
//! on its own, which is what the individual CLI subcommands do.
//!
//! ```text
//! ┌──────────┐    ┌─────────────┐    ┌──────────┐    ┌────────────┐
//! │  Loader  │───▶│  Normalize  │───▶│  Matrix  │───▶│ Classifier │
//! └──────────┘    └─────────────┘    └──────────┘    └────────────┘
//!                        │                 │
//!                        │                 └── last period
//!                        ▼                         │
//!                 ┌─────────────┐                  ▼
//!                 │    Store    │────────▶ ┌──────────────┐
//!                 └─────────────┘          │ Co-occurrence│
//!                                          └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use briefscope::config::Config;
//! use briefscope::pipeline::Pipeline;
//! use std::path::Path;
//!
//! # fn example() -> briefscope::error::Result<()> {
//! let pipeline = Pipeline::new(Config::default())?;
//! let report = pipeline.run(Some(Path::new("data/briefs.csv")), None)?;
//! println!("{} merges", report.normalization.total_merged());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analytics::{CooccurrenceAnalyzer, CooccurrencePair, TrendClassification, TrendClassifier, TrendMatrix};
use crate::config::Config;
use crate::error::Result;
use crate::models::Period;
use crate::normalize::builtin::builtin_mappings;
use crate::normalize::{Canonicalizer, MappingSet, NormalizationReport};
use crate::output::TableWriter;
use crate::storage::{load_file, LoadReport, Store};

// ============================================================================
// Reports
// ============================================================================

/// Shape of the keyword × period matrix
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatrixSummary {
    pub terms: usize,
    pub periods: usize,
    pub first_period: Option<Period>,
    pub last_period: Option<Period>,
    pub busiest_period: Option<(Period, u64)>,
    pub quietest_period: Option<(Period, u64)>,
}

impl From<&TrendMatrix> for MatrixSummary {
    fn from(matrix: &TrendMatrix) -> Self {
        let (terms, periods) = matrix.dims();
        Self {
            terms,
            periods,
            first_period: matrix.periods().first().copied(),
            last_period: matrix.last_period(),
            busiest_period: matrix.busiest_period(),
            quietest_period: matrix.quietest_period(),
        }
    }
}

/// Sizes of the three trend sets
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrendSummary {
    pub emerging: usize,
    pub declining: usize,
    pub stable: usize,
    pub degenerate: bool,
}

impl From<&TrendClassification> for TrendSummary {
    fn from(c: &TrendClassification) -> Self {
        Self {
            emerging: c.emerging.len(),
            declining: c.declining.len(),
            stable: c.stable.len(),
            degenerate: c.degenerate,
        }
    }
}

/// Co-occurrence outcome; `period` is `None` when the store had no periods
#[derive(Debug, Clone, Default, Serialize)]
pub struct CooccurrenceSummary {
    pub period: Option<Period>,
    pub min_freq: u64,
    pub pairs: usize,
}

/// Everything a full run did, written as `run_summary.json`
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub load: Option<LoadReport>,
    pub normalization: NormalizationReport,
    pub matrix: MatrixSummary,
    pub trends: TrendSummary,
    pub cooccurrence: CooccurrenceSummary,
    pub outputs: Vec<PathBuf>,
}

/// Output of the trends stage
#[derive(Debug)]
pub struct TrendOutcome {
    pub matrix: TrendMatrix,
    pub classification: TrendClassification,
    pub outputs: Vec<PathBuf>,
}

/// Output of the co-occurrence stage
#[derive(Debug)]
pub struct CooccurrenceOutcome {
    pub period: Period,
    pub pairs: Vec<CooccurrencePair>,
    pub output: PathBuf,
}

// ============================================================================
// Pipeline
// ============================================================================

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    /// Validate `config` and build a pipeline around it
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open the configured store
    ///
    /// With `create` the schema is created if missing; otherwise the tables
    /// must already exist and stages fail with a configuration error if not.
    pub fn open_store(&self, create: bool) -> Result<Store> {
        let path = &self.config.database.sqlite_path;
        if create {
            Store::create(path)
        } else {
            Store::open(path)
        }
    }

    /// Built-in mappings overlaid with an optional mapping file
    pub fn mappings(&self, extra: Option<&Path>) -> Result<MappingSet> {
        let mut set = builtin_mappings()?;
        if let Some(path) = extra {
            set.extend(MappingSet::from_file(path)?)?;
            tracing::info!(path = %path.display(), "Loaded mapping file");
        }
        Ok(set)
    }

    pub fn load(&self, store: &mut Store, input: &Path) -> Result<LoadReport> {
        load_file(store, input)
    }

    /// Apply all mappings, then check that no merge left dangling links
    pub fn normalize(&self, store: &mut Store, mappings: &MappingSet) -> Result<NormalizationReport> {
        let report = Canonicalizer::new().apply_all(store, mappings)?;
        store.verify_integrity()?;
        Ok(report)
    }

    /// Build the matrix, classify and write the four trend tables
    pub fn trends(&self, store: &Store, writer: &TableWriter) -> Result<TrendOutcome> {
        let matrix = TrendMatrix::build(store)?;
        let classification = TrendClassifier::new(self.config.trends.clone()).classify(&matrix);

        let outputs = vec![
            writer.write_matrix(&matrix)?,
            writer.write_emerging(&classification.emerging)?,
            writer.write_declining(&classification.declining)?,
            writer.write_stable(&classification.stable)?,
        ];

        Ok(TrendOutcome {
            matrix,
            classification,
            outputs,
        })
    }

    /// Co-occurrence table for `period`, or the configured period, or the
    /// last period in `matrix`
    ///
    /// Returns `None` when no period can be chosen.
    pub fn cooccur(
        &self,
        store: &Store,
        writer: &TableWriter,
        matrix: &TrendMatrix,
        period: Option<Period>,
        min_freq: Option<u64>,
    ) -> Result<Option<CooccurrenceOutcome>> {
        let Some(period) = period
            .or(self.config.cooccurrence.period)
            .or_else(|| matrix.last_period())
        else {
            tracing::warn!("No period available for co-occurrence analysis");
            return Ok(None);
        };

        let analyzer =
            CooccurrenceAnalyzer::new(min_freq.unwrap_or(self.config.cooccurrence.min_freq));
        let pairs = analyzer.analyze(store, period)?;
        let output = writer.write_cooccurrence(period, &pairs)?;

        Ok(Some(CooccurrenceOutcome {
            period,
            pairs,
            output,
        }))
    }

    /// Run every stage in order
    ///
    /// With `input` the store is created if needed and the file loaded first;
    /// without it the store must already be populated.
    pub fn run(&self, input: Option<&Path>, mapping_file: Option<&Path>) -> Result<PipelineReport> {
        let started_at = Utc::now();
        tracing::info!(
            db = %self.config.database.sqlite_path.display(),
            output = %self.config.output.dir.display(),
            "Starting pipeline run"
        );

        let mappings = self.mappings(mapping_file)?;
        let mut store = self.open_store(input.is_some())?;

        let load = match input {
            Some(path) => Some(self.load(&mut store, path)?),
            None => None,
        };

        let normalization = self.normalize(&mut store, &mappings)?;

        let writer = TableWriter::new(&self.config.output.dir)?;
        let trends = self.trends(&store, &writer)?;
        let cooccurrence = self.cooccur(&store, &writer, &trends.matrix, None, None)?;

        let mut outputs = trends.outputs.clone();
        let cooccurrence_summary = match cooccurrence {
            Some(c) => {
                outputs.push(c.output);
                CooccurrenceSummary {
                    period: Some(c.period),
                    min_freq: self.config.cooccurrence.min_freq,
                    pairs: c.pairs.len(),
                }
            }
            None => CooccurrenceSummary {
                min_freq: self.config.cooccurrence.min_freq,
                ..Default::default()
            },
        };

        let mut report = PipelineReport {
            started_at,
            finished_at: Utc::now(),
            load,
            normalization,
            matrix: MatrixSummary::from(&trends.matrix),
            trends: TrendSummary::from(&trends.classification),
            cooccurrence: cooccurrence_summary,
            outputs,
        };
        let summary_path = writer.output_dir().join(crate::output::SUMMARY_FILE);
        report.outputs.push(summary_path);
        writer.write_summary(&report)?;

        tracing::info!(
            merged = report.normalization.total_merged(),
            terms = report.matrix.terms,
            periods = report.matrix.periods,
            emerging = report.trends.emerging,
            declining = report.trends.declining,
            stable = report.trends.stable,
            pairs = report.cooccurrence.pairs,
            "Pipeline run completed"
        );
        Ok(report)
    }
}
