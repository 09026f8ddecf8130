//! Derived table output
//!
//! Every analysis result is written as a CSV table into a single output
//! directory; the run summary goes next to them as JSON. Files are overwritten
//! on each run.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::analytics::{CooccurrencePair, DecliningTerm, EmergingTerm, StableTerm, TrendMatrix};
use crate::error::{Error, Result};
use crate::models::Period;

pub const MATRIX_FILE: &str = "keywords_by_quarter.csv";
pub const EMERGING_FILE: &str = "keywords_emerging.csv";
pub const DECLINING_FILE: &str = "keywords_declining.csv";
pub const STABLE_FILE: &str = "keywords_stable.csv";
pub const SUMMARY_FILE: &str = "run_summary.json";

/// File name of the co-occurrence table for `period`
pub fn cooccurrence_file(period: Period) -> String {
    format!("cooccurrence_{period}.csv")
}

#[derive(Serialize)]
struct EmergingRow<'a> {
    keyword: &'a str,
    recent_freq: u64,
    early_freq: u64,
    growth: i64,
}

#[derive(Serialize)]
struct DecliningRow<'a> {
    keyword: &'a str,
    early_freq: u64,
    recent_freq: u64,
    decline: i64,
}

#[derive(Serialize)]
struct StableRow<'a> {
    keyword: &'a str,
    avg_freq: f64,
    cv: f64,
}

/// Writes derived tables into one directory
pub struct TableWriter {
    output_dir: PathBuf,
}

impl TableWriter {
    /// Create a writer, creating `output_dir` if needed
    pub fn new(output_dir: &Path) -> Result<Self> {
        fs::create_dir_all(output_dir).map_err(|e| {
            Error::with_source(
                format!("Failed to create output directory: {}", output_dir.display()),
                e,
            )
        })?;

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Dense matrix: a `keyword` column followed by one column per period
    pub fn write_matrix(&self, matrix: &TrendMatrix) -> Result<PathBuf> {
        let path = self.output_dir.join(MATRIX_FILE);
        let mut wtr = csv::Writer::from_path(&path)?;

        let mut header = Vec::with_capacity(matrix.periods().len() + 1);
        header.push("keyword".to_string());
        header.extend(matrix.periods().iter().map(Period::to_string));
        wtr.write_record(&header)?;

        for (term, series) in matrix.rows() {
            let mut record = Vec::with_capacity(series.len() + 1);
            record.push(term.to_string());
            record.extend(series.iter().map(u64::to_string));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;

        tracing::debug!(path = %path.display(), rows = matrix.terms().len(), "Wrote matrix table");
        Ok(path)
    }

    pub fn write_emerging(&self, terms: &[EmergingTerm]) -> Result<PathBuf> {
        self.write_rows(
            EMERGING_FILE,
            &["keyword", "recent_freq", "early_freq", "growth"],
            terms.iter().map(|t| EmergingRow {
                keyword: &t.term,
                recent_freq: t.recent_freq,
                early_freq: t.early_freq,
                growth: t.growth,
            }),
        )
    }

    pub fn write_declining(&self, terms: &[DecliningTerm]) -> Result<PathBuf> {
        self.write_rows(
            DECLINING_FILE,
            &["keyword", "early_freq", "recent_freq", "decline"],
            terms.iter().map(|t| DecliningRow {
                keyword: &t.term,
                early_freq: t.early_freq,
                recent_freq: t.recent_freq,
                decline: t.decline,
            }),
        )
    }

    pub fn write_stable(&self, terms: &[StableTerm]) -> Result<PathBuf> {
        self.write_rows(
            STABLE_FILE,
            &["keyword", "avg_freq", "cv"],
            terms.iter().map(|t| StableRow {
                keyword: &t.term,
                avg_freq: t.avg_freq,
                cv: t.cv,
            }),
        )
    }

    pub fn write_cooccurrence(&self, period: Period, pairs: &[CooccurrencePair]) -> Result<PathBuf> {
        self.write_rows(&cooccurrence_file(period), &["term_a", "term_b", "count"], pairs.iter())
    }

    /// Pretty-printed JSON summary
    pub fn write_summary<T: Serialize>(&self, summary: &T) -> Result<PathBuf> {
        let path = self.output_dir.join(SUMMARY_FILE);
        let file = File::create(&path)?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, summary)?;
        out.flush()?;
        Ok(path)
    }

    // The header is written explicitly so empty tables still carry it
    fn write_rows<R, I>(&self, name: &str, header: &[&str], rows: I) -> Result<PathBuf>
    where
        R: Serialize,
        I: IntoIterator<Item = R>,
    {
        let path = self.output_dir.join(name);
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;

        wtr.write_record(header)?;
        let mut count = 0usize;
        for row in rows {
            wtr.serialize(row)?;
            count += 1;
        }
        wtr.flush()?;

        tracing::debug!(path = %path.display(), rows = count, "Wrote table");
        Ok(path)
    }
}
