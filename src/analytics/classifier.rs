//! Emerging / declining / stable keyword classification
//!
//! Window sums over the matrix: the first [`EARLY_WINDOW`] periods and the
//! last [`RECENT_WINDOW`] periods. With fewer than [`MIN_PERIODS`] periods the
//! windows would overlap, so the result is empty and flagged degenerate.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::{AnalyticsError, TrendMatrix};

pub const EARLY_WINDOW: usize = 3;
pub const RECENT_WINDOW: usize = 2;
pub const MIN_PERIODS: usize = EARLY_WINDOW + RECENT_WINDOW;
const CV_EPSILON: f64 = 1e-10;

// ============================================================================
// Thresholds
// ============================================================================

/// Classification thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendThresholds {
    /// Emerging: recent window sum must reach this
    pub min_recent: u64,
    /// Emerging: early window sum must stay below this
    pub min_growth: u64,
    /// Declining: early window sum must reach this
    pub min_early: u64,
    /// Declining: recent window sum must not exceed this
    pub max_recent: u64,
    /// Stable: mean over all periods must reach this
    pub min_avg: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            min_recent: 5,
            min_growth: 3,
            min_early: 5,
            max_recent: 2,
            min_avg: 10.0,
        }
    }
}

impl TrendThresholds {
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.min_avg.is_finite() || self.min_avg < 0.0 {
            return Err(AnalyticsError::InvalidThreshold {
                name: "min_avg",
                value: self.min_avg.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

// ============================================================================
// Result rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmergingTerm {
    pub term: String,
    pub recent_freq: u64,
    pub early_freq: u64,
    pub growth: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecliningTerm {
    pub term: String,
    pub early_freq: u64,
    pub recent_freq: u64,
    pub decline: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StableTerm {
    pub term: String,
    pub avg_freq: f64,
    /// Coefficient of variation: sample std / mean
    pub cv: f64,
}

/// The three term sets for one matrix
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendClassification {
    pub emerging: Vec<EmergingTerm>,
    pub declining: Vec<DecliningTerm>,
    pub stable: Vec<StableTerm>,
    /// Fewer than [`MIN_PERIODS`] periods; all sets are empty
    pub degenerate: bool,
    pub periods: usize,
}

impl TrendClassification {
    pub fn is_empty(&self) -> bool {
        self.emerging.is_empty() && self.declining.is_empty() && self.stable.is_empty()
    }
}

// ============================================================================
// Classifier
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct TrendClassifier {
    thresholds: TrendThresholds,
}

struct Windows {
    early: u64,
    recent: u64,
}

impl TrendClassifier {
    pub fn new(thresholds: TrendThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &TrendThresholds {
        &self.thresholds
    }

    /// Classify every term of the matrix
    pub fn classify(&self, matrix: &TrendMatrix) -> TrendClassification {
        let periods = matrix.periods().len();

        if periods < MIN_PERIODS {
            tracing::warn!(
                periods,
                required = MIN_PERIODS,
                "Too few periods for trend classification"
            );
            return TrendClassification {
                degenerate: true,
                periods,
                ..Default::default()
            };
        }

        let result = TrendClassification {
            emerging: self.emerging(matrix),
            declining: self.declining(matrix),
            stable: self.stable(matrix),
            degenerate: false,
            periods,
        };

        tracing::info!(
            emerging = result.emerging.len(),
            declining = result.declining.len(),
            stable = result.stable.len(),
            periods,
            "Classified keyword trends"
        );
        result
    }

    /// Low early, meaningful recent; sorted by growth descending
    pub fn emerging(&self, matrix: &TrendMatrix) -> Vec<EmergingTerm> {
        if matrix.periods().len() < MIN_PERIODS {
            return Vec::new();
        }
        let t = &self.thresholds;

        let mut out: Vec<EmergingTerm> = matrix
            .rows()
            .filter_map(|(term, series)| {
                let w = windows(series);
                (w.recent >= t.min_recent && w.early < t.min_growth).then(|| EmergingTerm {
                    term: term.to_string(),
                    recent_freq: w.recent,
                    early_freq: w.early,
                    growth: w.recent as i64 - w.early as i64,
                })
            })
            .collect();

        out.sort_by(|a, b| b.growth.cmp(&a.growth).then_with(|| a.term.cmp(&b.term)));
        out
    }

    /// Meaningful early, near-absent recent; sorted by decline descending
    pub fn declining(&self, matrix: &TrendMatrix) -> Vec<DecliningTerm> {
        if matrix.periods().len() < MIN_PERIODS {
            return Vec::new();
        }
        let t = &self.thresholds;

        let mut out: Vec<DecliningTerm> = matrix
            .rows()
            .filter_map(|(term, series)| {
                let w = windows(series);
                (w.early >= t.min_early && w.recent <= t.max_recent).then(|| DecliningTerm {
                    term: term.to_string(),
                    early_freq: w.early,
                    recent_freq: w.recent,
                    decline: w.early as i64 - w.recent as i64,
                })
            })
            .collect();

        out.sort_by(|a, b| b.decline.cmp(&a.decline).then_with(|| a.term.cmp(&b.term)));
        out
    }

    /// Consistently frequent; sorted by mean descending
    pub fn stable(&self, matrix: &TrendMatrix) -> Vec<StableTerm> {
        if matrix.periods().len() < MIN_PERIODS {
            return Vec::new();
        }

        let mut out: Vec<StableTerm> = matrix
            .rows()
            .filter_map(|(term, series)| {
                let values: Vec<f64> = series.iter().map(|&c| c as f64).collect();
                let mean = values.iter().mean();
                if mean < self.thresholds.min_avg {
                    return None;
                }
                let std = values.iter().std_dev();
                Some(StableTerm {
                    term: term.to_string(),
                    avg_freq: mean,
                    cv: std / (mean + CV_EPSILON),
                })
            })
            .collect();

        out.sort_by(|a, b| {
            b.avg_freq
                .partial_cmp(&a.avg_freq)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.term.cmp(&b.term))
        });
        out
    }
}

fn windows(series: &[u64]) -> Windows {
    let n = series.len();
    Windows {
        early: series[..EARLY_WINDOW.min(n)].iter().sum(),
        recent: series[n.saturating_sub(RECENT_WINDOW)..].iter().sum(),
    }
}
