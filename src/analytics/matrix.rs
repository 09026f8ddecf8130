//! Keyword × period frequency matrix
//!
//! Rows are normalized keyword forms, columns are periods, and each cell holds
//! the number of distinct publications in that period carrying the keyword.
//! The matrix is dense: combinations never observed hold 0.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::params;
use serde::Serialize;

use super::AnalyticsError;
use crate::error::Result;
use crate::models::Period;
use crate::storage::Store;

/// Dense term × period count matrix
///
/// Terms and periods are both kept sorted; sorted periods are chronological.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrendMatrix {
    terms: Vec<String>,
    periods: Vec<Period>,
    counts: Vec<Vec<u64>>,
}

impl TrendMatrix {
    /// Build the matrix from the store
    ///
    /// Publications without a resolved period are left out entirely.
    pub fn build(store: &Store) -> Result<Self> {
        store.require_tables(&["briefs", "keywords", "brief_keywords"])?;

        let mut stmt = store.conn().prepare(
            "SELECT b.year_quarter, k.keyword_norm, COUNT(DISTINCT b.brief_id)
             FROM brief_keywords bk
             JOIN briefs b   ON bk.brief_id = b.brief_id
             JOIN keywords k ON bk.keyword_id = k.keyword_id
             WHERE b.year_quarter IS NOT NULL AND b.year_quarter != ''
             GROUP BY b.year_quarter, k.keyword_norm",
        )?;

        let rows = stmt
            .query_map(params![], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut observations = Vec::with_capacity(rows.len());
        for (period, term, count) in rows {
            match period.parse::<Period>() {
                Ok(p) => observations.push((term, p, count as u64)),
                Err(e) => tracing::warn!(period = %period, error = %e, "Ignoring unparseable period"),
            }
        }

        let matrix = Self::from_observations(observations);
        tracing::info!(
            terms = matrix.terms.len(),
            periods = matrix.periods.len(),
            "Built keyword × period matrix"
        );
        Ok(matrix)
    }

    /// Build a dense matrix from sparse `(term, period, count)` observations
    ///
    /// Repeated observations of the same cell are summed.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (String, Period, u64)>,
    {
        let mut cells: BTreeMap<String, BTreeMap<Period, u64>> = BTreeMap::new();
        let mut periods: BTreeSet<Period> = BTreeSet::new();

        for (term, period, count) in observations {
            periods.insert(period);
            *cells.entry(term).or_default().entry(period).or_insert(0) += count;
        }

        let periods: Vec<Period> = periods.into_iter().collect();
        let mut terms = Vec::with_capacity(cells.len());
        let mut counts = Vec::with_capacity(cells.len());

        for (term, by_period) in cells {
            counts.push(
                periods
                    .iter()
                    .map(|p| by_period.get(p).copied().unwrap_or(0))
                    .collect(),
            );
            terms.push(term);
        }

        Self {
            terms,
            periods,
            counts,
        }
    }

    /// Build from explicit rows over explicit periods
    ///
    /// Periods are sorted and the cells reordered to match.
    pub fn from_rows<I>(periods: Vec<Period>, rows: I) -> std::result::Result<Self, AnalyticsError>
    where
        I: IntoIterator<Item = (String, Vec<u64>)>,
    {
        let mut order: Vec<usize> = (0..periods.len()).collect();
        order.sort_by_key(|&i| periods[i]);
        let sorted_periods: Vec<Period> = order.iter().map(|&i| periods[i]).collect();

        let mut by_term: BTreeMap<String, Vec<u64>> = BTreeMap::new();
        for (term, cells) in rows {
            if cells.len() != periods.len() {
                return Err(AnalyticsError::DimensionMismatch {
                    term,
                    expected: periods.len(),
                    got: cells.len(),
                });
            }
            let reordered = order.iter().map(|&i| cells[i]).collect();
            if by_term.insert(term.clone(), reordered).is_some() {
                return Err(AnalyticsError::DuplicateTerm(term));
            }
        }

        let (terms, counts) = by_term.into_iter().unzip();
        Ok(Self {
            terms,
            periods: sorted_periods,
            counts,
        })
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// `(terms, periods)`
    pub fn dims(&self) -> (usize, usize) {
        (self.terms.len(), self.periods.len())
    }

    /// Frequency series of one term, in period order
    pub fn row(&self, term: &str) -> Option<&[u64]> {
        self.terms
            .binary_search_by(|t| t.as_str().cmp(term))
            .ok()
            .map(|i| self.counts[i].as_slice())
    }

    /// Cell value; 0 for any term or period not in the matrix
    pub fn get(&self, term: &str, period: Period) -> u64 {
        let Ok(col) = self.periods.binary_search(&period) else {
            return 0;
        };
        self.row(term).map(|r| r[col]).unwrap_or(0)
    }

    /// `(term, series)` pairs in term order
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[u64])> {
        self.terms
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter().map(Vec::as_slice))
    }

    /// Latest period present
    pub fn last_period(&self) -> Option<Period> {
        self.periods.last().copied()
    }

    /// Total keyword mentions per period
    pub fn period_totals(&self) -> Vec<(Period, u64)> {
        self.periods
            .iter()
            .enumerate()
            .map(|(col, p)| (*p, self.counts.iter().map(|r| r[col]).sum()))
            .collect()
    }

    /// Period with the most keyword mentions (earliest on ties)
    pub fn busiest_period(&self) -> Option<(Period, u64)> {
        self.period_totals()
            .into_iter()
            .reduce(|best, cur| if cur.1 > best.1 { cur } else { best })
    }

    /// Period with the fewest keyword mentions (earliest on ties)
    pub fn quietest_period(&self) -> Option<(Period, u64)> {
        self.period_totals()
            .into_iter()
            .reduce(|best, cur| if cur.1 < best.1 { cur } else { best })
    }
}
