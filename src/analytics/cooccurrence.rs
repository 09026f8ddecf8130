//! Keyword co-occurrence within a single period
//!
//! A pair counts once per publication that carries both keywords, no matter
//! how many raw surface forms of each it lists.

use std::collections::{BTreeSet, HashMap};

use rusqlite::params;
use serde::Serialize;

use crate::error::Result;
use crate::models::Period;
use crate::storage::Store;

pub const DEFAULT_MIN_FREQ: u64 = 3;

/// Unordered keyword pair with `term_a < term_b`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CooccurrencePair {
    pub term_a: String,
    pub term_b: String,
    pub count: u64,
}

#[derive(Debug, Clone)]
pub struct CooccurrenceAnalyzer {
    min_freq: u64,
}

impl Default for CooccurrenceAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_FREQ)
    }
}

impl CooccurrenceAnalyzer {
    pub fn new(min_freq: u64) -> Self {
        Self { min_freq }
    }

    pub fn min_freq(&self) -> u64 {
        self.min_freq
    }

    /// Pairs for one period, read from the store
    ///
    /// A period with no publications yields an empty table.
    pub fn analyze(&self, store: &Store, period: Period) -> Result<Vec<CooccurrencePair>> {
        store.require_tables(&["briefs", "keywords", "brief_keywords"])?;

        let mut stmt = store.conn().prepare(
            "SELECT bk.brief_id, k.keyword_norm
             FROM brief_keywords bk
             JOIN briefs b   ON bk.brief_id = b.brief_id
             JOIN keywords k ON bk.keyword_id = k.keyword_id
             WHERE b.year_quarter = ?1",
        )?;

        let rows = stmt
            .query_map(params![period.to_string()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut docs: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (brief_id, term) in rows {
            docs.entry(brief_id).or_default().insert(term);
        }

        let publications = docs.len();
        let pairs = self.count_pairs(docs.into_values());

        tracing::info!(
            period = %period,
            publications,
            pairs = pairs.len(),
            min_freq = self.min_freq,
            "Computed keyword co-occurrence"
        );
        Ok(pairs)
    }

    /// Count pairs over per-publication term sets
    ///
    /// Result is sorted by count descending, then by `(term_a, term_b)`.
    pub fn count_pairs<I>(&self, documents: I) -> Vec<CooccurrencePair>
    where
        I: IntoIterator<Item = BTreeSet<String>>,
    {
        let mut counts: HashMap<(String, String), u64> = HashMap::new();

        for terms in documents {
            let terms: Vec<&String> = terms.iter().collect();
            for (i, a) in terms.iter().enumerate() {
                for b in &terms[i + 1..] {
                    *counts.entry(((*a).clone(), (*b).clone())).or_insert(0) += 1;
                }
            }
        }

        let mut pairs: Vec<CooccurrencePair> = counts
            .into_iter()
            .filter(|(_, count)| *count >= self.min_freq)
            .map(|((term_a, term_b), count)| CooccurrencePair {
                term_a,
                term_b,
                count,
            })
            .collect();

        pairs.sort_by(|x, y| {
            y.count
                .cmp(&x.count)
                .then_with(|| x.term_a.cmp(&y.term_a))
                .then_with(|| x.term_b.cmp(&y.term_b))
        });
        pairs
    }
}
