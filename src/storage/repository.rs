//! Read-only summary queries over the publication store
//!
//! These back the `explore` command and the post-normalization report. None of
//! them mutate the store.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::{Store, StoreError, REQUIRED_TABLES};
use crate::error::Result;
use crate::models::{FundingType, GeoType, TagType};

/// A term and the number of publications using it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: u64,
}

/// Row counts for every table in the store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSummary {
    pub tables: Vec<(String, u64)>,
}

/// Per-year metadata completeness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessRow {
    pub year: Option<i32>,
    pub total: u64,
    pub with_country: u64,
    pub with_funding: u64,
    pub with_keywords: u64,
}

fn term_counts(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<TermCount>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(TermCount {
                term: row.get(0)?,
                count: row.get::<_, i64>(1)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

impl Store {
    /// Row counts for all tables
    pub fn summary(&self) -> Result<StoreSummary> {
        self.require_tables(REQUIRED_TABLES)?;
        let tables = REQUIRED_TABLES
            .iter()
            .map(|t| Ok(((*t).to_string(), self.count_rows(t)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(StoreSummary { tables })
    }

    /// Publications per period, chronologically
    pub fn briefs_per_period(&self) -> Result<Vec<TermCount>> {
        term_counts(
            self.conn(),
            "SELECT year_quarter, COUNT(*) FROM briefs
             WHERE year_quarter IS NOT NULL AND year_quarter != ''
             GROUP BY year_quarter ORDER BY year_quarter",
            [],
        )
    }

    /// Most used normalized keywords
    pub fn top_keywords(&self, limit: usize) -> Result<Vec<TermCount>> {
        term_counts(
            self.conn(),
            "SELECT k.keyword_norm, COUNT(DISTINCT bk.brief_id) AS n
             FROM brief_keywords bk
             JOIN keywords k ON bk.keyword_id = k.keyword_id
             GROUP BY k.keyword_norm
             ORDER BY n DESC, k.keyword_norm
             LIMIT ?1",
            params![limit as i64],
        )
    }

    /// Most used geographic terms of one type
    pub fn top_geo(&self, geo_type: GeoType, limit: usize) -> Result<Vec<TermCount>> {
        term_counts(
            self.conn(),
            "SELECT g.value_norm, COUNT(DISTINCT bg.brief_id) AS n
             FROM brief_geo bg
             JOIN geo g ON bg.geo_id = g.geo_id
             WHERE g.geo_type = ?1
             GROUP BY g.value_norm
             ORDER BY n DESC, g.value_norm
             LIMIT ?2",
            params![geo_type.as_str(), limit as i64],
        )
    }

    /// Most used funding entities of one type, by raw form
    pub fn top_funding(&self, entity_type: FundingType, limit: usize) -> Result<Vec<TermCount>> {
        term_counts(
            self.conn(),
            "SELECT fe.entity_raw, COUNT(DISTINCT bf.brief_id) AS n
             FROM brief_funding bf
             JOIN funding_entities fe ON bf.entity_id = fe.entity_id
             WHERE fe.entity_type = ?1
             GROUP BY fe.entity_raw
             ORDER BY n DESC, fe.entity_raw
             LIMIT ?2",
            params![entity_type.as_str(), limit as i64],
        )
    }

    /// Publication counts for every value of a flat tag type
    pub fn tag_counts(&self, tag_type: TagType) -> Result<Vec<TermCount>> {
        term_counts(
            self.conn(),
            "SELECT tag_value, COUNT(*) AS n
             FROM brief_tags
             WHERE tag_type = ?1
             GROUP BY tag_value
             ORDER BY n DESC, tag_value",
            params![tag_type.as_str()],
        )
    }

    /// Most frequent series labels
    pub fn top_series(&self, limit: usize) -> Result<Vec<TermCount>> {
        term_counts(
            self.conn(),
            "SELECT series_raw, COUNT(*) AS n
             FROM briefs
             WHERE series_raw IS NOT NULL AND series_raw != ''
             GROUP BY series_raw
             ORDER BY n DESC, series_raw
             LIMIT ?1",
            params![limit as i64],
        )
    }

    /// Per-year share of publications carrying country, funding and keyword metadata
    pub fn completeness_by_year(&self) -> Result<Vec<CompletenessRow>> {
        let mut stmt = self.conn().prepare(
            "SELECT b.year,
                    COUNT(DISTINCT b.brief_id),
                    COUNT(DISTINCT bg.brief_id),
                    COUNT(DISTINCT bf.brief_id),
                    COUNT(DISTINCT bk.brief_id)
             FROM briefs b
             LEFT JOIN (SELECT bg.brief_id FROM brief_geo bg
                        JOIN geo g ON g.geo_id = bg.geo_id
                        WHERE g.geo_type = 'country') bg ON b.brief_id = bg.brief_id
             LEFT JOIN brief_funding bf ON b.brief_id = bf.brief_id
             LEFT JOIN brief_keywords bk ON b.brief_id = bk.brief_id
             GROUP BY b.year
             ORDER BY b.year",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(CompletenessRow {
                    year: row.get(0)?,
                    total: row.get::<_, i64>(1)? as u64,
                    with_country: row.get::<_, i64>(2)? as u64,
                    with_funding: row.get::<_, i64>(3)? as u64,
                    with_keywords: row.get::<_, i64>(4)? as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Ordered author names of one publication
    pub fn authors_of(&self, brief_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(
            "SELECT a.author_name_raw FROM brief_authors ba
             JOIN authors a ON a.author_id = ba.author_id
             WHERE ba.brief_id = ?1
             ORDER BY ba.author_order",
        )?;
        let names = stmt
            .query_map(params![brief_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Check that every association row points at an existing dictionary row
    ///
    /// Duplicate links are ruled out by the composite primary keys; a dangling
    /// link would mean a merge retired a dictionary row it had not emptied.
    pub fn verify_integrity(&self) -> Result<()> {
        const LINKS: &[(&str, &str, &str)] = &[
            ("brief_keywords", "keywords", "keyword_id"),
            ("brief_geo", "geo", "geo_id"),
            ("brief_authors", "authors", "author_id"),
            ("brief_funding", "funding_entities", "entity_id"),
        ];

        for (link, dict, id) in LINKS {
            let dangling: i64 = self.conn().query_row(
                &format!(
                    "SELECT COUNT(*) FROM {link} l
                     LEFT JOIN {dict} d ON d.{id} = l.{id}
                     WHERE d.{id} IS NULL"
                ),
                [],
                |row| row.get(0),
            )?;
            if dangling > 0 {
                return Err(StoreError::Integrity {
                    table: (*link).to_string(),
                    detail: format!("{dangling} rows reference a missing {dict} entry"),
                }
                .into());
            }
        }
        Ok(())
    }
}
