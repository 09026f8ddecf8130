//! Applies canonical mappings to the store
//!
//! Each call to [`Canonicalizer::apply`] runs inside one SQLite transaction
//! covering a whole attribute class: either every entry of the table is
//! applied or, on error, none is. Entries within a class are independent;
//! the table is required to be transitively reduced so their order does not
//! matter.

use rusqlite::{params, OptionalExtension, Transaction};
use serde::Serialize;

use super::{AttributeClass, CanonicalMap, MappingSet};
use crate::error::Result;
use crate::models::normalize_surface;
use crate::storage::Store;

/// Result of applying one variant→canonical entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryOutcome {
    pub variant: String,
    pub canonical: String,
    /// Association rows that pointed at the variant and were rewritten
    pub merged: usize,
}

/// Result of applying one mapping table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub class: AttributeClass,
    /// Total association rows rewritten
    pub merged: usize,
    /// Entries whose variant was present
    pub applied: Vec<EntryOutcome>,
    /// Entries whose variant never occurred in this store
    pub skipped: usize,
}

/// Result of applying a whole [`MappingSet`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub classes: Vec<MergeReport>,
}

impl NormalizationReport {
    pub fn total_merged(&self) -> usize {
        self.classes.iter().map(|c| c.merged).sum()
    }
}

/// Dictionary table layout; every dictionary follows the same shape
struct Dictionary {
    table: &'static str,
    id: &'static str,
    raw: &'static str,
    norm: &'static str,
    kind: Option<(&'static str, &'static str)>,
    link: &'static str,
}

impl Dictionary {
    fn for_class(class: AttributeClass) -> Option<Self> {
        match class {
            AttributeClass::Tag(_) => None,
            AttributeClass::Keyword => Some(Self {
                table: "keywords",
                id: "keyword_id",
                raw: "keyword_raw",
                norm: "keyword_norm",
                kind: None,
                link: "brief_keywords",
            }),
            AttributeClass::Geo(t) => Some(Self {
                table: "geo",
                id: "geo_id",
                raw: "value_raw",
                norm: "value_norm",
                kind: Some(("geo_type", t.as_str())),
                link: "brief_geo",
            }),
            AttributeClass::Funding(t) => Some(Self {
                table: "funding_entities",
                id: "entity_id",
                raw: "entity_raw",
                norm: "entity_norm",
                kind: Some(("entity_type", t.as_str())),
                link: "brief_funding",
            }),
        }
    }

    fn type_filter(&self) -> String {
        match self.kind {
            Some((col, value)) => format!(" AND {col} = '{value}'"),
            None => String::new(),
        }
    }

    /// Ids of every row with the given normalized form, lowest first
    fn ids_by_norm(&self, tx: &Transaction<'_>, norm: &str) -> Result<Vec<i64>> {
        let sql = format!(
            "SELECT {id} FROM {table} WHERE {norm_col} = ?1{filter} ORDER BY {id}",
            id = self.id,
            table = self.table,
            norm_col = self.norm,
            filter = self.type_filter(),
        );
        let mut stmt = tx.prepare(&sql)?;
        let ids = stmt
            .query_map(params![norm], |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    fn id_by_raw(&self, tx: &Transaction<'_>, raw: &str) -> Result<Option<i64>> {
        let id = tx
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE {} = ?1{}",
                    self.id,
                    self.table,
                    self.raw,
                    self.type_filter()
                ),
                params![raw],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Row for `canonical`: exact raw form first, then any row sharing its
    /// normalized form unless that form is the variant's own
    fn find_or_create(&self, tx: &Transaction<'_>, canonical: &str, variant_norm: &str) -> Result<i64> {
        if let Some(id) = self.id_by_raw(tx, canonical)? {
            return Ok(id);
        }

        let norm = normalize_surface(canonical);
        if norm != variant_norm {
            if let Some(&id) = self.ids_by_norm(tx, &norm)?.first() {
                return Ok(id);
            }
        }

        match self.kind {
            Some((col, value)) => {
                tx.execute(
                    &format!(
                        "INSERT OR IGNORE INTO {} ({col}, {}, {}) VALUES (?1, ?2, ?3)",
                        self.table, self.raw, self.norm
                    ),
                    params![value, canonical, norm],
                )?;
            }
            None => {
                tx.execute(
                    &format!(
                        "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
                        self.table, self.raw, self.norm
                    ),
                    params![canonical, norm],
                )?;
            }
        }

        self.id_by_raw(tx, canonical)?
            .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
    }

    /// Move every association of `from` onto `to`, then retire `from`
    fn merge(&self, tx: &Transaction<'_>, from: i64, to: i64) -> Result<usize> {
        let moved = tx.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE {} = ?1", self.link, self.id),
            params![from],
            |row| row.get::<_, i64>(0),
        )? as usize;

        tx.execute(
            &format!(
                "INSERT OR IGNORE INTO {link} (brief_id, {id})
                 SELECT brief_id, ?1 FROM {link} WHERE {id} = ?2",
                link = self.link,
                id = self.id,
            ),
            params![to, from],
        )?;
        tx.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", self.link, self.id),
            params![from],
        )?;
        tx.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", self.table, self.id),
            params![from],
        )?;

        Ok(moved)
    }
}

/// Rewrites variant references to their canonical forms
#[derive(Debug, Default, Clone, Copy)]
pub struct Canonicalizer;

impl Canonicalizer {
    pub fn new() -> Self {
        Self
    }

    /// Apply one mapping table atomically
    pub fn apply(&self, store: &mut Store, map: &CanonicalMap) -> Result<MergeReport> {
        let class = map.class();
        let required = match Dictionary::for_class(class) {
            Some(dict) => vec![dict.table, dict.link],
            None => vec!["brief_tags"],
        };
        store.require_tables(&required)?;

        let tx = store.transaction()?;
        let mut report = MergeReport {
            class,
            merged: 0,
            applied: Vec::new(),
            skipped: 0,
        };

        for (variant, canonical) in map.iter() {
            let merged = match (class, Dictionary::for_class(class)) {
                (AttributeClass::Tag(tag_type), _) => {
                    apply_tag(&tx, tag_type.as_str(), variant, canonical)?
                }
                (_, Some(dict)) => apply_dictionary(&tx, &dict, variant, canonical)?,
                (_, None) => None,
            };

            match merged {
                Some(merged) => {
                    tracing::info!(
                        class = %class,
                        variant,
                        canonical,
                        merged,
                        "Merged variant into canonical form"
                    );
                    report.merged += merged;
                    report.applied.push(EntryOutcome {
                        variant: variant.to_string(),
                        canonical: canonical.to_string(),
                        merged,
                    });
                }
                None => {
                    tracing::debug!(class = %class, variant, "Variant not present, skipping");
                    report.skipped += 1;
                }
            }
        }

        tx.commit()?;

        tracing::info!(
            class = %class,
            merged = report.merged,
            applied = report.applied.len(),
            skipped = report.skipped,
            "Mapping applied"
        );
        Ok(report)
    }

    /// Apply every table in the set, each in its own transaction
    pub fn apply_all(&self, store: &mut Store, mappings: &MappingSet) -> Result<NormalizationReport> {
        let mut report = NormalizationReport::default();
        for map in mappings.iter() {
            report.classes.push(self.apply(store, map)?);
        }
        Ok(report)
    }
}

// Returns None when the variant does not occur for this tag type
fn apply_tag(
    tx: &Transaction<'_>,
    tag_type: &str,
    variant: &str,
    canonical: &str,
) -> Result<Option<usize>> {
    let n: i64 = tx.query_row(
        "SELECT COUNT(*) FROM brief_tags WHERE tag_type = ?1 AND tag_value = ?2",
        params![tag_type, variant],
        |row| row.get(0),
    )?;
    if n == 0 {
        return Ok(None);
    }

    tx.execute(
        "INSERT OR IGNORE INTO brief_tags (brief_id, tag_type, tag_value)
         SELECT brief_id, tag_type, ?3 FROM brief_tags
         WHERE tag_type = ?1 AND tag_value = ?2",
        params![tag_type, variant, canonical],
    )?;
    tx.execute(
        "DELETE FROM brief_tags WHERE tag_type = ?1 AND tag_value = ?2",
        params![tag_type, variant],
    )?;

    Ok(Some(n as usize))
}

// Returns None when no dictionary row carries the variant's normalized form
fn apply_dictionary(
    tx: &Transaction<'_>,
    dict: &Dictionary,
    variant: &str,
    canonical: &str,
) -> Result<Option<usize>> {
    let variant_norm = normalize_surface(variant);
    let variant_ids = dict.ids_by_norm(tx, &variant_norm)?;
    if variant_ids.is_empty() {
        return Ok(None);
    }

    let canonical_id = dict.find_or_create(tx, canonical, &variant_norm)?;
    let retired: Vec<i64> = variant_ids
        .into_iter()
        .filter(|id| *id != canonical_id)
        .collect();
    if retired.is_empty() {
        return Ok(None);
    }

    let mut merged = 0;
    for id in retired {
        merged += dict.merge(tx, id, canonical_id)?;
    }
    Ok(Some(merged))
}
