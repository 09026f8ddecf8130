//! Bulk load of flat harvester rows into the base tables
//!
//! The harvester emits one row per publication with multi-valued fields joined
//! by `" | "`. This is the only place those fields are split; everything
//! downstream works on the ordered sequences in [`PublicationRecord`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Transaction};
use serde::{Deserialize, Serialize};

use super::{Store, StoreError};
use crate::error::Result;
use crate::models::{normalize_surface, PublicationRecord};

/// A flat harvester row keyed by column name
pub type FlatRow = HashMap<String, String>;

/// Outcome of a load run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub records_loaded: usize,
    pub records_skipped: usize,
    pub keyword_links: usize,
    pub geo_links: usize,
    pub author_links: usize,
    pub funding_links: usize,
    pub tag_links: usize,
}

/// Read flat rows from a CSV, JSON Lines or JSON array file
pub fn read_flat_records(path: &Path) -> Result<Vec<FlatRow>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => read_csv(path),
        "jsonl" | "ndjson" => read_json_lines(path),
        "json" => read_json_array(path),
        _ => Err(StoreError::UnsupportedFormat {
            path: path.display().to_string(),
        }
        .into()),
    }
}

fn read_csv(path: &Path) -> Result<Vec<FlatRow>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn read_json_lines(path: &Path) -> Result<Vec<FlatRow>> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(&line)?;
        rows.push(json_to_row(value, idx + 1)?);
    }
    Ok(rows)
}

fn read_json_array(path: &Path) -> Result<Vec<FlatRow>> {
    let reader = BufReader::new(File::open(path)?);
    let values: Vec<serde_json::Value> = serde_json::from_reader(reader)?;
    values
        .into_iter()
        .enumerate()
        .map(|(idx, v)| json_to_row(v, idx + 1))
        .collect()
}

fn json_to_row(value: serde_json::Value, line: usize) -> Result<FlatRow> {
    use serde_json::Value;

    let Value::Object(map) = value else {
        return Err(StoreError::InvalidRecord {
            line,
            message: "expected a JSON object".to_string(),
        }
        .into());
    };

    let mut row = FlatRow::with_capacity(map.len());
    for (key, value) in map {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s,
            // Already-split lists are re-joined so there is a single split point
            Value::Array(items) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect::<Vec<_>>()
                .join(" | "),
            other => other.to_string(),
        };
        row.insert(key, text);
    }
    Ok(row)
}

/// Read `path` and load every row into `store`
pub fn load_file(store: &mut Store, path: &Path) -> Result<LoadReport> {
    let rows = read_flat_records(path)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "Read flat records");

    let mut skipped = 0;
    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        match PublicationRecord::from_flat(row) {
            Some(record) => records.push(record),
            None => {
                skipped += 1;
                tracing::warn!("Skipping row without brief_id");
            }
        }
    }

    let mut report = load_records(store, &records)?;
    report.records_skipped += skipped;
    Ok(report)
}

/// Load already-split records in a single transaction
///
/// A record whose `brief_id` already exists replaces the stored one, and its
/// previous associations are dropped first so a re-harvest is last-write-wins.
pub fn load_records(store: &mut Store, records: &[PublicationRecord]) -> Result<LoadReport> {
    let harvested_at = Utc::now().to_rfc3339();
    let tx = store.transaction()?;
    let mut report = LoadReport::default();

    for record in records {
        if record.brief_id.is_empty() {
            report.records_skipped += 1;
            continue;
        }

        clear_associations(&tx, &record.brief_id)?;
        upsert_brief(&tx, record, &harvested_at)?;

        for keyword in &record.keywords {
            let id = dictionary_id(
                &tx,
                "INSERT OR IGNORE INTO keywords (keyword_raw, keyword_norm) VALUES (?1, ?2)",
                "SELECT keyword_id FROM keywords WHERE keyword_raw = ?1",
                None,
                keyword,
            )?;
            report.keyword_links += tx.execute(
                "INSERT OR IGNORE INTO brief_keywords (brief_id, keyword_id) VALUES (?1, ?2)",
                params![record.brief_id, id],
            )?;
        }

        for (geo_type, value) in &record.geo {
            let id = dictionary_id(
                &tx,
                "INSERT OR IGNORE INTO geo (geo_type, value_raw, value_norm) VALUES (?3, ?1, ?2)",
                "SELECT geo_id FROM geo WHERE value_raw = ?1 AND geo_type = ?2",
                Some(geo_type.as_str()),
                value,
            )?;
            report.geo_links += tx.execute(
                "INSERT OR IGNORE INTO brief_geo (brief_id, geo_id) VALUES (?1, ?2)",
                params![record.brief_id, id],
            )?;
        }

        for (order, author) in record.authors.iter().enumerate() {
            let id = dictionary_id(
                &tx,
                "INSERT OR IGNORE INTO authors (author_name_raw, author_name_norm) VALUES (?1, ?2)",
                "SELECT author_id FROM authors WHERE author_name_raw = ?1",
                None,
                author,
            )?;
            report.author_links += tx.execute(
                "INSERT OR IGNORE INTO brief_authors (brief_id, author_id, author_order)
                 VALUES (?1, ?2, ?3)",
                params![record.brief_id, id, order as i64],
            )?;
        }

        for (entity_type, value) in &record.funding {
            let id = dictionary_id(
                &tx,
                "INSERT OR IGNORE INTO funding_entities (entity_type, entity_raw, entity_norm)
                 VALUES (?3, ?1, ?2)",
                "SELECT entity_id FROM funding_entities WHERE entity_raw = ?1 AND entity_type = ?2",
                Some(entity_type.as_str()),
                value,
            )?;
            report.funding_links += tx.execute(
                "INSERT OR IGNORE INTO brief_funding (brief_id, entity_id) VALUES (?1, ?2)",
                params![record.brief_id, id],
            )?;
        }

        for (tag_type, value) in &record.tags {
            report.tag_links += tx.execute(
                "INSERT OR IGNORE INTO brief_tags (brief_id, tag_type, tag_value) VALUES (?1, ?2, ?3)",
                params![record.brief_id, tag_type.as_str(), value],
            )?;
        }

        report.records_loaded += 1;
    }

    tx.commit()?;

    tracing::info!(
        loaded = report.records_loaded,
        skipped = report.records_skipped,
        keyword_links = report.keyword_links,
        geo_links = report.geo_links,
        funding_links = report.funding_links,
        tag_links = report.tag_links,
        "Load completed"
    );
    Ok(report)
}

fn clear_associations(tx: &Transaction<'_>, brief_id: &str) -> Result<()> {
    for table in [
        "brief_keywords",
        "brief_geo",
        "brief_authors",
        "brief_funding",
        "brief_tags",
    ] {
        tx.execute(
            &format!("DELETE FROM {table} WHERE brief_id = ?1"),
            params![brief_id],
        )?;
    }
    Ok(())
}

fn upsert_brief(tx: &Transaction<'_>, record: &PublicationRecord, harvested_at: &str) -> Result<()> {
    let last_harvested = if record.last_harvested_at.is_empty() {
        harvested_at
    } else {
        record.last_harvested_at.as_str()
    };

    tx.execute(
        r#"
        INSERT INTO briefs
            (brief_id, uuid, uri, title, issued_date, year, quarter, year_quarter,
             type_raw, abstract, language, publisher, series_raw, access_rights,
             license, cg_number, cg_review_status, last_harvested_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        ON CONFLICT(brief_id) DO UPDATE SET
            uuid = excluded.uuid,
            uri = excluded.uri,
            title = excluded.title,
            issued_date = excluded.issued_date,
            year = excluded.year,
            quarter = excluded.quarter,
            year_quarter = excluded.year_quarter,
            type_raw = excluded.type_raw,
            abstract = excluded.abstract,
            language = excluded.language,
            publisher = excluded.publisher,
            series_raw = excluded.series_raw,
            access_rights = excluded.access_rights,
            license = excluded.license,
            cg_number = excluded.cg_number,
            cg_review_status = excluded.cg_review_status,
            last_harvested_at = excluded.last_harvested_at
        "#,
        params![
            record.brief_id,
            record.uuid,
            record.uri,
            record.title,
            record.issued_date,
            record.year,
            record.quarter,
            record.period.map(|p| p.to_string()),
            record.type_raw,
            record.abstract_text,
            record.language,
            record.publisher,
            record.series,
            record.access_rights,
            record.license,
            record.cg_number,
            record.review_status,
            last_harvested,
        ],
    )?;
    Ok(())
}

// Insert-or-get on a dictionary keyed by raw form (plus type when given).
// Insert SQL binds ?1 raw, ?2 norm, ?3 type; select binds ?1 raw, ?2 type.
fn dictionary_id(
    tx: &Transaction<'_>,
    insert_sql: &str,
    select_sql: &str,
    term_type: Option<&str>,
    raw: &str,
) -> Result<i64> {
    let norm = normalize_surface(raw);
    let id = match term_type {
        Some(t) => {
            tx.execute(insert_sql, params![raw, norm, t])?;
            tx.query_row(select_sql, params![raw, t], |row| row.get(0))?
        }
        None => {
            tx.execute(insert_sql, params![raw, norm])?;
            tx.query_row(select_sql, params![raw], |row| row.get(0))?
        }
    };
    Ok(id)
}
