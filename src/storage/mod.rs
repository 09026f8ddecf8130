//! Relational store for publication metadata
//!
//! The store is a single SQLite database holding one row per publication in
//! `briefs`, three typed term dictionaries (`keywords`, `geo`,
//! `funding_entities`), an `authors` dictionary, their association tables, and
//! the flat `brief_tags` table.
//!
//! Composite primary keys on every association table make a duplicate
//! `(publication, term)` pair structurally impossible; writers use
//! `INSERT OR IGNORE` so merges never trip over them.

pub mod loader;
pub mod repository;

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Transaction};
use thiserror::Error;

use crate::error::{BriefscopeErrorTrait, ErrorCategory, Result};

pub use loader::{load_file, load_records, read_flat_records, LoadReport};
pub use repository::{CompletenessRow, StoreSummary, TermCount};

/// Errors raised by the relational store
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required table is absent, meaning the store was never loaded
    #[error("required table '{table}' is missing; load the store first")]
    MissingTable { table: String },

    /// The input file extension is not one the loader understands
    #[error("unsupported input format: {path}")]
    UnsupportedFormat { path: String },

    /// A record in the input file could not be decoded
    #[error("invalid input record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    /// The database file does not exist and the stage does not create one
    #[error("database '{path}' does not exist; load the store first")]
    MissingDatabase { path: String },

    /// An association row points at a dictionary entry that no longer exists
    #[error("integrity violation in {table}: {detail}")]
    Integrity { table: String, detail: String },
}

impl BriefscopeErrorTrait for StoreError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingTable { .. } | Self::MissingDatabase { .. } => ErrorCategory::Config,
            Self::UnsupportedFormat { .. } | Self::InvalidRecord { .. } => ErrorCategory::Input,
            Self::Integrity { .. } => ErrorCategory::Storage,
        }
    }
}

/// Every table the core stages rely on
pub const REQUIRED_TABLES: &[&str] = &[
    "briefs",
    "keywords",
    "brief_keywords",
    "geo",
    "brief_geo",
    "authors",
    "brief_authors",
    "funding_entities",
    "brief_funding",
    "brief_tags",
];

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS briefs (
        brief_id            TEXT PRIMARY KEY,
        uuid                TEXT,
        uri                 TEXT,
        title               TEXT,
        issued_date         TEXT,
        year                INTEGER,
        quarter             INTEGER,
        year_quarter        TEXT,
        type_raw            TEXT,
        abstract            TEXT,
        language            TEXT,
        publisher           TEXT,
        series_raw          TEXT,
        access_rights       TEXT,
        license             TEXT,
        cg_number           TEXT,
        cg_review_status    TEXT,
        last_harvested_at   TEXT
    );

    CREATE TABLE IF NOT EXISTS keywords (
        keyword_id   INTEGER PRIMARY KEY AUTOINCREMENT,
        keyword_raw  TEXT NOT NULL UNIQUE,
        keyword_norm TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS brief_keywords (
        brief_id   TEXT NOT NULL REFERENCES briefs(brief_id),
        keyword_id INTEGER NOT NULL REFERENCES keywords(keyword_id),
        PRIMARY KEY (brief_id, keyword_id)
    );

    CREATE TABLE IF NOT EXISTS geo (
        geo_id     INTEGER PRIMARY KEY AUTOINCREMENT,
        geo_type   TEXT NOT NULL,
        value_raw  TEXT NOT NULL,
        value_norm TEXT NOT NULL,
        UNIQUE (geo_type, value_raw)
    );

    CREATE TABLE IF NOT EXISTS brief_geo (
        brief_id TEXT NOT NULL REFERENCES briefs(brief_id),
        geo_id   INTEGER NOT NULL REFERENCES geo(geo_id),
        PRIMARY KEY (brief_id, geo_id)
    );

    CREATE TABLE IF NOT EXISTS authors (
        author_id        INTEGER PRIMARY KEY AUTOINCREMENT,
        author_name_raw  TEXT NOT NULL UNIQUE,
        author_name_norm TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS brief_authors (
        brief_id     TEXT NOT NULL REFERENCES briefs(brief_id),
        author_id    INTEGER NOT NULL REFERENCES authors(author_id),
        author_order INTEGER NOT NULL,
        PRIMARY KEY (brief_id, author_id)
    );

    CREATE TABLE IF NOT EXISTS funding_entities (
        entity_id   INTEGER PRIMARY KEY AUTOINCREMENT,
        entity_type TEXT NOT NULL,
        entity_raw  TEXT NOT NULL,
        entity_norm TEXT NOT NULL,
        UNIQUE (entity_type, entity_raw)
    );

    CREATE TABLE IF NOT EXISTS brief_funding (
        brief_id  TEXT NOT NULL REFERENCES briefs(brief_id),
        entity_id INTEGER NOT NULL REFERENCES funding_entities(entity_id),
        PRIMARY KEY (brief_id, entity_id)
    );

    CREATE TABLE IF NOT EXISTS brief_tags (
        brief_id  TEXT NOT NULL REFERENCES briefs(brief_id),
        tag_type  TEXT NOT NULL,
        tag_value TEXT NOT NULL,
        PRIMARY KEY (brief_id, tag_type, tag_value)
    );

    CREATE INDEX IF NOT EXISTS idx_briefs_year_quarter ON briefs(year_quarter);
    CREATE INDEX IF NOT EXISTS idx_briefs_year         ON briefs(year);
    CREATE INDEX IF NOT EXISTS idx_briefs_issued       ON briefs(issued_date);
    CREATE INDEX IF NOT EXISTS idx_brief_keywords_kid  ON brief_keywords(keyword_id);
    CREATE INDEX IF NOT EXISTS idx_keywords_norm       ON keywords(keyword_norm);
    CREATE INDEX IF NOT EXISTS idx_brief_geo_gid       ON brief_geo(geo_id);
    CREATE INDEX IF NOT EXISTS idx_geo_type_norm       ON geo(geo_type, value_norm);
    CREATE INDEX IF NOT EXISTS idx_brief_funding_eid   ON brief_funding(entity_id);
    CREATE INDEX IF NOT EXISTS idx_funding_type_norm   ON funding_entities(entity_type, entity_norm);
    CREATE INDEX IF NOT EXISTS idx_brief_tags_value    ON brief_tags(tag_type, tag_value);
"#;

/// SQLite-backed publication store
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open an existing database without touching its schema
    ///
    /// Stages that only read or normalize use this; they call
    /// [`Store::require_tables`] so an unloaded database fails loudly instead
    /// of silently producing empty results. A missing file is a configuration
    /// error and is never created here.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StoreError::MissingDatabase {
                path: path.display().to_string(),
            }
            .into());
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::connect(conn, path)
    }

    fn connect(conn: Connection, path: &Path) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        tracing::debug!(path = %path.display(), "SQLite store opened");
        Ok(Self { conn })
    }

    /// Open (creating if needed) a database and ensure the schema exists
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self::connect(Connection::open(path)?, path)?;
        store.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite store initialized");
        Ok(store)
    }

    /// Create in-memory store with schema (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    /// Wrap an existing connection as-is
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Fail with a configuration error if any of `tables` is missing
    pub fn require_tables(&self, tables: &[&str]) -> Result<()> {
        for table in tables {
            let exists: Option<i64> = self
                .conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![table],
                    |row| row.get(0),
                )
                .optional()?;

            if exists.is_none() {
                return Err(StoreError::MissingTable {
                    table: (*table).to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Read-only access to the connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction; dropping it without commit rolls back
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Row count of a table from [`REQUIRED_TABLES`]
    pub fn count_rows(&self, table: &str) -> Result<u64> {
        if !REQUIRED_TABLES.contains(&table) {
            return Err(StoreError::MissingTable {
                table: table.to_string(),
            }
            .into());
        }
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(n as u64)
    }
}
