//! Batch index contract and SQLite document-table implementation.
//!
//! # Responsibility
//! - Upsert read-optimized batch documents by id.
//! - Serve identifier lookups for batch validation.
//!
//! # Invariants
//! - Documents are JSON objects; anything else read back is invalid data.
//! - `save` is a full-document upsert; the last save for an id wins.

use crate::db::DbError;
use crate::projection::index::IndexDocument;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for index APIs.
pub type IndexResult<T> = Result<T, IndexError>;

/// Index-layer error for storage, encoding and decoding failures.
#[derive(Debug)]
pub enum IndexError {
    Db(DbError),
    Encode(serde_json::Error),
    InvalidData(String),
    /// Index backend refused or failed the operation.
    Unavailable(String),
}

impl Display for IndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode index document: {err}"),
            Self::InvalidData(message) => write!(f, "invalid index document: {message}"),
            Self::Unavailable(message) => write!(f, "batch index unavailable: {message}"),
        }
    }
}

impl Error for IndexError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for IndexError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for IndexError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Document index for activity batches (read-optimized projection).
pub trait BatchIndex {
    /// Upserts `document` under `id` and returns the stored id.
    fn save(&self, id: &str, document: &IndexDocument) -> IndexResult<String>;
    fn get_by_identifier(&self, id: &str) -> IndexResult<Option<IndexDocument>>;
}

/// SQLite-backed batch index.
pub struct SqliteBatchIndex<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBatchIndex<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BatchIndex for SqliteBatchIndex<'_> {
    fn save(&self, id: &str, document: &IndexDocument) -> IndexResult<String> {
        let encoded = serde_json::to_string(document).map_err(IndexError::Encode)?;
        self.conn.execute(
            "INSERT INTO activity_batch_index (id, document)
             VALUES (?1, ?2)
             ON CONFLICT (id) DO UPDATE SET
                document = excluded.document,
                synced_at = (strftime('%s', 'now') * 1000);",
            params![id, encoded],
        )?;
        Ok(id.to_string())
    }

    fn get_by_identifier(&self, id: &str) -> IndexResult<Option<IndexDocument>> {
        let text = self
            .conn
            .query_row(
                "SELECT document FROM activity_batch_index WHERE id = ?1;",
                [id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        text.map(|text| parse_document(id, &text)).transpose()
    }
}

fn parse_document(id: &str, text: &str) -> IndexResult<IndexDocument> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(IndexError::InvalidData(format!(
            "document `{id}` is not a JSON object"
        ))),
        Err(err) => Err(IndexError::InvalidData(format!(
            "document `{id}` is not valid JSON: {err}"
        ))),
    }
}
