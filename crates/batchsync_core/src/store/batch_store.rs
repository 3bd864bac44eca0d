//! Column-store contract and SQLite implementation for activity batches.
//!
//! # Responsibility
//! - Persist projected `BatchRow`s keyed by `(activity_id, batch_id)`.
//! - Apply single-template writes to the `cert_templates` map column.
//! - Decode stored rows back into `ActivityBatch`.
//!
//! # Invariants
//! - `cert_templates` is stored as a JSON object of flat string maps.
//! - Dates are stored as full date-time text with their offset.
//! - Template writes are read-modify-write in one transaction; concurrent
//!   writers on the same template id are last-write-wins.
//! - Read paths reject malformed persisted data instead of masking it.

use crate::certificate::template::{lift_flat_template, FlatTemplate};
use crate::db::DbError;
use crate::dates::normalizer::{parse_date_time, DATE_TIME_FORMAT};
use crate::model::batch::{ActivityBatch, TemplateId};
use crate::model::fields;
use crate::projection::row::{BatchRow, ColumnValue};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Column name for each row field, in insert order.
const COLUMN_BINDINGS: &[(&str, &str)] = &[
    ("activity_id", fields::ACTIVITY_ID),
    ("batch_id", fields::BATCH_ID),
    ("name", fields::NAME),
    ("description", fields::DESCRIPTION),
    ("status", fields::STATUS),
    ("enrollment_type", fields::ENROLLMENT_TYPE),
    ("created_by", fields::CREATED_BY),
    ("start_date", fields::START_DATE),
    ("end_date", fields::END_DATE),
    ("enrollment_end_date", fields::ENROLLMENT_END_DATE),
    ("created_date", fields::CREATED_DATE),
    ("updated_date", fields::UPDATED_DATE),
    ("cert_templates", fields::CERT_TEMPLATES),
];

const BATCH_UPSERT_SQL: &str = "INSERT INTO activity_batch (
    activity_id,
    batch_id,
    name,
    description,
    status,
    enrollment_type,
    created_by,
    start_date,
    end_date,
    enrollment_end_date,
    created_date,
    updated_date,
    cert_templates
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
ON CONFLICT (activity_id, batch_id) DO UPDATE SET
    name = excluded.name,
    description = excluded.description,
    status = excluded.status,
    enrollment_type = excluded.enrollment_type,
    created_by = excluded.created_by,
    start_date = excluded.start_date,
    end_date = excluded.end_date,
    enrollment_end_date = excluded.enrollment_end_date,
    created_date = excluded.created_date,
    updated_date = excluded.updated_date,
    cert_templates = excluded.cert_templates;";

const BATCH_SELECT_SQL: &str = "SELECT
    activity_id,
    batch_id,
    name,
    description,
    status,
    enrollment_type,
    created_by,
    start_date,
    end_date,
    enrollment_end_date,
    created_date,
    updated_date,
    cert_templates
FROM activity_batch";

pub type StoreResult<T> = Result<T, StoreError>;

/// Column-store error.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NotFound {
        activity_id: String,
        batch_id: String,
    },
    /// Row handed to the store is missing a required key column.
    MissingColumn(&'static str),
    InvalidData(String),
    Encode(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound {
                activity_id,
                batch_id,
            } => write!(
                f,
                "activity batch not found: activity_id={activity_id} batch_id={batch_id}"
            ),
            Self::MissingColumn(column) => write!(f, "batch row is missing column {column}"),
            Self::InvalidData(message) => write!(f, "invalid persisted batch data: {message}"),
            Self::Encode(err) => write!(f, "failed to encode cert_templates: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::NotFound { .. } | Self::MissingColumn(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Column store for activity batches (system of record).
pub trait BatchStore {
    /// Inserts or fully replaces one batch row.
    fn upsert_row(&self, row: &BatchRow) -> StoreResult<()>;
    fn read_by_id(&self, activity_id: &str, batch_id: &str) -> StoreResult<Option<ActivityBatch>>;
    /// Reads only the flat `cert_templates` column.
    fn certificate_templates(
        &self,
        activity_id: &str,
        batch_id: &str,
    ) -> StoreResult<Option<BTreeMap<TemplateId, FlatTemplate>>>;
    /// Writes one template entry, replacing any entry with the same id.
    fn add_certificate_template(
        &self,
        activity_id: &str,
        batch_id: &str,
        template_id: &str,
        template: &FlatTemplate,
    ) -> StoreResult<()>;
    /// Removes one template entry. Absent entries are not an error.
    fn remove_certificate_template(
        &self,
        activity_id: &str,
        batch_id: &str,
        template_id: &str,
    ) -> StoreResult<()>;
}

/// SQLite-backed column store.
pub struct SqliteBatchStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBatchStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn update_templates(
        &self,
        activity_id: &str,
        batch_id: &str,
        mutate: impl FnOnce(&mut BTreeMap<TemplateId, FlatTemplate>),
    ) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let mut templates = read_templates(&tx, activity_id, batch_id)?.ok_or_else(|| {
            StoreError::NotFound {
                activity_id: activity_id.to_string(),
                batch_id: batch_id.to_string(),
            }
        })?;

        mutate(&mut templates);

        let encoded = serde_json::to_string(&templates).map_err(StoreError::Encode)?;
        tx.execute(
            "UPDATE activity_batch
             SET cert_templates = ?1
             WHERE activity_id = ?2 AND batch_id = ?3;",
            params![encoded, activity_id, batch_id],
        )?;
        tx.commit()?;
        Ok(())
    }
}

impl BatchStore for SqliteBatchStore<'_> {
    fn upsert_row(&self, row: &BatchRow) -> StoreResult<()> {
        for key in [fields::ACTIVITY_ID, fields::BATCH_ID] {
            if row.text(key).is_none() {
                return Err(StoreError::MissingColumn(key));
            }
        }

        let values = COLUMN_BINDINGS
            .iter()
            .map(|(_, field)| column_to_sql(field, row.get(field)))
            .collect::<StoreResult<Vec<_>>>()?;

        self.conn.execute(BATCH_UPSERT_SQL, params_from_iter(values))?;
        Ok(())
    }

    fn read_by_id(&self, activity_id: &str, batch_id: &str) -> StoreResult<Option<ActivityBatch>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BATCH_SELECT_SQL}
             WHERE activity_id = ?1 AND batch_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![activity_id, batch_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_batch_row(row)?));
        }
        Ok(None)
    }

    fn certificate_templates(
        &self,
        activity_id: &str,
        batch_id: &str,
    ) -> StoreResult<Option<BTreeMap<TemplateId, FlatTemplate>>> {
        read_templates(self.conn, activity_id, batch_id)
    }

    fn add_certificate_template(
        &self,
        activity_id: &str,
        batch_id: &str,
        template_id: &str,
        template: &FlatTemplate,
    ) -> StoreResult<()> {
        self.update_templates(activity_id, batch_id, |templates| {
            templates.insert(template_id.to_string(), template.clone());
        })
    }

    fn remove_certificate_template(
        &self,
        activity_id: &str,
        batch_id: &str,
        template_id: &str,
    ) -> StoreResult<()> {
        self.update_templates(activity_id, batch_id, |templates| {
            templates.remove(template_id);
        })
    }
}

fn read_templates(
    conn: &Connection,
    activity_id: &str,
    batch_id: &str,
) -> StoreResult<Option<BTreeMap<TemplateId, FlatTemplate>>> {
    let text = conn
        .query_row(
            "SELECT cert_templates
             FROM activity_batch
             WHERE activity_id = ?1 AND batch_id = ?2;",
            params![activity_id, batch_id],
            |row| row.get::<_, String>(0),
        )
        .optional()?;

    text.map(|text| decode_templates(&text)).transpose()
}

fn decode_templates(text: &str) -> StoreResult<BTreeMap<TemplateId, FlatTemplate>> {
    serde_json::from_str(text).map_err(|err| {
        StoreError::InvalidData(format!(
            "cert_templates is not a map of flat string maps: {err}"
        ))
    })
}

fn column_to_sql(field: &str, value: Option<&ColumnValue>) -> StoreResult<Value> {
    let value = match value {
        None | Some(ColumnValue::Null) if field == fields::CERT_TEMPLATES => {
            Value::Text("{}".to_string())
        }
        None | Some(ColumnValue::Null) => Value::Null,
        Some(ColumnValue::Text(text)) => Value::Text(text.clone()),
        Some(ColumnValue::Int(number)) => Value::Integer(*number),
        Some(ColumnValue::Timestamp(instant)) => {
            Value::Text(instant.format(DATE_TIME_FORMAT).to_string())
        }
        Some(ColumnValue::Templates(templates)) => {
            Value::Text(serde_json::to_string(templates).map_err(StoreError::Encode)?)
        }
    };
    Ok(value)
}

fn parse_batch_row(row: &Row<'_>) -> StoreResult<ActivityBatch> {
    let mut batch = ActivityBatch::with_id(
        row.get::<_, String>("activity_id")?,
        row.get::<_, String>("batch_id")?,
    );
    batch.name = row.get("name")?;
    batch.description = row.get("description")?;
    batch.status = row.get("status")?;
    batch.enrollment_type = row.get("enrollment_type")?;
    batch.created_by = row.get("created_by")?;

    for (column, field) in COLUMN_BINDINGS {
        if !fields::all_date_fields().any(|date_field| date_field == *field) {
            continue;
        }
        let value = match row.get::<_, Option<String>>(*column)? {
            Some(text) => Some(
                parse_date_time(field, &text)
                    .map_err(|err| StoreError::InvalidData(err.to_string()))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };
        batch.set_date_field(field, value);
    }

    let templates = decode_templates(&row.get::<_, String>("cert_templates")?)?;
    batch.cert_templates = templates
        .iter()
        .map(|(id, flat)| (id.clone(), lift_flat_template(flat)))
        .collect();

    Ok(batch)
}
