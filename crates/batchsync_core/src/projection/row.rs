//! Column-store row projection.
//!
//! # Invariants
//! - `ColumnValue` has no generic nested variant; templates can only enter a
//!   row as flat string maps.
//! - Each date field is projected independently: a failure leaves that field
//!   at its last good value and is reported, the rest of the row proceeds.
//! - Template flattening is all-or-nothing for the whole row.

use crate::certificate::template::{flatten_template, FlatTemplate, TemplateError};
use crate::dates::normalizer::{DateNormalizer, DateTransformError};
use crate::error::BatchErrorKind;
use crate::model::batch::{ActivityBatch, TemplateId};
use crate::model::fields;
use chrono::{DateTime, FixedOffset};
use log::warn;
use std::collections::BTreeMap;

/// One column value in the batch table.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Text(String),
    Int(i64),
    /// Zone-aware instant; rendered as full date-time text by the store.
    Timestamp(DateTime<FixedOffset>),
    /// `certTemplates`: template id -> flat template.
    Templates(BTreeMap<TemplateId, FlatTemplate>),
}

/// Flat column-store representation of one batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchRow {
    columns: BTreeMap<&'static str, ColumnValue>,
}

impl BatchRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &'static str, value: ColumnValue) {
        self.columns.insert(column, value);
    }

    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.columns.get(column)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        match self.columns.get(column) {
            Some(ColumnValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn timestamp(&self, column: &str) -> Option<DateTime<FixedOffset>> {
        match self.columns.get(column) {
            Some(ColumnValue::Timestamp(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn templates(&self) -> Option<&BTreeMap<TemplateId, FlatTemplate>> {
        match self.columns.get(fields::CERT_TEMPLATES) {
            Some(ColumnValue::Templates(value)) => Some(value),
            _ => None,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &ColumnValue)> {
        self.columns.iter().map(|(name, value)| (*name, value))
    }
}

/// A date field the column projection could not fully transform.
#[derive(Debug, Clone, PartialEq)]
pub struct DateFieldFailure {
    pub field: &'static str,
    pub error: DateTransformError,
}

impl DateFieldFailure {
    pub fn kind(&self) -> BatchErrorKind {
        BatchErrorKind::DateTransformFailure
    }
}

/// Column projection output: the row plus per-field date failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRow {
    pub row: BatchRow,
    pub failures: Vec<DateFieldFailure>,
}

impl ProjectedRow {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Projects a batch into its column-store row.
///
/// Every classified date is round-tripped through the full date-time format
/// in the process timezone, then end-of-day fields are pinned to
/// 23:59:59.999 on their local calendar day.
///
/// # Errors
/// - `TemplateError` when any template cannot be flattened; no row is
///   produced in that case.
pub fn project_for_column_store(
    batch: &ActivityBatch,
    normalizer: &DateNormalizer,
) -> Result<ProjectedRow, TemplateError> {
    let templates = batch
        .cert_templates
        .iter()
        .map(|(id, record)| flatten_template(record).map(|flat| (id.clone(), flat)))
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let mut row = BatchRow::new();
    row.set(
        fields::ACTIVITY_ID,
        ColumnValue::Text(batch.activity_id.clone()),
    );
    row.set(fields::BATCH_ID, ColumnValue::Text(batch.batch_id.clone()));
    row.set(fields::NAME, optional_text(&batch.name));
    row.set(fields::DESCRIPTION, optional_text(&batch.description));
    row.set(
        fields::STATUS,
        batch.status.map_or(ColumnValue::Null, ColumnValue::Int),
    );
    row.set(fields::ENROLLMENT_TYPE, optional_text(&batch.enrollment_type));
    row.set(fields::CREATED_BY, optional_text(&batch.created_by));
    row.set(fields::CERT_TEMPLATES, ColumnValue::Templates(templates));

    let mut failures = Vec::new();
    for field in fields::all_date_fields() {
        let Some(value) = batch.date_field(field) else {
            row.set(field, ColumnValue::Null);
            continue;
        };

        let projected = match normalizer.normalize_instant(field, value) {
            Ok(normalized) => match normalizer.apply_end_of_day(field, normalized) {
                Ok(adjusted) => adjusted,
                Err(error) => {
                    record_failure(&mut failures, &batch.batch_id, field, error);
                    normalized
                }
            },
            Err(error) => {
                record_failure(&mut failures, &batch.batch_id, field, error);
                normalizer.localize(value)
            }
        };
        row.set(field, ColumnValue::Timestamp(projected));
    }

    Ok(ProjectedRow { row, failures })
}

fn record_failure(
    failures: &mut Vec<DateFieldFailure>,
    batch_id: &str,
    field: &'static str,
    error: DateTransformError,
) {
    let failure = DateFieldFailure { field, error };
    warn!(
        "event=date_projection module=projection status=error kind={} batch_id={} field={} error={}",
        failure.kind().as_str(),
        batch_id,
        field,
        failure.error
    );
    failures.push(failure);
}

fn optional_text(value: &Option<String>) -> ColumnValue {
    value.clone().map_or(ColumnValue::Null, ColumnValue::Text)
}
