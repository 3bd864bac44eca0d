//! Activity batch entity.
//!
//! # Responsibility
//! - Hold the canonical in-memory record projected into both stores.
//! - Give typed access to date fields by their external name.
//!
//! # Invariants
//! - Dates are instants; timezone handling belongs to projection.
//! - `cert_templates` is keyed by template identifier, one entry per template.

use crate::model::fields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Opaque template identifier (the template's `identifier` field).
pub type TemplateId = String;

/// Template key/value record. May hold nested values in memory and in the
/// index; the column store only ever sees the flattened form.
pub type TemplateRecord = Map<String, Value>;

/// Denormalized activity batch record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityBatch {
    /// Owning activity; used for link validation.
    pub activity_id: String,
    /// Row key in the column store and document id in the index.
    pub batch_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub enrollment_type: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub enrollment_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cert_templates: BTreeMap<TemplateId, TemplateRecord>,
}

impl ActivityBatch {
    /// Creates a batch for `activity_id` with a generated batch id.
    pub fn new(activity_id: impl Into<String>) -> Self {
        Self::with_id(activity_id, Uuid::new_v4().to_string())
    }

    /// Creates a batch with a caller-provided batch id.
    ///
    /// All optional fields start empty and no template is attached.
    pub fn with_id(activity_id: impl Into<String>, batch_id: impl Into<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            batch_id: batch_id.into(),
            name: None,
            description: None,
            status: None,
            enrollment_type: None,
            created_by: None,
            start_date: None,
            end_date: None,
            enrollment_end_date: None,
            created_date: None,
            updated_date: None,
            cert_templates: BTreeMap::new(),
        }
    }

    /// Reads a date field by its external name.
    ///
    /// Unknown names read as absent.
    pub fn date_field(&self, field: &str) -> Option<DateTime<Utc>> {
        match field {
            fields::START_DATE => self.start_date,
            fields::END_DATE => self.end_date,
            fields::ENROLLMENT_END_DATE => self.enrollment_end_date,
            fields::CREATED_DATE => self.created_date,
            fields::UPDATED_DATE => self.updated_date,
            _ => None,
        }
    }

    /// Writes a date field by its external name.
    ///
    /// Returns `false` and leaves the batch untouched for unknown names.
    pub fn set_date_field(&mut self, field: &str, value: Option<DateTime<Utc>>) -> bool {
        let slot = match field {
            fields::START_DATE => &mut self.start_date,
            fields::END_DATE => &mut self.end_date,
            fields::ENROLLMENT_END_DATE => &mut self.enrollment_end_date,
            fields::CREATED_DATE => &mut self.created_date,
            fields::UPDATED_DATE => &mut self.updated_date,
            _ => return false,
        };
        *slot = value;
        true
    }

    pub fn has_template(&self, template_id: &str) -> bool {
        self.cert_templates.contains_key(template_id)
    }
}

#[cfg(test)]
mod tests {
    use super::ActivityBatch;
    use chrono::{TimeZone, Utc};

    #[test]
    fn new_generates_distinct_batch_ids() {
        let first = ActivityBatch::new("A1");
        let second = ActivityBatch::new("A1");
        assert_ne!(first.batch_id, second.batch_id);
        assert!(first.cert_templates.is_empty());
    }

    #[test]
    fn date_fields_are_addressable_by_external_name() {
        let mut batch = ActivityBatch::with_id("A1", "B1");
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();

        assert!(batch.set_date_field("enrollmentEndDate", Some(instant)));
        assert_eq!(batch.enrollment_end_date, Some(instant));
        assert_eq!(batch.date_field("enrollmentEndDate"), Some(instant));

        assert!(!batch.set_date_field("name", Some(instant)));
        assert_eq!(batch.date_field("name"), None);
    }
}
