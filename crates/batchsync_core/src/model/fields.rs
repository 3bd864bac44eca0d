//! Field names shared by the domain model, the column row and the index
//! document, plus the date classification policy.
//!
//! # Invariants
//! - `END_OF_DAY_FIELDS` is a subset of `SIMPLE_DATE_FIELDS`.
//! - The lists are process-wide read-only configuration.

pub const ACTIVITY_ID: &str = "activityId";
pub const BATCH_ID: &str = "batchId";
pub const NAME: &str = "name";
pub const DESCRIPTION: &str = "description";
pub const STATUS: &str = "status";
pub const ENROLLMENT_TYPE: &str = "enrollmentType";
pub const CREATED_BY: &str = "createdBy";
pub const START_DATE: &str = "startDate";
pub const END_DATE: &str = "endDate";
pub const ENROLLMENT_END_DATE: &str = "enrollmentEndDate";
pub const CREATED_DATE: &str = "createdDate";
pub const UPDATED_DATE: &str = "updatedDate";
pub const CERT_TEMPLATES: &str = "certTemplates";

/// Index-only keys mirroring the row key.
pub const ID: &str = "id";
pub const IDENTIFIER: &str = "identifier";

/// Certificate template keys.
pub const URL: &str = "url";
pub const PREVIEW_URL: &str = "previewUrl";

/// Rendered with the full date-time format in both stores.
pub const DATE_TIME_FIELDS: &[&str] = &[CREATED_DATE, UPDATED_DATE];

/// Rendered with the configured simple-date pattern in the index.
pub const SIMPLE_DATE_FIELDS: &[&str] = &[START_DATE, END_DATE, ENROLLMENT_END_DATE];

/// Pinned to 23:59:59.999 local time when written to the column store.
pub const END_OF_DAY_FIELDS: &[&str] = &[END_DATE, ENROLLMENT_END_DATE];

/// Iterates every classified date field, full date-time fields first.
pub fn all_date_fields() -> impl Iterator<Item = &'static str> {
    DATE_TIME_FIELDS
        .iter()
        .chain(SIMPLE_DATE_FIELDS.iter())
        .copied()
}

pub fn is_end_of_day_field(field: &str) -> bool {
    END_OF_DAY_FIELDS.contains(&field)
}

#[cfg(test)]
mod tests {
    use super::{all_date_fields, is_end_of_day_field, END_OF_DAY_FIELDS, SIMPLE_DATE_FIELDS};

    #[test]
    fn end_of_day_fields_are_simple_date_fields() {
        for field in END_OF_DAY_FIELDS {
            assert!(SIMPLE_DATE_FIELDS.contains(field), "{field} is not a simple date field");
        }
    }

    #[test]
    fn all_date_fields_covers_both_lists_once() {
        let fields = all_date_fields().collect::<Vec<_>>();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0], "createdDate");
        assert!(fields.contains(&"enrollmentEndDate"));
    }

    #[test]
    fn end_of_day_membership_is_exact() {
        assert!(is_end_of_day_field("endDate"));
        assert!(!is_end_of_day_field("startDate"));
        assert!(!is_end_of_day_field("EndDate"));
    }
}
