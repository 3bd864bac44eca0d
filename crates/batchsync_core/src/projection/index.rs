//! Index document projection.
//!
//! The index tolerates nested values, so `certTemplates` is attached as-is.

use crate::dates::normalizer::DateNormalizer;
use crate::model::batch::ActivityBatch;
use crate::model::fields;
use serde_json::{Map, Value};

/// Read-optimized document stored in the batch index.
pub type IndexDocument = Map<String, Value>;

/// Projects a batch into its index document.
///
/// Full date-time fields use the full format, simple-date fields use the
/// normalizer's pattern, absent dates are written as `null`. The `id` and
/// `identifier` keys are added by the sync path, not here.
pub fn project_for_index(batch: &ActivityBatch, normalizer: &DateNormalizer) -> IndexDocument {
    let mut document = IndexDocument::new();
    document.insert(
        fields::ACTIVITY_ID.to_string(),
        Value::String(batch.activity_id.clone()),
    );
    document.insert(
        fields::BATCH_ID.to_string(),
        Value::String(batch.batch_id.clone()),
    );
    document.insert(fields::NAME.to_string(), optional_text(&batch.name));
    document.insert(
        fields::DESCRIPTION.to_string(),
        optional_text(&batch.description),
    );
    document.insert(
        fields::STATUS.to_string(),
        batch.status.map_or(Value::Null, Value::from),
    );
    document.insert(
        fields::ENROLLMENT_TYPE.to_string(),
        optional_text(&batch.enrollment_type),
    );
    document.insert(fields::CREATED_BY.to_string(), optional_text(&batch.created_by));

    for field in fields::DATE_TIME_FIELDS {
        let rendered = normalizer.format_date_time(batch.date_field(field));
        document.insert(field.to_string(), rendered.map_or(Value::Null, Value::String));
    }
    for field in fields::SIMPLE_DATE_FIELDS {
        let rendered = normalizer.format_simple_date(batch.date_field(field));
        document.insert(field.to_string(), rendered.map_or(Value::Null, Value::String));
    }

    let templates = batch
        .cert_templates
        .iter()
        .map(|(id, record)| (id.clone(), Value::Object(record.clone())))
        .collect::<Map<_, _>>();
    document.insert(fields::CERT_TEMPLATES.to_string(), Value::Object(templates));

    document
}

fn optional_text(value: &Option<String>) -> Value {
    value.clone().map_or(Value::Null, Value::String)
}

#[cfg(test)]
mod tests {
    use super::project_for_index;
    use crate::dates::normalizer::DateNormalizer;
    use crate::model::batch::ActivityBatch;
    use chrono::{FixedOffset, TimeZone, Utc};
    use serde_json::{json, Value};

    #[test]
    fn renders_each_date_bucket_and_keeps_nested_templates() {
        let offset = FixedOffset::east_opt(19_800).unwrap();
        let normalizer = DateNormalizer::new(offset, "%Y-%m-%d").unwrap();
        let mut batch = ActivityBatch::with_id("A1", "B1");
        batch.name = Some("Spring cohort".to_string());
        batch.status = Some(1);
        batch.created_date = Some(Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap());
        batch.end_date = Some(Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap());
        batch.cert_templates.insert(
            "T1".to_string(),
            json!({"identifier": "T1", "signatories": [{"name": "Dean"}]})
                .as_object()
                .cloned()
                .unwrap(),
        );

        let document = project_for_index(&batch, &normalizer);

        assert_eq!(document["activityId"], json!("A1"));
        assert_eq!(document["name"], json!("Spring cohort"));
        assert_eq!(document["status"], json!(1));
        assert_eq!(document["createdDate"], json!("2024-03-11 01:30:00:000+0530"));
        assert_eq!(document["endDate"], json!("2024-03-11"));
        assert_eq!(document["startDate"], Value::Null);
        assert_eq!(
            document["certTemplates"]["T1"]["signatories"],
            json!([{"name": "Dean"}])
        );
        assert!(!document.contains_key("id"));
    }
}
