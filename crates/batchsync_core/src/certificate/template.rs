//! Template flattening, canonical url derivation and attach/detach.
//!
//! # Invariants
//! - A flat template maps string keys to string-or-null values only.
//! - Nested values are encoded as compact JSON text that decodes back to
//!   the original value.
//! - Lifting decodes text holding a JSON array or object back into a nested
//!   value; other text stays a string.
//! - The batch keeps nested templates; only the column store sees flat ones.
//! - The batch is only mutated after the whole template flattened.

use crate::model::batch::{ActivityBatch, TemplateId, TemplateRecord};
use crate::model::fields;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Column-store form of one template.
pub type FlatTemplate = BTreeMap<String, Option<String>>;

/// Template validation or flattening failure.
#[derive(Debug)]
pub enum TemplateError {
    /// Template has no non-blank string `identifier`.
    MissingIdentifier,
    /// A nested value could not be encoded.
    Serialization {
        key: String,
        source: serde_json::Error,
    },
}

impl Display for TemplateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentifier => write!(f, "certificate template has no identifier"),
            Self::Serialization { key, source } => {
                write!(f, "failed to serialize certificate template field `{key}`: {source}")
            }
        }
    }
}

impl Error for TemplateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingIdentifier => None,
            Self::Serialization { source, .. } => Some(source),
        }
    }
}

/// Reads the template id from the record's `identifier` field.
pub fn template_identifier(template: &TemplateRecord) -> Result<TemplateId, TemplateError> {
    match template.get(fields::IDENTIFIER) {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.clone()),
        _ => Err(TemplateError::MissingIdentifier),
    }
}

/// Copies `previewUrl` into `url` when only the preview is present.
pub fn derive_canonical_url(template: &mut TemplateRecord) {
    if template.contains_key(fields::URL) {
        return;
    }
    if let Some(preview) = template.get(fields::PREVIEW_URL).cloned() {
        template.insert(fields::URL.to_string(), preview);
    }
}

/// Flattens every entry of a template, failing on the first bad value.
pub fn flatten_template(template: &TemplateRecord) -> Result<FlatTemplate, TemplateError> {
    template
        .iter()
        .map(|(key, value)| flatten_value(key, value).map(|flat| (key.clone(), flat)))
        .collect()
}

/// Lifts a flat template back into a record.
///
/// Values encoded from arrays or objects come back nested; scalars stay
/// strings since their original type is not recorded.
pub fn lift_flat_template(flat: &FlatTemplate) -> TemplateRecord {
    flat.iter()
        .map(|(key, value)| (key.clone(), value.as_deref().map_or(Value::Null, lift_value)))
        .collect()
}

/// Attaches `template` to `batch` under `template_id`.
///
/// Returns the flat mapping the caller persists under `certTemplates`.
/// The batch holds the nested record, with `url` derived, so the index
/// keeps its structure. Any previous entry for `template_id` is replaced.
///
/// # Errors
/// - `Serialization` when a nested value cannot be encoded; `batch` is
///   left untouched.
pub fn attach_template(
    batch: &mut ActivityBatch,
    template_id: &str,
    mut template: TemplateRecord,
) -> Result<FlatTemplate, TemplateError> {
    derive_canonical_url(&mut template);
    let flat = flatten_template(&template)?;
    batch.cert_templates.insert(template_id.to_string(), template);
    Ok(flat)
}

/// Removes one template entry. Returns the removed record, if any.
pub fn detach_template(batch: &mut ActivityBatch, template_id: &str) -> Option<TemplateRecord> {
    batch.cert_templates.remove(template_id)
}

fn flatten_value(key: &str, value: &Value) -> Result<Option<String>, TemplateError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value)
            .map(Some)
            .map_err(|source| TemplateError::Serialization {
                key: key.to_string(),
                source,
            }),
    }
}

fn lift_value(text: &str) -> Value {
    if text.starts_with('[') || text.starts_with('{') {
        if let Ok(nested @ (Value::Array(_) | Value::Object(_))) = serde_json::from_str::<Value>(text) {
            return nested;
        }
    }
    Value::String(text.to_string())
}
