//! Batch existence and ownership validation.

use crate::error::{BatchError, BatchResult};
use crate::model::fields;
use crate::projection::index::IndexDocument;
use crate::search::index::BatchIndex;
use log::info;
use serde_json::Value;

/// Looks up `batch_id` in the index and checks its owning activity.
///
/// The ownership check only runs when `activity_id` is non-blank; the
/// comparison itself is exact.
///
/// # Errors
/// - `NotFound` when the index holds no (or an empty) document.
/// - `NotLinked` when the document's `activityId` differs.
/// - `Index` for lookup failures.
pub fn validate_activity_batch<I: BatchIndex + ?Sized>(
    index: &I,
    batch_id: &str,
    activity_id: Option<&str>,
) -> BatchResult<IndexDocument> {
    let document = index
        .get_by_identifier(batch_id)?
        .filter(|document| !document.is_empty())
        .ok_or_else(|| BatchError::NotFound {
            batch_id: batch_id.to_string(),
        })?;

    if let Some(expected) = activity_id.filter(|id| !id.trim().is_empty()) {
        let linked = document.get(fields::ACTIVITY_ID).and_then(Value::as_str);
        if linked != Some(expected) {
            info!(
                "event=batch_validate module=service status=rejected reason=not_linked batch_id={} activity_id={}",
                batch_id, expected
            );
            return Err(BatchError::NotLinked {
                batch_id: batch_id.to_string(),
                activity_id: expected.to_string(),
            });
        }
    }

    Ok(document)
}
