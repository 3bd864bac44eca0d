//! Foreground index sync.

use crate::error::BatchResult;
use crate::model::fields;
use crate::projection::index::IndexDocument;
use crate::search::index::BatchIndex;
use log::info;
use serde_json::Value;
use std::time::Instant;

/// Upserts `document` into the index under `unique_id`.
///
/// Stamps `id` and `identifier` with `unique_id` before writing, as the
/// index schema requires. Single attempt; failures propagate.
pub fn sync_activity_batch_foreground<I: BatchIndex + ?Sized>(
    index: &I,
    unique_id: &str,
    mut document: IndexDocument,
) -> BatchResult<String> {
    let started_at = Instant::now();
    document.insert(fields::ID.to_string(), Value::String(unique_id.to_string()));
    document.insert(
        fields::IDENTIFIER.to_string(),
        Value::String(unique_id.to_string()),
    );

    let stored_id = index.save(unique_id, &document)?;
    info!(
        "event=index_sync module=service status=ok batch_id={} duration_ms={}",
        stored_id,
        started_at.elapsed().as_millis()
    );
    Ok(stored_id)
}
