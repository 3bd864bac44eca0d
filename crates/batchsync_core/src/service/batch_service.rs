//! Activity batch use-case service.
//!
//! # Responsibility
//! - Dispatch typed batch commands.
//! - Run the validate -> mutate -> project -> persist flow for templates.
//!
//! # Invariants
//! - Client errors (`NotFound`, `NotLinked`, `InvalidRequest`) are raised
//!   before any store write.
//! - Column-store writes precede the index sync; neither is retried and a
//!   failed index sync does not roll back the column write.
//! - No per-batch locking: concurrent attaches are last-write-wins.

use crate::certificate::template::{attach_template, detach_template, template_identifier};
use crate::command::{
    AttachCertificateRequest, BatchCommand, BatchResponse, CertificateResponse,
    RemoveCertificateRequest, SaveBatchResponse, SyncResponse, SUCCESS,
};
use crate::dates::normalizer::DateNormalizer;
use crate::error::{BatchError, BatchResult};
use crate::model::batch::ActivityBatch;
use crate::projection::index::{project_for_index, IndexDocument};
use crate::projection::row::project_for_column_store;
use crate::search::index::BatchIndex;
use crate::service::sync::sync_activity_batch_foreground;
use crate::service::validator::validate_activity_batch;
use crate::store::batch_store::BatchStore;
use log::{error, info, warn};
use std::time::Instant;

/// Batch service over injected column-store and index handles.
pub struct ActivityBatchService<S: BatchStore, I: BatchIndex> {
    store: S,
    index: I,
    normalizer: DateNormalizer,
}

impl<S: BatchStore, I: BatchIndex> ActivityBatchService<S, I> {
    pub fn new(store: S, index: I, normalizer: DateNormalizer) -> Self {
        Self {
            store,
            index,
            normalizer,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Dispatches one command and logs its outcome.
    pub fn handle(&self, command: BatchCommand) -> BatchResult<BatchResponse> {
        let operation = command.operation();
        let started_at = Instant::now();

        let result = match command {
            BatchCommand::AddCertificate(request) => self
                .attach_certificate(&request)
                .map(BatchResponse::Certificate),
            BatchCommand::RemoveCertificate(request) => self
                .remove_certificate(&request)
                .map(BatchResponse::Certificate),
            BatchCommand::SyncForeground(request) => self
                .sync_foreground(&request.unique_id, request.document)
                .map(|id| {
                    BatchResponse::Synced(SyncResponse {
                        response: SUCCESS,
                        id,
                    })
                }),
            BatchCommand::SaveBatch(batch) => self.save_batch(&batch).map(BatchResponse::Saved),
        };

        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(_) => info!(
                "event=batch_command module=service status=ok operation={operation} duration_ms={duration_ms}"
            ),
            Err(err) if err.is_client_error() => warn!(
                "event=batch_command module=service status=rejected operation={operation} kind={} duration_ms={duration_ms} error={err}",
                err.kind().as_str()
            ),
            Err(err) => error!(
                "event=batch_command module=service status=error operation={operation} kind={} duration_ms={duration_ms} error={err}",
                err.kind().as_str()
            ),
        }
        result
    }

    /// Validates that `batch_id` exists and, if given, belongs to `activity_id`.
    pub fn validate_batch(
        &self,
        batch_id: &str,
        activity_id: Option<&str>,
    ) -> BatchResult<IndexDocument> {
        validate_activity_batch(&self.index, batch_id, activity_id)
    }

    /// Attaches a certificate template and re-syncs the index document.
    ///
    /// # Errors
    /// - `InvalidRequest` for blank ids or a template without `identifier`.
    /// - `NotFound` / `NotLinked` from validation or the column-store read.
    /// - `Template` serialization failure; nothing is written.
    /// - `Store` / `Index` write failures.
    pub fn attach_certificate(
        &self,
        request: &AttachCertificateRequest,
    ) -> BatchResult<CertificateResponse> {
        require_id("activityId", &request.activity_id)?;
        require_id("batchId", &request.batch_id)?;
        let template_id = template_identifier(&request.template)?;
        info!(
            "event=certificate_attach module=service status=start activity_id={} batch_id={} template_id={} requested_by={}",
            request.activity_id,
            request.batch_id,
            template_id,
            request.requested_by.as_deref().unwrap_or("-")
        );

        self.validate_batch(&request.batch_id, Some(&request.activity_id))?;
        let mut batch = self.load_batch(&request.activity_id, &request.batch_id)?;

        let flat = attach_template(&mut batch, &template_id, request.template.clone())?;
        self.store.add_certificate_template(
            &request.activity_id,
            &request.batch_id,
            &template_id,
            &flat,
        )?;
        self.sync_batch(&batch)?;

        info!(
            "event=certificate_attach module=service status=ok activity_id={} batch_id={} template_id={} fields={}",
            request.activity_id,
            request.batch_id,
            template_id,
            flat.len()
        );
        Ok(CertificateResponse::success(
            request.batch_id.clone(),
            request.activity_id.clone(),
        ))
    }

    /// Detaches one certificate template and re-syncs the index document.
    ///
    /// Detaching a template the batch does not carry succeeds unchanged.
    pub fn remove_certificate(
        &self,
        request: &RemoveCertificateRequest,
    ) -> BatchResult<CertificateResponse> {
        require_id("activityId", &request.activity_id)?;
        require_id("batchId", &request.batch_id)?;
        require_id("templateId", &request.template_id)?;

        self.validate_batch(&request.batch_id, Some(&request.activity_id))?;
        let mut batch = self.load_batch(&request.activity_id, &request.batch_id)?;

        let removed = detach_template(&mut batch, &request.template_id).is_some();
        self.store.remove_certificate_template(
            &request.activity_id,
            &request.batch_id,
            &request.template_id,
        )?;
        self.sync_batch(&batch)?;

        info!(
            "event=certificate_detach module=service status=ok activity_id={} batch_id={} template_id={} removed={}",
            request.activity_id, request.batch_id, request.template_id, removed
        );
        Ok(CertificateResponse::success(
            request.batch_id.clone(),
            request.activity_id.clone(),
        ))
    }

    /// Persists a whole batch: column row first, then the index document.
    ///
    /// Date fields that fail to transform are written with their last good
    /// value and listed in the response.
    pub fn save_batch(&self, batch: &ActivityBatch) -> BatchResult<SaveBatchResponse> {
        require_id("activityId", &batch.activity_id)?;
        require_id("batchId", &batch.batch_id)?;

        let projected = project_for_column_store(batch, &self.normalizer)?;
        self.store.upsert_row(&projected.row)?;
        self.sync_batch(batch)?;

        Ok(SaveBatchResponse {
            response: SUCCESS,
            batch_id: batch.batch_id.clone(),
            activity_id: batch.activity_id.clone(),
            date_failures: projected
                .failures
                .iter()
                .map(|failure| failure.field.to_string())
                .collect(),
        })
    }

    /// Upserts a pre-built document into the index under `unique_id`.
    pub fn sync_foreground(&self, unique_id: &str, document: IndexDocument) -> BatchResult<String> {
        require_id("uniqueId", unique_id)?;
        sync_activity_batch_foreground(&self.index, unique_id, document)
    }

    fn load_batch(&self, activity_id: &str, batch_id: &str) -> BatchResult<ActivityBatch> {
        self.store
            .read_by_id(activity_id, batch_id)?
            .ok_or_else(|| BatchError::NotFound {
                batch_id: batch_id.to_string(),
            })
    }

    fn sync_batch(&self, batch: &ActivityBatch) -> BatchResult<String> {
        let document = project_for_index(batch, &self.normalizer);
        sync_activity_batch_foreground(&self.index, &batch.batch_id, document)
    }
}

fn require_id(name: &str, value: &str) -> BatchResult<()> {
    if value.trim().is_empty() {
        return Err(BatchError::InvalidRequest(format!("{name} is required")));
    }
    Ok(())
}
