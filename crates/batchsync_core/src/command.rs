//! Typed command surface for batch operations.
//!
//! # Responsibility
//! - Define one request type per operation and the matching responses.
//! - Give every operation a stable wire name for dispatch and logging.
//!
//! # Invariants
//! - Every command variant is handled exhaustively by the batch service.
//! - Success responses always echo the batch identity they touched.

use crate::model::batch::{ActivityBatch, TemplateId, TemplateRecord};
use crate::projection::index::IndexDocument;
use serde::{Deserialize, Serialize};

/// Success marker carried by every response.
pub const SUCCESS: &str = "SUCCESS";

/// Attach one certificate template to a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachCertificateRequest {
    pub activity_id: String,
    pub batch_id: String,
    /// Must carry `identifier`; `previewUrl` is optional.
    pub template: TemplateRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
}

/// Detach one certificate template from a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCertificateRequest {
    pub activity_id: String,
    pub batch_id: String,
    pub template_id: TemplateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
}

/// Push a pre-built document into the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncForegroundRequest {
    pub unique_id: String,
    pub document: IndexDocument,
}

/// Operation request dispatched to `ActivityBatchService::handle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", content = "request")]
pub enum BatchCommand {
    #[serde(rename = "addCertificateToActivityBatch")]
    AddCertificate(AttachCertificateRequest),
    #[serde(rename = "removeCertificateFromActivityBatch")]
    RemoveCertificate(RemoveCertificateRequest),
    #[serde(rename = "syncActivityBatchForeground")]
    SyncForeground(SyncForegroundRequest),
    #[serde(rename = "saveActivityBatch")]
    SaveBatch(ActivityBatch),
}

impl BatchCommand {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::AddCertificate(_) => "addCertificateToActivityBatch",
            Self::RemoveCertificate(_) => "removeCertificateFromActivityBatch",
            Self::SyncForeground(_) => "syncActivityBatchForeground",
            Self::SaveBatch(_) => "saveActivityBatch",
        }
    }
}

/// Response to a certificate attach or detach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
    pub response: &'static str,
    pub batch_id: String,
    pub activity_id: String,
}

impl CertificateResponse {
    pub fn success(batch_id: impl Into<String>, activity_id: impl Into<String>) -> Self {
        Self {
            response: SUCCESS,
            batch_id: batch_id.into(),
            activity_id: activity_id.into(),
        }
    }
}

/// Response to a full batch save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveBatchResponse {
    pub response: &'static str,
    pub batch_id: String,
    pub activity_id: String,
    /// Date fields written with their last good value instead of the
    /// fully transformed one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub date_failures: Vec<String>,
}

/// Response to a foreground sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResponse {
    pub response: &'static str,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BatchResponse {
    Certificate(CertificateResponse),
    Saved(SaveBatchResponse),
    Synced(SyncResponse),
}
