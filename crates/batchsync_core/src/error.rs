//! Service-level error taxonomy.
//!
//! # Invariants
//! - `NotFound`, `NotLinked` and `InvalidRequest` are client errors and are
//!   raised before any store write.
//! - Serialization failures abort the whole operation.
//! - Date transform failures never surface here; the column projection
//!   recovers them per field and reports them in the outcome.

use crate::certificate::template::TemplateError;
use crate::search::index::IndexError;
use crate::store::batch_store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BatchResult<T> = Result<T, BatchError>;

/// Stable category tag for a batch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchErrorKind {
    NotFound,
    NotLinked,
    SerializationFailure,
    DateTransformFailure,
    InvalidRequest,
    /// Store or index failure with no specialized recovery.
    Internal,
}

impl BatchErrorKind {
    pub fn is_client_error(self) -> bool {
        matches!(self, Self::NotFound | Self::NotLinked | Self::InvalidRequest)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::NotLinked => "not_linked",
            Self::SerializationFailure => "serialization_failure",
            Self::DateTransformFailure => "date_transform_failure",
            Self::InvalidRequest => "invalid_request",
            Self::Internal => "internal",
        }
    }
}

/// Failure of a batch operation.
#[derive(Debug)]
pub enum BatchError {
    /// No batch exists for the id.
    NotFound { batch_id: String },
    /// Batch exists but belongs to another activity.
    NotLinked {
        batch_id: String,
        activity_id: String,
    },
    Template(TemplateError),
    InvalidRequest(String),
    Store(StoreError),
    Index(IndexError),
}

impl BatchError {
    pub fn kind(&self) -> BatchErrorKind {
        match self {
            Self::NotFound { .. } => BatchErrorKind::NotFound,
            Self::NotLinked { .. } => BatchErrorKind::NotLinked,
            Self::Template(TemplateError::MissingIdentifier) | Self::InvalidRequest(_) => {
                BatchErrorKind::InvalidRequest
            }
            Self::Template(TemplateError::Serialization { .. }) => {
                BatchErrorKind::SerializationFailure
            }
            Self::Store(_) | Self::Index(_) => BatchErrorKind::Internal,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.kind().is_client_error()
    }
}

impl Display for BatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { batch_id } => write!(f, "no such batchId exists: {batch_id}"),
            Self::NotLinked {
                batch_id,
                activity_id,
            } => write!(
                f,
                "batchId {batch_id} is not linked with activityId {activity_id}"
            ),
            Self::Template(err) => write!(f, "{err}"),
            Self::InvalidRequest(message) => write!(f, "invalid request: {message}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Index(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Template(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Index(err) => Some(err),
            Self::NotFound { .. } | Self::NotLinked { .. } | Self::InvalidRequest(_) => None,
        }
    }
}

impl From<TemplateError> for BatchError {
    fn from(value: TemplateError) -> Self {
        Self::Template(value)
    }
}

impl From<StoreError> for BatchError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { batch_id, .. } => Self::NotFound { batch_id },
            other => Self::Store(other),
        }
    }
}

impl From<IndexError> for BatchError {
    fn from(value: IndexError) -> Self {
        Self::Index(value)
    }
}
