//! Core logic for activity batch synchronization.
//! Keeps the column store and the batch index consistent for certificate
//! template attach/detach, date normalization and foreground index sync.

pub mod certificate;
pub mod command;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod projection;
pub mod search;
pub mod service;
pub mod store;

pub use certificate::template::{FlatTemplate, TemplateError};
pub use command::{
    AttachCertificateRequest, BatchCommand, BatchResponse, CertificateResponse,
    RemoveCertificateRequest, SaveBatchResponse, SyncForegroundRequest, SyncResponse, SUCCESS,
};
pub use config::{ConfigError, SyncConfig};
pub use dates::normalizer::{DateNormalizer, DateTransformError};
pub use error::{BatchError, BatchErrorKind, BatchResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::batch::{ActivityBatch, TemplateId, TemplateRecord};
pub use projection::index::{project_for_index, IndexDocument};
pub use projection::row::{project_for_column_store, BatchRow, ColumnValue, ProjectedRow};
pub use search::index::{BatchIndex, IndexError, IndexResult, SqliteBatchIndex};
pub use service::batch_service::ActivityBatchService;
pub use store::batch_store::{BatchStore, SqliteBatchStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
