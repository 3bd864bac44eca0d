use batchsync_core::db::open_db_in_memory;
use batchsync_core::{
    ActivityBatchService, BatchCommand, BatchErrorKind, BatchIndex, BatchResponse, BatchStore,
    DateNormalizer, SqliteBatchIndex, SqliteBatchStore,
};
use serde_json::{json, Value};

fn command(value: Value) -> BatchCommand {
    serde_json::from_value(value).unwrap()
}

#[test]
fn full_lifecycle_through_tagged_commands() {
    let column = open_db_in_memory().unwrap();
    let index = open_db_in_memory().unwrap();
    let service = ActivityBatchService::new(
        SqliteBatchStore::new(&column),
        SqliteBatchIndex::new(&index),
        DateNormalizer::utc(),
    );

    let saved = service
        .handle(command(json!({
            "operation": "saveActivityBatch",
            "request": {
                "activityId": "A1",
                "batchId": "B1",
                "name": "Evening batch",
                "endDate": "2024-06-30T10:00:00Z"
            }
        })))
        .unwrap();
    assert!(matches!(saved, BatchResponse::Saved(ref response) if response.batch_id == "B1"));

    let attached = service
        .handle(command(json!({
            "operation": "addCertificateToActivityBatch",
            "request": {
                "activityId": "A1",
                "batchId": "B1",
                "template": {"identifier": "T1", "previewUrl": "http://x/y"},
                "requestedBy": "admin"
            }
        })))
        .unwrap();
    assert_eq!(
        serde_json::to_value(&attached).unwrap(),
        json!({"response": "SUCCESS", "batchId": "B1", "activityId": "A1"})
    );

    service
        .handle(command(json!({
            "operation": "removeCertificateFromActivityBatch",
            "request": {"activityId": "A1", "batchId": "B1", "templateId": "T1"}
        })))
        .unwrap();

    let stored = service.store().read_by_id("A1", "B1").unwrap().unwrap();
    assert!(stored.cert_templates.is_empty());
    assert_eq!(stored.name.as_deref(), Some("Evening batch"));

    let document = service.index().get_by_identifier("B1").unwrap().unwrap();
    assert_eq!(document["endDate"], json!("2024-06-30"));
    assert_eq!(document["certTemplates"], json!({}));
}

#[test]
fn foreground_sync_command_returns_stored_id() {
    let column = open_db_in_memory().unwrap();
    let index = open_db_in_memory().unwrap();
    let service = ActivityBatchService::new(
        SqliteBatchStore::new(&column),
        SqliteBatchIndex::new(&index),
        DateNormalizer::utc(),
    );

    let response = service
        .handle(command(json!({
            "operation": "syncActivityBatchForeground",
            "request": {
                "uniqueId": "B9",
                "document": {"batchId": "B9", "activityId": "A9"}
            }
        })))
        .unwrap();

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"response": "SUCCESS", "id": "B9"})
    );
    assert!(service.index().get_by_identifier("B9").unwrap().is_some());
}

#[test]
fn failed_commands_surface_error_kind() {
    let column = open_db_in_memory().unwrap();
    let index = open_db_in_memory().unwrap();
    let service = ActivityBatchService::new(
        SqliteBatchStore::new(&column),
        SqliteBatchIndex::new(&index),
        DateNormalizer::utc(),
    );

    let err = service
        .handle(command(json!({
            "operation": "addCertificateToActivityBatch",
            "request": {
                "activityId": "A1",
                "batchId": "B404",
                "template": {"identifier": "T1"}
            }
        })))
        .unwrap_err();
    assert_eq!(err.kind(), BatchErrorKind::NotFound);
    assert!(err.is_client_error());
}
