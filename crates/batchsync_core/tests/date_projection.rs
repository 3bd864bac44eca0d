use batchsync_core::db::open_db_in_memory;
use batchsync_core::{
    project_for_column_store, project_for_index, ActivityBatch, ActivityBatchService, BatchIndex,
    BatchStore, ColumnValue, DateNormalizer, SqliteBatchIndex, SqliteBatchStore,
};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde_json::{json, Value};

fn kolkata() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
}

fn utc(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
}

fn batch_with_dates() -> ActivityBatch {
    let mut batch = ActivityBatch::with_id("A1", "B1");
    batch.start_date = Some(utc("2024-03-10T20:00:00.123456Z"));
    batch.end_date = Some(utc("2024-03-10T20:00:00Z"));
    batch.created_date = Some(utc("2024-03-01T08:15:30.250Z"));
    batch
}

#[test]
fn end_of_day_fields_pin_to_local_calendar_day() {
    let normalizer = DateNormalizer::new(kolkata(), "%Y-%m-%d").unwrap();
    let projected = project_for_column_store(&batch_with_dates(), &normalizer).unwrap();

    let expected = kolkata()
        .with_ymd_and_hms(2024, 3, 11, 23, 59, 59)
        .unwrap()
        + chrono::Duration::milliseconds(999);
    assert_eq!(projected.row.timestamp("endDate"), Some(expected));
    assert!(projected.is_complete());
}

#[test]
fn other_dates_keep_their_time_at_millisecond_precision() {
    let normalizer = DateNormalizer::new(kolkata(), "%Y-%m-%d").unwrap();
    let projected = project_for_column_store(&batch_with_dates(), &normalizer).unwrap();

    let start = projected.row.timestamp("startDate").unwrap();
    assert_eq!(start.with_timezone(&Utc), utc("2024-03-10T20:00:00.123Z"));
    assert_eq!(start.offset(), &kolkata());

    let created = projected.row.timestamp("createdDate").unwrap();
    assert_eq!(created.with_timezone(&Utc), utc("2024-03-01T08:15:30.250Z"));
}

#[test]
fn absent_dates_pass_through_as_null() {
    let normalizer = DateNormalizer::new(kolkata(), "%d/%m/%Y").unwrap();
    let batch = ActivityBatch::with_id("A1", "B1");

    let projected = project_for_column_store(&batch, &normalizer).unwrap();
    assert_eq!(projected.row.get("enrollmentEndDate"), Some(&ColumnValue::Null));
    assert!(projected.is_complete());

    let document = project_for_index(&batch, &normalizer);
    assert_eq!(document["enrollmentEndDate"], Value::Null);
    assert_eq!(document["updatedDate"], Value::Null);
}

#[test]
fn index_renders_each_bucket_in_process_timezone() {
    let normalizer = DateNormalizer::new(kolkata(), "%d/%m/%Y").unwrap();
    let document = project_for_index(&batch_with_dates(), &normalizer);

    assert_eq!(document["createdDate"], json!("2024-03-01 13:45:30:250+0530"));
    assert_eq!(document["startDate"], json!("11/03/2024"));
    assert_eq!(document["endDate"], json!("11/03/2024"));
}

#[test]
fn pattern_without_calendar_day_fails_only_end_of_day_fields() {
    let normalizer = DateNormalizer::new(kolkata(), "%H:%M").unwrap();
    let mut batch = batch_with_dates();
    batch.enrollment_end_date = Some(utc("2024-03-05T00:00:00Z"));

    let projected = project_for_column_store(&batch, &normalizer).unwrap();
    let failed = projected
        .failures
        .iter()
        .map(|failure| failure.field)
        .collect::<Vec<_>>();
    assert_eq!(failed, vec!["endDate", "enrollmentEndDate"]);

    // Failed fields keep the last good value: the normalized instant.
    let end = projected.row.timestamp("endDate").unwrap();
    assert_eq!(end.with_timezone(&Utc), utc("2024-03-10T20:00:00Z"));
    assert!(projected.row.timestamp("startDate").is_some());
}

#[test]
fn save_reports_date_failures_and_still_writes_both_stores() {
    let column = open_db_in_memory().unwrap();
    let index = open_db_in_memory().unwrap();
    let service = ActivityBatchService::new(
        SqliteBatchStore::new(&column),
        SqliteBatchIndex::new(&index),
        DateNormalizer::new(kolkata(), "%H:%M").unwrap(),
    );

    let response = service.save_batch(&batch_with_dates()).unwrap();
    assert_eq!(response.date_failures, vec!["endDate".to_string()]);

    let stored = service.store().read_by_id("A1", "B1").unwrap().unwrap();
    assert_eq!(stored.end_date, Some(utc("2024-03-10T20:00:00Z")));
    let document = service.index().get_by_identifier("B1").unwrap().unwrap();
    assert_eq!(document["endDate"], json!("01:30"));
}

#[test]
fn stored_dates_round_trip_through_sqlite_text() {
    let column = open_db_in_memory().unwrap();
    let index = open_db_in_memory().unwrap();
    let service = ActivityBatchService::new(
        SqliteBatchStore::new(&column),
        SqliteBatchIndex::new(&index),
        DateNormalizer::new(kolkata(), "%Y-%m-%d").unwrap(),
    );

    let response = service.save_batch(&batch_with_dates()).unwrap();
    assert!(response.date_failures.is_empty());

    let raw_end: String = column
        .query_row(
            "SELECT end_date FROM activity_batch WHERE batch_id = 'B1';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(raw_end, "2024-03-11 23:59:59:999+0530");

    let stored = service.store().read_by_id("A1", "B1").unwrap().unwrap();
    assert_eq!(stored.end_date, Some(utc("2024-03-11T18:29:59.999Z")));
    assert_eq!(stored.start_date, Some(utc("2024-03-10T20:00:00.123Z")));
    assert_eq!(stored.enrollment_end_date, None);
}
