use batchsync_core::db::migrations::latest_version;
use batchsync_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "activity_batch");
    assert_table_exists(&conn, "activity_batch_index");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batches.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    conn_first
        .execute(
            "INSERT INTO activity_batch (activity_id, batch_id) VALUES ('A1', 'B1');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let templates: String = conn_second
        .query_row(
            "SELECT cert_templates FROM activity_batch WHERE batch_id = 'B1';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(templates, "{}");
}

#[test]
fn batch_key_is_activity_and_batch_id() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO activity_batch (activity_id, batch_id) VALUES ('A1', 'B1');",
        [],
    )
    .unwrap();

    let duplicate = conn.execute(
        "INSERT INTO activity_batch (activity_id, batch_id) VALUES ('A1', 'B1');",
        [],
    );
    assert!(duplicate.is_err());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
