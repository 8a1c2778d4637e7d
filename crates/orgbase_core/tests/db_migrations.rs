use orgbase_core::db::migrations::latest_version;
use orgbase_core::db::{ensure_schema, open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "tree_nodes");
    assert_table_exists(&conn, "organizations");
    assert_table_exists(&conn, "users");
    assert_table_exists(&conn, "user_followed_organizations");
    assert_table_exists(&conn, "app_settings");
}

#[test]
fn open_db_enables_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orgbase.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "tree_nodes");
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

#[test]
fn repositories_reject_connection_below_latest_version() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE app_settings (id INTEGER PRIMARY KEY);
         PRAGMA user_version = 1;",
    )
    .unwrap();

    let err = ensure_schema(&conn, "app_settings", &["id"]).unwrap_err();
    match err {
        DbError::UninitializedConnection {
            expected_version,
            actual_version,
        } => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ensure_schema_reports_missing_column() {
    let conn = open_db_in_memory().unwrap();
    let err = ensure_schema(&conn, "organizations", &["uuid", "parent_uuid"]).unwrap_err();
    assert!(matches!(
        err,
        DbError::MissingRequiredColumn {
            table: "organizations",
            column: "parent_uuid"
        }
    ));
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
