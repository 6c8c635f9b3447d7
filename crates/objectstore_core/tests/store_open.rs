mod common;

use common::{Contact, MIGRATIONS};
use objectstore_core::db::migrations::{latest_version, schema_version};
use objectstore_core::{
    open_store, DbError, ObjectStoreService, StoreConfig, StoreError, StoreLocation,
};
use rusqlite::Connection;

#[test]
fn in_memory_store_applies_all_migrations() {
    let conn = open_store(&StoreConfig::in_memory(), MIGRATIONS).unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version(MIGRATIONS));
    assert_table_exists(&conn, "contacts");
    assert_table_exists(&conn, "tags");
}

#[test]
fn file_store_survives_close_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::file(dir.path().join("objects.db"));

    let service = ObjectStoreService::open(&config, MIGRATIONS).unwrap();
    service.create(&Contact::new("c-1", "Alice", 30));
    service.close().unwrap();

    let reopened = ObjectStoreService::open(&config, MIGRATIONS).unwrap();
    let alice: Contact = reopened.find("c-1".to_string()).unwrap().unwrap();
    assert_eq!(alice.name, "Alice");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_store(&StoreConfig::file(&path), MIGRATIONS).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version(MIGRATIONS));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn service_open_wraps_bootstrap_failures() {
    let broken = [objectstore_core::Migration::new(1, "CREATE TABLE (;")];

    let result = ObjectStoreService::open(&StoreConfig::in_memory(), &broken);
    assert!(matches!(result, Err(StoreError::Db(DbError::Sqlite(_)))));
}

#[test]
fn foreign_keys_follow_config() {
    let mut config = StoreConfig::in_memory();
    config.foreign_keys = false;

    let conn = open_store(&config, MIGRATIONS).unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 0);
}

#[test]
fn config_parses_from_partial_json() {
    let config: StoreConfig = serde_json::from_str(
        r#"{"location": {"kind": "file", "path": "/var/lib/app/objects.db"}, "busy_timeout_ms": 250}"#,
    )
    .unwrap();

    assert_eq!(
        config.location,
        StoreLocation::File {
            path: "/var/lib/app/objects.db".into()
        }
    );
    assert_eq!(config.busy_timeout_ms, 250);
    assert!(config.foreign_keys);

    let defaults: StoreConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(defaults, StoreConfig::default());
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
