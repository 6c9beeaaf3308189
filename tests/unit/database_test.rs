//! Unit tests for the DocsFocus database layer (connection + migrations).

use docsfocus::database::migrations::{get_schema_version, run_all, CURRENT_SCHEMA_VERSION};
use docsfocus::database::Database;
use tempfile::TempDir;

#[test]
fn test_open_in_memory_succeeds() {
    let db = Database::open_in_memory();
    assert!(db.is_ok(), "open_in_memory should succeed");
}

#[test]
fn test_migrations_create_entry_table() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let conn = db.connection();

    for table in ["schema_version", "kv_entries"] {
        let exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
                |row| row.get(0),
            )
            .unwrap_or(false);
        assert!(exists, "Table '{}' should exist after migrations", table);
    }
}

#[test]
fn test_schema_version_is_current() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_migrations_are_idempotent() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    run_all(db.connection()).expect("second run should succeed");
    run_all(db.connection()).expect("third run should succeed");
    let rows: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, CURRENT_SCHEMA_VERSION as i64);
}

#[test]
fn test_open_creates_parent_directories() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let path = tmp.path().join("nested").join("deeper").join("docsfocus.db");
    let db = Database::open(&path);
    assert!(db.is_ok());
    assert!(path.exists());
}

#[test]
fn test_entries_survive_reopen() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let path = tmp.path().join("docsfocus.db");
    {
        let db = Database::open(&path).unwrap();
        db.connection()
            .execute(
                "INSERT INTO kv_entries (area, key, value, updated_at) VALUES ('sync', 'k', '1', 0)",
                [],
            )
            .unwrap();
    }
    let db = Database::open(&path).unwrap();
    let value: String = db
        .connection()
        .query_row("SELECT value FROM kv_entries WHERE area='sync' AND key='k'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(value, "1");
}
