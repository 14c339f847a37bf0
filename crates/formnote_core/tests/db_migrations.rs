use formnote_core::db::migrations::latest_version;
use formnote_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["notebooks", "columns", "cells", "templates"] {
        assert_table_exists(&conn, table);
    }
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn reopening_file_database_keeps_schema_and_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("formnote.db");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO notebooks (uuid, title, color, created_at, updated_at, is_deleted)
         VALUES ('00000000-0000-4000-8000-000000000001', 'Guests', '#4CAF50', 1, 1, 0);",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM notebooks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn deleting_notebook_row_cascades_to_grid() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO notebooks (uuid, title, color, created_at, updated_at, is_deleted)
         VALUES ('nb', 'Rooms', '#4CAF50', 1, 1, 0);
         INSERT INTO columns (notebook_id, column_index, name, width, type, is_visible, is_frozen)
         VALUES ('nb', 0, 'Room', 150.0, 'text', 1, 0);
         INSERT INTO cells (notebook_id, row_index, col_index, content, updated_at)
         VALUES ('nb', 0, 0, '101', 1);
         DELETE FROM notebooks WHERE uuid = 'nb';",
    )
    .unwrap();

    let cells: i64 = conn
        .query_row("SELECT COUNT(*) FROM cells;", [], |row| row.get(0))
        .unwrap();
    let columns: i64 = conn
        .query_row("SELECT COUNT(*) FROM columns;", [], |row| row.get(0))
        .unwrap();
    assert_eq!((cells, columns), (0, 0));
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
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
fn fresh_store_seeds_system_templates() {
    let conn = open_db_in_memory().unwrap();
    let mut stmt = conn
        .prepare("SELECT name, cols FROM templates WHERE is_system = 1 ORDER BY id;")
        .unwrap();
    let seeded = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(seeded.len(), 6);
    assert_eq!(seeded[0], ("空白表格".to_string(), 5));
    assert_eq!(seeded[1], ("日程安排".to_string(), 4));
}

#[test]
fn cell_style_columns_default_for_existing_cells() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO notebooks (uuid, title, color, created_at, updated_at, is_deleted)
         VALUES ('nb', 'Rooms', '#4CAF50', 1, 1, 0);
         INSERT INTO cells (notebook_id, row_index, col_index, content, updated_at)
         VALUES ('nb', 0, 0, '101', 1);",
    )
    .unwrap();
    let (color, bold, size, alignment): (String, i64, f64, String) = conn
        .query_row(
            "SELECT text_color, is_bold, text_size, text_alignment FROM cells;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    assert_eq!(
        (color.as_str(), bold, size, alignment.as_str()),
        ("#000000", 0, 14.0, "left")
    );
}

#[test]
fn failing_migration_reports_version_and_keeps_previous_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.db");

    // Claims version 1 but has no grid tables, so migration 2 cannot alter `cells`.
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 1;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::Migration { version, .. } => assert_eq!(version, 2),
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 1);
}

#[test]
fn concurrent_first_opens_migrate_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");

    let handles = (0..4)
        .map(|_| {
            let path = path.clone();
            std::thread::spawn(move || open_db(&path).map(|_| ()))
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let templates: i64 = conn
        .query_row("SELECT COUNT(*) FROM templates WHERE is_system = 1;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(templates, 6);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
