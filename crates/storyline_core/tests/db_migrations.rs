use rusqlite::Connection;
use storyline_core::db::migrations::{apply_migrations, latest_version, step_name};
use storyline_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "project_meta");
    assert_table_exists(&conn, "tree_entries");
}

#[test]
fn reopening_a_project_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("novel.storyline");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO project_meta (key, value) VALUES ('title', 'Kept');",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let title: String = second
        .query_row("SELECT value FROM project_meta WHERE key = 'title';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(title, "Kept");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.storyline");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 42);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn fresh_project_file_runs_named_schema_steps() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = Connection::open(dir.path().join("fresh.storyline")).unwrap();

    let applied = apply_migrations(&mut conn).unwrap();
    assert_eq!(applied.len() as u32, latest_version());
    assert_eq!(applied[0].name, "project_tree");
    assert_eq!(step_name(applied[0].version), Some("project_tree"));
    assert!(apply_migrations(&mut conn).unwrap().is_empty());
}

#[test]
fn failed_schema_step_names_the_step_and_keeps_old_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clash.storyline");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE VIEW tree_entries AS SELECT 1 AS row_seq;")
        .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaStep { version, name, .. } => {
            assert_eq!(version, 1);
            assert_eq!(name, "project_tree");
        }
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
}

#[test]
fn unreachable_project_path_is_reported_with_its_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("novel.storyline");

    let err = open_db(&path).unwrap_err();
    match &err {
        DbError::Open { location, .. } => assert_eq!(location, &path.display().to_string()),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("novel.storyline"));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "missing table `{table}`");
}
