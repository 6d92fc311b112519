//! Tests for opening database files and validating their schema.

use rusqlite::Connection;
use tempfile::TempDir;
use worky::db::schema::{COMPLETED_TABLE, CREATE_SCHEMA, TASKS_TABLE};
use worky::{ErrorCode, Storage};

fn open_err(path: &str) -> ErrorCode {
    Storage::open(path).expect_err("open should fail").code()
}

/// Build a database file from raw DDL and try to open it.
///
/// The directory is returned so the file outlives the call.
fn open_with_ddl(ddl: &str) -> (TempDir, Result<Storage, worky::StorageError>) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("foreign.worky");
    Connection::open(&path).unwrap().execute_batch(ddl).unwrap();
    let result = Storage::open(&path);
    (dir, result)
}

mod path_tests {
    use super::*;

    #[test]
    fn empty_path_is_invalid() {
        assert_eq!(open_err(""), ErrorCode::InvalidPath);
    }

    #[test]
    fn whitespace_path_is_invalid() {
        assert_eq!(open_err(" "), ErrorCode::InvalidPath);
    }

    #[test]
    fn dot_path_is_invalid() {
        assert_eq!(open_err("."), ErrorCode::InvalidPath);
    }

    #[test]
    fn slash_path_is_invalid() {
        assert_eq!(open_err("/"), ErrorCode::InvalidPath);
    }

    #[test]
    fn wrong_suffix_is_invalid_and_not_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stuff.sqlite");

        let err = Storage::open(&path).unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidPath);
        assert!(!path.exists());
    }

    #[test]
    fn directory_path_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("folder.worky");
        std::fs::create_dir(&path).unwrap();

        assert_eq!(Storage::open(&path).unwrap_err().code(), ErrorCode::OpenFailure);
    }

    #[test]
    fn missing_parent_directory_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no/such/dir/stuff.worky");

        assert_eq!(Storage::open(&path).unwrap_err().code(), ErrorCode::OpenFailure);
    }

    #[test]
    fn non_sqlite_file_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.worky");
        std::fs::write(&path, "definitely not a database, just some plain text padding it out").unwrap();

        assert_eq!(Storage::open(&path).unwrap_err().code(), ErrorCode::OpenFailure);
    }

    #[test]
    fn unwritable_empty_file_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locked.worky");

        // A valid header with no tables, write-locked by another connection.
        let blocker = Connection::open(&path).unwrap();
        blocker
            .execute_batch("PRAGMA user_version = 1; BEGIN IMMEDIATE;")
            .unwrap();

        let err = Storage::open(&path).unwrap_err();

        assert_eq!(err.code(), ErrorCode::OpenFailure, "{err}");
        drop(blocker);
    }
}

mod create_tests {
    use super::*;

    #[test]
    fn simple_path_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stuff.worky");
        assert!(!path.is_file());

        let storage = Storage::open(&path).unwrap();

        assert!(path.is_file());
        assert_eq!(storage.path(), path.as_path());
    }

    #[test]
    fn db_in_subdirectory_creates_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("db")).unwrap();
        let path = dir.path().join("db").join("stuff.worky");

        Storage::open(&path).unwrap();

        assert!(path.is_file());
    }

    #[test]
    fn new_file_gets_both_tables() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path().join("stuff.worky")).unwrap();

        let schema = storage.schema().unwrap();
        let names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![COMPLETED_TABLE, TASKS_TABLE]);
    }

    #[test]
    fn empty_existing_file_gets_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.worky");
        std::fs::File::create(&path).unwrap();

        let storage = Storage::open(&path).unwrap();

        assert!(storage.schema().unwrap().table(TASKS_TABLE).is_some());
    }

    #[test]
    fn reopening_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stuff.worky");
        let task = Storage::open(&path)
            .unwrap()
            .create_task("persist", "2030-01-01")
            .unwrap();

        let reopened = Storage::open(&path).unwrap();

        assert_eq!(reopened.get_task(task.id).unwrap(), Some(task));
    }

    #[test]
    fn reference_schema_is_accepted() {
        let (_dir, result) = open_with_ddl(CREATE_SCHEMA);
        assert!(result.is_ok());
    }
}

mod mismatch_tests {
    use super::*;

    fn assert_mismatch(ddl: &str) {
        let (_dir, result) = open_with_ddl(ddl);
        let err = result.expect_err("schema should be rejected");
        assert_eq!(err.code(), ErrorCode::SchemaMismatch, "{err}");
    }

    const TASKS: &str = "CREATE TABLE tasks (
        id INTEGER PRIMARY KEY,
        description VARCHAR NOT NULL,
        due_date DATE NOT NULL,
        created_date DATETIME NOT NULL,
        last_updated DATETIME NOT NULL);";

    const COMPLETED: &str = "CREATE TABLE completed (
        id INTEGER PRIMARY KEY REFERENCES tasks (id) ON DELETE CASCADE,
        completed_by DATETIME NOT NULL);";

    #[test]
    fn unrelated_table_is_rejected() {
        assert_mismatch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);");
    }

    #[test]
    fn extra_table_is_rejected() {
        assert_mismatch(&format!("{TASKS}{COMPLETED}CREATE TABLE tags (name TEXT);"));
    }

    #[test]
    fn extra_table_named_like_sqlite_is_rejected() {
        assert_mismatch(&format!("{TASKS}{COMPLETED}CREATE TABLE sqlitedata (x TEXT);"));
    }

    #[test]
    fn file_with_sqlite_prefixed_table_is_not_extended() {
        let (dir, result) = open_with_ddl("CREATE TABLE sqlitexyz (a TEXT);");

        assert_eq!(result.unwrap_err().code(), ErrorCode::SchemaMismatch);

        let conn = Connection::open(dir.path().join("foreign.worky")).unwrap();
        let tasks: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'tasks'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tasks, 0);
    }

    #[test]
    fn missing_table_is_rejected() {
        assert_mismatch(TASKS);
    }

    #[test]
    fn missing_column_is_rejected() {
        assert_mismatch(&format!(
            "CREATE TABLE tasks (
                id INTEGER PRIMARY KEY,
                description VARCHAR NOT NULL,
                due_date DATE NOT NULL,
                created_date DATETIME NOT NULL);
             {COMPLETED}"
        ));
    }

    #[test]
    fn extra_column_is_rejected() {
        assert_mismatch(&format!(
            "{TASKS}
             CREATE TABLE completed (
                id INTEGER PRIMARY KEY REFERENCES tasks (id) ON DELETE CASCADE,
                completed_by DATETIME NOT NULL,
                note TEXT);"
        ));
    }

    #[test]
    fn different_primary_key_is_rejected() {
        assert_mismatch(&format!(
            "CREATE TABLE tasks (
                id INTEGER,
                description VARCHAR NOT NULL,
                due_date DATE NOT NULL,
                created_date DATETIME NOT NULL,
                last_updated DATETIME NOT NULL,
                PRIMARY KEY (id, due_date));
             {COMPLETED}"
        ));
    }

    #[test]
    fn missing_foreign_key_is_rejected() {
        assert_mismatch(&format!(
            "{TASKS}
             CREATE TABLE completed (
                id INTEGER PRIMARY KEY,
                completed_by DATETIME NOT NULL);"
        ));
    }

    #[test]
    fn foreign_key_on_wrong_column_is_rejected() {
        assert_mismatch(&format!(
            "{TASKS}
             CREATE TABLE completed (
                id INTEGER PRIMARY KEY,
                completed_by INTEGER NOT NULL REFERENCES tasks (id));"
        ));
    }

    #[test]
    fn unexpected_foreign_key_on_tasks_is_rejected() {
        assert_mismatch(&format!(
            "CREATE TABLE tasks (
                id INTEGER PRIMARY KEY REFERENCES completed (id),
                description VARCHAR NOT NULL,
                due_date DATE NOT NULL,
                created_date DATETIME NOT NULL,
                last_updated DATETIME NOT NULL);
             {COMPLETED}"
        ));
    }

    #[test]
    fn rows_are_not_inspected() {
        let ddl = format!(
            "{TASKS}{COMPLETED}
             INSERT INTO tasks VALUES (1, 'legacy', '2020-01-01', '2020-01-01 00:00:00', '2020-01-01 00:00:00');"
        );
        let (_dir, result) = open_with_ddl(&ddl);
        let storage = result.unwrap();
        assert_eq!(storage.get_overdue_tasks().unwrap().len(), 1);
    }
}
