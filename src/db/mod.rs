//! Storage layer for the task tracker.

pub mod schema;
pub mod tasks;

use crate::error::{StorageError, StorageResult};
use regex_lite::Regex;
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Required shape of a database file name.
static DB_PATH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]\w*\.worky$").expect("valid database path pattern"));

/// Handle to a task database file.
///
/// Holds no open connection: every operation opens its own connection,
/// runs, and closes it again.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Open or create the database at the given path.
    ///
    /// A new (or empty) file gets the schema; an existing file must match it.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy().into_owned();

        if !is_valid_db_path(&path_str) {
            return Err(StorageError::invalid_path(&path_str));
        }

        let storage = Self {
            path: path.to_path_buf(),
        };

        // Any SQLite failure before validation means the file cannot be used.
        let found = storage
            .prepare_schema(&path_str)
            .map_err(|source| StorageError::Open {
                path: path_str.clone(),
                source,
            })?;

        if let Err(e) = schema::validate(&found) {
            warn!(path = %path_str, error = %e, "Database schema mismatch");
            return Err(e);
        }

        debug!(path = %path_str, "Opened task database");
        Ok(storage)
    }

    /// Create the schema in a file without user tables, then read it back.
    fn prepare_schema(&self, path_str: &str) -> rusqlite::Result<schema::DatabaseSchema> {
        let mut conn = self.connect()?;

        if schema::table_names(&conn)?.is_empty() {
            let tx = conn.transaction()?;
            tx.execute_batch(schema::CREATE_SCHEMA)?;
            tx.commit()?;
            info!(path = %path_str, "Created task database");
        }

        schema::read_schema(&conn)
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        Ok(conn)
    }

    /// Run a read-only function on a fresh connection.
    pub(crate) fn with_session<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    /// Run a function as one unit of work.
    ///
    /// Commits when `f` succeeds. On error the transaction is dropped, which
    /// rolls it back, and the error is returned unchanged.
    pub(crate) fn with_transaction<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> StorageResult<T>,
    {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Whether `path` names a `.worky` file starting with a letter.
pub fn is_valid_db_path(path: &str) -> bool {
    DB_PATH_PATTERN.is_match(path)
}
