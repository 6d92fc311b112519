//! Schema definition, introspection and compatibility checks.

use super::Storage;
use crate::error::{StorageError, StorageResult};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const TASKS_TABLE: &str = "tasks";
pub const COMPLETED_TABLE: &str = "completed";

/// DDL for a fresh database.
pub const CREATE_SCHEMA: &str = "
    CREATE TABLE tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        description VARCHAR NOT NULL,
        due_date DATE NOT NULL,
        created_date DATETIME NOT NULL,
        last_updated DATETIME NOT NULL
    );
    CREATE TABLE completed (
        id INTEGER NOT NULL PRIMARY KEY REFERENCES tasks (id) ON DELETE CASCADE,
        completed_by DATETIME NOT NULL
    );
";

/// Information about a table column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    /// 1-based position within the primary key, 0 when not part of it.
    pub primary_key: i32,
}

/// Information about a foreign key constraint (possibly spanning several columns).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub referred_table: String,
    pub constrained_columns: Vec<String>,
    pub referred_columns: Vec<String>,
    pub on_delete: String,
}

/// Information about a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

/// Complete database schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub tables: Vec<TableInfo>,
    pub sqlite_version: String,
}

impl DatabaseSchema {
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }
}

struct ExpectedForeignKey {
    referred_table: &'static str,
    constrained_columns: &'static [&'static str],
    referred_columns: &'static [&'static str],
}

struct ExpectedTable {
    name: &'static str,
    columns: &'static [&'static str],
    primary_key: &'static [&'static str],
    foreign_keys: &'static [ExpectedForeignKey],
}

const EXPECTED_TABLES: &[ExpectedTable] = &[
    ExpectedTable {
        name: TASKS_TABLE,
        columns: &["id", "description", "due_date", "created_date", "last_updated"],
        primary_key: &["id"],
        foreign_keys: &[],
    },
    ExpectedTable {
        name: COMPLETED_TABLE,
        columns: &["id", "completed_by"],
        primary_key: &["id"],
        foreign_keys: &[ExpectedForeignKey {
            referred_table: TASKS_TABLE,
            constrained_columns: &["id"],
            referred_columns: &["id"],
        }],
    },
];

impl Storage {
    /// Get complete schema information for the database.
    pub fn schema(&self) -> StorageResult<DatabaseSchema> {
        self.with_session(|conn| Ok(read_schema(conn)?))
    }
}

/// Names of the user tables, excluding SQLite's internal `sqlite_*` tables.
///
/// `_` is escaped: it is a LIKE wildcard and would also hide e.g. `sqlitedata`.
pub fn table_names(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r"SELECT name FROM sqlite_master
         WHERE type = 'table'
         AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
         ORDER BY name",
    )?;

    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(names)
}

pub fn read_schema(conn: &Connection) -> rusqlite::Result<DatabaseSchema> {
    let sqlite_version: String = conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;

    let mut tables = Vec::new();
    for name in table_names(conn)? {
        tables.push(read_table(conn, name)?);
    }

    Ok(DatabaseSchema {
        tables,
        sqlite_version,
    })
}

fn read_table(conn: &Connection, name: String) -> rusqlite::Result<TableInfo> {
    let columns = table_columns(conn, &name)?;

    let mut pk: Vec<&ColumnInfo> = columns.iter().filter(|c| c.primary_key > 0).collect();
    pk.sort_by_key(|c| c.primary_key);
    let primary_key = pk.into_iter().map(|c| c.name.clone()).collect();

    let foreign_keys = table_foreign_keys(conn, &name)?;

    Ok(TableInfo {
        name,
        columns,
        primary_key,
        foreign_keys,
    })
}

fn table_columns(conn: &Connection, table_name: &str) -> rusqlite::Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare("SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1)")?;

    let columns = stmt
        .query_map([table_name], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                data_type: row.get::<_, String>(1)?.to_uppercase(),
                nullable: row.get::<_, i32>(2)? == 0,
                primary_key: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(columns)
}

fn table_foreign_keys(conn: &Connection, table_name: &str) -> rusqlite::Result<Vec<ForeignKeyInfo>> {
    let mut stmt = conn.prepare(
        "SELECT id, \"table\", \"from\", \"to\", on_delete
         FROM pragma_foreign_key_list(?1)
         ORDER BY id, seq",
    )?;

    let rows = stmt
        .query_map([table_name], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    // One row per column; rows sharing an id form a single constraint.
    let mut keys: Vec<(i64, ForeignKeyInfo)> = Vec::new();
    for (id, referred_table, from, to, on_delete) in rows {
        match keys.last_mut() {
            Some((last_id, fk)) if *last_id == id => {
                fk.constrained_columns.push(from);
                fk.referred_columns.extend(to);
            }
            _ => keys.push((
                id,
                ForeignKeyInfo {
                    referred_table,
                    constrained_columns: vec![from],
                    referred_columns: to.into_iter().collect(),
                    on_delete,
                },
            )),
        }
    }

    Ok(keys.into_iter().map(|(_, fk)| fk).collect())
}

/// Check that a schema has exactly the expected tables, columns and keys.
///
/// Column order is irrelevant. Indexes, column types and row data are not
/// inspected.
pub fn validate(schema: &DatabaseSchema) -> StorageResult<()> {
    let expected: BTreeSet<&str> = EXPECTED_TABLES.iter().map(|t| t.name).collect();
    let found: BTreeSet<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    if expected != found {
        return Err(StorageError::schema_mismatch(format!(
            "expected tables {:?}, found {:?}",
            expected, found
        )));
    }

    for table in EXPECTED_TABLES {
        let Some(info) = schema.table(table.name) else {
            return Err(StorageError::schema_mismatch(format!("missing table {}", table.name)));
        };
        validate_table(table, info)?;
    }

    Ok(())
}

fn validate_table(expected: &ExpectedTable, info: &TableInfo) -> StorageResult<()> {
    let columns: Vec<&str> = info.columns.iter().map(|c| c.name.as_str()).collect();
    if !same_elements(expected.columns, &columns) {
        return Err(StorageError::schema_mismatch(format!(
            "table {} has columns {:?}",
            info.name, columns
        )));
    }

    let primary_key: Vec<&str> = info.primary_key.iter().map(String::as_str).collect();
    if !same_elements(expected.primary_key, &primary_key) {
        return Err(StorageError::schema_mismatch(format!(
            "table {} has primary key {:?}",
            info.name, primary_key
        )));
    }

    if expected.foreign_keys.len() != info.foreign_keys.len() {
        return Err(StorageError::schema_mismatch(format!(
            "table {} has {} foreign keys, expected {}",
            info.name,
            info.foreign_keys.len(),
            expected.foreign_keys.len()
        )));
    }

    for expected_fk in expected.foreign_keys {
        let matching = info.foreign_keys.iter().find(|fk| {
            fk.referred_table == expected_fk.referred_table
                && same_elements(expected_fk.constrained_columns, &as_strs(&fk.constrained_columns))
                && same_elements(expected_fk.referred_columns, &as_strs(&fk.referred_columns))
        });
        if matching.is_none() {
            return Err(StorageError::schema_mismatch(format!(
                "table {} lacks foreign key {:?} -> {}{:?}",
                info.name,
                expected_fk.constrained_columns,
                expected_fk.referred_table,
                expected_fk.referred_columns
            )));
        }
    }

    Ok(())
}

fn as_strs(v: &[String]) -> Vec<&str> {
    v.iter().map(String::as_str).collect()
}

/// Same length and every expected element present.
fn same_elements(expected: &[&str], found: &[&str]) -> bool {
    expected.len() == found.len() && expected.iter().all(|e| found.contains(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_schema() -> DatabaseSchema {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(CREATE_SCHEMA).unwrap();
        read_schema(&conn).unwrap()
    }

    #[test]
    fn fresh_schema_is_valid() {
        let schema = fresh_schema();
        validate(&schema).unwrap();
        assert!(!schema.sqlite_version.is_empty());
    }

    #[test]
    fn internal_tables_are_hidden() {
        // AUTOINCREMENT creates sqlite_sequence.
        let schema = fresh_schema();
        let names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["completed", "tasks"]);
    }

    #[test]
    fn tables_starting_with_sqlite_are_listed() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE sqlitedata (x TEXT);").unwrap();
        assert_eq!(table_names(&conn).unwrap(), vec!["sqlitedata"]);
    }

    #[test]
    fn completed_foreign_key_is_introspected() {
        let schema = fresh_schema();
        let completed = schema.table(COMPLETED_TABLE).unwrap();
        assert_eq!(completed.primary_key, vec!["id"]);
        assert_eq!(completed.foreign_keys.len(), 1);
        let fk = &completed.foreign_keys[0];
        assert_eq!(fk.referred_table, "tasks");
        assert_eq!(fk.constrained_columns, vec!["id"]);
        assert_eq!(fk.referred_columns, vec!["id"]);
        assert_eq!(fk.on_delete, "CASCADE");
    }

    #[test]
    fn column_order_does_not_matter() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE tasks (
                 last_updated DATETIME NOT NULL,
                 description VARCHAR NOT NULL,
                 id INTEGER PRIMARY KEY,
                 created_date DATETIME NOT NULL,
                 due_date DATE NOT NULL
             );
             CREATE TABLE completed (
                 completed_by DATETIME NOT NULL,
                 id INTEGER PRIMARY KEY REFERENCES tasks (id)
             );",
        )
        .unwrap();
        validate(&read_schema(&conn).unwrap()).unwrap();
    }

    #[test]
    fn composite_foreign_keys_are_grouped() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE parent (a INTEGER, b INTEGER, PRIMARY KEY (a, b));
             CREATE TABLE child (x INTEGER, y INTEGER,
                 FOREIGN KEY (x, y) REFERENCES parent (a, b));",
        )
        .unwrap();
        let schema = read_schema(&conn).unwrap();
        let parent = schema.table("parent").unwrap();
        assert_eq!(parent.primary_key, vec!["a", "b"]);
        let child = schema.table("child").unwrap();
        assert_eq!(child.foreign_keys.len(), 1);
        assert_eq!(child.foreign_keys[0].constrained_columns, vec!["x", "y"]);
        assert_eq!(child.foreign_keys[0].referred_columns, vec!["a", "b"]);
    }

    #[test]
    fn same_elements_checks_length() {
        assert!(same_elements(&["a", "b"], &["b", "a"]));
        assert!(!same_elements(&["a"], &["a", "a"]));
        assert!(!same_elements(&["a", "b"], &["a"]));
    }
}
