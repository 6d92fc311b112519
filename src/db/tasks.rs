//! Task CRUD and categorized listings.

use super::Storage;
use crate::error::{StorageError, StorageResult};
use crate::types::{
    CompletedTask, CompletionRecord, Task, TaskId, now_utc, parse_due_date, today,
};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

const TASK_COLUMNS: &str = "t.id, t.description, t.due_date, t.created_date, t.last_updated";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        created_date: row.get("created_date")?,
        last_updated: row.get("last_updated")?,
    })
}

fn parse_completed_row(row: &Row) -> rusqlite::Result<CompletedTask> {
    let task = parse_task_row(row)?;
    let completion = CompletionRecord {
        id: task.id,
        completed_by: row.get("completed_by")?,
    };
    Ok(CompletedTask { task, completion })
}

/// Internal helper to get a task using an existing connection.
fn get_task_internal(conn: &Connection, task_id: TaskId) -> StorageResult<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1"),
            params![task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

/// Incomplete tasks whose due date compares to `today` with `op`, earliest first.
fn incomplete_tasks(conn: &Connection, op: &str, today: NaiveDate) -> StorageResult<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks t
         LEFT OUTER JOIN completed c ON t.id = c.id
         WHERE c.id IS NULL AND t.due_date {op} ?1
         ORDER BY t.due_date"
    ))?;

    let tasks = stmt
        .query_map(params![today], parse_task_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tasks)
}

impl Storage {
    /// Create a new task due on `due_date` (`YYYY-MM-DD`).
    pub fn create_task(&self, description: &str, due_date: &str) -> StorageResult<Task> {
        let due_date = parse_due_date(due_date)?;
        let now = now_utc();

        let task = self.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO tasks (description, due_date, created_date, last_updated)
                 VALUES (?1, ?2, ?3, ?4)",
                params![description, due_date, now, now],
            )?;

            Ok(Task {
                id: tx.last_insert_rowid(),
                description: description.to_string(),
                due_date,
                created_date: now,
                last_updated: now,
            })
        })?;

        debug!(task_id = task.id, due_date = %task.due_date, "Created task");
        Ok(task)
    }

    /// Overwrite the description and due date of an existing task.
    ///
    /// Fails with [`StorageError::TaskNotFound`] when no task has `task_id`.
    pub fn update_task(
        &self,
        task_id: TaskId,
        description: &str,
        due_date: &str,
    ) -> StorageResult<Task> {
        let due_date = parse_due_date(due_date)?;

        let task = self.with_transaction(|tx| {
            let mut task =
                get_task_internal(tx, task_id)?.ok_or(StorageError::TaskNotFound(task_id))?;

            task.description = description.to_string();
            task.due_date = due_date;
            task.last_updated = now_utc();

            tx.execute(
                "UPDATE tasks SET description = ?2, due_date = ?3, last_updated = ?4 WHERE id = ?1",
                params![task.id, task.description, task.due_date, task.last_updated],
            )?;

            Ok(task)
        })?;

        debug!(task_id, "Updated task");
        Ok(task)
    }

    /// Delete a task and, by cascade, its completion record.
    ///
    /// Returns whether a task was removed; a missing id is not an error.
    pub fn delete_task(&self, task_id: TaskId) -> StorageResult<bool> {
        let deleted = self.with_transaction(|tx| {
            let rows = tx.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            Ok(rows > 0)
        })?;

        debug!(task_id, deleted, "Deleted task");
        Ok(deleted)
    }

    /// Record a task as completed now.
    ///
    /// The task's existence is enforced by the foreign key: an unknown id (or
    /// a task completed twice) fails with [`StorageError::ConstraintViolation`].
    pub fn complete_task(&self, task_id: TaskId) -> StorageResult<CompletionRecord> {
        let record = CompletionRecord {
            id: task_id,
            completed_by: now_utc(),
        };

        self.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO completed (id, completed_by) VALUES (?1, ?2)",
                params![record.id, record.completed_by],
            )?;
            Ok(())
        })?;

        debug!(task_id, "Completed task");
        Ok(record)
    }

    /// Get a task by id. Completion state is not included.
    pub fn get_task(&self, task_id: TaskId) -> StorageResult<Option<Task>> {
        self.with_session(|conn| get_task_internal(conn, task_id))
    }

    /// Whether a completion record exists for `task_id`.
    pub fn is_completed(&self, task_id: TaskId) -> StorageResult<bool> {
        self.with_session(|conn| {
            let completed = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM completed WHERE id = ?1)",
                params![task_id],
                |row| row.get(0),
            )?;
            Ok(completed)
        })
    }

    /// Incomplete tasks due today or later, earliest due date first.
    pub fn get_active_tasks(&self) -> StorageResult<Vec<Task>> {
        self.get_active_tasks_on(today())
    }

    /// Incomplete tasks whose due date has passed, earliest due date first.
    pub fn get_overdue_tasks(&self) -> StorageResult<Vec<Task>> {
        self.get_overdue_tasks_on(today())
    }

    pub fn get_active_tasks_on(&self, today: NaiveDate) -> StorageResult<Vec<Task>> {
        self.with_session(|conn| incomplete_tasks(conn, ">=", today))
    }

    pub fn get_overdue_tasks_on(&self, today: NaiveDate) -> StorageResult<Vec<Task>> {
        self.with_session(|conn| incomplete_tasks(conn, "<", today))
    }

    /// Completed tasks with their completion records, most recent first.
    pub fn get_completed_tasks(&self) -> StorageResult<Vec<CompletedTask>> {
        self.with_session(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS}, c.completed_by FROM tasks t
                 JOIN completed c ON t.id = c.id
                 ORDER BY c.completed_by DESC"
            ))?;

            let tasks = stmt
                .query_map([], parse_completed_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(tasks)
        })
    }
}
