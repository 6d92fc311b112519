//! Core types for the task tracker.

use chrono::{Duration, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Task identifier, assigned by the database on creation.
pub type TaskId = i64;

/// Format of due dates on the wire and in the database.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// A task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub due_date: NaiveDate,
    pub created_date: NaiveDateTime,
    pub last_updated: NaiveDateTime,
}

impl Task {
    /// Due date rendered back in `YYYY-MM-DD` form.
    pub fn due_date_string(&self) -> String {
        format_due_date(self.due_date)
    }
}

/// Marks a task as done. Shares its id with the completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: TaskId,
    pub completed_by: NaiveDateTime,
}

/// A completed task paired with its completion record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTask {
    pub task: Task,
    pub completion: CompletionRecord,
}

/// Derived state of a task. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Active,
    Overdue,
    Completed,
}

impl TaskState {
    /// Classify a task by its due date and whether a completion record exists.
    pub fn derive(due_date: NaiveDate, completed: bool, today: NaiveDate) -> Self {
        if completed {
            TaskState::Completed
        } else if due_date < today {
            TaskState::Overdue
        } else {
            TaskState::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Active => "active",
            TaskState::Overdue => "overdue",
            TaskState::Completed => "completed",
        }
    }
}

/// Parse a `YYYY-MM-DD` due date.
pub fn parse_due_date(value: &str) -> StorageResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DUE_DATE_FORMAT)
        .map_err(|e| StorageError::malformed_date(value, e))
}

pub fn format_due_date(date: NaiveDate) -> String {
    date.format(DUE_DATE_FORMAT).to_string()
}

/// Current UTC calendar date.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Current UTC time truncated to whole seconds.
pub fn now_utc() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(0)
}

/// Due date suggested for new tasks when none is given.
pub fn default_due_date(days_ahead: i64) -> NaiveDate {
    today() + Duration::days(days_ahead)
}
