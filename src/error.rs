//! Structured error types for storage operations.

use serde::Serialize;
use std::fmt;

use crate::types::TaskId;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Opening the database file
    InvalidPath,
    OpenFailure,
    SchemaMismatch,

    // Validation errors
    MalformedDate,
    ConstraintViolation,

    // Not found errors
    TaskNotFound,

    // Internal errors
    DatabaseError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidPath => "INVALID_PATH",
            ErrorCode::OpenFailure => "OPEN_FAILURE",
            ErrorCode::SchemaMismatch => "SCHEMA_MISMATCH",
            ErrorCode::MalformedDate => "MALFORMED_DATE",
            ErrorCode::ConstraintViolation => "CONSTRAINT_VIOLATION",
            ErrorCode::TaskNotFound => "TASK_NOT_FOUND",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
        };
        f.write_str(s)
    }
}

/// Failure raised by the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database name must start with a letter and end with .worky: {path:?}")]
    InvalidPath { path: String },

    #[error("Invalid database path: {path}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("The loaded database is not compatible with this application: {reason}")]
    SchemaMismatch { reason: String },

    #[error("Invalid due date {value:?}, expected YYYY-MM-DD")]
    MalformedDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(#[source] rusqlite::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),
}

impl StorageError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StorageError::InvalidPath { .. } => ErrorCode::InvalidPath,
            StorageError::Open { .. } => ErrorCode::OpenFailure,
            StorageError::SchemaMismatch { .. } => ErrorCode::SchemaMismatch,
            StorageError::MalformedDate { .. } => ErrorCode::MalformedDate,
            StorageError::ConstraintViolation(_) => ErrorCode::ConstraintViolation,
            StorageError::TaskNotFound(_) => ErrorCode::TaskNotFound,
            StorageError::Database(_) => ErrorCode::DatabaseError,
        }
    }

    // Convenience constructors

    pub fn invalid_path(path: &str) -> Self {
        StorageError::InvalidPath {
            path: path.to_string(),
        }
    }

    pub fn schema_mismatch(reason: impl Into<String>) -> Self {
        StorageError::SchemaMismatch {
            reason: reason.into(),
        }
    }

    pub fn malformed_date(value: &str, source: chrono::ParseError) -> Self {
        StorageError::MalformedDate {
            value: value.to_string(),
            source,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => StorageError::ConstraintViolation(err),
            _ => StorageError::Database(err),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
