//! Worky task tracker library
//!
//! This module exports the storage core and the command-line glue around it.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod types;

pub use db::Storage;
pub use error::{ErrorCode, StorageError, StorageResult};
pub use types::{CompletedTask, CompletionRecord, Task, TaskId, TaskState};
