//! CLI command definitions for worky
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod commands;

use crate::format::OutputFormat;
use crate::types::TaskId;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Worky task tracker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database file; must end in .worky (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Which group of tasks to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ListFilter {
    /// Overdue, active and completed tasks
    #[default]
    All,
    /// Incomplete tasks due today or later
    Active,
    /// Incomplete tasks past their due date
    Overdue,
    /// Completed tasks, most recent first
    Completed,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a task
    Add {
        description: String,

        /// Due date as YYYY-MM-DD (default: two weeks from today, see config)
        #[arg(long)]
        due: Option<String>,
    },

    /// Replace the description and due date of a task
    Update {
        id: TaskId,
        description: String,

        /// Due date as YYYY-MM-DD
        #[arg(long)]
        due: String,
    },

    /// Delete a task and its completion record
    Delete { id: TaskId },

    /// Mark a task as completed
    Complete { id: TaskId },

    /// Show a single task
    Show { id: TaskId },

    /// List tasks by state
    List {
        #[arg(value_enum, default_value_t = ListFilter::All)]
        filter: ListFilter,
    },

    /// Print the database schema
    Schema,
}
