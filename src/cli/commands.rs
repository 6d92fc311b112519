//! Dispatch of parsed commands to the storage layer.

use super::{Command, ListFilter};
use crate::db::Storage;
use crate::format::{
    OutputFormat, TaskListing, format_listing_json, format_listing_markdown, format_task_json,
    format_task_markdown,
};
use crate::types::{Task, TaskId, TaskState, default_due_date, format_due_date, today};
use anyhow::{Context, Result, anyhow};
use serde_json::json;
use tracing::info;

/// Settings a command needs besides its own arguments.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext {
    pub format: OutputFormat,
    pub default_due_days: i64,
}

/// Run one command against `storage` and return the text to print.
pub fn run(storage: &Storage, command: &Command, ctx: CommandContext) -> Result<String> {
    match command {
        Command::Add { description, due } => {
            let due = due
                .clone()
                .unwrap_or_else(|| format_due_date(default_due_date(ctx.default_due_days)));
            let task = storage.create_task(description, &due)?;
            info!(task_id = task.id, "Task added");
            Ok(render_task(&task, Some(TaskState::derive(task.due_date, false, today())), ctx.format))
        }
        Command::Update {
            id,
            description,
            due,
        } => {
            let task = storage.update_task(*id, description, due)?;
            Ok(render_task(&task, None, ctx.format))
        }
        Command::Delete { id } => {
            let deleted = storage.delete_task(*id)?;
            Ok(render_ack(*id, if deleted { "deleted" } else { "not found" }, ctx.format))
        }
        Command::Complete { id } => {
            storage
                .complete_task(*id)
                .with_context(|| format!("completing task {}", id))?;
            Ok(render_ack(*id, "completed", ctx.format))
        }
        Command::Show { id } => {
            let task = storage
                .get_task(*id)?
                .ok_or_else(|| anyhow!("Task not found: {}", id))?;
            let completed = storage.is_completed(task.id)?;
            let state = TaskState::derive(task.due_date, completed, today());
            Ok(render_task(&task, Some(state), ctx.format))
        }
        Command::List { filter } => {
            let listing = list(storage, *filter)?;
            Ok(match ctx.format {
                OutputFormat::Json => format_listing_json(&listing).to_string(),
                OutputFormat::Markdown => format_listing_markdown(&listing),
            })
        }
        Command::Schema => {
            let schema = storage.schema()?;
            Ok(serde_json::to_string_pretty(&schema)?)
        }
    }
}

fn list(storage: &Storage, filter: ListFilter) -> Result<TaskListing> {
    let wants = |f: ListFilter| filter == ListFilter::All || filter == f;

    let mut listing = TaskListing::default();
    if wants(ListFilter::Overdue) {
        listing.overdue = Some(storage.get_overdue_tasks()?);
    }
    if wants(ListFilter::Active) {
        listing.active = Some(storage.get_active_tasks()?);
    }
    if wants(ListFilter::Completed) {
        listing.completed = Some(storage.get_completed_tasks()?);
    }
    Ok(listing)
}

fn render_task(task: &Task, state: Option<TaskState>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_task_json(task, state).to_string(),
        OutputFormat::Markdown => format_task_markdown(task, state),
    }
}

fn render_ack(id: TaskId, outcome: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json!({ "id": id, "result": outcome }).to_string(),
        OutputFormat::Markdown => format!("Task {}: {}\n", id, outcome),
    }
}
