//! Output formatting utilities for markdown and JSON.

use crate::types::{CompletedTask, Task, TaskState};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    #[default]
    #[serde(alias = "md")]
    Markdown,
}

/// Tasks grouped by derived state, as shown by `list`.
#[derive(Debug, Default, Serialize)]
pub struct TaskListing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdue: Option<Vec<Task>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<Vec<Task>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<Vec<CompletedTask>>,
}

/// Format a single task as markdown.
pub fn format_task_markdown(task: &Task, state: Option<TaskState>) -> String {
    let mut md = String::new();

    md.push_str(&format!("## Task {}: {}\n", task.id, task.description));
    md.push_str(&format!("- **due**: {}\n", task.due_date_string()));
    if let Some(state) = state {
        md.push_str(&format!("- **state**: {}\n", state.as_str()));
    }
    md.push_str(&format!("- **created**: {}\n", task.created_date));
    md.push_str(&format!("- **updated**: {}\n", task.last_updated));

    md
}

fn task_line(task: &Task) -> String {
    format!("- `{}` {} (due {})\n", task.id, task.description, task.due_date_string())
}

fn push_section(md: &mut String, title: &str, tasks: &[Task]) {
    md.push_str(&format!("# {} ({})\n\n", title, tasks.len()));
    if tasks.is_empty() {
        md.push_str("_none_\n");
    }
    for task in tasks {
        md.push_str(&task_line(task));
    }
    md.push('\n');
}

/// Format a listing as markdown, one section per group present.
pub fn format_listing_markdown(listing: &TaskListing) -> String {
    let mut md = String::new();

    if let Some(ref overdue) = listing.overdue {
        push_section(&mut md, "Overdue", overdue);
    }
    if let Some(ref active) = listing.active {
        push_section(&mut md, "Active", active);
    }
    if let Some(ref completed) = listing.completed {
        md.push_str(&format!("# Completed ({})\n\n", completed.len()));
        if completed.is_empty() {
            md.push_str("_none_\n");
        }
        for entry in completed {
            md.push_str(&format!(
                "- `{}` {} (due {}, completed {})\n",
                entry.task.id,
                entry.task.description,
                entry.task.due_date_string(),
                entry.completion.completed_by
            ));
        }
        md.push('\n');
    }

    md
}

/// Format a single task as JSON.
pub fn format_task_json(task: &Task, state: Option<TaskState>) -> Value {
    let mut value = json!(task);
    if let (Some(state), Some(obj)) = (state, value.as_object_mut()) {
        obj.insert("state".to_string(), json!(state));
    }
    value
}

pub fn format_listing_json(listing: &TaskListing) -> Value {
    json!(listing)
}
