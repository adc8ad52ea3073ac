//! Plain-text formatting of store state.

use std::fmt::Write as _;

use chrono::{Local, TimeZone};

use tasklane_core::task::{Task, TaskFilter, Timestamp};

use crate::store::TaskState;

/// Command reference printed by `help`.
pub const HELP: &str = "\
commands:
  list                                   reload the current filter
  add <title> [| <desc>] [!priority] [@due YYYY-MM-DD]
  status <id> <STATUS>                   e.g. status 3 in_progress
  rm <id>                                delete one task
  rm-all                                 delete every task
  filter status <STATUS|all>
  filter priority <PRIORITY|all>
  show <id>                              print one task in full
  clear                                  dismiss the error
  help
  quit";

/// Format epoch milliseconds in local time.
///
/// Falls back to the raw millisecond value if the format string is invalid
/// or the instant is ambiguous.
#[must_use]
pub fn format_timestamp(ts: Timestamp, format: &str) -> String {
    let ms = ts.as_millis();
    let secs = i64::try_from(ms / 1000).unwrap_or(i64::MAX);
    let nsecs = u32::try_from((ms % 1000) * 1_000_000).unwrap_or(0);
    let chrono::LocalResult::Single(dt) = Local.timestamp_opt(secs, nsecs) else {
        return ts.to_string();
    };
    let mut out = String::new();
    if write!(out, "{}", dt.format(format)).is_err() {
        return ts.to_string();
    }
    out
}

/// One-line summary: `#3 [TODO] (HIGH) Buy groceries  due 2026-12-01 23:59`.
#[must_use]
pub fn format_task_line(task: &Task, timestamp_format: &str) -> String {
    let mut line = format!(
        "#{} [{}] ({}) {}",
        task.id, task.status, task.priority, task.title
    );
    if let Some(due) = task.due_date {
        let _ = write!(line, "  due {}", format_timestamp(due, timestamp_format));
    }
    line
}

/// Every field of a task, one per line.
#[must_use]
pub fn format_task_details(task: &Task, timestamp_format: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "task #{}", task.id);
    let _ = writeln!(out, "  title:       {}", task.title);
    if !task.description.is_empty() {
        let _ = writeln!(out, "  description: {}", task.description);
    }
    let _ = writeln!(out, "  status:      {}", task.status);
    let _ = writeln!(out, "  priority:    {}", task.priority);
    let _ = writeln!(
        out,
        "  created:     {}",
        format_timestamp(task.created_at, timestamp_format)
    );
    let _ = writeln!(
        out,
        "  updated:     {}",
        format_timestamp(task.updated_at, timestamp_format)
    );
    match task.due_date {
        Some(due) => {
            let _ = write!(out, "  due:         {}", format_timestamp(due, timestamp_format));
        }
        None => out.push_str("  due:         -"),
    }
    out
}

/// Full state view: header, banners, then the task list.
#[must_use]
pub fn format_state(state: &TaskState, timestamp_format: &str) -> String {
    let mut out = String::new();
    let filter = match state.active_filter {
        TaskFilter::All => "all".to_string(),
        TaskFilter::ByStatus(status) => format!("status {status}"),
        TaskFilter::ByPriority(priority) => format!("priority {priority}"),
    };
    let _ = write!(out, "-- {} task(s), filter: {filter}", state.tasks.len());
    if state.is_loading {
        out.push_str(", loading...");
    }
    out.push_str(" --");

    if let Some(error) = &state.error {
        let _ = write!(out, "\n!! {error}");
    }
    if let Some(message) = &state.success_message {
        let _ = write!(out, "\nok {message}");
    }

    if state.tasks.is_empty() && !state.is_loading {
        out.push_str("\n   (no tasks)");
    }
    for task in &state.tasks {
        let _ = write!(out, "\n   {}", format_task_line(task, timestamp_format));
    }
    out
}
