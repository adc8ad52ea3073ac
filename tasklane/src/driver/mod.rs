//! Line-oriented command driver.
//!
//! Turns one line of user input into a [`Command`]. Most commands map
//! directly onto a [`TaskIntent`]; the rest act on the driver itself.
//! Parsing never validates task fields: the store's validator chain owns
//! those rules and reports them through `TaskState::error`.
//!
//! ```text
//! add Buy groceries | milk, eggs !high @due 2026-12-01
//! status 3 in_progress
//! filter priority urgent
//! ```

pub mod render;

use chrono::{Local, NaiveDate, TimeZone};

use tasklane_core::task::{ParseEnumError, TaskId, TaskPriority, TaskStatus, Timestamp};

use crate::store::TaskIntent;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Forward to the store.
    Intent(TaskIntent),
    /// Print one task in full.
    Show(TaskId),
    /// Dismiss the current error.
    ClearError,
    /// Print the command reference.
    Help,
    /// Exit the driver.
    Quit,
}

/// Errors produced while parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The line was blank.
    #[error("empty command")]
    Empty,

    /// The first word is not a known command.
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    /// A required argument is missing.
    #[error("{command}: missing {argument}")]
    MissingArgument {
        /// Command being parsed.
        command: &'static str,
        /// What was expected.
        argument: &'static str,
    },

    /// Trailing input after a complete command.
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),

    /// Task ids are positive integers.
    #[error("invalid task id '{0}'")]
    InvalidId(String),

    /// Unknown status or priority name.
    #[error(transparent)]
    InvalidValue(#[from] ParseEnumError),

    /// Due dates are `YYYY-MM-DD`.
    #[error("invalid due date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

/// Parse a single input line.
///
/// # Errors
///
/// Returns [`CommandError`] describing the first problem found.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    match word.to_ascii_lowercase().as_str() {
        "" => Err(CommandError::Empty),
        "list" | "ls" | "load" => no_args(rest, Command::Intent(TaskIntent::LoadTasks)),
        "add" | "new" => parse_add(rest),
        "status" | "mv" => parse_status(rest),
        "rm" | "delete" => {
            let id = single_id("rm", rest)?;
            Ok(Command::Intent(TaskIntent::DeleteTaskById(id)))
        }
        "rm-all" | "clear-all" => no_args(rest, Command::Intent(TaskIntent::DeleteAllTasks)),
        "filter" => parse_filter(rest),
        "show" => Ok(Command::Show(single_id("show", rest)?)),
        "clear" => no_args(rest, Command::ClearError),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

fn no_args(rest: &str, command: Command) -> Result<Command, CommandError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(CommandError::UnexpectedArgument(rest.to_string()))
    }
}

fn parse_id(raw: &str) -> Result<TaskId, CommandError> {
    match raw.parse::<TaskId>() {
        Ok(id) if !id.is_unsaved() => Ok(id),
        _ => Err(CommandError::InvalidId(raw.to_string())),
    }
}

fn single_id(command: &'static str, rest: &str) -> Result<TaskId, CommandError> {
    let mut args = rest.split_whitespace();
    let raw = args.next().ok_or(CommandError::MissingArgument {
        command,
        argument: "task id",
    })?;
    if let Some(extra) = args.next() {
        return Err(CommandError::UnexpectedArgument(extra.to_string()));
    }
    parse_id(raw)
}

/// `add <title> [| <description>] [!priority] [@due YYYY-MM-DD]`
fn parse_add(rest: &str) -> Result<Command, CommandError> {
    let mut words = Vec::new();
    let mut priority = TaskPriority::Medium;
    let mut due_date = None;

    let mut tokens = rest.split_whitespace();
    while let Some(token) = tokens.next() {
        if let Some(name) = token.strip_prefix('!')
            && !name.is_empty()
        {
            priority = name.parse()?;
        } else if token.eq_ignore_ascii_case("@due") {
            let raw = tokens.next().ok_or(CommandError::MissingArgument {
                command: "add",
                argument: "due date",
            })?;
            due_date = Some(parse_due_date(raw)?);
        } else {
            words.push(token);
        }
    }

    let text = words.join(" ");
    let (title, description) = text
        .split_once('|')
        .map_or((text.as_str(), ""), |(t, d)| (t.trim(), d.trim()));

    Ok(Command::Intent(TaskIntent::CreateTask {
        title: title.to_string(),
        description: description.to_string(),
        priority,
        due_date,
    }))
}

/// `status <id> <STATUS>`
fn parse_status(rest: &str) -> Result<Command, CommandError> {
    let mut args = rest.split_whitespace();
    let id = parse_id(args.next().ok_or(CommandError::MissingArgument {
        command: "status",
        argument: "task id",
    })?)?;
    let status: TaskStatus = args
        .next()
        .ok_or(CommandError::MissingArgument {
            command: "status",
            argument: "status",
        })?
        .parse()?;
    if let Some(extra) = args.next() {
        return Err(CommandError::UnexpectedArgument(extra.to_string()));
    }
    Ok(Command::Intent(TaskIntent::UpdateTaskStatus { id, status }))
}

/// `filter status <STATUS|all>` or `filter priority <PRIORITY|all>`
fn parse_filter(rest: &str) -> Result<Command, CommandError> {
    let mut args = rest.split_whitespace();
    let kind = args.next().ok_or(CommandError::MissingArgument {
        command: "filter",
        argument: "'status' or 'priority'",
    })?;
    let value = args.next().ok_or(CommandError::MissingArgument {
        command: "filter",
        argument: "value",
    })?;
    if let Some(extra) = args.next() {
        return Err(CommandError::UnexpectedArgument(extra.to_string()));
    }
    let all = value.eq_ignore_ascii_case("all");

    let intent = match kind.to_ascii_lowercase().as_str() {
        "status" => TaskIntent::FilterByStatus(if all { None } else { Some(value.parse()?) }),
        "priority" => {
            TaskIntent::FilterByPriority(if all { None } else { Some(value.parse()?) })
        }
        _ => return Err(CommandError::UnexpectedArgument(kind.to_string())),
    };
    Ok(Command::Intent(intent))
}

/// A date is due at the last millisecond of that local day.
fn parse_due_date(raw: &str) -> Result<Timestamp, CommandError> {
    let invalid = || CommandError::InvalidDate(raw.to_string());
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let end_of_day = date.and_hms_milli_opt(23, 59, 59, 999).ok_or_else(invalid)?;
    let local = Local
        .from_local_datetime(&end_of_day)
        .earliest()
        .ok_or_else(invalid)?;
    let millis = u64::try_from(local.timestamp_millis()).map_err(|_| invalid())?;
    Ok(Timestamp::from_millis(millis))
}
