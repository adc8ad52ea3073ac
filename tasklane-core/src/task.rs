//! Task entity and query filter types for `Tasklane`.
//!
//! A [`Task`] is an immutable record: every change produces a new value
//! (see [`Task::with_status`] and [`Task::touched_at`]). The persistence
//! collaborator is the system of record and assigns [`TaskId`]s; a task
//! carrying [`TaskId::UNSAVED`] has never been persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a persisted task.
///
/// Identifiers are assigned by the repository on create. The zero value
/// ([`TaskId::UNSAVED`]) marks a task that has not been persisted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    /// Identifier carried by tasks that have not been persisted.
    pub const UNSAVED: Self = Self(0);

    /// Creates a `TaskId` from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns `true` if this id has not been assigned by a repository.
    #[must_use]
    pub const fn is_unsaved(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::UNSAVED
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

/// Millisecond-precision UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp for the current instant.
    #[must_use]
    pub fn now() -> Self {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    /// Creates a timestamp from milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Returns a timestamp `millis` later, saturating at the maximum.
    #[must_use]
    pub const fn plus_millis(self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Returns a timestamp `millis` earlier, saturating at the epoch.
    #[must_use]
    pub const fn minus_millis(self, millis: u64) -> Self {
        Self(self.0.saturating_sub(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Error returned when a status or priority name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enum was being parsed ("status" or "priority").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Normalises user input to the canonical upper-snake form.
fn canonical_name(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPriority {
    /// Can wait.
    Low,
    /// Default priority.
    Medium,
    /// Should be done soon.
    High,
    /// Needs attention now.
    Urgent,
}

impl TaskPriority {
    /// All priorities, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    /// Canonical upper-snake name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = canonical_name(s);
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| ParseEnumError {
                kind: "priority",
                value: s.to_string(),
            })
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Actively being worked on.
    InProgress,
    /// Waiting on something external.
    Pending,
    /// Done.
    Completed,
    /// Will not be done.
    Cancelled,
    /// Kept for reference only.
    Archived,
    /// Marked deleted but still stored.
    Deleted,
    /// Paused.
    OnHold,
    /// Declined.
    Rejected,
}

impl TaskStatus {
    /// All statuses in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Todo,
        Self::InProgress,
        Self::Pending,
        Self::Completed,
        Self::Cancelled,
        Self::Archived,
        Self::Deleted,
        Self::OnHold,
        Self::Rejected,
    ];

    /// Canonical upper-snake name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Archived => "ARCHIVED",
            Self::Deleted => "DELETED",
            Self::OnHold => "ON_HOLD",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = canonical_name(s);
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == name)
            .ok_or_else(|| ParseEnumError {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// A task in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Repository-assigned identifier ([`TaskId::UNSAVED`] before create).
    pub id: TaskId,
    /// Short title shown in the list.
    pub title: String,
    /// Free-form description, may be empty.
    pub description: String,
    /// Priority of the task.
    pub priority: TaskPriority,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// When the task was created.
    pub created_at: Timestamp,
    /// When the task was last modified. Never earlier than `created_at`.
    pub updated_at: Timestamp,
    /// Optional deadline.
    pub due_date: Option<Timestamp>,
}

impl Task {
    /// Builds a new, unsaved task in [`TaskStatus::Todo`] stamped with `now`.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: TaskPriority,
        due_date: Option<Timestamp>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: TaskId::UNSAVED,
            title: title.into(),
            description: description.into(),
            priority,
            status: TaskStatus::Todo,
            created_at: now,
            updated_at: now,
            due_date,
        }
    }

    /// Returns a copy of this task with a different status.
    ///
    /// `updated_at` is left alone; the update use case stamps it.
    #[must_use]
    pub fn with_status(&self, status: TaskStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Returns this task with `updated_at` refreshed to `now`.
    ///
    /// Clamped so that `updated_at >= created_at` holds even if the clock
    /// went backwards.
    #[must_use]
    pub fn touched_at(mut self, now: Timestamp) -> Self {
        self.updated_at = now.max(self.created_at);
        self
    }
}

/// Query predicate selecting which tasks a live query delivers.
///
/// Exactly one filter is active in the store at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskFilter {
    /// Every task.
    #[default]
    All,
    /// Tasks in the given status.
    ByStatus(TaskStatus),
    /// Tasks with the given priority.
    ByPriority(TaskPriority),
}

impl TaskFilter {
    /// Returns `true` if the task is selected by this filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::ByStatus(status) => task.status == *status,
            Self::ByPriority(priority) => task.priority == *priority,
        }
    }

    /// The status this filter selects on, if it is a status filter.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        match self {
            Self::ByStatus(status) => Some(*status),
            Self::All | Self::ByPriority(_) => None,
        }
    }

    /// Applies the filter and the canonical query order (newest first).
    ///
    /// Ties on `created_at` are broken by descending id so the order is
    /// deterministic.
    #[must_use]
    pub fn select<'a, I>(&self, tasks: I) -> Vec<Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut selected: Vec<Task> = tasks
            .into_iter()
            .filter(|t| self.matches(t))
            .cloned()
            .collect();
        selected.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        selected
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::ByStatus(status) => write!(f, "status={status}"),
            Self::ByPriority(priority) => write!(f, "priority={priority}"),
        }
    }
}
