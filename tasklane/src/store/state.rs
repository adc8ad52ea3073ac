//! The immutable state snapshot published by the store.

use tasklane_core::task::{Task, TaskFilter, TaskId, TaskStatus};

/// Lifecycle of the active query subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryPhase {
    /// No query has been started.
    #[default]
    Idle,
    /// A query was (re)started and has not emitted yet.
    Loading,
    /// The active query has emitted at least once.
    Loaded,
    /// The active query failed; `tasks` keep their last good value.
    Failed,
}

/// Everything the presentation layer needs to render the task list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskState {
    /// Tasks selected by the active filter, newest first.
    pub tasks: Vec<Task>,
    /// `true` until the active query delivers its first value.
    pub is_loading: bool,
    /// Last failure message, cleared by `clear_error` or a new query.
    pub error: Option<String>,
    /// Transient confirmation, cleared automatically.
    pub success_message: Option<String>,
    /// The status being filtered on, if the active filter is by status.
    pub selected_filter: Option<TaskStatus>,
    /// The full active filter.
    pub active_filter: TaskFilter,
    /// Where the active query is in its lifecycle.
    pub query_phase: QueryPhase,
}

impl TaskState {
    /// Looks up a task in the current projection.
    #[must_use]
    pub fn find(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}
