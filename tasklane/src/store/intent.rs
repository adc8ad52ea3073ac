//! User intents accepted by the store.

use tasklane_core::task::{Task, TaskId, TaskPriority, TaskStatus, Timestamp};

/// A discrete request to change or query state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskIntent {
    /// (Re)start the query for the active filter.
    LoadTasks,
    /// Create a task from raw fields.
    CreateTask {
        title: String,
        description: String,
        priority: TaskPriority,
        due_date: Option<Timestamp>,
    },
    /// Move a task in the current list to another status.
    UpdateTaskStatus { id: TaskId, status: TaskStatus },
    /// Delete a task by id.
    DeleteTaskById(TaskId),
    /// Delete every task.
    DeleteAllTasks,
    /// Delete the given task.
    DeleteTask(Task),
    /// Filter by status; `None` shows everything.
    FilterByStatus(Option<TaskStatus>),
    /// Filter by priority; `None` shows everything.
    FilterByPriority(Option<TaskPriority>),
}

impl TaskIntent {
    /// Short name for tracing.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LoadTasks => "load_tasks",
            Self::CreateTask { .. } => "create_task",
            Self::UpdateTaskStatus { .. } => "update_task_status",
            Self::DeleteTaskById(_) => "delete_task_by_id",
            Self::DeleteAllTasks => "delete_all_tasks",
            Self::DeleteTask(_) => "delete_task",
            Self::FilterByStatus(_) => "filter_by_status",
            Self::FilterByPriority(_) => "filter_by_priority",
        }
    }

    /// Query intents restart the subscription and never suspend.
    #[must_use]
    pub const fn is_query(&self) -> bool {
        matches!(
            self,
            Self::LoadTasks | Self::FilterByStatus(_) | Self::FilterByPriority(_)
        )
    }
}
