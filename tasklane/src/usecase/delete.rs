//! Delete one task or all of them.

use std::sync::Arc;

use tasklane_core::task::{Task, TaskId};

use super::{UseCaseError, UseCaseResult};
use crate::repository::TaskRepository;

const FALLBACK_MESSAGE: &str = "An unknown error occurred while deleting the task";
const FALLBACK_ALL_MESSAGE: &str = "An unknown error occurred while deleting all tasks";

/// Removes tasks. No validation applies.
pub struct DeleteTask<R> {
    repository: Arc<R>,
}

impl<R: TaskRepository> DeleteTask<R> {
    /// Build the use case over `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Delete by id. An absent id is a successful no-op.
    ///
    /// # Errors
    ///
    /// `UseCaseError::Persistence` if the repository fails.
    pub async fn by_id(&self, id: TaskId) -> UseCaseResult<()> {
        self.repository
            .delete_by_id(id)
            .await
            .map(|()| tracing::info!(task_id = %id, "task deleted"))
            .map_err(|e| {
                tracing::warn!(task_id = %id, error = %e, "task delete failed");
                UseCaseError::persistence(&e, FALLBACK_MESSAGE)
            })
    }

    /// Delete the stored task matching `task.id`.
    ///
    /// # Errors
    ///
    /// `UseCaseError::Persistence` if the repository fails.
    pub async fn task(&self, task: &Task) -> UseCaseResult<()> {
        self.repository
            .delete(task)
            .await
            .map(|()| tracing::info!(task_id = %task.id, "task deleted"))
            .map_err(|e| {
                tracing::warn!(task_id = %task.id, error = %e, "task delete failed");
                UseCaseError::persistence(&e, FALLBACK_MESSAGE)
            })
    }

    /// Delete every task.
    ///
    /// # Errors
    ///
    /// `UseCaseError::Persistence` if the repository fails.
    pub async fn all(&self) -> UseCaseResult<()> {
        self.repository
            .delete_all()
            .await
            .map(|()| tracing::info!("all tasks deleted"))
            .map_err(|e| {
                tracing::warn!(error = %e, "delete all failed");
                UseCaseError::persistence(&e, FALLBACK_ALL_MESSAGE)
            })
    }
}
