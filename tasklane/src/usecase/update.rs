//! Update an existing task.

use std::sync::Arc;

use tasklane_core::task::{Task, Timestamp};
use tasklane_core::validation::{TaskValidator, ValidationResult};

use super::{UseCaseError, UseCaseResult};
use crate::repository::TaskRepository;

const FALLBACK_MESSAGE: &str = "An unknown error occurred while updating the task";

/// Validates title and description, stamps `updated_at`, and overwrites.
pub struct UpdateTask<R> {
    repository: Arc<R>,
    validator: TaskValidator,
}

impl<R: TaskRepository> UpdateTask<R> {
    /// Build the use case over `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            validator: TaskValidator::for_update(),
        }
    }

    /// Validate and store `task`, stamped with the current clock.
    ///
    /// # Errors
    ///
    /// `UseCaseError::Validation` if title or description is invalid, or
    /// `UseCaseError::Persistence` if the repository rejects the write.
    pub async fn execute(&self, task: Task) -> UseCaseResult<()> {
        self.execute_at(task, Timestamp::now()).await
    }

    /// Validate and store `task`, stamped with `now`.
    ///
    /// # Errors
    ///
    /// See [`UpdateTask::execute`].
    pub async fn execute_at(&self, task: Task, now: Timestamp) -> UseCaseResult<()> {
        if let ValidationResult::Invalid(message) = self.validator.validate_at(&task, now) {
            tracing::debug!(task_id = %task.id, %message, "update rejected");
            return Err(UseCaseError::Validation(message));
        }
        let task = task.touched_at(now);
        match self.repository.update(&task).await {
            Ok(()) => {
                tracing::info!(task_id = %task.id, status = %task.status, "task updated");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, "task update failed");
                Err(UseCaseError::persistence(&e, FALLBACK_MESSAGE))
            }
        }
    }
}
