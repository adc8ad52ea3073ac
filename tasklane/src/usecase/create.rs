//! Create a new task.

use std::sync::Arc;

use tasklane_core::task::{Task, TaskId, Timestamp};
use tasklane_core::validation::{TaskValidator, ValidationResult};

use super::{UseCaseError, UseCaseResult};
use crate::repository::TaskRepository;

const FALLBACK_MESSAGE: &str = "An unknown error occurred while creating the task";

/// Validates a task (title, description, due date) and inserts it.
pub struct CreateTask<R> {
    repository: Arc<R>,
    validator: TaskValidator,
}

impl<R: TaskRepository> CreateTask<R> {
    /// Build the use case over `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            validator: TaskValidator::for_create(),
        }
    }

    /// Validate against the current clock, then insert.
    ///
    /// # Errors
    ///
    /// `UseCaseError::Validation` with the first failing rule's message, or
    /// `UseCaseError::Persistence` if the repository rejects the insert.
    pub async fn execute(&self, task: &Task) -> UseCaseResult<TaskId> {
        self.execute_at(task, Timestamp::now()).await
    }

    /// Validate against an explicit clock reading, then insert.
    ///
    /// # Errors
    ///
    /// See [`CreateTask::execute`].
    pub async fn execute_at(&self, task: &Task, now: Timestamp) -> UseCaseResult<TaskId> {
        if let ValidationResult::Invalid(message) = self.validator.validate_at(task, now) {
            tracing::debug!(%message, "create rejected");
            return Err(UseCaseError::Validation(message));
        }
        match self.repository.create(task).await {
            Ok(id) => {
                tracing::info!(task_id = %id, priority = %task.priority, "task created");
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "task create failed");
                Err(UseCaseError::persistence(&e, FALLBACK_MESSAGE))
            }
        }
    }
}
