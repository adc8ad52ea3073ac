//! Use cases: the only path from the store to the repository.
//!
//! Each use case wraps one repository operation, runs validation where it
//! applies, and folds every outcome into a [`UseCaseResult`]. Repository
//! failures never escape as panics or raw errors.

pub mod create;
pub mod delete;
pub mod query;
pub mod update;

use std::sync::Arc;

use crate::repository::{RepositoryError, TaskRepository};

pub use create::CreateTask;
pub use delete::DeleteTask;
pub use query::QueryTasks;
pub use update::UpdateTask;

/// Failure outcome of a use case, carrying a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UseCaseError {
    /// The input was rejected by the validator chain.
    #[error("{0}")]
    Validation(String),

    /// The repository reported a failure.
    #[error("{0}")]
    Persistence(String),
}

impl UseCaseError {
    /// The user-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(message) | Self::Persistence(message) => message,
        }
    }

    /// Consumes the error, returning its message.
    #[must_use]
    pub fn into_message(self) -> String {
        match self {
            Self::Validation(message) | Self::Persistence(message) => message,
        }
    }

    /// Wraps a repository error, substituting `fallback` for a blank message.
    pub(crate) fn persistence(err: &RepositoryError, fallback: &str) -> Self {
        let message = err.to_string();
        if message.trim().is_empty() {
            Self::Persistence(fallback.to_string())
        } else {
            Self::Persistence(message)
        }
    }
}

/// Result type returned by every use case.
pub type UseCaseResult<T> = Result<T, UseCaseError>;

/// The full set of use cases over one repository.
pub struct TaskUseCases<R> {
    /// Validate and insert a new task.
    pub create: CreateTask<R>,
    /// Validate and overwrite an existing task.
    pub update: UpdateTask<R>,
    /// Remove one or all tasks.
    pub delete: DeleteTask<R>,
    /// Live and point queries.
    pub query: QueryTasks<R>,
}

impl<R: TaskRepository> TaskUseCases<R> {
    /// Build every use case over a shared repository.
    #[must_use]
    pub fn new(repository: &Arc<R>) -> Self {
        Self {
            create: CreateTask::new(Arc::clone(repository)),
            update: UpdateTask::new(Arc::clone(repository)),
            delete: DeleteTask::new(Arc::clone(repository)),
            query: QueryTasks::new(Arc::clone(repository)),
        }
    }
}
