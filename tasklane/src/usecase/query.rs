//! Live and point queries.

use std::sync::Arc;

use tasklane_core::task::{Task, TaskFilter, TaskId};

use super::{UseCaseError, UseCaseResult};
use crate::repository::{TaskRepository, TaskStream};

const FALLBACK_MESSAGE: &str = "An unknown error occurred while loading the task";

/// Maps a [`TaskFilter`] onto the repository's live streams.
pub struct QueryTasks<R> {
    repository: Arc<R>,
}

impl<R: TaskRepository> QueryTasks<R> {
    /// Build the use case over `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Open a live stream for `filter`, newest task first.
    ///
    /// The stream re-emits after every change to the stored tasks until it
    /// is dropped.
    #[must_use]
    pub fn execute(&self, filter: TaskFilter) -> TaskStream {
        tracing::debug!(%filter, "opening task query");
        match filter {
            TaskFilter::All => self.repository.observe_all(),
            TaskFilter::ByStatus(status) => self.repository.observe_by_status(status),
            TaskFilter::ByPriority(priority) => self.repository.observe_by_priority(priority),
        }
    }

    /// One-shot lookup of a single task.
    ///
    /// # Errors
    ///
    /// `UseCaseError::Persistence` if the repository read fails.
    pub async fn get(&self, id: TaskId) -> UseCaseResult<Option<Task>> {
        self.repository.get_by_id(id).await.map_err(|e| {
            tracing::warn!(task_id = %id, error = %e, "task lookup failed");
            UseCaseError::persistence(&e, FALLBACK_MESSAGE)
        })
    }
}
