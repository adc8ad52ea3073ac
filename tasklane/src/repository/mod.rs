//! Persistence contract for tasks.
//!
//! Defines the [`TaskRepository`] trait the use-case layer depends on.
//! Queries are live: `observe_*` returns a [`TaskStream`] that re-emits the
//! selected tasks every time the stored collection changes. Mutations are
//! atomic and become visible to open streams without a manual refresh.
//!
//! Implementations:
//! - [`memory::InMemoryTaskRepository`]: watch-channel backed table with an
//!   optional snapshot file.

pub mod memory;

use std::future::Future;

use futures_util::stream::BoxStream;

use tasklane_core::codec::CodecError;
use tasklane_core::task::{Task, TaskId, TaskPriority, TaskStatus};

pub use memory::InMemoryTaskRepository;

/// Live query result: every item is the full, ordered selection.
pub type TaskStream = BoxStream<'static, Result<Vec<Task>, RepositoryError>>;

/// Errors reported by a [`TaskRepository`].
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The underlying storage is unavailable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A write operation failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// A read operation failed.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The snapshot file could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] CodecError),

    /// Collaborator-specific failure, message passed through verbatim.
    #[error("{0}")]
    Other(String),
}

/// Reactive CRUD store for tasks.
///
/// All `observe_*` streams order tasks by creation time, newest first.
pub trait TaskRepository: Send + Sync {
    /// Live stream of every task.
    fn observe_all(&self) -> TaskStream;

    /// Live stream of tasks in the given status.
    fn observe_by_status(&self, status: TaskStatus) -> TaskStream;

    /// Live stream of tasks with the given priority.
    fn observe_by_priority(&self, priority: TaskPriority) -> TaskStream;

    /// Look up a single task.
    fn get_by_id(
        &self,
        id: TaskId,
    ) -> impl Future<Output = Result<Option<Task>, RepositoryError>> + Send;

    /// Insert a task and return its assigned id.
    ///
    /// A task carrying [`TaskId::UNSAVED`] gets a fresh id; any other id
    /// replaces the stored task with that id.
    fn create(&self, task: &Task) -> impl Future<Output = Result<TaskId, RepositoryError>> + Send;

    /// Overwrite an existing task.
    fn update(&self, task: &Task) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove a task by id. Removing an unknown id succeeds.
    fn delete_by_id(&self, id: TaskId) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove the stored task matching `task.id`.
    fn delete(&self, task: &Task) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove every task.
    fn delete_all(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
