//! Intent-driven state store.
//!
//! [`TaskStore`] owns a single [`TaskState`] cell published through a
//! `tokio::sync::watch` channel. The only ways to change it are
//! [`TaskStore::process_intent`] and [`TaskStore::clear_error`].
//!
//! Two background tasks may be attached to a store at any time, each held
//! in a single-occupancy slot:
//! - the active query subscription, replaced on every load or filter
//!   change;
//! - the success-message timer, replaced on every new success message.
//!
//! Both are aborted when the last store handle is dropped.

mod intent;
mod slot;
mod state;

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use tasklane_core::task::{Task, TaskFilter, TaskId, TaskPriority, TaskStatus, Timestamp};

use crate::repository::{TaskRepository, TaskStream};
use crate::usecase::{TaskUseCases, UseCaseResult};

pub use intent::TaskIntent;
pub use state::{QueryPhase, TaskState};

use slot::{Slot, Ticket};

/// Shown after a task is created.
pub const CREATED_MESSAGE: &str = "Task created successfully";
/// Shown after a task status change.
pub const UPDATED_MESSAGE: &str = "Task updated successfully";
/// Shown after a single task is deleted.
pub const DELETED_MESSAGE: &str = "Task deleted successfully";
/// Shown after every task is deleted.
pub const DELETED_ALL_MESSAGE: &str = "All tasks deleted successfully";

/// Shown when a query stream fails without a message.
const QUERY_FALLBACK_MESSAGE: &str = "An unknown error occurred while loading tasks";

/// Default lifetime of a success message.
pub const DEFAULT_SUCCESS_MESSAGE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Runtime settings for a [`TaskStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// How long a success message stays visible.
    pub success_message_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            success_message_timeout: DEFAULT_SUCCESS_MESSAGE_TIMEOUT,
        }
    }
}

type StateCell = Arc<watch::Sender<TaskState>>;

struct StoreInner<R> {
    state: StateCell,
    use_cases: TaskUseCases<R>,
    query: Slot,
    /// Held while a query is being swapped out.
    query_turn: tokio::sync::Mutex<()>,
    success_timer: Slot,
    config: StoreConfig,
}

impl<R> Drop for StoreInner<R> {
    fn drop(&mut self) {
        drop(self.query.cancel());
        drop(self.success_timer.cancel());
    }
}

/// Cloneable handle to the state store.
///
/// Background tasks hold only the state cell, never the store itself, so
/// dropping the last handle tears everything down.
pub struct TaskStore<R> {
    inner: Arc<StoreInner<R>>,
}

impl<R> Clone for TaskStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: TaskRepository + 'static> TaskStore<R> {
    /// Create a store in the initial state. No query is started until a
    /// [`TaskIntent::LoadTasks`] or filter intent arrives.
    #[must_use]
    pub fn new(repository: Arc<R>, config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Arc::new(watch::Sender::new(TaskState::default())),
                use_cases: TaskUseCases::new(&repository),
                query: Slot::default(),
                query_turn: tokio::sync::Mutex::new(()),
                success_timer: Slot::default(),
                config,
            }),
        }
    }

    /// Observe every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TaskState> {
        self.inner.state.subscribe()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.inner.state.borrow().clone()
    }

    /// `true` while a query subscription task is running.
    #[must_use]
    pub fn has_active_query(&self) -> bool {
        self.inner.query.is_running()
    }

    /// Dismiss the current error message.
    pub fn clear_error(&self) {
        self.inner.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// One-shot lookup that bypasses the filtered projection.
    ///
    /// # Errors
    ///
    /// `UseCaseError::Persistence` if the repository read fails.
    pub async fn get_task(&self, id: TaskId) -> UseCaseResult<Option<Task>> {
        self.inner.use_cases.query.get(id).await
    }

    /// Apply one intent.
    ///
    /// Resolves once the effect is applied: for queries, when the new
    /// subscription has been started; for mutations, when the use case has
    /// finished and its outcome is folded into state.
    pub async fn process_intent(&self, intent: TaskIntent) {
        tracing::debug!(intent = intent.name(), "processing intent");
        match intent {
            TaskIntent::LoadTasks => {
                let filter = self.inner.state.borrow().active_filter;
                self.start_query(filter).await;
            }
            TaskIntent::FilterByStatus(status) => {
                self.start_query(status.map_or(TaskFilter::All, TaskFilter::ByStatus)).await;
            }
            TaskIntent::FilterByPriority(priority) => {
                self.start_query(priority.map_or(TaskFilter::All, TaskFilter::ByPriority)).await;
            }
            TaskIntent::CreateTask {
                title,
                description,
                priority,
                due_date,
            } => {
                self.create_task(title, description, priority, due_date)
                    .await;
            }
            TaskIntent::UpdateTaskStatus { id, status } => {
                self.update_task_status(id, status).await;
            }
            TaskIntent::DeleteTaskById(id) => {
                let result = self.inner.use_cases.delete.by_id(id).await;
                self.fold(result, DELETED_MESSAGE);
            }
            TaskIntent::DeleteAllTasks => {
                let result = self.inner.use_cases.delete.all().await;
                self.fold(result, DELETED_ALL_MESSAGE);
            }
            TaskIntent::DeleteTask(task) => {
                let result = self.inner.use_cases.delete.task(&task).await;
                self.fold(result, DELETED_MESSAGE);
            }
        }
    }

    async fn create_task(
        &self,
        title: String,
        description: String,
        priority: TaskPriority,
        due_date: Option<Timestamp>,
    ) {
        let task = Task::new(title, description, priority, due_date, Timestamp::now());
        let result = self.inner.use_cases.create.execute(&task).await;
        self.fold(result, CREATED_MESSAGE);
    }

    async fn update_task_status(&self, id: TaskId, status: TaskStatus) {
        let existing = self.inner.state.borrow().find(id).cloned();
        let Some(task) = existing else {
            tracing::debug!(task_id = %id, "status change for unknown task ignored");
            return;
        };
        let result = self
            .inner
            .use_cases
            .update
            .execute(task.with_status(status))
            .await;
        self.fold(result, UPDATED_MESSAGE);
    }

    /// Fold a mutation outcome into state.
    fn fold<T>(&self, result: UseCaseResult<T>, success: &str) {
        match result {
            Ok(_) => self.post_success(success),
            Err(e) => {
                let message = e.into_message();
                self.inner.state.send_modify(|s| s.error = Some(message));
            }
        }
    }

    /// Show `message` and schedule its removal, replacing any pending one.
    fn post_success(&self, message: &str) {
        let delay = self.inner.config.success_message_timeout;
        let state = Arc::clone(&self.inner.state);
        self.inner.success_timer.replace(|ticket| {
            state.send_modify(|s| s.success_message = Some(message.to_string()));
            tokio::spawn(expire_success_message(state, ticket, delay))
        });
    }

    /// Cancel the active query and subscribe to `filter`.
    ///
    /// The previous subscription task is reaped before the new stream is
    /// opened, so at most one repository stream is ever live.
    async fn start_query(&self, filter: TaskFilter) {
        let _turn = self.inner.query_turn.lock().await;
        if let Some(previous) = self.inner.query.cancel() {
            // Resolves with a cancellation error once the old stream is dropped.
            let _ = previous.await;
        }
        let stream = self.inner.use_cases.query.execute(filter);
        let state = Arc::clone(&self.inner.state);
        self.inner.query.replace(|ticket| {
            state.send_modify(|s| {
                s.active_filter = filter;
                s.selected_filter = filter.status();
                s.is_loading = true;
                s.error = None;
                s.query_phase = QueryPhase::Loading;
            });
            tokio::spawn(run_query(stream, state, ticket, filter))
        });
    }
}

/// Drain a query stream into the state cell until it ends, fails, or is
/// superseded.
async fn run_query(mut stream: TaskStream, state: StateCell, ticket: Ticket, filter: TaskFilter) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(tasks) => {
                let count = tasks.len();
                let applied = state.send_if_modified(|s| {
                    if !ticket.is_current() {
                        return false;
                    }
                    s.tasks = tasks;
                    s.is_loading = false;
                    s.query_phase = QueryPhase::Loaded;
                    true
                });
                if !applied {
                    return;
                }
                tracing::debug!(%filter, count, "query emitted");
            }
            Err(e) => {
                tracing::warn!(%filter, error = %e, "task query failed");
                let mut message = e.to_string();
                if message.trim().is_empty() {
                    message = QUERY_FALLBACK_MESSAGE.to_string();
                }
                state.send_if_modified(|s| {
                    if !ticket.is_current() {
                        return false;
                    }
                    s.is_loading = false;
                    s.error = Some(message);
                    s.query_phase = QueryPhase::Failed;
                    true
                });
                return;
            }
        }
    }
    tracing::debug!(%filter, "query stream ended");
    // A stream that ends before delivering leaves nothing to wait for.
    state.send_if_modified(|s| {
        if !ticket.is_current() || !s.is_loading {
            return false;
        }
        s.is_loading = false;
        s.query_phase = QueryPhase::Idle;
        true
    });
}

async fn expire_success_message(state: StateCell, ticket: Ticket, delay: Duration) {
    tokio::time::sleep(delay).await;
    state.send_if_modified(|s| ticket.is_current() && s.success_message.take().is_some());
}

/// Feed intents from a channel into `store`.
///
/// Query intents are applied inline so their order is preserved; mutations
/// are spawned so a slow repository call never blocks later intents. The
/// loop ends when every sender is dropped.
pub fn spawn_intent_loop<R>(
    store: TaskStore<R>,
    mut intents: mpsc::Receiver<TaskIntent>,
) -> JoinHandle<()>
where
    R: TaskRepository + 'static,
{
    tokio::spawn(async move {
        while let Some(intent) = intents.recv().await {
            if intent.is_query() {
                store.process_intent(intent).await;
            } else {
                let store = store.clone();
                tokio::spawn(async move { store.process_intent(intent).await });
            }
        }
        tracing::debug!("intent channel closed");
    })
}
