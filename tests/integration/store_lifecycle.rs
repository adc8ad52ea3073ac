//! Integration tests for the task store: intent dispatch, query
//! subscription lifecycle, and success-message expiry.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::Instant;

use tasklane::repository::{InMemoryTaskRepository, RepositoryError, TaskRepository, TaskStream};
use tasklane::store::{
    self, CREATED_MESSAGE, DELETED_ALL_MESSAGE, DELETED_MESSAGE, QueryPhase, StoreConfig,
    TaskIntent, TaskState, TaskStore, UPDATED_MESSAGE,
};
use tasklane::usecase::QueryTasks;
use tasklane_core::task::{Task, TaskFilter, TaskId, TaskPriority, TaskStatus};

// ---------------------------------------------------------------------------
// Test repositories
// ---------------------------------------------------------------------------

/// Decrements the live-stream counter when the stream is dropped.
struct StreamGuard(Arc<AtomicUsize>);

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory repository that counts open query streams and can be made to
/// fail writes.
#[derive(Default)]
struct ProbeRepository {
    inner: InMemoryTaskRepository,
    open_streams: Arc<AtomicUsize>,
    fail_writes: AtomicBool,
}

impl ProbeRepository {
    fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    fn track(&self, stream: TaskStream) -> TaskStream {
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        let guard = StreamGuard(Arc::clone(&self.open_streams));
        stream
            .map(move |item| {
                let _alive = &guard;
                item
            })
            .boxed()
    }

    fn check_write(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("database locked".to_string()));
        }
        Ok(())
    }
}

impl TaskRepository for ProbeRepository {
    fn observe_all(&self) -> TaskStream {
        self.track(self.inner.observe_all())
    }

    fn observe_by_status(&self, status: TaskStatus) -> TaskStream {
        self.track(self.inner.observe_by_status(status))
    }

    fn observe_by_priority(&self, priority: TaskPriority) -> TaskStream {
        self.track(self.inner.observe_by_priority(priority))
    }

    async fn get_by_id(&self, id: TaskId) -> Result<Option<Task>, RepositoryError> {
        self.inner.get_by_id(id).await
    }

    async fn create(&self, task: &Task) -> Result<TaskId, RepositoryError> {
        self.check_write()?;
        self.inner.create(task).await
    }

    async fn update(&self, task: &Task) -> Result<(), RepositoryError> {
        self.check_write()?;
        self.inner.update(task).await
    }

    async fn delete_by_id(&self, id: TaskId) -> Result<(), RepositoryError> {
        self.check_write()?;
        self.inner.delete_by_id(id).await
    }

    async fn delete(&self, task: &Task) -> Result<(), RepositoryError> {
        self.check_write()?;
        self.inner.delete(task).await
    }

    async fn delete_all(&self) -> Result<(), RepositoryError> {
        self.check_write()?;
        self.inner.delete_all().await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_store() -> (Arc<ProbeRepository>, TaskStore<ProbeRepository>) {
    let repo = Arc::new(ProbeRepository::default());
    let store = TaskStore::new(Arc::clone(&repo), StoreConfig::default());
    (repo, store)
}

fn create_intent(title: &str, priority: TaskPriority) -> TaskIntent {
    TaskIntent::CreateTask {
        title: title.to_string(),
        description: String::new(),
        priority,
        due_date: None,
    }
}

/// Wait until the published state satisfies `pred`.
async fn wait_for_state<R>(store: &TaskStore<R>, pred: impl FnMut(&TaskState) -> bool) -> TaskState
where
    R: TaskRepository + 'static,
{
    let mut rx = store.subscribe();
    let state = rx.wait_for(pred).await.expect("store alive").clone();
    state
}

/// Yield until `cond` holds, giving aborted tasks a chance to be dropped.
async fn settle(mut cond: impl FnMut() -> bool) {
    for _ in 0..100 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

/// Create tasks through the store and wait until the list shows them all.
async fn seed<R>(store: &TaskStore<R>, titles: &[&str]) -> TaskState
where
    R: TaskRepository + 'static,
{
    for title in titles {
        store
            .process_intent(create_intent(title, TaskPriority::Medium))
            .await;
    }
    let expected = titles.len();
    wait_for_state(store, |s| !s.is_loading && s.tasks.len() == expected).await
}

// ===========================================================================
// Create and success messages
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn create_sets_message_and_clears_after_two_seconds() {
    let (_repo, store) = make_store();
    store.process_intent(TaskIntent::LoadTasks).await;

    store
        .process_intent(TaskIntent::CreateTask {
            title: "Buy groceries".to_string(),
            description: String::new(),
            priority: TaskPriority::Medium,
            due_date: None,
        })
        .await;
    let posted = Instant::now();
    assert_eq!(store.state().success_message.as_deref(), Some(CREATED_MESSAGE));
    assert!(store.state().error.is_none());

    let state = wait_for_state(&store, |s| s.tasks.len() == 1).await;
    let task = &state.tasks[0];
    assert_eq!(task.title, "Buy groceries");
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.priority, TaskPriority::Medium);
    assert!(!task.id.is_unsaved());

    tokio::time::sleep_until(posted + Duration::from_millis(1999)).await;
    assert_eq!(store.state().success_message.as_deref(), Some(CREATED_MESSAGE));

    tokio::time::sleep_until(posted + Duration::from_millis(2001)).await;
    assert!(store.state().success_message.is_none());
}

#[tokio::test(start_paused = true)]
async fn newer_success_message_survives_older_timer() {
    let (_repo, store) = make_store();
    store.process_intent(TaskIntent::LoadTasks).await;
    store
        .process_intent(create_intent("Write report", TaskPriority::Low))
        .await;
    let first = Instant::now();
    let state = wait_for_state(&store, |s| s.tasks.len() == 1).await;
    let id = state.tasks[0].id;

    tokio::time::sleep_until(first + Duration::from_millis(1500)).await;
    assert_eq!(store.state().success_message.as_deref(), Some(CREATED_MESSAGE));
    store.process_intent(TaskIntent::DeleteTaskById(id)).await;
    let second = Instant::now();
    assert_eq!(store.state().success_message.as_deref(), Some(DELETED_MESSAGE));

    // The first timer would have fired here.
    tokio::time::sleep_until(first + Duration::from_millis(2100)).await;
    assert_eq!(store.state().success_message.as_deref(), Some(DELETED_MESSAGE));

    tokio::time::sleep_until(second + Duration::from_millis(2001)).await;
    assert!(store.state().success_message.is_none());
}

#[tokio::test(start_paused = true)]
async fn configured_message_timeout_is_used() {
    let repo = Arc::new(ProbeRepository::default());
    let store = TaskStore::new(
        Arc::clone(&repo),
        StoreConfig {
            success_message_timeout: Duration::from_millis(300),
        },
    );
    store
        .process_intent(create_intent("Short lived", TaskPriority::Low))
        .await;
    let posted = Instant::now();
    assert!(store.state().success_message.is_some());

    tokio::time::sleep_until(posted + Duration::from_millis(301)).await;
    assert!(store.state().success_message.is_none());
}

#[tokio::test]
async fn validation_failure_reports_error_without_persisting() {
    let (repo, store) = make_store();
    store
        .process_intent(create_intent("Hi", TaskPriority::High))
        .await;

    let state = store.state();
    assert_eq!(
        state.error.as_deref(),
        Some("Title must be at least 3 characters")
    );
    assert!(state.success_message.is_none());
    assert!(repo.inner.is_empty());
}

#[tokio::test]
async fn error_and_success_are_independent() {
    let (_repo, store) = make_store();
    store
        .process_intent(create_intent("", TaskPriority::Low))
        .await;
    store
        .process_intent(create_intent("Valid title", TaskPriority::Low))
        .await;

    let state = store.state();
    assert_eq!(state.error.as_deref(), Some("Title cannot be empty"));
    assert_eq!(state.success_message.as_deref(), Some(CREATED_MESSAGE));

    store.clear_error();
    let state = store.state();
    assert!(state.error.is_none());
    assert_eq!(state.success_message.as_deref(), Some(CREATED_MESSAGE));
}

#[tokio::test]
async fn persistence_failure_surfaces_collaborator_message() {
    let (repo, store) = make_store();
    repo.fail_writes.store(true, Ordering::SeqCst);

    store
        .process_intent(create_intent("Pay rent", TaskPriority::Urgent))
        .await;
    assert_eq!(
        store.state().error.as_deref(),
        Some("storage unavailable: database locked")
    );

    store.process_intent(TaskIntent::DeleteAllTasks).await;
    assert_eq!(
        store.state().error.as_deref(),
        Some("storage unavailable: database locked")
    );
    assert!(store.state().success_message.is_none());
}

// ===========================================================================
// Query subscription
// ===========================================================================

#[tokio::test]
async fn load_tasks_lifecycle() {
    let (_repo, store) = make_store();
    assert_eq!(store.state().query_phase, QueryPhase::Idle);

    store.process_intent(TaskIntent::LoadTasks).await;
    let loading = store.state();
    assert!(loading.is_loading);
    assert_eq!(loading.query_phase, QueryPhase::Loading);

    let loaded = wait_for_state(&store, |s| !s.is_loading).await;
    assert_eq!(loaded.query_phase, QueryPhase::Loaded);
    assert!(loaded.tasks.is_empty());
    assert_eq!(loaded.active_filter, TaskFilter::All);
}

#[tokio::test]
async fn created_tasks_arrive_newest_first() {
    let (_repo, store) = make_store();
    store.process_intent(TaskIntent::LoadTasks).await;
    let state = seed(&store, &["First task", "Second task", "Third task"]).await;

    // Created in the same millisecond at worst; ties break on id.
    let titles: Vec<_> = state.tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["Third task", "Second task", "First task"]);
}

#[tokio::test]
async fn rapid_filter_change_leaves_one_subscription() {
    let (repo, store) = make_store();
    store.process_intent(TaskIntent::LoadTasks).await;
    let seeded = seed(&store, &["Draft proposal", "Review code"]).await;
    let started = seeded.tasks[0].id;
    store
        .process_intent(TaskIntent::UpdateTaskStatus {
            id: started,
            status: TaskStatus::InProgress,
        })
        .await;

    store
        .process_intent(TaskIntent::FilterByStatus(Some(TaskStatus::InProgress)))
        .await;
    store
        .process_intent(TaskIntent::FilterByStatus(None))
        .await;

    let state = wait_for_state(&store, |s| !s.is_loading).await;
    assert_eq!(state.active_filter, TaskFilter::All);
    assert_eq!(state.selected_filter, None);
    assert_eq!(state.tasks.len(), 2);
    assert!(store.has_active_query());
    settle(|| repo.open_streams() == 1).await;

    // A change visible to both filters must only land via the All stream.
    store
        .process_intent(create_intent("Ship it", TaskPriority::High))
        .await;
    let state = wait_for_state(&store, |s| s.tasks.len() == 3).await;
    assert_eq!(state.active_filter, TaskFilter::All);
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(store.state().tasks.len(), 3);
    assert_eq!(repo.open_streams(), 1);
}

#[tokio::test]
async fn filter_switch_closes_old_stream_before_returning() {
    let (repo, store) = make_store();
    store.process_intent(TaskIntent::LoadTasks).await;
    wait_for_state(&store, |s| s.query_phase == QueryPhase::Loaded).await;
    assert_eq!(repo.open_streams(), 1);

    store
        .process_intent(TaskIntent::FilterByStatus(Some(TaskStatus::InProgress)))
        .await;
    assert_eq!(repo.open_streams(), 1);

    // Switching before the previous query ever delivered.
    store
        .process_intent(TaskIntent::FilterByPriority(Some(TaskPriority::Low)))
        .await;
    assert_eq!(repo.open_streams(), 1);
    store.process_intent(TaskIntent::LoadTasks).await;
    assert_eq!(repo.open_streams(), 1);

    let state = wait_for_state(&store, |s| !s.is_loading).await;
    assert_eq!(state.active_filter, TaskFilter::ByPriority(TaskPriority::Low));
}

#[tokio::test]
async fn filter_by_status_tracks_updates() {
    let (_repo, store) = make_store();
    store.process_intent(TaskIntent::LoadTasks).await;
    let state = seed(&store, &["Water plants"]).await;
    let task = state.tasks[0].clone();

    store
        .process_intent(TaskIntent::FilterByStatus(Some(TaskStatus::Todo)))
        .await;
    let todo = wait_for_state(&store, |s| !s.is_loading).await;
    assert_eq!(todo.selected_filter, Some(TaskStatus::Todo));
    assert_eq!(todo.tasks.len(), 1);

    store
        .process_intent(TaskIntent::UpdateTaskStatus {
            id: task.id,
            status: TaskStatus::Completed,
        })
        .await;
    assert_eq!(store.state().success_message.as_deref(), Some(UPDATED_MESSAGE));
    let after = wait_for_state(&store, |s| s.tasks.is_empty()).await;
    assert_eq!(after.active_filter, TaskFilter::ByStatus(TaskStatus::Todo));

    store
        .process_intent(TaskIntent::FilterByStatus(Some(TaskStatus::Completed)))
        .await;
    let done = wait_for_state(&store, |s| !s.is_loading).await;
    assert_eq!(done.tasks.len(), 1);
    assert_eq!(done.tasks[0].status, TaskStatus::Completed);
    assert!(done.tasks[0].updated_at >= done.tasks[0].created_at);
}

#[tokio::test]
async fn filter_by_priority() {
    let (_repo, store) = make_store();
    store.process_intent(TaskIntent::LoadTasks).await;
    store
        .process_intent(create_intent("Fix outage", TaskPriority::Urgent))
        .await;
    store
        .process_intent(create_intent("Tidy desk", TaskPriority::Low))
        .await;
    wait_for_state(&store, |s| s.tasks.len() == 2).await;

    store
        .process_intent(TaskIntent::FilterByPriority(Some(TaskPriority::Urgent)))
        .await;
    let urgent = wait_for_state(&store, |s| !s.is_loading).await;
    assert_eq!(urgent.selected_filter, None);
    assert_eq!(urgent.active_filter, TaskFilter::ByPriority(TaskPriority::Urgent));
    assert_eq!(urgent.tasks.len(), 1);
    assert_eq!(urgent.tasks[0].title, "Fix outage");

    store
        .process_intent(TaskIntent::FilterByPriority(None))
        .await;
    let all = wait_for_state(&store, |s| !s.is_loading).await;
    assert_eq!(all.active_filter, TaskFilter::All);
    assert_eq!(all.tasks.len(), 2);
}

#[tokio::test]
async fn load_tasks_reuses_active_filter() {
    let (repo, store) = make_store();
    store
        .process_intent(TaskIntent::FilterByStatus(Some(TaskStatus::Pending)))
        .await;
    store.process_intent(TaskIntent::LoadTasks).await;

    let state = wait_for_state(&store, |s| !s.is_loading).await;
    assert_eq!(state.active_filter, TaskFilter::ByStatus(TaskStatus::Pending));
    assert_eq!(state.selected_filter, Some(TaskStatus::Pending));
    settle(|| repo.open_streams() == 1).await;
}

// ===========================================================================
// Update and delete
// ===========================================================================

#[tokio::test]
async fn update_of_unknown_id_leaves_state_untouched() {
    let (_repo, store) = make_store();
    store.process_intent(TaskIntent::LoadTasks).await;
    let before = seed(&store, &["Only task"]).await;

    store
        .process_intent(TaskIntent::UpdateTaskStatus {
            id: TaskId::new(999),
            status: TaskStatus::Completed,
        })
        .await;

    assert_eq!(store.state(), before);
}

#[tokio::test]
async fn delete_entity_removes_it() {
    let (_repo, store) = make_store();
    store.process_intent(TaskIntent::LoadTasks).await;
    let state = seed(&store, &["Keep", "Remove"]).await;
    let doomed = state
        .tasks
        .iter()
        .find(|t| t.title == "Remove")
        .unwrap()
        .clone();

    store.process_intent(TaskIntent::DeleteTask(doomed)).await;
    assert_eq!(store.state().success_message.as_deref(), Some(DELETED_MESSAGE));
    let after = wait_for_state(&store, |s| s.tasks.len() == 1).await;
    assert_eq!(after.tasks[0].title, "Keep");
}

#[tokio::test]
async fn delete_all_then_query_is_empty() {
    let (repo, store) = make_store();
    store.process_intent(TaskIntent::LoadTasks).await;
    seed(&store, &["One task", "Two task", "Red task"]).await;

    store.process_intent(TaskIntent::DeleteAllTasks).await;
    assert_eq!(
        store.state().success_message.as_deref(),
        Some(DELETED_ALL_MESSAGE)
    );
    let state = wait_for_state(&store, |s| s.tasks.is_empty()).await;
    assert!(!state.is_loading);

    let fresh = QueryTasks::new(Arc::clone(&repo))
        .execute(TaskFilter::All)
        .next()
        .await
        .unwrap()
        .unwrap();
    assert!(fresh.is_empty());
}

#[tokio::test]
async fn mutations_never_set_loading() {
    let (_repo, store) = make_store();
    store.process_intent(TaskIntent::LoadTasks).await;
    wait_for_state(&store, |s| !s.is_loading).await;

    let mut rx = store.subscribe();
    let watcher = tokio::spawn(async move {
        let mut saw_loading = false;
        while rx.changed().await.is_ok() {
            saw_loading |= rx.borrow_and_update().is_loading;
        }
        saw_loading
    });

    seed(&store, &["Alpha task"]).await;
    store.process_intent(TaskIntent::DeleteAllTasks).await;
    store
        .process_intent(TaskIntent::UpdateTaskStatus {
            id: TaskId::new(12),
            status: TaskStatus::Archived,
        })
        .await;
    drop(store);

    assert!(!watcher.await.unwrap());
}

// ===========================================================================
// Intent loop and teardown
// ===========================================================================

#[tokio::test]
async fn intent_loop_applies_queries_in_order() {
    let (repo, store) = make_store();
    let (tx, rx) = mpsc::channel(8);
    let handle = store::spawn_intent_loop(store.clone(), rx);

    tx.send(create_intent("From channel", TaskPriority::Medium))
        .await
        .unwrap();
    tx.send(TaskIntent::FilterByStatus(Some(TaskStatus::Rejected)))
        .await
        .unwrap();
    tx.send(TaskIntent::FilterByStatus(None)).await.unwrap();

    let state = wait_for_state(&store, |s| {
        !s.is_loading && s.active_filter == TaskFilter::All && s.tasks.len() == 1
    })
    .await;
    assert_eq!(state.tasks[0].title, "From channel");
    settle(|| repo.open_streams() == 1).await;

    drop(tx);
    handle.await.unwrap();
}

#[tokio::test]
async fn dropping_last_handle_cancels_subscription() {
    let (repo, store) = make_store();
    store.process_intent(TaskIntent::LoadTasks).await;
    wait_for_state(&store, |s| !s.is_loading).await;
    assert_eq!(repo.open_streams(), 1);

    let mut rx = store.subscribe();
    drop(store);
    while rx.changed().await.is_ok() {}
    settle(|| repo.open_streams() == 0).await;
}

#[tokio::test]
async fn failed_snapshot_write_does_not_duplicate_on_retry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("tasks.bin");
    let repo = Arc::new(InMemoryTaskRepository::open(&path).unwrap());
    let store = TaskStore::new(Arc::clone(&repo), StoreConfig::default());
    store.process_intent(TaskIntent::LoadTasks).await;
    wait_for_state(&store, |s| s.query_phase == QueryPhase::Loaded).await;

    for _ in 0..2 {
        store
            .process_intent(create_intent("Buy groceries", TaskPriority::Medium))
            .await;
        let state = store.state();
        assert!(state.error.as_deref().unwrap().starts_with("write failed: "));
        assert!(state.success_message.is_none());
        store.clear_error();
    }
    assert!(repo.is_empty());
    assert!(store.state().tasks.is_empty());

    std::fs::create_dir(dir.path().join("missing")).unwrap();
    store
        .process_intent(create_intent("Buy groceries", TaskPriority::Medium))
        .await;
    let state = wait_for_state(&store, |s| !s.tasks.is_empty()).await;
    assert_eq!(state.tasks.len(), 1);
    assert!(state.error.is_none());
    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn snapshot_backed_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.bin");

    {
        let repo = Arc::new(InMemoryTaskRepository::open(&path).unwrap());
        let store = TaskStore::new(repo, StoreConfig::default());
        store
            .process_intent(create_intent("Remember me", TaskPriority::High))
            .await;
        assert_eq!(store.state().success_message.as_deref(), Some(CREATED_MESSAGE));
    }

    let repo = Arc::new(InMemoryTaskRepository::open(&path).unwrap());
    let store = TaskStore::new(repo, StoreConfig::default());
    store.process_intent(TaskIntent::LoadTasks).await;
    let state = wait_for_state(&store, |s| !s.is_loading).await;
    assert_eq!(state.tasks.len(), 1);
    assert_eq!(state.tasks[0].title, "Remember me");
    assert_eq!(state.tasks[0].priority, TaskPriority::High);
}
