//! Watch-channel backed task table.
//!
//! The table lives in a [`tokio::sync::watch`] channel so every mutation
//! wakes all open query streams, which then re-run their filter against
//! the new table. When opened with a snapshot path, the full table is
//! rewritten to disk after each mutation, before the change is published.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::sync::watch;

use tasklane_core::codec::{TaskSnapshot, decode_snapshot, encode_snapshot};
use tasklane_core::task::{Task, TaskFilter, TaskId, TaskPriority, TaskStatus};

use super::{RepositoryError, TaskRepository, TaskStream};

/// First id handed out by an empty table.
const FIRST_ID: u64 = 1;

#[derive(Debug, Clone)]
struct Table {
    tasks: BTreeMap<TaskId, Task>,
    next_id: u64,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_id: FIRST_ID,
        }
    }
}

impl Table {
    fn from_snapshot(snapshot: TaskSnapshot) -> Self {
        let tasks: BTreeMap<TaskId, Task> = snapshot
            .tasks
            .into_iter()
            .map(|task| (task.id, task))
            .collect();
        // Never hand out an id that is already on disk.
        let max_id = tasks.keys().next_back().map_or(0, TaskId::as_u64);
        Self {
            tasks,
            next_id: snapshot.next_id.max(max_id.saturating_add(1)).max(FIRST_ID),
        }
    }

    fn to_snapshot(&self) -> TaskSnapshot {
        TaskSnapshot::new(self.next_id, self.tasks.values().cloned().collect())
    }
}

/// In-memory [`TaskRepository`] with optional file persistence.
pub struct InMemoryTaskRepository {
    table: watch::Sender<Table>,
    snapshot_path: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskRepository {
    /// Create an empty, memory-only repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: watch::Sender::new(Table::default()),
            snapshot_path: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Open a repository backed by a snapshot file.
    ///
    /// A missing file yields an empty table; the file is created on the
    /// first mutation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ReadFailed` if the file exists but cannot
    /// be read, or `RepositoryError::Snapshot` if its contents are invalid.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let table = match std::fs::read(path) {
            Ok(bytes) => Table::from_snapshot(decode_snapshot(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Table::default(),
            Err(e) => {
                return Err(RepositoryError::ReadFailed(format!(
                    "{}: {e}",
                    path.display()
                )));
            }
        };
        tracing::info!(
            path = %path.display(),
            tasks = table.tasks.len(),
            "opened task snapshot"
        );
        Ok(Self {
            table: watch::Sender::new(table),
            snapshot_path: Some(path.to_path_buf()),
            write_lock: Mutex::new(()),
        })
    }

    /// Number of stored tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.borrow().tasks.len()
    }

    /// Returns `true` if no tasks are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.borrow().tasks.is_empty()
    }

    fn observe(&self, filter: TaskFilter) -> TaskStream {
        let rx = self.table.subscribe();
        futures_util::stream::unfold((rx, true), move |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let tasks = filter.select(rx.borrow_and_update().tasks.values());
            Some((Ok(tasks), (rx, false)))
        })
        .boxed()
    }

    /// Apply `edit` to a copy of the table, persist the copy, then publish it.
    ///
    /// `edit` returns `None` to leave the table untouched. Nothing is
    /// published unless the snapshot write succeeds, and `write_lock`
    /// serializes the whole read-modify-write.
    fn commit<T>(
        &self,
        edit: impl FnOnce(&mut Table) -> Option<T>,
    ) -> Result<Option<T>, RepositoryError> {
        let _guard = self.write_lock.lock();
        let mut table = self.table.borrow().clone();
        let Some(out) = edit(&mut table) else {
            return Ok(None);
        };
        self.persist(&table)?;
        self.table.send_replace(table);
        Ok(Some(out))
    }

    /// Rewrite the snapshot file with `table`.
    ///
    /// Writes go to a sibling temp file first and are renamed into place.
    fn persist(&self, table: &Table) -> Result<(), RepositoryError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let bytes = encode_snapshot(&table.to_snapshot())?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &bytes)
            .and_then(|()| std::fs::rename(&tmp, path))
            .map_err(|e| {
                tracing::warn!(path = %path.display(), error = %e, "snapshot write failed");
                RepositoryError::WriteFailed(format!("{}: {e}", path.display()))
            })
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn observe_all(&self) -> TaskStream {
        self.observe(TaskFilter::All)
    }

    fn observe_by_status(&self, status: TaskStatus) -> TaskStream {
        self.observe(TaskFilter::ByStatus(status))
    }

    fn observe_by_priority(&self, priority: TaskPriority) -> TaskStream {
        self.observe(TaskFilter::ByPriority(priority))
    }

    async fn get_by_id(&self, id: TaskId) -> Result<Option<Task>, RepositoryError> {
        Ok(self.table.borrow().tasks.get(&id).cloned())
    }

    async fn create(&self, task: &Task) -> Result<TaskId, RepositoryError> {
        let assigned = self
            .commit(|table| {
                let assigned = if task.id.is_unsaved() {
                    let id = TaskId::new(table.next_id);
                    table.next_id = table.next_id.saturating_add(1);
                    id
                } else {
                    table.next_id = table.next_id.max(task.id.as_u64().saturating_add(1));
                    task.id
                };
                let mut stored = task.clone();
                stored.id = assigned;
                table.tasks.insert(assigned, stored);
                Some(assigned)
            })?
            .unwrap_or(task.id);
        tracing::debug!(task_id = %assigned, "stored task");
        Ok(assigned)
    }

    async fn update(&self, task: &Task) -> Result<(), RepositoryError> {
        self.commit(|table| {
            table
                .tasks
                .get_mut(&task.id)
                .map(|stored| *stored = task.clone())
        })?
        .ok_or(RepositoryError::NotFound(task.id))
    }

    async fn delete_by_id(&self, id: TaskId) -> Result<(), RepositoryError> {
        self.commit(|table| table.tasks.remove(&id).map(drop))?;
        Ok(())
    }

    async fn delete(&self, task: &Task) -> Result<(), RepositoryError> {
        self.delete_by_id(task.id).await
    }

    async fn delete_all(&self) -> Result<(), RepositoryError> {
        // Always publish so open streams re-emit even for an empty table.
        self.commit(|table| {
            table.tasks.clear();
            Some(())
        })?;
        Ok(())
    }
}
