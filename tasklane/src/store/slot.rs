//! Single-occupancy handle for a background task.
//!
//! Replacing the occupant aborts the previous task and bumps a generation
//! counter. The spawned task receives a [`Ticket`] and checks it inside
//! every state write, so a task that was replaced can no longer write even
//! if it was mid-flight when the abort landed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Proof of which generation a background task belongs to.
#[derive(Debug, Clone)]
pub(crate) struct Ticket {
    current: Arc<AtomicU64>,
    generation: u64,
}

impl Ticket {
    /// `true` while no newer task has replaced this one.
    pub(crate) fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}

#[derive(Debug, Default)]
pub(crate) struct Slot {
    occupant: Mutex<Option<JoinHandle<()>>>,
    generation: Arc<AtomicU64>,
}

impl Slot {
    /// Abort the current occupant and install the task built by `start`.
    ///
    /// `start` runs with the slot locked, so concurrent replacements are
    /// totally ordered and no handle is ever orphaned.
    pub(crate) fn replace<F>(&self, start: F)
    where
        F: FnOnce(Ticket) -> JoinHandle<()>,
    {
        let mut occupant = self.occupant.lock();
        if let Some(previous) = occupant.take() {
            previous.abort();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *occupant = Some(start(Ticket {
            current: Arc::clone(&self.generation),
            generation,
        }));
    }

    /// Abort the current occupant, if any, and hand back its handle.
    ///
    /// Awaiting the handle resolves once the aborted task has been dropped
    /// along with everything it owned.
    pub(crate) fn cancel(&self) -> Option<JoinHandle<()>> {
        let mut occupant = self.occupant.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        let previous = occupant.take()?;
        previous.abort();
        Some(previous)
    }

    /// `true` if an occupant is installed and still running.
    pub(crate) fn is_running(&self) -> bool {
        self.occupant
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
