//! Cancellable delayed actions.
//!
//! A [`Debouncer`] runs only the most recent action scheduled on it, once
//! its delay has passed without another call. Each call bumps a generation
//! counter; a scheduled task fires only if its generation is still current
//! when it wakes.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Delay used to coalesce filter and sort edits.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Coalesces bursts of calls into one delayed action.
///
/// Must be used from within a Tokio runtime. Dropping the debouncer cancels
/// whatever is pending.
#[derive(Debug, Default)]
pub struct Debouncer {
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `action` to run after `delay`, superseding any action
    /// scheduled earlier that has not started yet.
    ///
    /// Does nothing once the debouncer is disposed.
    pub fn debounce<F>(&self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.generation);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::SeqCst) == generation {
                action.await;
            }
        });

        // A superseded task wakes, sees a newer generation and exits.
        *self.lock() = Some(handle);
    }

    /// Cancels the pending action, including one that is already running.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.lock().take() {
            handle.abort();
        }
    }

    /// Cancels pending work and ignores all later calls.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Returns true while the latest scheduled action has not finished.
    pub fn is_pending(&self) -> bool {
        self.lock().as_ref().is_some_and(|h| !h.is_finished())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
