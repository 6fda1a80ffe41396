//! # Scoped idling registration.
//!
//! [`IdlingGuard`] increments a tracker on creation and decrements it on drop,
//! so a tracked unit is released on success, error, panic unwinding and
//! cancellation alike. [`track`] applies it to a future.

use std::future::Future;
use std::sync::Arc;

use super::tracker::IdlingTracker;

/// Holds one unit of work on an [`IdlingTracker`] until dropped.
#[must_use = "dropping the guard marks the work as finished"]
pub struct IdlingGuard {
    tracker: Arc<dyn IdlingTracker>,
}

impl IdlingGuard {
    /// Increments `tracker` until the guard is dropped.
    pub fn new(tracker: Arc<dyn IdlingTracker>) -> Self {
        tracker.increment();
        Self { tracker }
    }

    /// Like [`IdlingGuard::new`] but only when `enabled`.
    pub fn when(enabled: bool, tracker: &Arc<dyn IdlingTracker>) -> Option<Self> {
        enabled.then(|| Self::new(Arc::clone(tracker)))
    }
}

impl Drop for IdlingGuard {
    fn drop(&mut self) {
        self.tracker.decrement();
    }
}

/// Runs `fut` as one tracked unit of `tracker`.
///
/// The tracker is incremented when the returned future is first polled and
/// decremented when it completes or is dropped.
pub async fn track<F: Future>(tracker: Arc<dyn IdlingTracker>, fut: F) -> F::Output {
    let _guard = IdlingGuard::new(tracker);
    fut.await
}
