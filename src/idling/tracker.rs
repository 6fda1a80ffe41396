//! # Idling trackers.
//!
//! An [`IdlingTracker`] is a counter-based busy signal for external
//! synchronization (test harnesses, instrumentation). The container increments
//! it before a tracked stage runs and decrements it afterwards, on every exit
//! path.
//!
//! ## Rules
//! - Trackers are observational only; they never influence scheduling.
//! - Decrement at zero is ignored.
//! - The idle callback capability is optional ([`IdlingTracker::register_idle_callback`]).

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::trace;

/// Callback fired on a busy → idle transition.
pub type IdleCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Counter-based busy/idle signal.
pub trait IdlingTracker: Send + Sync + 'static {
    /// Marks one unit of work as in flight.
    fn increment(&self);

    /// Marks one unit of work as finished.
    fn decrement(&self);

    /// True when no tracked work is in flight.
    fn is_idle(&self) -> bool;

    /// Registers a callback fired on each busy → idle transition.
    ///
    /// Returns `false` when the tracker does not support callbacks.
    fn register_idle_callback(&self, _callback: IdleCallback) -> bool {
        false
    }
}

/// Tracker that ignores everything and always reports idle.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIdlingTracker;

impl IdlingTracker for NoopIdlingTracker {
    fn increment(&self) {}

    fn decrement(&self) {}

    fn is_idle(&self) -> bool {
        true
    }
}

/// Counting tracker with idle callbacks and an async idle wait.
///
/// ### Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use statevisor::{CountingIdlingTracker, IdlingTracker};
///
/// let tracker = CountingIdlingTracker::new();
/// let fired = Arc::new(AtomicUsize::new(0));
/// let f = fired.clone();
/// tracker.register_idle_callback(Arc::new(move || { f.fetch_add(1, Ordering::SeqCst); }));
///
/// tracker.increment();
/// tracker.increment();
/// tracker.decrement();
/// assert!(!tracker.is_idle());
/// tracker.decrement();
/// assert!(tracker.is_idle());
/// assert_eq!(fired.load(Ordering::SeqCst), 1);
/// ```
pub struct CountingIdlingTracker {
    count: Mutex<usize>,
    idle: watch::Sender<bool>,
    callbacks: Mutex<Vec<IdleCallback>>,
}

impl CountingIdlingTracker {
    /// Creates an idle tracker.
    pub fn new() -> Self {
        let (idle, _rx) = watch::channel(true);
        Self {
            count: Mutex::new(0),
            idle,
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Number of tracked units currently in flight.
    pub fn count(&self) -> usize {
        *self.count.lock()
    }

    /// Completes once the tracker is idle (immediately if it already is).
    pub async fn wait_idle(&self) {
        let mut rx = self.idle.subscribe();
        // sender lives as long as `self`, so this cannot fail
        let _ = rx.wait_for(|idle| *idle).await;
    }
}

impl Default for CountingIdlingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CountingIdlingTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountingIdlingTracker")
            .field("count", &self.count())
            .finish()
    }
}

impl IdlingTracker for CountingIdlingTracker {
    fn increment(&self) {
        let mut count = self.count.lock();
        *count += 1;
        if *count == 1 {
            self.idle.send_replace(false);
            trace!("idling tracker busy");
        }
    }

    fn decrement(&self) {
        let became_idle = {
            let mut count = self.count.lock();
            match *count {
                0 => {
                    trace!("idling decrement on idle tracker ignored");
                    false
                }
                1 => {
                    *count = 0;
                    self.idle.send_replace(true);
                    true
                }
                _ => {
                    *count -= 1;
                    false
                }
            }
        };

        if became_idle {
            trace!("idling tracker idle");
            // callbacks run outside the counter lock so they may re-enter the tracker
            let callbacks = self.callbacks.lock().clone();
            for cb in callbacks {
                cb();
            }
        }
    }

    fn is_idle(&self) -> bool {
        *self.count.lock() == 0
    }

    fn register_idle_callback(&self, callback: IdleCallback) -> bool {
        self.callbacks.lock().push(callback);
        true
    }
}
