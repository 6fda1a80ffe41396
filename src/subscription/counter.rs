//! # SubscribedCounter: debounced observer count.
//!
//! Counts active observers of the container streams and publishes a two-valued
//! [`Subscription`] status.
//!
//! ## Transitions
//! ```text
//! count 0 → 1      ──► Subscribed (immediately, under the same lock)
//! count 1 → 0      ──► arm timer(debounce)
//!   increment before timer fires ──► timer disarmed, no status change
//!   timer fires with count == 0  ──► Unsubscribed
//! release_all()    ──► count = 0, Unsubscribed (immediately)
//! ```
//!
//! ## Rules
//! - The status never repeats (distinct-until-changed).
//! - New observers see the current status first.
//! - Decrement at zero is ignored.
//! - Outside a tokio runtime the debounce cannot be armed and Unsubscribed is published at once.

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tracing::trace;

/// Observer presence reported by [`SubscribedCounter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscription {
    /// At least one observer is active (or was, within the debounce window).
    Subscribed,
    /// No observer has been active for at least the debounce window.
    Unsubscribed,
}

impl Subscription {
    /// True for [`Subscription::Subscribed`].
    #[inline]
    pub fn is_subscribed(self) -> bool {
        matches!(self, Subscription::Subscribed)
    }
}

/// Thread-safe observer counter with a debounced Unsubscribed edge.
///
/// Cheap to clone; clones share the same count.
#[derive(Clone)]
pub struct SubscribedCounter {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<CounterState>,
    status: watch::Sender<Subscription>,
    debounce: Duration,
}

struct CounterState {
    count: usize,
    /// Bumped on every transition that invalidates a pending timer.
    epoch: u64,
    timer: Option<JoinHandle<()>>,
}

impl SubscribedCounter {
    /// Creates a counter at zero with status [`Subscription::Unsubscribed`].
    pub fn new(debounce: Duration) -> Self {
        let (status, _rx) = watch::channel(Subscription::Unsubscribed);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(CounterState {
                    count: 0,
                    epoch: 0,
                    timer: None,
                }),
                status,
                debounce,
            }),
        }
    }

    /// Registers one more observer.
    pub fn increment(&self) {
        let mut st = self.inner.state.lock();
        st.count += 1;
        st.epoch = st.epoch.wrapping_add(1);
        if let Some(timer) = st.timer.take() {
            timer.abort();
        }
        if self.inner.publish(Subscription::Subscribed) {
            trace!(count = st.count, "subscribed");
        }
    }

    /// Unregisters one observer; ignored when the count is already zero.
    pub fn decrement(&self) {
        let mut st = self.inner.state.lock();
        if st.count == 0 {
            trace!("decrement on empty counter ignored");
            return;
        }
        st.count -= 1;
        if st.count > 0 {
            return;
        }

        st.epoch = st.epoch.wrapping_add(1);
        let epoch = st.epoch;
        let debounce = self.inner.debounce;

        match Handle::try_current() {
            Ok(rt) if !debounce.is_zero() => {
                let weak: Weak<Inner> = Arc::downgrade(&self.inner);
                st.timer = Some(rt.spawn(async move {
                    tokio::time::sleep(debounce).await;
                    if let Some(inner) = weak.upgrade() {
                        inner.expire(epoch);
                    }
                }));
            }
            _ => {
                if self.inner.publish(Subscription::Unsubscribed) {
                    trace!("unsubscribed");
                }
            }
        }
    }

    /// Forces the count to zero and publishes [`Subscription::Unsubscribed`] immediately.
    ///
    /// Used on container teardown so no outstanding increment leaks.
    pub fn release_all(&self) {
        let mut st = self.inner.state.lock();
        st.count = 0;
        st.epoch = st.epoch.wrapping_add(1);
        if let Some(timer) = st.timer.take() {
            timer.abort();
        }
        if self.inner.publish(Subscription::Unsubscribed) {
            trace!("released all observers");
        }
    }

    /// Current number of registered observers.
    pub fn count(&self) -> usize {
        self.inner.state.lock().count
    }

    /// Current published status.
    pub fn status(&self) -> Subscription {
        *self.inner.status.borrow()
    }

    /// Returns a watch receiver positioned at the current status.
    pub fn watch(&self) -> watch::Receiver<Subscription> {
        self.inner.status.subscribe()
    }

    /// Stream of statuses: the current one first, then every change.
    ///
    /// Consecutive duplicates are suppressed even if the underlying watch
    /// coalesced a `Subscribed → Unsubscribed → Subscribed` burst.
    pub fn statuses(&self) -> BoxStream<'static, Subscription> {
        let rx = self.watch();
        stream::unfold((rx, None), |(mut rx, last)| async move {
            loop {
                let current = *rx.borrow_and_update();
                if last != Some(current) {
                    return Some((current, (rx, Some(current))));
                }
                if rx.changed().await.is_err() {
                    return None;
                }
            }
        })
        .boxed()
    }
}

impl std::fmt::Debug for SubscribedCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscribedCounter")
            .field("count", &self.count())
            .field("status", &self.status())
            .field("debounce", &self.inner.debounce)
            .finish()
    }
}

impl Inner {
    /// Publishes `status` if it differs from the current one; returns whether it changed.
    fn publish(&self, status: Subscription) -> bool {
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        })
    }

    /// Debounce timer callback.
    fn expire(&self, epoch: u64) {
        let mut st = self.state.lock();
        if st.epoch != epoch || st.count != 0 {
            return;
        }
        st.timer = None;
        if self.publish(Subscription::Unsubscribed) {
            trace!("unsubscribed after debounce");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(timer) = self.state.get_mut().timer.take() {
            timer.abort();
        }
    }
}
