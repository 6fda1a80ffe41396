//! # The single state cell.
//!
//! Holds the current state and multicasts every commit.
//!
//! ```text
//! commit(next) ──write lock──► next == current? ── yes → nothing
//!                                   └─ no → swap + Bus::publish(next)
//!
//! stream() ──read lock──► (current, receiver)
//!                          stream = current, then every later commit
//! ```
//!
//! Commit and subscribe take the same lock, so a new stream never misses nor
//! repeats the commit that races with it.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::RwLock;
use tracing::trace;

use crate::events::{Bus, receiver_stream};

pub(crate) struct StateCell<S> {
    current: RwLock<Arc<S>>,
    bus: Bus<Arc<S>>,
}

impl<S: PartialEq + Send + Sync + 'static> StateCell<S> {
    pub(crate) fn new(initial: S, capacity: usize) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            bus: Bus::new(capacity),
        }
    }

    pub(crate) fn current(&self) -> Arc<S> {
        Arc::clone(&self.current.read())
    }

    /// Replaces the state unless `next` equals it. Returns whether it committed.
    ///
    /// Callers hold the serialization lock.
    pub(crate) fn commit(&self, next: S) -> bool {
        let mut current = self.current.write();
        if **current == next {
            trace!("reduce produced an equal state; nothing committed");
            return false;
        }
        let next = Arc::new(next);
        *current = Arc::clone(&next);
        self.bus.publish(next);
        true
    }

    /// Latest state first, then every later commit in order.
    pub(crate) fn stream(&self) -> BoxStream<'static, Arc<S>> {
        let (latest, rx) = {
            let current = self.current.read();
            (Arc::clone(&current), self.bus.subscribe())
        };
        stream::once(async move { latest })
            .chain(receiver_stream(rx, "state"))
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_replays_latest_then_commits() {
        let cell = StateCell::new(1, 8);
        assert!(cell.commit(2));

        let mut s = cell.stream();
        assert!(cell.commit(3));
        assert_eq!(*s.next().await.unwrap(), 2);
        assert_eq!(*s.next().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_equal_state_is_not_committed() {
        let cell = StateCell::new("a", 8);
        let mut s = cell.stream();
        assert!(!cell.commit("a"));
        assert!(cell.commit("b"));

        assert_eq!(*s.next().await.unwrap(), "a");
        assert_eq!(*s.next().await.unwrap(), "b");
    }

    #[tokio::test]
    async fn test_lagging_stream_converges_to_latest() {
        let cell = StateCell::new(0u32, 2);
        let mut s = cell.stream();
        for i in 1..=10 {
            cell.commit(i);
        }
        assert_eq!(*s.next().await.unwrap(), 0);
        let mut last = 0;
        while last != 10 {
            last = *s.next().await.unwrap();
        }
        assert_eq!(*cell.current(), 10);
    }
}
