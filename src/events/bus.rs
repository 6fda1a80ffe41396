//! # Broadcast bus.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking publishing from many sources (dispatcher, intent runners,
//! stages). It carries the container's lifecycle [`ContainerEvent`](super::ContainerEvent)s
//! and committed states.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent items for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: items are lost if there are no receivers at send time.
//!
//! [`EventBus`] is the per-container lifecycle bus: it stamps each event with
//! the container's next sequence number as it publishes it.

use std::sync::Arc;

use futures::Stream;
use futures::stream;
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use super::event::ContainerEvent;

/// Broadcast channel for cloneable items.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Debug)]
pub struct Bus<T> {
    tx: broadcast::Sender<T>,
}

impl<T> Clone for Bus<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Clone> Bus<T> {
    /// Creates a new bus with the given ring capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<T>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an item to all active receivers; dropped if there are none.
    pub fn publish(&self, item: T) {
        let _ = self.tx.send(item);
    }

    /// Creates a new receiver that will observe subsequent items.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }
}

/// Lifecycle event bus of one container.
///
/// Clones share the bus and the sequence counter, so sequence numbers follow
/// publish order within a container and start at 0 for every container.
#[derive(Clone)]
pub(crate) struct EventBus {
    bus: Bus<ContainerEvent>,
    next_seq: Arc<Mutex<u64>>,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            bus: Bus::new(capacity),
            next_seq: Arc::new(Mutex::new(0)),
        }
    }

    /// Numbers `event` and publishes it.
    pub(crate) fn publish(&self, mut event: ContainerEvent) {
        // numbering and sending under one lock keeps seq in receive order
        let mut next = self.next_seq.lock();
        event.seq = *next;
        *next += 1;
        self.bus.publish(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ContainerEvent> {
        self.bus.subscribe()
    }
}

/// Turns a receiver into a stream that ends when the bus closes.
///
/// Lagged receivers skip the overwritten items (logged with `channel`) and
/// keep going from the oldest retained one.
pub(crate) fn receiver_stream<T: Clone + Send + 'static>(
    rx: broadcast::Receiver<T>,
    channel: &'static str,
) -> impl Stream<Item = T> + Send + 'static {
    stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(item) => return Some((item, rx)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(channel, skipped, "receiver lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}
