//! # Side-effect channel.
//!
//! Multicast delivery of one-off side effects in post order, without replay.
//! Every active observer owns an unbounded queue, so a slow observer never
//! loses an effect; only unobserved effects are subject to the policy below.
//!
//! ```text
//! post(e) ──lock──► send a clone to every live observer queue
//!                     ├─ at least one accepted → Delivered
//!                     └─ none (closed queues pruned) → no observer:
//!                          ├─ DropUnobserved   → Dropped
//!                          └─ BufferUnobserved → backlog (oldest evicted when full)
//!
//! subscribe() ──lock──► take backlog + register a new queue
//!                       stream = backlog items, then live items
//! ```
//!
//! The backlog is handed to the first observer that subscribes; later observers
//! only see effects posted after they subscribed.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use crate::core::SideEffectBuffering;

/// Outcome of [`SideEffectBus::post`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// At least one observer received the effect.
    Delivered,
    /// Nobody was observing; the effect waits in the backlog.
    Buffered,
    /// Nobody was observing and the policy discards unobserved effects.
    Dropped,
}

struct Channels<E> {
    observers: Vec<mpsc::UnboundedSender<E>>,
    backlog: VecDeque<E>,
}

pub(crate) struct SideEffectBus<E> {
    channels: Mutex<Channels<E>>,
    buffering: SideEffectBuffering,
    backlog_capacity: usize,
}

impl<E: Clone + Send + 'static> SideEffectBus<E> {
    pub(crate) fn new(backlog_capacity: usize, buffering: SideEffectBuffering) -> Self {
        Self {
            channels: Mutex::new(Channels {
                observers: Vec::new(),
                backlog: VecDeque::new(),
            }),
            buffering,
            backlog_capacity: backlog_capacity.max(1),
        }
    }

    pub(crate) fn post(&self, effect: E) -> Delivery {
        let mut channels = self.channels.lock();
        channels
            .observers
            .retain(|observer| observer.send(effect.clone()).is_ok());
        if !channels.observers.is_empty() {
            return Delivery::Delivered;
        }

        match self.buffering {
            SideEffectBuffering::DropUnobserved => Delivery::Dropped,
            SideEffectBuffering::BufferUnobserved => {
                if channels.backlog.len() >= self.backlog_capacity {
                    channels.backlog.pop_front();
                    warn!(
                        capacity = self.backlog_capacity,
                        "side-effect backlog full; evicted oldest"
                    );
                }
                channels.backlog.push_back(effect);
                Delivery::Buffered
            }
        }
    }

    pub(crate) fn subscribe(&self) -> BoxStream<'static, E> {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = {
            let mut channels = self.channels.lock();
            channels.observers.push(tx);
            std::mem::take(&mut channels.backlog)
        };
        let live = stream::unfold(rx, |mut rx| async move {
            let effect = rx.recv().await?;
            Some((effect, rx))
        });
        stream::iter(pending).chain(live).boxed()
    }

    #[cfg(test)]
    pub(crate) fn backlog_len(&self) -> usize {
        self.channels.lock().backlog.len()
    }
}
