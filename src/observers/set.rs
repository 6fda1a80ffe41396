//! # Non-blocking event fan-out to multiple observers.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► observer1.on_event()
//!     │    (bounded)         └──────► panic → ObserverPanicked
//!     ├──► [queue 2] ──► worker 2 ──► observer2.on_event()
//!     │    (bounded)
//!     └──► [queue N] ──► worker N ──► observerN.on_event()
//! ```
//!
//! ## Rules
//! - **No cross-observer ordering**: observer A may process event N while B processes N+5
//! - **Overflow**: event dropped for that observer only, `ObserverOverflow` published
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Per-observer FIFO**: each observer sees events in order
//!
//! `AssertUnwindSafe` is used around `on_event`; an observer that panics while
//! holding its own lock may leave that state poisoned or inconsistent.

use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Observe;
use crate::error::panic_info;
use crate::events::{ContainerEvent, EventBus};

struct ObserverChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<ContainerEvent>>,
}

/// Fan-out coordinator for lifecycle event observers.
pub(crate) struct ObserverSet {
    channels: Vec<ObserverChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: EventBus,
}

impl ObserverSet {
    /// Spawns one worker per observer on `rt`.
    pub(crate) fn new(
        observers: Vec<Arc<dyn Observe>>,
        bus: EventBus,
        rt: &Handle,
    ) -> Self {
        let mut channels = Vec::with_capacity(observers.len());
        let mut workers = Vec::with_capacity(observers.len());

        for obs in observers {
            let name = obs.name();
            let (tx, mut rx) = mpsc::channel::<Arc<ContainerEvent>>(obs.queue_capacity().max(1));
            let worker_bus = bus.clone();

            workers.push(rt.spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = obs.on_event(ev.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = panic_info(panic.as_ref());
                        worker_bus.publish(ContainerEvent::observer_panicked(name, info));
                    }
                }
            }));
            channels.push(ObserverChannel { name, sender: tx });
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Queues `event` for every observer without waiting.
    ///
    /// Observer health events that overflow are not re-published.
    pub(crate) fn emit(&self, event: ContainerEvent) {
        let health = event.is_observer_health();
        let event = Arc::new(event);

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !health {
                self.bus
                    .publish(ContainerEvent::observer_overflow(channel.name, reason));
            }
        }
    }

    /// Closes every queue and waits for the workers to drain them.
    pub(crate) async fn shutdown(self) {
        drop(self.channels);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}
