//! # Container probe for test harnesses.
//!
//! A [`ContainerProbe`] is an explicit handle that records every state and
//! side effect a container emits from the moment it is created. It uses the
//! plain (not ref-counted) streams, so attaching a probe never changes the
//! container's subscription status. Being the first side-effect observer, it
//! also receives effects buffered while nobody observed.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;

use crate::core::Container;
use crate::idling::IdlingTracker;
use crate::intent::{SideEffect, State};

/// Records states and side effects of one container.
pub struct ContainerProbe<S, E> {
    states: Arc<Mutex<Vec<Arc<S>>>>,
    side_effects: Arc<Mutex<Vec<E>>>,
    state_rx: mpsc::UnboundedReceiver<Arc<S>>,
    side_effect_rx: mpsc::UnboundedReceiver<E>,
    idling: Arc<dyn IdlingTracker>,
    idle: Option<Arc<Notify>>,
    collectors: [JoinHandle<()>; 2],
}

impl<S: State, E: SideEffect> Container<S, E> {
    /// Attaches a probe recording from now on.
    ///
    /// The first recorded state is the current one.
    pub fn probe(&self) -> ContainerProbe<S, E> {
        let states = Arc::new(Mutex::new(Vec::new()));
        let side_effects = Arc::new(Mutex::new(Vec::new()));
        let (state_tx, state_rx) = mpsc::unbounded_channel();
        let (side_effect_tx, side_effect_rx) = mpsc::unbounded_channel();

        let mut stream = self.state_stream();
        let log = Arc::clone(&states);
        let state_collector = tokio::spawn(async move {
            while let Some(state) = stream.next().await {
                log.lock().push(Arc::clone(&state));
                let _ = state_tx.send(state);
            }
        });

        let mut stream = self.side_effects();
        let log = Arc::clone(&side_effects);
        let side_effect_collector = tokio::spawn(async move {
            while let Some(effect) = stream.next().await {
                log.lock().push(effect.clone());
                let _ = side_effect_tx.send(effect);
            }
        });

        // trackers never drop callbacks, so the waker only holds the Notify weakly
        let idling = self.idling_tracker();
        let notify = Arc::new(Notify::new());
        let waker = Arc::downgrade(&notify);
        let idle = idling
            .register_idle_callback(Arc::new(move || {
                if let Some(notify) = waker.upgrade() {
                    notify.notify_waiters();
                }
            }))
            .then_some(notify);

        ContainerProbe {
            states,
            side_effects,
            state_rx,
            side_effect_rx,
            idling,
            idle,
            collectors: [state_collector, side_effect_collector],
        }
    }
}

impl<S: State, E: SideEffect> ContainerProbe<S, E> {
    /// Next recorded state, or `None` when nothing arrives within `within`.
    pub async fn next_state(&mut self, within: Duration) -> Option<Arc<S>> {
        tokio::time::timeout(within, self.state_rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Next recorded side effect, or `None` when nothing arrives within `within`.
    pub async fn next_side_effect(&mut self, within: Duration) -> Option<E> {
        tokio::time::timeout(within, self.side_effect_rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Every state recorded so far.
    pub fn states(&self) -> Vec<Arc<S>> {
        self.states.lock().clone()
    }

    /// Every side effect recorded so far.
    pub fn side_effects(&self) -> Vec<E> {
        self.side_effects.lock().clone()
    }

    /// Waits until the idling tracker reports idle. Returns `false` on timeout.
    pub async fn await_idle(&self, within: Duration) -> bool {
        let wait = async {
            loop {
                match &self.idle {
                    Some(notify) => {
                        let notified = notify.notified();
                        tokio::pin!(notified);
                        notified.as_mut().enable();
                        if self.idling.is_idle() {
                            return;
                        }
                        notified.await;
                    }
                    None => {
                        if self.idling.is_idle() {
                            return;
                        }
                        tokio::time::sleep(Duration::from_millis(5)).await;
                    }
                }
            }
        };
        tokio::time::timeout(within, wait).await.is_ok()
    }
}

impl<S, E> Drop for ContainerProbe<S, E> {
    fn drop(&mut self) {
        for collector in &self.collectors {
            collector.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Container, CountingIdlingTracker, IdlingTracker, Pipeline, StageError};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_probe_records_states_and_effects() {
        let container: Container<u32, &'static str> = Container::builder(0).build();
        let mut probe = container.probe();

        container.intent(
            Pipeline::new("bump")
                .transform(|_ctx, ()| async { Ok::<u32, StageError>(5) })
                .side_effect(|_| "bumped")
                .reduce(|state, by| state + by),
        );

        let wait = Duration::from_secs(1);
        assert_eq!(probe.next_state(wait).await.as_deref(), Some(&0));
        assert_eq!(probe.next_state(wait).await.as_deref(), Some(&5));
        assert_eq!(probe.next_side_effect(wait).await, Some("bumped"));
        assert!(probe.await_idle(wait).await);
        assert_eq!(probe.states().len(), 2);
        assert_eq!(probe.side_effects(), vec!["bumped"]);

        container.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_recorder_releases_idle_waker() {
        let tracker = Arc::new(CountingIdlingTracker::new());
        let container: Container<u32, &'static str> = Container::builder(0)
            .idling_tracker(tracker.clone())
            .build();

        let first = container.probe();
        let second = container.probe();
        let wakers = [first.idle.as_ref(), second.idle.as_ref()]
            .map(|notify| Arc::downgrade(notify.expect("counting tracker accepts callbacks")));
        drop(first);
        drop(second);

        assert!(wakers.iter().all(|w| w.upgrade().is_none()));
        // stale callbacks stay registered and must be harmless
        tracker.increment();
        tracker.decrement();
        assert!(tracker.is_idle());

        container.close().await.unwrap();
    }
}
