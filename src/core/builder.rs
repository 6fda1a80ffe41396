//! # Container builder.
//!
//! Everything a container depends on comes from here; there is no global
//! registry.
//!
//! ```text
//! Container::builder(initial)
//!     .config(ContainerConfig)            debounce, capacities, buffering, grace
//!     .background(Handle)                 where non-blocking intents run
//!     .idling_tracker(Arc<dyn ..>)        default: CountingIdlingTracker
//!     .restore(|| Option<S>)              read once; Some replaces `initial`
//!     .observers(Vec<Arc<dyn Observe>>)   lifecycle event fan-out
//!     .on_create(pipeline)                first intent(s)
//!     .build()
//! ```

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::config::ContainerConfig;
use super::container::{Container, Shared};
use super::dispatcher::Dispatcher;
use super::inflight::Inflight;
use super::state::StateCell;
use crate::events::{ContainerEvent, EventBus, EventKind, SideEffectBus};
use crate::idling::{CountingIdlingTracker, IdlingTracker};
use crate::intent::{Pipeline, SideEffect, State};
use crate::observers::{Observe, ObserverSet};
use crate::subscription::SubscribedCounter;

type RestoreHook<S> = Box<dyn FnOnce() -> Option<S> + Send>;

/// Builder for a [`Container`].
pub struct ContainerBuilder<S, E> {
    initial: S,
    cfg: ContainerConfig,
    background: Option<Handle>,
    idling: Option<Arc<dyn IdlingTracker>>,
    restore: Option<RestoreHook<S>>,
    observers: Vec<Arc<dyn Observe>>,
    on_create: Vec<Pipeline<S, E>>,
}

impl<S: State, E: SideEffect> ContainerBuilder<S, E> {
    /// Creates a builder with default configuration.
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            cfg: ContainerConfig::default(),
            background: None,
            idling: None,
            restore: None,
            observers: Vec::new(),
            on_create: Vec::new(),
        }
    }

    /// Replaces the configuration.
    pub fn config(mut self, cfg: ContainerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Runtime handle non-blocking intents are spawned on.
    ///
    /// Defaults to the runtime `build()` is called from.
    pub fn background(mut self, handle: Handle) -> Self {
        self.background = Some(handle);
        self
    }

    /// Tracker stages report busy/idle to.
    pub fn idling_tracker(mut self, tracker: Arc<dyn IdlingTracker>) -> Self {
        self.idling = Some(tracker);
        self
    }

    /// Hook read once at build time; `Some` replaces the initial state.
    pub fn restore<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> Option<S> + Send + 'static,
    {
        self.restore = Some(Box::new(hook));
        self
    }

    /// Sets lifecycle event observers.
    ///
    /// Each observer gets a dedicated worker and bounded queue.
    pub fn observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Submits `pipeline` as soon as the container is built.
    ///
    /// Called repeatedly, pipelines are submitted in call order.
    pub fn on_create(mut self, pipeline: Pipeline<S, E>) -> Self {
        self.on_create.push(pipeline);
        self
    }

    /// Builds the container and starts its dispatcher.
    ///
    /// # Panics
    /// Without [`background`](Self::background), panics when called outside a
    /// tokio runtime.
    pub fn build(self) -> Container<S, E> {
        let background = self.background.unwrap_or_else(Handle::current);
        let cfg = self.cfg;
        let initial = self.restore.and_then(|hook| hook()).unwrap_or(self.initial);
        let idling = self
            .idling
            .unwrap_or_else(|| Arc::new(CountingIdlingTracker::new()));

        let bus = EventBus::new(cfg.bus_capacity_clamped());
        let token = CancellationToken::new();
        let (intents, rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            state: StateCell::new(initial, cfg.state_capacity_clamped()),
            side_effects: SideEffectBus::new(
                cfg.side_effect_capacity_clamped(),
                cfg.side_effect_buffering,
            ),
            serial: tokio::sync::Mutex::new(()),
            subscribed: SubscribedCounter::new(cfg.subscribe_debounce),
            idling,
            bus: bus.clone(),
            inflight: Inflight::new(),
            token: token.clone(),
            intents,
            next_id: AtomicU64::new(0),
            dispatcher: Mutex::new(None),
            cfg,
        });

        if !self.observers.is_empty() {
            let set = ObserverSet::new(self.observers, bus.clone(), &background);
            observer_listener(&background, &bus, set);
        }
        subscription_forwarder(&background, &shared);

        let dispatcher = Dispatcher::new(Arc::clone(&shared), rx, background.clone());
        *shared.dispatcher.lock() = Some(background.spawn(dispatcher.run()));

        let container = Container::from_shared(shared);
        for pipeline in self.on_create {
            container.intent(pipeline);
        }
        container
    }
}

/// Forwards bus events to the observer set until the container closes.
fn observer_listener(background: &Handle, bus: &EventBus, set: ObserverSet) {
    let mut rx = bus.subscribe();
    background.spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    let closed = ev.kind == EventKind::ContainerClosed;
                    set.emit(ev);
                    if closed {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "observer listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    });
}

/// Publishes every subscribed-counter status change as a lifecycle event.
fn subscription_forwarder<S, E>(background: &Handle, shared: &Arc<Shared<S, E>>) {
    let mut status = shared.subscribed.watch();
    let bus = shared.bus.clone();
    let token = shared.token.clone();
    background.spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                changed = status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = *status.borrow_and_update();
                    bus.publish(
                        ContainerEvent::new(EventKind::SubscriptionChanged)
                            .with_subscription(current),
                    );
                }
            }
        }
    });
}
