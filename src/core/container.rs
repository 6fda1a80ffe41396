//! # Container: the single owner of one state value.
//!
//! The [`Container`] owns the state cell, the side-effect channel, the
//! subscribed counter, the idling tracker and the lifecycle event bus. Intents
//! are admitted by a dispatcher task and run by per-intent runners.
//!
//! ## High-level architecture
//! ```text
//! intent(pipeline) ──► mpsc ──► dispatcher
//!                                  ├─ non-blocking → JoinSet::spawn_on(background, runner)
//!                                  └─ blocking     → runner inline, serialization lock held
//!
//! runner ──► stages ──► reduce ──fair lock──► StateCell::commit ──► state_stream()
//!                  └──► post   ───────────────► SideEffectBus   ──► side_effects()
//!
//! ref_counted_*() ──► RefCounted ──► SubscribedCounter ──► repeat_on_subscription
//! ```
//!
//! ## Teardown
//! ```text
//! close() / last Container dropped
//!   └─► root token cancelled
//!         ├─ queued intents      → Cancelled
//!         ├─ running intents     → cancelled at their next await, drained within `grace`
//!         ├─ subscribed counter  → released (Unsubscribed)
//!         └─ ContainerClosed published; streams end
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use super::builder::ContainerBuilder;
use super::config::ContainerConfig;
use super::inflight::Inflight;
use super::state::StateCell;
use crate::error::ContainerError;
use crate::events::{ContainerEvent, EventBus, EventKind, SideEffectBus, receiver_stream};
use crate::idling::IdlingTracker;
use crate::intent::{
    Chain, IntentHandle, IntentId, IntentOptions, IntentStatus, Pipeline, SideEffect, State,
};
use crate::subscription::{RefCountExt, RefCounted, SubscribedCounter};

/// One admitted intent waiting for the dispatcher.
pub(crate) struct Job<S, E> {
    pub(crate) id: IntentId,
    pub(crate) name: Arc<str>,
    pub(crate) idling: Option<bool>,
    pub(crate) blocking: bool,
    pub(crate) chain: Chain<S, E>,
    pub(crate) token: CancellationToken,
    pub(crate) status: watch::Sender<IntentStatus>,
}

impl<S, E> Job<S, E> {
    /// Marks a job that will never run as cancelled.
    pub(crate) fn refuse(self) {
        self.token.cancel();
        self.status.send_replace(IntentStatus::Cancelled);
    }
}

/// Everything the dispatcher, runners and stages share.
pub(crate) struct Shared<S, E> {
    pub(crate) cfg: ContainerConfig,
    pub(crate) state: StateCell<S>,
    pub(crate) side_effects: SideEffectBus<E>,
    /// Fair (FIFO) serialization point for reduces.
    pub(crate) serial: tokio::sync::Mutex<()>,
    pub(crate) subscribed: SubscribedCounter,
    pub(crate) idling: Arc<dyn IdlingTracker>,
    pub(crate) bus: EventBus,
    pub(crate) inflight: Arc<Inflight>,
    /// Root token; every intent token is a child.
    pub(crate) token: CancellationToken,
    pub(crate) intents: mpsc::UnboundedSender<Job<S, E>>,
    pub(crate) next_id: AtomicU64,
    pub(crate) dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl<S: State, E: SideEffect> Shared<S, E> {
    /// Queues a pipeline; `Err` carries an already-cancelled handle.
    fn admit<T: Send + 'static>(
        &self,
        pipeline: Pipeline<S, E, T>,
        opts: IntentOptions,
    ) -> Result<IntentHandle, IntentHandle> {
        let (name, idling, chain) = pipeline.into_parts();
        let name: Arc<str> = Arc::from(name.as_ref());
        let id = IntentId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);

        if self.token.is_cancelled() {
            debug!(intent = %name, %id, "intent refused: container closed");
            return Err(IntentHandle::refused(id, name));
        }

        let token = self.token.child_token();
        let (status, rx) = watch::channel(IntentStatus::Scheduled);
        let handle = IntentHandle::new(id, Arc::clone(&name), token.clone(), rx);
        let job = Job {
            id,
            name,
            idling: opts.idling_override().or(idling),
            blocking: opts.is_blocking(),
            chain,
            token,
            status,
        };

        match self.intents.send(job) {
            Ok(()) => Ok(handle),
            Err(mpsc::error::SendError(job)) => {
                debug!(intent = %job.name, id = %job.id, "intent refused: dispatcher gone");
                job.refuse();
                Err(handle)
            }
        }
    }

    pub(crate) fn submit<T: Send + 'static>(
        &self,
        pipeline: Pipeline<S, E, T>,
        opts: IntentOptions,
    ) -> Result<IntentHandle, ContainerError> {
        self.admit(pipeline, opts).map_err(|_| ContainerError::Closed)
    }

    pub(crate) fn submit_or_refuse<T: Send + 'static>(
        &self,
        pipeline: Pipeline<S, E, T>,
        opts: IntentOptions,
    ) -> IntentHandle {
        self.admit(pipeline, opts).unwrap_or_else(|refused| refused)
    }
}

/// Reactive single-owner state container.
///
/// Cheap to clone; all clones drive the same container. Dropping the last
/// clone tears the container down as [`close`](Self::close) would, without
/// waiting.
///
/// ## Example
/// ```rust
/// use statevisor::{Container, IntentStatus, Pipeline, StageError};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Profile { id: u32 }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let container: Container<Profile, String> = Container::builder(Profile { id: 42 }).build();
///
/// let handle = container.intent(
///     Pipeline::new("load")
///         .transform(|_ctx, ()| async { Ok::<_, StageError>(7 + 5) })
///         .reduce(|_state, id| Profile { id }),
/// );
///
/// assert_eq!(handle.join().await, IntentStatus::Completed);
/// assert_eq!(*container.state(), Profile { id: 12 });
/// container.close().await.unwrap();
/// # }
/// ```
pub struct Container<S, E = ()> {
    pub(crate) shared: Arc<Shared<S, E>>,
    _teardown: Arc<DropGuard>,
}

impl<S, E> Clone for Container<S, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            _teardown: Arc::clone(&self._teardown),
        }
    }
}

impl<S: State, E: SideEffect> Container<S, E> {
    /// Starts building a container holding `initial`.
    pub fn builder(initial: S) -> ContainerBuilder<S, E> {
        ContainerBuilder::new(initial)
    }

    pub(crate) fn from_shared(shared: Arc<Shared<S, E>>) -> Self {
        let teardown = shared.token.clone().drop_guard();
        Self {
            shared,
            _teardown: Arc::new(teardown),
        }
    }

    /// Consistent snapshot of the current state.
    pub fn state(&self) -> Arc<S> {
        self.shared.state.current()
    }

    /// Current state first, then every committed state in commit order.
    ///
    /// Ends on teardown.
    pub fn state_stream(&self) -> BoxStream<'static, Arc<S>> {
        self.shared
            .state
            .stream()
            .take_until(self.shared.token.clone().cancelled_owned())
            .boxed()
    }

    /// Side effects in post order, without replay.
    ///
    /// The first observer after a quiet period also receives the effects
    /// buffered while nobody observed (see [`SideEffectBuffering`](crate::SideEffectBuffering)).
    /// Ends on teardown.
    pub fn side_effects(&self) -> BoxStream<'static, E> {
        self.shared
            .side_effects
            .subscribe()
            .take_until(self.shared.token.clone().cancelled_owned())
            .boxed()
    }

    /// [`state_stream`](Self::state_stream) counted by the container's subscribed counter.
    pub fn ref_counted_state_stream(&self) -> RefCounted<BoxStream<'static, Arc<S>>> {
        self.state_stream().ref_counted(self.subscribed_counter())
    }

    /// [`side_effects`](Self::side_effects) counted by the container's subscribed counter.
    pub fn ref_counted_side_effects(&self) -> RefCounted<BoxStream<'static, E>> {
        self.side_effects().ref_counted(self.subscribed_counter())
    }

    /// Lifecycle events from now on; ends after `ContainerClosed`.
    pub fn events(&self) -> BoxStream<'static, ContainerEvent> {
        let rx = self.shared.bus.subscribe();
        if self.shared.token.is_cancelled() && self.shared.dispatcher.lock().is_none() {
            return stream::empty().boxed();
        }
        receiver_stream(rx, "events")
            .scan(false, |closed, ev| {
                let item = (!*closed).then(|| {
                    *closed = ev.kind == EventKind::ContainerClosed;
                    ev
                });
                futures::future::ready(item)
            })
            .boxed()
    }

    /// Submits a pipeline with default options.
    ///
    /// After teardown the returned handle is already `Cancelled`.
    pub fn intent<T: Send + 'static>(&self, pipeline: Pipeline<S, E, T>) -> IntentHandle {
        self.shared.submit_or_refuse(pipeline, IntentOptions::default())
    }

    /// Submits a pipeline with explicit options.
    pub fn intent_with<T: Send + 'static>(
        &self,
        pipeline: Pipeline<S, E, T>,
        opts: IntentOptions,
    ) -> IntentHandle {
        self.shared.submit_or_refuse(pipeline, opts)
    }

    /// Like [`intent`](Self::intent) but reports a closed container as an error.
    pub fn try_intent<T: Send + 'static>(
        &self,
        pipeline: Pipeline<S, E, T>,
    ) -> Result<IntentHandle, ContainerError> {
        self.shared.submit(pipeline, IntentOptions::default())
    }

    /// Like [`intent_with`](Self::intent_with) but reports a closed container as an error.
    pub fn try_intent_with<T: Send + 'static>(
        &self,
        pipeline: Pipeline<S, E, T>,
        opts: IntentOptions,
    ) -> Result<IntentHandle, ContainerError> {
        self.shared.submit(pipeline, opts)
    }

    /// The counter fed by the ref-counted streams.
    pub fn subscribed_counter(&self) -> SubscribedCounter {
        self.shared.subscribed.clone()
    }

    /// The tracker stages report to.
    pub fn idling_tracker(&self) -> Arc<dyn IdlingTracker> {
        Arc::clone(&self.shared.idling)
    }

    /// True when no tracked stage is in flight.
    pub fn is_idle(&self) -> bool {
        self.shared.idling.is_idle()
    }

    /// `name#id` labels of the intents running right now, sorted by id.
    pub fn running_intents(&self) -> Vec<String> {
        self.shared.inflight.snapshot()
    }

    /// Configuration the container was built with.
    pub fn config(&self) -> &ContainerConfig {
        &self.shared.cfg
    }

    /// True once teardown has started.
    pub fn is_closed(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    /// Tears the container down and waits for in-flight intents.
    ///
    /// Returns [`ContainerError::GraceExceeded`] (and aborts the rest) when they
    /// do not stop within the configured grace period. Calling it again, or
    /// from another clone, returns `Ok(())` without waiting.
    pub async fn close(&self) -> Result<(), ContainerError> {
        self.shared.token.cancel();
        let Some(mut dispatcher) = self.shared.dispatcher.lock().take() else {
            return Ok(());
        };

        let grace = self.shared.cfg.grace;
        match tokio::time::timeout(grace, &mut dispatcher).await {
            Ok(_) => Ok(()),
            Err(_elapsed) => {
                let stuck = self.shared.inflight.snapshot();
                warn!(?grace, ?stuck, "teardown grace exceeded; aborting");
                dispatcher.abort();
                self.shared
                    .bus
                    .publish(ContainerEvent::new(EventKind::ContainerClosed));
                Err(ContainerError::GraceExceeded { grace, stuck })
            }
        }
    }
}

impl<S, E> std::fmt::Debug for Container<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("closed", &self.shared.token.is_cancelled())
            .field("subscribed", &self.shared.subscribed)
            .finish_non_exhaustive()
    }
}
