//! # Stage kinds and the per-stage execution context.
//!
//! Stage kinds are a closed set resolved when a [`Pipeline`](super::Pipeline)
//! is built; there is no runtime registry of stage handlers.
//!
//! | Kind           | Runs on                  | Idling by default | May replace state |
//! |----------------|--------------------------|-------------------|-------------------|
//! | `Transform`    | background context       | tracked           | no                |
//! | `SideEffect`   | background context       | tracked           | no                |
//! | `Reduce`       | serialization point      | tracked           | yes               |
//! | `Subscription` | inside a transform       | not tracked       | no                |
//!
//! Every stage body runs behind a panic boundary: a panic becomes
//! [`StageError::Panicked`] for the owning intent only.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, warn};

use super::handle::{IntentHandle, IntentId, IntentStatus};
use super::pipeline::Pipeline;
use super::{SideEffect, State};
use crate::core::Shared;
use crate::error::StageError;
use crate::events::{ContainerEvent, Delivery, EventKind};
use crate::idling::{IdlingGuard, IdlingTracker};

/// Closed set of pipeline stage kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Asynchronous, non-mutating work.
    Transform,
    /// Posting a one-off side effect.
    SideEffect,
    /// Serialized replacement of the current state.
    Reduce,
    /// Hot collection gated by state or subscription (`run_on`, `repeat_on_subscription`).
    Subscription,
}

impl StageKind {
    /// Whether the stage participates in the idling tracker unless overridden.
    pub fn tracked_by_default(self) -> bool {
        !matches!(self, StageKind::Subscription)
    }

    /// Short stable label for logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            StageKind::Transform => "transform",
            StageKind::SideEffect => "side_effect",
            StageKind::Reduce => "reduce",
            StageKind::Subscription => "subscription",
        }
    }
}

/// Everything one running intent shares between its stages.
pub(crate) struct IntentScope<S, E> {
    pub(crate) shared: Arc<Shared<S, E>>,
    pub(crate) id: IntentId,
    pub(crate) name: Arc<str>,
    pub(crate) token: CancellationToken,
    pub(crate) status: Arc<watch::Sender<IntentStatus>>,
    pub(crate) idling: Option<bool>,
    /// The intent runs inline on the serialization context and already owns it.
    pub(crate) serial_held: bool,
}

impl<S, E> Clone for IntentScope<S, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            id: self.id,
            name: Arc::clone(&self.name),
            token: self.token.clone(),
            status: Arc::clone(&self.status),
            idling: self.idling,
            serial_held: self.serial_held,
        }
    }
}

impl<S: State, E: SideEffect> IntentScope<S, E> {
    fn enter(&self, kind: StageKind) {
        let next = IntentStatus::running(kind);
        self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    pub(crate) fn tracks(&self, kind: StageKind) -> bool {
        self.idling.unwrap_or_else(|| kind.tracked_by_default())
    }

    fn event(&self, kind: EventKind) -> ContainerEvent {
        ContainerEvent::new(kind).with_intent(self.id.get(), Arc::clone(&self.name))
    }

    fn context(
        &self,
        kind: StageKind,
        token: CancellationToken,
        idle: Option<IdlingGuard>,
    ) -> StageContext<S, E> {
        StageContext {
            scope: self.clone(),
            snapshot: self.shared.state.current(),
            kind,
            token,
            idle: Arc::new(Mutex::new(idle)),
        }
    }

    /// Runs an asynchronous stage body (transform).
    pub(crate) async fn stage<T, F, Fut>(&self, kind: StageKind, body: F) -> Result<T, StageError>
    where
        F: FnOnce(StageContext<S, E>) -> Fut,
        Fut: Future<Output = Result<T, StageError>>,
    {
        self.enter(kind);
        let idle = IdlingGuard::when(self.tracks(kind), &self.shared.idling);
        let ctx = self.context(kind, self.token.clone(), idle);
        let idle_cell = Arc::clone(&ctx.idle);

        let result = AssertUnwindSafe(async move { body(ctx).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(StageError::from_panic(panic)));

        // release the stage's idling unit even if a context clone escaped
        idle_cell.lock().take();
        result
    }

    /// Runs a side-effect stage: builds the effect and posts it.
    pub(crate) async fn side_effect<F>(&self, make: F) -> Result<(), StageError>
    where
        F: FnOnce() -> E,
    {
        self.enter(StageKind::SideEffect);
        let _idle = IdlingGuard::when(self.tracks(StageKind::SideEffect), &self.shared.idling);
        let effect = std::panic::catch_unwind(AssertUnwindSafe(make))
            .map_err(StageError::from_panic)?;
        self.post(effect);
        Ok(())
    }

    /// Runs a reduce stage at the serialization point.
    pub(crate) async fn reduce<F>(&self, token: &CancellationToken, f: F) -> Result<(), StageError>
    where
        F: FnOnce(&S) -> S,
    {
        self.enter(StageKind::Reduce);
        let _idle = IdlingGuard::when(self.tracks(StageKind::Reduce), &self.shared.idling);
        let _serial = if self.serial_held {
            None
        } else {
            Some(self.shared.serial.lock().await)
        };
        if token.is_cancelled() {
            return Err(StageError::Canceled);
        }

        let current = self.shared.state.current();
        let next = std::panic::catch_unwind(AssertUnwindSafe(|| f(&current)))
            .map_err(StageError::from_panic)?;

        if self.shared.state.commit(next) {
            debug!(intent = %self.name, id = %self.id, "state committed");
            self.shared.bus.publish(
                self.event(EventKind::StateCommitted)
                    .with_stage(StageKind::Reduce),
            );
        }
        Ok(())
    }

    pub(crate) fn post(&self, effect: E) {
        match self.shared.side_effects.post(effect) {
            Delivery::Delivered | Delivery::Buffered => {
                self.shared.bus.publish(self.event(EventKind::SideEffectPosted));
            }
            Delivery::Dropped => {
                warn!(intent = %self.name, id = %self.id, "side effect dropped: no observer");
                self.shared.bus.publish(
                    self.event(EventKind::SideEffectDropped)
                        .with_error("no_observer"),
                );
            }
        }
    }
}

/// Handle a stage body receives.
///
/// - [`state`](Self::state) is the snapshot captured when the stage started
///   and never changes during the stage.
/// - [`volatile_state`](Self::volatile_state) reads whatever is committed now.
pub struct StageContext<S, E> {
    pub(crate) scope: IntentScope<S, E>,
    snapshot: Arc<S>,
    kind: StageKind,
    pub(crate) token: CancellationToken,
    /// Idling unit held for the enclosing stage (if tracked).
    idle: Arc<Mutex<Option<IdlingGuard>>>,
}

impl<S, E> Clone for StageContext<S, E> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            snapshot: Arc::clone(&self.snapshot),
            kind: self.kind,
            token: self.token.clone(),
            idle: Arc::clone(&self.idle),
        }
    }
}

impl<S: State, E: SideEffect> StageContext<S, E> {
    /// State captured at stage entry.
    pub fn state(&self) -> Arc<S> {
        Arc::clone(&self.snapshot)
    }

    /// Live committed state at the moment of the call.
    pub fn volatile_state(&self) -> Arc<S> {
        self.scope.shared.state.current()
    }

    /// Posts a side effect to the container's side-effect stream.
    pub fn post(&self, effect: E) {
        self.scope.post(effect);
    }

    /// Replaces the state from inside a running stage (serialized like any reduce).
    ///
    /// Typically used inside `repeat_on_subscription` / `run_on` blocks.
    pub async fn reduce<F>(&self, f: F) -> Result<(), StageError>
    where
        F: FnOnce(&S) -> S,
    {
        let res = self.scope.reduce(&self.token, f).await;
        self.scope.enter(self.kind);
        res
    }

    /// Submits another intent to the same container.
    pub fn submit<T: Send + 'static>(&self, pipeline: Pipeline<S, E, T>) -> IntentHandle {
        self.scope.shared.submit_or_refuse(pipeline, Default::default())
    }

    /// Kind of the stage this context belongs to.
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Identifier of the owning intent.
    pub fn intent_id(&self) -> IntentId {
        self.scope.id
    }

    /// Name of the owning intent.
    pub fn intent_name(&self) -> &str {
        &self.scope.name
    }

    /// True once the stage should stop (intent cancelled, teardown, or scope left).
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the stage should stop.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Context for a nested block (subscription-gated or state-scoped run).
    pub(crate) fn child(&self, kind: StageKind, token: CancellationToken) -> Self {
        self.scope.context(kind, token, None)
    }

    /// Releases this stage's idling unit until the returned pause is dropped.
    pub(crate) fn pause_idling(&self) -> IdlingPause {
        let held = self.idle.lock().take().is_some();
        IdlingPause {
            cell: Arc::clone(&self.idle),
            resume: held.then(|| Arc::clone(&self.scope.shared.idling)),
        }
    }
}

/// Restores a paused idling unit on drop.
pub(crate) struct IdlingPause {
    cell: Arc<Mutex<Option<IdlingGuard>>>,
    resume: Option<Arc<dyn IdlingTracker>>,
}

impl Drop for IdlingPause {
    fn drop(&mut self) {
        if let Some(tracker) = self.resume.take() {
            *self.cell.lock() = Some(IdlingGuard::new(tracker));
        }
    }
}
