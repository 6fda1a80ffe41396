//! # Gated execution inside a running stage.
//!
//! Both helpers run a nested block on a child cancellation token and a
//! [`StageKind::Subscription`] context, so the block is cancelled without
//! touching the owning intent.
//!
//! ```text
//! repeat_on_subscription(block)
//!   loop:
//!     wait Subscribed ──► run block ──┬─ Unsubscribed → cancel block, loop
//!                                     ├─ block done   → wait Unsubscribed, loop
//!                                     └─ block error  → return error
//!
//! run_on(select, block)
//!   loop:
//!     wait select(state) == Some(v) ──► run block(v) ──┬─ select(state) == None  → cancel, loop
//!                                                      ├─ select(state) == Some(w) → cancel, run block(w)
//!                                                      └─ block done            → return result
//! ```
//!
//! Hot collection is not tracked by the idling tracker by default: while a
//! helper waits, the enclosing stage's idling unit is released.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::{FutureExt, StreamExt};
use tracing::trace;

use super::stage::{IdlingPause, StageContext, StageKind};
use super::{SideEffect, State};
use crate::error::StageError;

impl<S: State, E: SideEffect> StageContext<S, E> {
    fn pause_hot_collection(&self) -> Option<IdlingPause> {
        (!self.scope.tracks(StageKind::Subscription)).then(|| self.pause_idling())
    }

    /// Runs `block` whenever the container's subscribed counter reports Subscribed.
    ///
    /// The block is dropped as soon as the status becomes Unsubscribed and
    /// rerun on the next Subscribed. A resubscription inside the debounce
    /// window keeps it running. Returns `Err(StageError::Canceled)` once the
    /// intent is cancelled or the container is torn down, or the first
    /// non-cancellation error the block returns.
    pub async fn repeat_on_subscription<F, Fut>(&self, mut block: F) -> Result<(), StageError>
    where
        F: FnMut(StageContext<S, E>) -> Fut + Send,
        Fut: Future<Output = Result<(), StageError>> + Send,
    {
        let _pause = self.pause_hot_collection();
        let mut status = self.scope.shared.subscribed.watch();

        loop {
            let subscribed = tokio::select! {
                _ = self.token.cancelled() => false,
                ok = async { status.wait_for(|s| s.is_subscribed()).await.is_ok() } => ok,
            };
            if !subscribed {
                return Err(StageError::Canceled);
            }

            trace!(intent = %self.intent_name(), "subscription block started");
            let child = self.token.child_token();
            let run = AssertUnwindSafe(block(self.child(StageKind::Subscription, child.clone())))
                .catch_unwind();

            let outcome = tokio::select! {
                res = run => Some(res.unwrap_or_else(|panic| Err(StageError::from_panic(panic)))),
                _ = async { status.wait_for(|s| !s.is_subscribed()).await.is_ok() } => None,
                _ = self.token.cancelled() => None,
            };
            child.cancel();

            match outcome {
                Some(Err(e)) if !e.is_cancellation() => return Err(e),
                Some(_) => {
                    // finished while subscribed; rearm on the next Subscribed edge
                    let left = tokio::select! {
                        _ = self.token.cancelled() => false,
                        ok = async { status.wait_for(|s| !s.is_subscribed()).await.is_ok() } => ok,
                    };
                    if !left {
                        return Err(StageError::Canceled);
                    }
                }
                None if self.token.is_cancelled() => return Err(StageError::Canceled),
                None => trace!(intent = %self.intent_name(), "subscription block dropped"),
            }
        }
    }

    /// Runs `block` while `select` maps the committed state to `Some`.
    ///
    /// `select` plays the role of a subtype check plus predicate. The block
    /// starts with the selected value and is cancelled as soon as the state
    /// stops matching. Latest wins: every newly committed matching state
    /// cancels the running block and starts it fresh with the new value, so at
    /// most one execution is active. Returns the block's result once it
    /// completes while matching.
    pub async fn run_on<T, R, Sel, F, Fut>(&self, select: Sel, mut block: F) -> Result<R, StageError>
    where
        Sel: Fn(&S) -> Option<T> + Send + Sync,
        T: Send,
        F: FnMut(StageContext<S, E>, T) -> Fut + Send,
        Fut: Future<Output = Result<R, StageError>> + Send,
    {
        let _pause = self.pause_hot_collection();
        let mut states = self.scope.shared.state.stream();
        let mut restart = None;

        loop {
            let value = match restart.take() {
                Some(value) => value,
                None => loop {
                    let next = tokio::select! {
                        _ = self.token.cancelled() => return Err(StageError::Canceled),
                        next = states.next() => next,
                    };
                    match next {
                        Some(state) => {
                            if let Some(value) = select(&*state) {
                                break value;
                            }
                        }
                        None => return Err(StageError::Canceled),
                    }
                },
            };

            trace!(intent = %self.intent_name(), "scoped block started");
            let child = self.token.child_token();
            let run = AssertUnwindSafe(block(self.child(StageKind::Subscription, child.clone()), value))
                .catch_unwind();

            let outcome = tokio::select! {
                res = run => Some(res.unwrap_or_else(|panic| Err(StageError::from_panic(panic)))),
                _ = self.token.cancelled() => None,
                next = states.next() => {
                    restart = next.and_then(|state| select(&*state));
                    None
                }
            };
            child.cancel();

            match outcome {
                Some(res) => return res,
                None if self.token.is_cancelled() => return Err(StageError::Canceled),
                None if restart.is_some() => {
                    trace!(intent = %self.intent_name(), "scoped block superseded by a newer state")
                }
                None => trace!(intent = %self.intent_name(), "scoped block left its state"),
            }
        }
    }
}
