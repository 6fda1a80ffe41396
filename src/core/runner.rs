//! # Run one intent to its terminal status.
//!
//! Drives an intent's stage chain against its cancellation token and publishes
//! the outcome.
//!
//! ## Event flow
//! ```text
//! Success:
//!   chain → Ok(())                        → Completed, publish IntentCompleted
//!
//! Cancellation:
//!   token cancelled / Err(Canceled)       → Cancelled, publish IntentCancelled
//!   container torn down (any error)       → Cancelled, publish IntentCancelled
//!
//! Failure:
//!   chain → Err(Fail/Panicked)            → Failed(e), publish IntentFailed
//! ```
//!
//! ## Rules
//! - Always sets **exactly one** terminal status
//! - `Canceled` is a normal terminal outcome, never `Failed`
//! - A runner dropped mid-flight (abort) still leaves `Cancelled` behind

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::container::{Job, Shared};
use crate::error::StageError;
use crate::events::{ContainerEvent, EventKind};
use crate::intent::{IntentScope, IntentStatus, SideEffect, State};

/// Leaves `Cancelled` behind unless a terminal status was already set.
struct TerminalGuard(Arc<watch::Sender<IntentStatus>>);

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.0.send_if_modified(|status| {
            if status.is_terminal() {
                false
            } else {
                *status = IntentStatus::Cancelled;
                true
            }
        });
    }
}

/// Runs `job` until it completes, fails or is cancelled.
///
/// `serial_held` is true when the caller already owns the serialization lock
/// (blocking intents); reduces then commit without taking it again.
pub(crate) async fn run_intent<S: State, E: SideEffect>(
    shared: Arc<Shared<S, E>>,
    job: Job<S, E>,
    serial_held: bool,
) {
    let Job {
        id,
        name,
        idling,
        chain,
        token,
        status,
        ..
    } = job;

    let _inflight = shared.inflight.enter(id, Arc::clone(&name));
    let status = Arc::new(status);
    let _terminal = TerminalGuard(Arc::clone(&status));

    let scope = IntentScope {
        shared: Arc::clone(&shared),
        id,
        name: Arc::clone(&name),
        token: token.clone(),
        status: Arc::clone(&status),
        idling,
        serial_held,
    };

    let res = tokio::select! {
        biased;
        _ = token.cancelled() => Err(StageError::Canceled),
        res = chain(scope) => res,
    };

    let stage = status.borrow().stage();
    let terminal = match res {
        Ok(()) => IntentStatus::Completed,
        Err(_) if shared.token.is_cancelled() => IntentStatus::Cancelled,
        Err(e) if e.is_cancellation() => IntentStatus::Cancelled,
        Err(e) => IntentStatus::Failed(e),
    };

    let event = match &terminal {
        IntentStatus::Completed => {
            debug!(intent = %name, %id, "intent completed");
            ContainerEvent::new(EventKind::IntentCompleted)
        }
        IntentStatus::Failed(e) => {
            warn!(
                intent = %name,
                %id,
                stage = stage.map(|s| s.as_label()),
                error = %e,
                "intent failed"
            );
            let ev = ContainerEvent::new(EventKind::IntentFailed).with_error(e.to_string());
            match stage {
                Some(stage) => ev.with_stage(stage),
                None => ev,
            }
        }
        _ => {
            debug!(intent = %name, %id, "intent cancelled");
            ContainerEvent::new(EventKind::IntentCancelled)
        }
    };

    status.send_replace(terminal);
    shared.bus.publish(event.with_intent(id.get(), name));
}
