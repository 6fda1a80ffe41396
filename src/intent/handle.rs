//! # Intent handles, identifiers, status and per-call options.
//!
//! ## Status machine
//! ```text
//! Scheduled ──► Transforming ──► SideEffecting ──► Reducing ──► Completed
//!     │              │                 │               │
//!     └──────────────┴───────┬─────────┴───────────────┘
//!                            ├──► Failed(StageError)
//!                            └──► Cancelled
//! ```
//! Stages can repeat in any order a pipeline declares; the status always
//! names the stage that is running now.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::stage::StageKind;
use crate::error::StageError;

/// Container-unique, monotonically increasing intent identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntentId(pub(crate) u64);

impl IntentId {
    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle status of one intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentStatus {
    /// Accepted, not started yet.
    Scheduled,
    /// Running a transform (or a subscription block inside one).
    Transforming,
    /// Posting a side effect.
    SideEffecting,
    /// Waiting for, or holding, the serialization point to replace state.
    Reducing,
    /// Every stage finished.
    Completed,
    /// A stage failed; later stages were skipped.
    Failed(StageError),
    /// Cancelled through the handle or container teardown.
    Cancelled,
}

impl IntentStatus {
    /// True for `Completed`, `Failed` and `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IntentStatus::Completed | IntentStatus::Failed(_) | IntentStatus::Cancelled
        )
    }

    /// The stage kind a running status corresponds to.
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            IntentStatus::Transforming => Some(StageKind::Transform),
            IntentStatus::SideEffecting => Some(StageKind::SideEffect),
            IntentStatus::Reducing => Some(StageKind::Reduce),
            _ => None,
        }
    }

    pub(crate) fn running(kind: StageKind) -> Self {
        match kind {
            StageKind::Transform | StageKind::Subscription => IntentStatus::Transforming,
            StageKind::SideEffect => IntentStatus::SideEffecting,
            StageKind::Reduce => IntentStatus::Reducing,
        }
    }
}

/// Per-call submission flags.
///
/// ### Example
/// ```
/// use statevisor::IntentOptions;
///
/// let opts = IntentOptions::new().blocking().idling(false);
/// assert!(opts.is_blocking());
/// assert_eq!(opts.idling_override(), Some(false));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntentOptions {
    blocking: bool,
    idling: Option<bool>,
}

impl IntentOptions {
    /// Non-blocking, stage-default idling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the intent inline on the serialization context.
    ///
    /// Later intents are not dispatched and no other reducer runs until this
    /// intent finishes. Use only when mutual exclusion with dispatch is wanted.
    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    /// Forces idling participation on (`true`) or off (`false`) for every stage.
    pub fn idling(mut self, tracked: bool) -> Self {
        self.idling = Some(tracked);
        self
    }

    /// True when the intent runs inline on the serialization context.
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Idling override, if any.
    pub fn idling_override(&self) -> Option<bool> {
        self.idling
    }
}

/// Handle to a submitted intent.
///
/// Dropping the handle does **not** cancel the intent.
#[derive(Debug, Clone)]
pub struct IntentHandle {
    id: IntentId,
    name: Arc<str>,
    token: CancellationToken,
    status: watch::Receiver<IntentStatus>,
}

impl IntentHandle {
    pub(crate) fn new(
        id: IntentId,
        name: Arc<str>,
        token: CancellationToken,
        status: watch::Receiver<IntentStatus>,
    ) -> Self {
        Self {
            id,
            name,
            token,
            status,
        }
    }

    /// Handle for an intent refused because the container is closed.
    pub(crate) fn refused(id: IntentId, name: Arc<str>) -> Self {
        let token = CancellationToken::new();
        token.cancel();
        let (_tx, rx) = watch::channel(IntentStatus::Cancelled);
        Self::new(id, name, token, rx)
    }

    /// Intent identifier.
    pub fn id(&self) -> IntentId {
        self.id
    }

    /// Intent name (from the pipeline).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current status.
    pub fn status(&self) -> IntentStatus {
        self.status.borrow().clone()
    }

    /// True once the intent reached a terminal status.
    pub fn is_finished(&self) -> bool {
        self.status.borrow().is_terminal()
    }

    /// Requests cancellation; stages stop at their next await point.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Waits for the terminal status.
    pub async fn join(&self) -> IntentStatus {
        let mut rx = self.status.clone();
        if let Ok(status) = rx.wait_for(IntentStatus::is_terminal).await {
            return status.clone();
        }
        // runner gone without a terminal status; report what it left behind
        rx.borrow().clone()
    }
}
