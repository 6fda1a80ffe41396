//! # Lifecycle events emitted by the container.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Intent events**: admission and terminal outcome of each intent
//! - **Data events**: state commits and side-effect delivery
//! - **Runtime events**: subscription changes, teardown, observer health
//!
//! The [`ContainerEvent`] struct carries the metadata (intent, stage, error, status).
//! Events never carry state or side-effect values; observers that need values
//! subscribe to the container streams.
//!
//! ## Ordering guarantees
//! Each event carries a sequence number (`seq`) assigned by its container at publish time; it starts at 0 and increases monotonically per container.
//!
//! ## Example
//! ```rust
//! use statevisor::{ContainerEvent, EventKind, StageKind};
//!
//! let ev = ContainerEvent::new(EventKind::IntentFailed)
//!     .with_intent(7, "load-profile")
//!     .with_stage(StageKind::Transform)
//!     .with_error("timeout");
//!
//! assert_eq!(ev.kind, EventKind::IntentFailed);
//! assert_eq!(ev.intent.as_deref(), Some("load-profile"));
//! assert_eq!(ev.error.as_deref(), Some("timeout"));
//! ```

use std::sync::Arc;
use std::time::SystemTime;

use crate::intent::StageKind;
use crate::subscription::Subscription;

/// Classification of container lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Intent events ===
    /// Intent accepted by the dispatcher.
    ///
    /// Sets: `intent`, `intent_id`
    IntentScheduled,

    /// All stages of the intent finished.
    ///
    /// Sets: `intent`, `intent_id`
    IntentCompleted,

    /// A stage failed or panicked; remaining stages were skipped.
    ///
    /// Sets: `intent`, `intent_id`, `stage`, `error`
    IntentFailed,

    /// Intent was cancelled (handle, teardown, or a cancelled stage).
    ///
    /// Sets: `intent`, `intent_id`
    IntentCancelled,

    // === Data events ===
    /// A reduce stage committed a new state.
    ///
    /// Sets: `intent`, `intent_id`, `stage`
    StateCommitted,

    /// A side effect was delivered to observers or buffered.
    ///
    /// Sets: `intent`, `intent_id`
    SideEffectPosted,

    /// A side effect was discarded (no observer and no room to buffer).
    ///
    /// Sets: `intent`, `intent_id`, `error`
    SideEffectDropped,

    // === Runtime events ===
    /// The subscribed counter published a new status.
    ///
    /// Sets: `subscription`
    SubscriptionChanged,

    /// The container finished its teardown.
    ContainerClosed,

    /// Observer dropped an event (queue full or worker closed).
    ///
    /// Sets: `observer`, `error`
    ObserverOverflow,

    /// Observer panicked while processing an event.
    ///
    /// Sets: `observer`, `error`
    ObserverPanicked,
}

/// Container lifecycle event with optional metadata.
#[derive(Debug, Clone)]
pub struct ContainerEvent {
    /// Per-container sequence number, monotonically increasing in publish order.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Intent name, if applicable.
    pub intent: Option<Arc<str>>,
    /// Intent id, if applicable.
    pub intent_id: Option<u64>,
    /// Stage involved, if applicable.
    pub stage: Option<StageKind>,
    /// Human-readable error or drop reason.
    pub error: Option<Arc<str>>,
    /// Published subscription status.
    pub subscription: Option<Subscription>,
    /// Observer name for observer health events.
    pub observer: Option<&'static str>,
}

impl ContainerEvent {
    /// Creates a new event of the given kind with the current timestamp.
    ///
    /// `seq` stays 0 until the container publishes the event.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: 0,
            at: SystemTime::now(),
            kind,
            intent: None,
            intent_id: None,
            stage: None,
            error: None,
            subscription: None,
            observer: None,
        }
    }

    /// Attaches the intent id and name.
    #[inline]
    pub fn with_intent(mut self, id: u64, name: impl Into<Arc<str>>) -> Self {
        self.intent_id = Some(id);
        self.intent = Some(name.into());
        self
    }

    /// Attaches a stage kind.
    #[inline]
    pub fn with_stage(mut self, stage: StageKind) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Attaches an error message.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a subscription status.
    #[inline]
    pub fn with_subscription(mut self, status: Subscription) -> Self {
        self.subscription = Some(status);
        self
    }

    /// Creates an observer overflow event.
    #[inline]
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        let mut ev = ContainerEvent::new(EventKind::ObserverOverflow).with_error(reason);
        ev.observer = Some(observer);
        ev
    }

    /// Creates an observer panic event.
    #[inline]
    pub fn observer_panicked(observer: &'static str, info: String) -> Self {
        let mut ev = ContainerEvent::new(EventKind::ObserverPanicked).with_error(info);
        ev.observer = Some(observer);
        ev
    }

    /// True for events describing observer health (never fed back to observers' own queues).
    #[inline]
    pub fn is_observer_health(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ObserverOverflow | EventKind::ObserverPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpublished_event_has_no_seq() {
        let ev = ContainerEvent::new(EventKind::IntentScheduled).with_error("x");
        assert_eq!(ev.seq, 0);
    }

    #[test]
    fn test_observer_helpers() {
        let ev = ContainerEvent::observer_overflow("metrics", "full");
        assert!(ev.is_observer_health());
        assert_eq!(ev.observer, Some("metrics"));
        assert_eq!(ev.error.as_deref(), Some("full"));

        let ev = ContainerEvent::new(EventKind::StateCommitted).with_stage(StageKind::Reduce);
        assert!(!ev.is_observer_health());
    }
}
