//! # Logging observer.
//!
//! [`LogWriter`] turns lifecycle events into `tracing` records under the
//! `statevisor::events` target. Install any `tracing` subscriber to see them.
//!
//! ## Output (fields)
//! ```text
//! INFO  intent scheduled   intent=load-profile id=7
//! INFO  intent completed   intent=load-profile id=7
//! WARN  intent failed      intent=load-profile id=7 stage=transform error="stage failed: timeout"
//! DEBUG state committed    intent=load-profile id=7
//! INFO  subscription       status=Subscribed
//! WARN  observer overflow  observer=metrics reason=full
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::Observe;
use crate::events::{ContainerEvent, EventKind};

const TARGET: &str = "statevisor::events";

/// Observer writing lifecycle events through `tracing`.
///
/// Enabled via the `logging` feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new log writer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &ContainerEvent) {
        let intent = e.intent.as_deref().unwrap_or("-");
        let id = e.intent_id.unwrap_or_default();
        let error = e.error.as_deref().unwrap_or("");

        match e.kind {
            EventKind::IntentScheduled => info!(target: TARGET, intent, id, "intent scheduled"),
            EventKind::IntentCompleted => info!(target: TARGET, intent, id, "intent completed"),
            EventKind::IntentCancelled => info!(target: TARGET, intent, id, "intent cancelled"),
            EventKind::IntentFailed => warn!(
                target: TARGET,
                intent,
                id,
                stage = e.stage.map(|s| s.as_label()),
                error,
                "intent failed"
            ),
            EventKind::StateCommitted => debug!(target: TARGET, intent, id, "state committed"),
            EventKind::SideEffectPosted => debug!(target: TARGET, intent, id, "side effect posted"),
            EventKind::SideEffectDropped => {
                warn!(target: TARGET, intent, id, reason = error, "side effect dropped")
            }
            EventKind::SubscriptionChanged => {
                info!(target: TARGET, status = ?e.subscription, "subscription")
            }
            EventKind::ContainerClosed => info!(target: TARGET, "container closed"),
            EventKind::ObserverOverflow => {
                warn!(target: TARGET, observer = e.observer, reason = error, "observer overflow")
            }
            EventKind::ObserverPanicked => {
                warn!(target: TARGET, observer = e.observer, error, "observer panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
