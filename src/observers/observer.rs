//! # Lifecycle event observer trait.
//!
//! Provides [`Observe`], the extension point for plugging custom handlers into
//! a container's lifecycle events.
//!
//! Each observer gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-observer bounded queue** (capacity via [`Observe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `EventKind::ObserverPanicked`)
//!
//! ## Rules
//! - A slow observer only affects its own queue.
//! - Queue overflow drops the event **for this observer only** and publishes
//!   `EventKind::ObserverOverflow`.
//! - Events are processed sequentially (FIFO) per observer.
//!
//! Observers are attached with `ContainerBuilder::observers`; the fan-out set
//! behind them is internal to the container:
//! ```compile_fail
//! use statevisor::ObserverSet;
//! ```
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use statevisor::{ContainerEvent, EventKind, Observe};
//!
//! struct Failures;
//!
//! #[async_trait]
//! impl Observe for Failures {
//!     async fn on_event(&self, ev: &ContainerEvent) {
//!         if ev.kind == EventKind::IntentFailed {
//!             // export a metric, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failures" }
//!     fn queue_capacity(&self) -> usize { 256 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::ContainerEvent;

/// Lifecycle event observer.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Processes a single event.
    async fn on_event(&self, event: &ContainerEvent);

    /// Human-readable name (for logs and observer health events).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this observer's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
