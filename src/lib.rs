//! # statevisor
//!
//! **Statevisor** is a single-owner reactive state container for async Rust.
//!
//! A container holds one immutable state value. Work is submitted as
//! *intents*: ordered pipelines of stages that transform data in the
//! background, post one-shot side effects, and finally reduce the state.
//! Reduces are serialized through one fair lock, so concurrent intents never
//! lose updates, while slow transforms never hold back other intents.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Pipeline   │   │   Pipeline   │   │   Pipeline   │
//!     │  (intent #1) │   │  (intent #2) │   │  (intent #3) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Container (single owner of S)                                    │
//! │  - StateCell (current Arc<S> + replay-latest stream)              │
//! │  - SideEffectBus (unobserved buffering policy)                    │
//! │  - SubscribedCounter (debounced Subscribed/Unsubscribed)          │
//! │  - IdlingTracker (busy/idle instrumentation)                      │
//! │  - Bus (broadcast lifecycle events)                               │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │ intent runner│   │ intent runner│   │ intent runner│   │
//!     │ (background) │   │ (background) │   │  (blocking)  │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ reduce ──► fair serial lock ◄───────┘                 │
//!      │                                                       │
//!      │ Publishes: IntentScheduled, StateCommitted,           │
//!      │ SideEffectPosted, IntentCompleted, IntentFailed, ...  │
//!      ▼                                                       ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │               (capacity: ContainerConfig::bus_capacity)           │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │   observer listener    │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                              ObserverSet
//!                            (per-observer queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                     obs1.on   obs2.on   obsN.on
//!                     _event()  _event()  _event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! Container::intent(pipeline) ──► dispatcher ──► IntentScheduled
//!
//! runner {
//!   ├─► transform    (concurrent, idling-tracked by default)
//!   ├─► side_effect  (posted to observers or buffered)
//!   ├─► reduce       (fair lock; commits only a distinct state)
//!   │
//!   └─ terminal status:
//!        - Ok                      ─► Completed
//!        - stage error or panic    ─► Failed (container stays usable)
//!        - handle/container cancel ─► Cancelled
//! }
//!
//! Container::close() ──► cancel root ──► refuse queued ──► release observers
//!                    ──► drain runners (grace) ──► ContainerClosed
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                             |
//! |-------------------|----------------------------------------------------------------|------------------------------------------------|
//! | **Container**     | Own one state, admit intents, expose state and effect streams. | [`Container`], [`ContainerBuilder`]            |
//! | **Intents**       | Compose stages and follow their outcome.                       | [`Pipeline`], [`StageContext`], [`IntentHandle`] |
//! | **Subscriptions** | Count observers with a debounced status.                       | [`SubscribedCounter`], [`RefCounted`]          |
//! | **Idling**        | Report busy/idle for test harnesses.                           | [`IdlingTracker`], [`CountingIdlingTracker`]   |
//! | **Observers**     | Hook into container lifecycle events.                          | [`Observe`], [`ContainerEvent`]                |
//! | **Errors**        | Typed errors for stages and the container.                     | [`StageError`], [`ContainerError`]             |
//! | **Configuration** | Centralize runtime settings.                                   | [`ContainerConfig`]                            |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] observer that writes through `tracing`.
//! - `testing`: exposes `Container::probe` and `ContainerProbe` outside this crate.
//!
//! ## Example
//! ```rust
//! use statevisor::{Container, IntentStatus, Pipeline, StageError};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Counter {
//!     value: u64,
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let container: Container<Counter, String> =
//!         Container::builder(Counter { value: 0 }).build();
//!
//!     let handle = container.intent(
//!         Pipeline::new("increment")
//!             .transform(|_ctx, ()| async { Ok::<u64, StageError>(2) })
//!             .side_effect(|by| format!("added {by}"))
//!             .reduce(|state: &Counter, by| Counter { value: state.value + by }),
//!     );
//!
//!     assert_eq!(handle.join().await, IntentStatus::Completed);
//!     assert_eq!(container.state().value, 2);
//!
//!     container.close().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod idling;
mod intent;
mod observers;
mod subscription;

// ---- Public re-exports ----

pub use core::{Container, ContainerBuilder, ContainerConfig, SideEffectBuffering};
pub use error::{ContainerError, StageError};
pub use events::{ContainerEvent, EventKind};
pub use idling::{
    CountingIdlingTracker, IdleCallback, IdlingGuard, IdlingTracker, NoopIdlingTracker, track,
};
pub use intent::{
    IntentHandle, IntentId, IntentOptions, IntentStatus, Pipeline, SideEffect, StageContext,
    StageKind, State,
};
pub use observers::Observe;
pub use subscription::{ObserverGuard, RefCountExt, RefCounted, SubscribedCounter, Subscription};

// Optional: explicit test probe for harnesses outside this crate.
// Enable with: `--features testing`
#[cfg(any(test, feature = "testing"))]
mod testing;
#[cfg(any(test, feature = "testing"))]
pub use testing::ContainerProbe;

// Optional: built-in logger observer.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;
