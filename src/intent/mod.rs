//! Intents: pipelines of stages submitted to a container.
//!
//! ## Contents
//! - [`Pipeline`] builder of ordered stages
//! - [`StageKind`], [`StageContext`] closed stage set and the handle a stage body gets
//! - [`IntentHandle`], [`IntentId`], [`IntentStatus`], [`IntentOptions`] submission surface
//!
//! ## Quick reference
//! ```text
//! Container::intent(pipeline) ──► dispatcher ──► runner
//!                                   │              ├─ transform   (background, concurrent)
//!                                   │              ├─ side_effect (background)
//!                                   │              └─ reduce      (fair lock, one at a time)
//!                                   └─ blocking: whole intent inline under the lock
//! ```

mod handle;
mod pipeline;
mod scoped;
mod stage;

pub use handle::{IntentHandle, IntentId, IntentOptions, IntentStatus};
pub use pipeline::Pipeline;
pub use stage::{StageContext, StageKind};

pub(crate) use pipeline::Chain;
pub(crate) use stage::IntentScope;

/// Values a container can hold.
///
/// Equality decides whether a reduce commits: an equal result commits nothing.
pub trait State: PartialEq + Send + Sync + 'static {}

impl<T: PartialEq + Send + Sync + 'static> State for T {}

/// Values a container can post as side effects.
pub trait SideEffect: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> SideEffect for T {}
