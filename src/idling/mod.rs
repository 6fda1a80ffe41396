//! Busy/idle instrumentation.
//!
//! - [`IdlingTracker`] the tracker contract, with [`CountingIdlingTracker`] and [`NoopIdlingTracker`]
//! - [`IdlingGuard`] / [`track`] scoped increment/decrement around a unit of work

mod guard;
mod tracker;

pub use guard::{IdlingGuard, track};
pub use tracker::{CountingIdlingTracker, IdleCallback, IdlingTracker, NoopIdlingTracker};
