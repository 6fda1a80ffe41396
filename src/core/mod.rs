//! Runtime core: the container and its execution machinery.
//!
//! The public API from this module is [`Container`], [`ContainerBuilder`] and
//! [`ContainerConfig`].
//!
//! Internal modules:
//! - [`container`]: public surface and the state shared by every task;
//! - [`dispatcher`]: admits intents, owns runners, tears down;
//! - [`runner`]: drives one intent to a terminal status;
//! - [`state`]: the state cell and its replay-latest stream;
//! - [`inflight`]: running intents, named on a stuck teardown;
//! - [`builder`]: wiring.

mod builder;
mod config;
mod container;
mod dispatcher;
mod inflight;
mod runner;
mod state;

#[cfg(test)]
mod tests;

pub use builder::ContainerBuilder;
pub use config::{ContainerConfig, SideEffectBuffering};
pub use container::Container;

pub(crate) use container::Shared;
