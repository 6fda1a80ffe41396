//! Container events: lifecycle records, the broadcast bus, and the side-effect channel.
//!
//! ## Contents
//! - [`EventKind`], [`ContainerEvent`] lifecycle classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`; [`EventBus`] numbers one container's events
//! - [`SideEffectBus`] user side effects with the unobserved-buffering policy
//!
//! ## Quick reference
//! - **Publishers**: dispatcher, intent runner, reduce/side-effect stages,
//!   subscription forwarder, `ObserverSet` workers (overflow/panic).
//! - **Consumers**: the observer listener (fans out to `ObserverSet`).

mod bus;
mod event;
mod side_effects;

pub(crate) use bus::{Bus, EventBus, receiver_stream};
pub use event::{ContainerEvent, EventKind};
pub(crate) use side_effects::{Delivery, SideEffectBus};
