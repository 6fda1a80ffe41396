//! # Lifecycle event observers.
//!
//! ```text
//! dispatcher / runners / stages ── publish(ContainerEvent) ──► Bus
//!                                                              │
//!                                          observer listener ◄─┘
//!                                                  └─► ObserverSet::emit
//!                                                        ├──► [queue] ──► LogWriter
//!                                                        ├──► [queue] ──► metrics
//!                                                        └──► [queue] ──► custom
//! ```
//!
//! The listener runs only when the builder was given observers, and stops
//! after forwarding `ContainerClosed`.

#[cfg(feature = "logging")]
mod log;
mod observer;
mod set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observer::Observe;
pub(crate) use set::ObserverSet;
