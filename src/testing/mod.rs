//! Test support: an explicit probe handle instead of a global test mode.

mod probe;

pub use probe::ContainerProbe;
