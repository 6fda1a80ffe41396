//! # Container configuration.
//!
//! Provides [`ContainerConfig`], the settings a [`ContainerBuilder`](crate::ContainerBuilder)
//! applies to one container, and [`SideEffectBuffering`], the policy for side
//! effects posted while nobody observes them.
//!
//! ## Sentinel values
//! - `subscribe_debounce = 0s` → Unsubscribed is published as soon as the count reaches 0
//! - capacities of `0` are clamped to 1 by the accessors

use std::time::Duration;

/// What happens to a side effect posted while no observer is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SideEffectBuffering {
    /// Discard it (reported as `SideEffectDropped`).
    DropUnobserved,
    /// Keep up to `side_effect_capacity` effects (oldest evicted) and hand them
    /// to the first observer that subscribes.
    #[default]
    BufferUnobserved,
}

/// Configuration for one container.
///
/// ## Field semantics
/// - `subscribe_debounce`: delay before Unsubscribed is published once the observer count hits 0
/// - `state_capacity`: commits a lagging state receiver may fall behind before skipping
/// - `side_effect_capacity`: how many unobserved side effects the backlog keeps
/// - `side_effect_buffering`: policy for unobserved side effects
/// - `bus_capacity`: lifecycle event ring size
/// - `grace`: how long teardown waits for in-flight intents
///
/// ## Notes
/// All fields are public. Prefer the clamped accessors over reading capacities directly.
#[derive(Clone, Debug)]
pub struct ContainerConfig {
    /// Debounce window on the Subscribed → Unsubscribed edge.
    pub subscribe_debounce: Duration,

    /// Broadcast ring size of the state stream.
    ///
    /// A receiver more than this many commits behind skips the oldest ones but
    /// still converges to the latest state.
    pub state_capacity: usize,

    /// Size of the unobserved side-effect backlog.
    ///
    /// Active observers each get an unbounded queue and never lose an effect.
    pub side_effect_capacity: usize,

    /// Policy for side effects posted while no observer is active.
    pub side_effect_buffering: SideEffectBuffering,

    /// Capacity of the lifecycle event bus.
    pub bus_capacity: usize,

    /// Maximum time [`Container::close`](crate::Container::close) waits for in-flight intents.
    pub grace: Duration,
}

impl ContainerConfig {
    /// State stream capacity clamped to a minimum of 1.
    #[inline]
    pub fn state_capacity_clamped(&self) -> usize {
        self.state_capacity.max(1)
    }

    /// Side-effect capacity clamped to a minimum of 1.
    #[inline]
    pub fn side_effect_capacity_clamped(&self) -> usize {
        self.side_effect_capacity.max(1)
    }

    /// Event bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for ContainerConfig {
    /// Default configuration:
    ///
    /// - `subscribe_debounce = 100ms`
    /// - `state_capacity = 64`, `side_effect_capacity = 64`
    /// - `side_effect_buffering = BufferUnobserved`
    /// - `bus_capacity = 1024`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            subscribe_debounce: Duration::from_millis(100),
            state_capacity: 64,
            side_effect_capacity: 64,
            side_effect_buffering: SideEffectBuffering::default(),
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ContainerConfig::default();
        assert_eq!(cfg.subscribe_debounce, Duration::from_millis(100));
        assert_eq!(cfg.side_effect_buffering, SideEffectBuffering::BufferUnobserved);
        assert_eq!(cfg.grace, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_capacities_are_clamped() {
        let cfg = ContainerConfig {
            state_capacity: 0,
            side_effect_capacity: 0,
            bus_capacity: 0,
            ..ContainerConfig::default()
        };
        assert_eq!(cfg.state_capacity_clamped(), 1);
        assert_eq!(cfg.side_effect_capacity_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
