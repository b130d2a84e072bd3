//! # Service configuration.
//!
//! Provides [`Config`] settings for a single [`Servd`](crate::Servd).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by [`Config::bus_capacity_clamped`]

use std::borrow::Cow;

/// Configuration for a service instance.
///
/// ## Field semantics
/// - `name`: service name used in tracing spans and as the `source` of every event
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped)
#[derive(Clone, Debug)]
pub struct Config {
    /// Service name.
    pub name: Cow<'static, str>,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Default configuration with a custom service name.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `name = "servd"`
    /// - `bus_capacity = 64` (a lifecycle emits only a handful of events)
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("servd"),
            bus_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let cfg = Config::default();
        assert_eq!(cfg.name, "servd");
        assert_eq!(cfg.bus_capacity_clamped(), 64);

        let cfg = Config {
            bus_capacity: 0,
            ..Config::named("api")
        };
        assert_eq!(cfg.name, "api");
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
