//! Error types for tick ring operations.

use std::fmt;

use crate::Tick;

/// Errors that can occur when building or writing a [`TickRing`](crate::TickRing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RingError {
    /// Capacity must be a power of two so slots are selected by mask.
    CapacityNotPowerOfTwo {
        /// The rejected capacity.
        capacity: usize,
    },

    /// The tick is older than the retained window and would alias a newer slot.
    OutsideWindow {
        /// The rejected tick.
        tick: Tick,
        /// Oldest tick the ring still answers for.
        oldest: Tick,
    },
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityNotPowerOfTwo { capacity } => {
                write!(f, "ring capacity {capacity} is not a power of two")
            }
            Self::OutsideWindow { tick, oldest } => {
                write!(
                    f,
                    "tick {} is older than the retained window starting at tick {}",
                    tick.raw(),
                    oldest.raw()
                )
            }
        }
    }
}

impl std::error::Error for RingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_capacity() {
        let err = RingError::CapacityNotPowerOfTwo { capacity: 1000 };
        let msg = err.to_string();
        assert!(msg.contains("1000"));
        assert!(msg.contains("power of two"));
    }

    #[test]
    fn display_outside_window() {
        let err = RingError::OutsideWindow {
            tick: Tick::new(3),
            oldest: Tick::new(1021),
        };
        let msg = err.to_string();
        assert!(msg.contains("tick 3"));
        assert!(msg.contains("1021"));
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<RingError>();
    }
}
