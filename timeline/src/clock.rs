//! Fixed-rate tick clock.

use std::num::NonZeroU32;
use std::time::Duration;

use crate::Tick;

/// Simulation rate in ticks per second.
///
/// Client and server agree on this out-of-band; the server declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickRate(NonZeroU32);

impl TickRate {
    /// 30 ticks per second.
    pub const DEFAULT: Self = match NonZeroU32::new(30) {
        Some(hz) => Self(hz),
        None => unreachable!(),
    };

    /// Creates a tick rate, or `None` for zero.
    #[must_use]
    pub const fn new(hz: u32) -> Option<Self> {
        match NonZeroU32::new(hz) {
            Some(hz) => Some(Self(hz)),
            None => None,
        }
    }

    /// Returns ticks per second.
    #[must_use]
    pub const fn hz(self) -> u32 {
        self.0.get()
    }

    /// Returns the wall-clock duration of one tick.
    #[must_use]
    pub fn interval(self) -> Duration {
        Duration::from_secs(1) / self.0.get()
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Monotonic tick counter driven by an external fixed-rate scheduler.
///
/// The clock does no jitter compensation and never fails; it only counts.
/// `current` is the tick of the latest completed step.
#[derive(Debug, Clone)]
pub struct TickClock {
    current: Tick,
    rate: TickRate,
}

impl TickClock {
    /// Creates a clock whose latest completed step is `start`.
    #[must_use]
    pub const fn new(start: Tick, rate: TickRate) -> Self {
        Self {
            current: start,
            rate,
        }
    }

    /// Returns the tick of the latest completed step.
    #[must_use]
    pub const fn current(&self) -> Tick {
        self.current
    }

    /// Steps the clock and returns the new tick.
    pub fn advance(&mut self) -> Tick {
        self.current = self.current.next();
        self.current
    }

    /// Returns the configured tick rate.
    #[must_use]
    pub const fn rate(&self) -> TickRate {
        self.rate
    }

    /// Returns the wall-clock duration of one tick.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.rate.interval()
    }

    /// Restarts the count for a fresh session.
    pub fn reset(&mut self, start: Tick) {
        self.current = start;
    }
}
