//! Engine configuration.

use std::num::NonZeroUsize;

use timeline::TickRate;

use crate::error::ConfigError;

const DEFAULT_HISTORY_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

const TESTING_HISTORY_CAPACITY: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// Client-side prediction settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionConfig {
    /// Ticks of input and state history kept for replay. Must be a power of two.
    pub history_capacity: NonZeroUsize,

    /// Simulation rate shared with the server.
    pub tick_rate: TickRate,

    /// Positional error at or below which a prediction counts as agreeing.
    pub correction_epsilon: f32,

    /// Positional error above which a correction snaps instead of smoothing.
    pub snap_threshold: f32,

    /// Ticks over which a smooth correction's visual offset decays to zero.
    /// Zero disables smoothing.
    pub smoothing_ticks: u32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            // 1024 ticks is ~34 s at 30 Hz, far beyond any playable RTT.
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            tick_rate: TickRate::DEFAULT,
            correction_epsilon: 0.001,
            snap_threshold: 5.0,
            smoothing_ticks: 6,
        }
    }
}

impl PredictionConfig {
    /// Creates a configuration suitable for testing with a smaller history.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            history_capacity: TESTING_HISTORY_CAPACITY,
            tick_rate: TickRate::DEFAULT,
            correction_epsilon: 0.001,
            snap_threshold: 5.0,
            smoothing_ticks: 4,
        }
    }

    /// Checks every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_capacity(self.history_capacity)?;
        let epsilon = self.correction_epsilon;
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(ConfigError::InvalidEpsilon { value: epsilon });
        }
        let snap = self.snap_threshold;
        if !snap.is_finite() || snap <= epsilon {
            return Err(ConfigError::InvalidSnapThreshold {
                value: snap,
                epsilon,
            });
        }
        Ok(())
    }
}

/// Policy for ticks with no input on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapPolicy {
    /// Never synthesise input; the next input simulates from the latest state.
    #[default]
    Skip,
    /// Fill skipped ticks by repeating the last applied input.
    RepeatLast,
}

/// Server-side authority settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityConfig {
    /// Ticks of authoritative state kept. Must be a power of two.
    pub history_capacity: NonZeroUsize,

    /// What to do about missing inputs.
    pub gap_policy: GapPolicy,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            gap_policy: GapPolicy::Skip,
        }
    }
}

impl AuthorityConfig {
    /// Creates a configuration suitable for testing with a smaller history.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            history_capacity: TESTING_HISTORY_CAPACITY,
            gap_policy: GapPolicy::Skip,
        }
    }

    /// Checks the history capacity is a power of two.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_capacity(self.history_capacity)
    }
}

fn validate_capacity(capacity: NonZeroUsize) -> Result<(), ConfigError> {
    if capacity.is_power_of_two() {
        Ok(())
    } else {
        Err(ConfigError::CapacityNotPowerOfTwo {
            capacity: capacity.get(),
        })
    }
}
