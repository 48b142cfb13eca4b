//! The movement simulation seam.

use payload::{InputPayload, StatePayload, Vec3};
use timeline::TickRate;

/// Advances one entity by one tick.
///
/// Implementations must be pure: the same `(prior, input)` must always
/// produce a bit-identical result on every machine that runs it, because the
/// client replays inputs the server has already simulated and expects the
/// same answer. The returned state carries `input.tick()`.
pub trait MovementSimulator {
    fn simulate(&self, prior: &StatePayload, input: &InputPayload) -> StatePayload;

    /// Rate the per-tick displacement is scaled for, if any.
    ///
    /// The predictor refuses to run a clock at a different rate.
    fn tick_rate(&self) -> Option<TickRate> {
        None
    }
}

impl<S: MovementSimulator + ?Sized> MovementSimulator for &S {
    fn simulate(&self, prior: &StatePayload, input: &InputPayload) -> StatePayload {
        (**self).simulate(prior, input)
    }

    fn tick_rate(&self) -> Option<TickRate> {
        (**self).tick_rate()
    }
}

impl<S: MovementSimulator + ?Sized> MovementSimulator for Box<S> {
    fn simulate(&self, prior: &StatePayload, input: &InputPayload) -> StatePayload {
        (**self).simulate(prior, input)
    }

    fn tick_rate(&self) -> Option<TickRate> {
        (**self).tick_rate()
    }
}

/// Parameters for [`LinearMovement`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementConfig {
    pub tick_rate: TickRate,
    /// Units per second at full intent.
    pub speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            tick_rate: TickRate::DEFAULT,
            speed: 6.0,
        }
    }
}

impl MovementConfig {
    /// Config moving `speed` units per second at `tick_rate`.
    #[must_use]
    pub const fn new(tick_rate: TickRate, speed: f32) -> Self {
        Self { tick_rate, speed }
    }

    /// Distance covered in one tick at full intent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn per_tick(&self) -> f32 {
        self.speed / self.tick_rate.hz() as f32
    }
}

/// Reference simulator: moves on the ground plane at constant speed.
///
/// Movement intent `(x, y)` maps to world `(x, 0, y)`. A motion-curve sample
/// adds its displacement on top. Rotation follows the input's facing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMovement {
    config: MovementConfig,
    per_tick: f32,
}

impl LinearMovement {
    /// Simulator using `config`.
    #[must_use]
    pub fn new(config: MovementConfig) -> Self {
        Self {
            config,
            per_tick: config.per_tick(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &MovementConfig {
        &self.config
    }
}

impl Default for LinearMovement {
    fn default() -> Self {
        Self::new(MovementConfig::default())
    }
}

impl MovementSimulator for LinearMovement {
    fn simulate(&self, prior: &StatePayload, input: &InputPayload) -> StatePayload {
        let intent = input.movement();
        let mut delta = Vec3::new(intent.x, 0.0, intent.y) * self.per_tick;
        if let Some(sample) = input.motion_curve() {
            delta += sample.displacement();
        }
        StatePayload::new(input.tick(), prior.position() + delta, input.facing())
    }

    fn tick_rate(&self) -> Option<TickRate> {
        Some(self.config.tick_rate)
    }
}
