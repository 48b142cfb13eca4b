//! Controller intent for a single tick.

use glam::{Quat, Vec2, Vec3};
use timeline::Tick;

/// A sampled point on a timed motion curve (root motion).
///
/// `phase` is the normalised curve time in `[0, 1]`; `displacement` is the
/// curve's contribution to this tick's movement, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionCurveSample {
    phase: f32,
    displacement: Vec3,
}

impl MotionCurveSample {
    /// Creates a sample, clamping `phase` into `[0, 1]` and zeroing
    /// non-finite values.
    #[must_use]
    pub fn new(phase: f32, displacement: Vec3) -> Self {
        let phase = if phase.is_finite() {
            phase.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let displacement = if displacement.is_finite() {
            displacement
        } else {
            Vec3::ZERO
        };
        Self {
            phase,
            displacement,
        }
    }

    /// Creates a sample from decoded values without sanitising them.
    #[must_use]
    pub const fn from_raw(phase: f32, displacement: Vec3) -> Self {
        Self {
            phase,
            displacement,
        }
    }

    /// Normalised curve time.
    #[must_use]
    pub const fn phase(&self) -> f32 {
        self.phase
    }

    /// Displacement contributed by the curve this tick.
    #[must_use]
    pub const fn displacement(&self) -> Vec3 {
        self.displacement
    }
}

/// Controller intent captured once per tick.
///
/// Built by the client's input sampler, buffered for replay, and sent to the
/// server. Copies go into ring buffers so later transmission or replay can
/// never observe a mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputPayload {
    tick: Tick,
    movement: Vec2,
    facing: Quat,
    motion_curve: Option<MotionCurveSample>,
}

impl InputPayload {
    /// Creates an input, clamping `movement` to unit length and normalising
    /// `facing`.
    ///
    /// Non-finite movement becomes zero; non-finite or degenerate facing
    /// becomes the identity rotation.
    #[must_use]
    pub fn new(tick: Tick, movement: Vec2, facing: Quat) -> Self {
        Self {
            tick,
            movement: sanitize_movement(movement),
            facing: sanitize_facing(facing),
            motion_curve: None,
        }
    }

    /// Creates an input from decoded values without sanitising them.
    ///
    /// The server must simulate exactly what the client simulated, so decoded
    /// payloads are never renormalised.
    #[must_use]
    pub const fn from_raw(
        tick: Tick,
        movement: Vec2,
        facing: Quat,
        motion_curve: Option<MotionCurveSample>,
    ) -> Self {
        Self {
            tick,
            movement,
            facing,
            motion_curve,
        }
    }

    /// Attaches a motion-curve sample.
    #[must_use]
    pub const fn with_motion_curve(mut self, sample: MotionCurveSample) -> Self {
        self.motion_curve = Some(sample);
        self
    }

    /// Returns the same intent stamped with a different tick.
    ///
    /// Used by the server when it fills an input gap by repeating the last
    /// known input.
    #[must_use]
    pub const fn restamped(mut self, tick: Tick) -> Self {
        self.tick = tick;
        self
    }

    /// Tick this input was sampled for.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Movement intent, length at most one.
    #[must_use]
    pub const fn movement(&self) -> Vec2 {
        self.movement
    }

    /// Desired facing.
    #[must_use]
    pub const fn facing(&self) -> Quat {
        self.facing
    }

    /// Optional root-motion sample.
    #[must_use]
    pub const fn motion_curve(&self) -> Option<MotionCurveSample> {
        self.motion_curve
    }
}

fn sanitize_movement(movement: Vec2) -> Vec2 {
    if movement.is_finite() {
        movement.clamp_length_max(1.0)
    } else {
        Vec2::ZERO
    }
}

fn sanitize_facing(facing: Quat) -> Quat {
    if !facing.is_finite() || facing.length_squared() <= f32::EPSILON {
        return Quat::IDENTITY;
    }
    facing.normalize()
}
