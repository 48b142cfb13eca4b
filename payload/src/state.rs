//! Simulated result of a tick.

use glam::{Quat, Vec3};
use timeline::Tick;

/// Position and rotation of an entity after the input for `tick` was applied.
///
/// The server emits these as authoritative; the client keeps its own
/// predicted copy per tick for comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatePayload {
    tick: Tick,
    position: Vec3,
    rotation: Quat,
}

impl StatePayload {
    /// Builds a state for `tick`.
    #[must_use]
    pub const fn new(tick: Tick, position: Vec3, rotation: Quat) -> Self {
        Self {
            tick,
            position,
            rotation,
        }
    }

    /// Tick this state belongs to.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// World position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Facing.
    #[must_use]
    pub const fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Same state relabelled with another tick.
    #[must_use]
    pub const fn at_tick(mut self, tick: Tick) -> Self {
        self.tick = tick;
        self
    }

    /// Euclidean distance between the two positions.
    ///
    /// Rotation is not part of the error metric.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f32 {
        self.position.distance(other.position)
    }
}
