//! Once-per-tick capture of controller intent.

use payload::{InputPayload, MotionCurveSample, Quat, Vec2};
use timeline::{Tick, TickClock, TickRate};

/// Raw controller intent as the input layer reports it.
///
/// Values are sanitised when stamped into an [`InputPayload`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerIntent {
    pub movement: Vec2,
    pub facing: Quat,
    pub motion_curve: Option<MotionCurveSample>,
}

impl ControllerIntent {
    /// Intent to move along `movement` while facing `facing`.
    #[must_use]
    pub const fn new(movement: Vec2, facing: Quat) -> Self {
        Self {
            movement,
            facing,
            motion_curve: None,
        }
    }

    /// No movement, default facing.
    #[must_use]
    pub const fn idle() -> Self {
        Self::new(Vec2::ZERO, Quat::IDENTITY)
    }

    /// Attaches a motion-curve sample.
    #[must_use]
    pub const fn with_motion_curve(mut self, sample: MotionCurveSample) -> Self {
        self.motion_curve = Some(sample);
        self
    }
}

impl Default for ControllerIntent {
    fn default() -> Self {
        Self::idle()
    }
}

/// Owns the local tick clock and stamps exactly one input per tick.
#[derive(Debug, Clone)]
pub struct InputSampler {
    clock: TickClock,
    last: Option<InputPayload>,
}

impl InputSampler {
    /// Creates a sampler whose first sample is stamped `start + 1`.
    #[must_use]
    pub const fn new(start: Tick, rate: TickRate) -> Self {
        Self {
            clock: TickClock::new(start, rate),
            last: None,
        }
    }

    /// Advances the clock and captures `intent` for the new tick.
    pub fn sample(&mut self, intent: &ControllerIntent) -> InputPayload {
        let tick = self.clock.advance();
        let mut input = InputPayload::new(tick, intent.movement, intent.facing);
        if let Some(sample) = intent.motion_curve {
            input = input.with_motion_curve(sample);
        }
        self.last = Some(input);
        input
    }

    /// Tick of the latest sample, or the start tick before any.
    #[must_use]
    pub const fn current_tick(&self) -> Tick {
        self.clock.current()
    }

    /// Most recent sampled input.
    #[must_use]
    pub const fn last_sample(&self) -> Option<&InputPayload> {
        self.last.as_ref()
    }

    /// Clock that stamps samples.
    #[must_use]
    pub const fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// Restarts at `start` and forgets the last sample.
    pub fn reset(&mut self, start: Tick) {
        self.clock.reset(start);
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payload::Vec3;

    #[test]
    fn stamps_consecutive_ticks() {
        let mut sampler = InputSampler::new(Tick::new(110), TickRate::DEFAULT);
        let intent = ControllerIntent::new(Vec2::X, Quat::IDENTITY);
        assert_eq!(sampler.sample(&intent).tick(), Tick::new(111));
        assert_eq!(sampler.sample(&intent).tick(), Tick::new(112));
        assert_eq!(sampler.current_tick(), Tick::new(112));
    }

    #[test]
    fn sanitises_intent() {
        let mut sampler = InputSampler::new(Tick::ZERO, TickRate::DEFAULT);
        let intent = ControllerIntent::new(Vec2::new(10.0, 0.0), Quat::IDENTITY);
        let input = sampler.sample(&intent);
        assert!((input.movement().length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn carries_motion_curve() {
        let mut sampler = InputSampler::new(Tick::ZERO, TickRate::DEFAULT);
        let curve = MotionCurveSample::new(0.25, Vec3::Z);
        let input = sampler.sample(&ControllerIntent::idle().with_motion_curve(curve));
        assert_eq!(input.motion_curve(), Some(curve));
        assert_eq!(sampler.last_sample(), Some(&input));
    }

    #[test]
    fn reset_restarts_clock() {
        let mut sampler = InputSampler::new(Tick::ZERO, TickRate::DEFAULT);
        sampler.sample(&ControllerIntent::idle());
        sampler.reset(Tick::new(500));
        assert!(sampler.last_sample().is_none());
        assert_eq!(sampler.sample(&ControllerIntent::idle()).tick(), Tick::new(501));
    }
}
