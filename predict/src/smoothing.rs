//! Render-only easing of smooth corrections.

use payload::Vec3;

/// Visual offset that hides a small correction.
///
/// When reconciliation moves the latest prediction, the render layer keeps
/// drawing the entity where it was and lets the offset decay to zero with a
/// cubic ease-out. History is never offset; only what is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothCorrection {
    duration: u32,
    remaining: u32,
    initial: Vec3,
    offset: Vec3,
}

impl SmoothCorrection {
    /// Creates an idle correction decaying over `duration` ticks.
    #[must_use]
    pub const fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: 0,
            initial: Vec3::ZERO,
            offset: Vec3::ZERO,
        }
    }

    /// Starts easing out `delta` (old drawn position minus new position).
    ///
    /// An offset still in flight is folded in so the drawn position does not
    /// jump.
    pub fn start(&mut self, delta: Vec3) {
        if self.duration == 0 || !delta.is_finite() {
            self.clear();
            return;
        }
        self.initial = self.offset + delta;
        self.offset = self.initial;
        self.remaining = self.duration;
    }

    /// Advances one tick and returns the new offset.
    #[allow(clippy::cast_precision_loss)]
    pub fn step(&mut self) -> Vec3 {
        if self.remaining == 0 {
            return Vec3::ZERO;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.offset = Vec3::ZERO;
            return Vec3::ZERO;
        }
        let t = 1.0 - self.remaining as f32 / self.duration as f32;
        self.offset = self.initial * (1.0 - ease_out_cubic(t));
        self.offset
    }

    /// Offset added to the drawn position this tick.
    #[must_use]
    pub const fn offset(&self) -> Vec3 {
        self.offset
    }

    /// Whether no correction is being blended in.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// Drops any offset; used for snaps and disconnects.
    pub fn clear(&mut self) {
        self.remaining = 0;
        self.initial = Vec3::ZERO;
        self.offset = Vec3::ZERO;
    }
}

// https://easings.net/#easeOutCubic
fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decays_to_zero_within_duration() {
        let mut correction = SmoothCorrection::new(6);
        correction.start(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(correction.offset(), Vec3::new(1.0, 0.0, 0.0));

        let mut previous = correction.offset().length();
        for _ in 0..5 {
            let offset = correction.step().length();
            assert!(offset < previous);
            previous = offset;
        }
        assert!(!correction.is_complete());
        assert_eq!(correction.step(), Vec3::ZERO);
        assert!(correction.is_complete());
    }

    #[test]
    fn idle_step_is_zero() {
        let mut correction = SmoothCorrection::new(4);
        assert!(correction.is_complete());
        assert_eq!(correction.step(), Vec3::ZERO);
    }

    #[test]
    fn restart_folds_in_current_offset() {
        let mut correction = SmoothCorrection::new(4);
        correction.start(Vec3::X);
        correction.step();
        let in_flight = correction.offset();
        correction.start(Vec3::X);
        assert_eq!(correction.offset(), in_flight + Vec3::X);
    }

    #[test]
    fn zero_duration_never_offsets() {
        let mut correction = SmoothCorrection::new(0);
        correction.start(Vec3::X);
        assert_eq!(correction.offset(), Vec3::ZERO);
        assert!(correction.is_complete());
    }

    #[test]
    fn clear_drops_offset() {
        let mut correction = SmoothCorrection::new(4);
        correction.start(Vec3::Y);
        correction.clear();
        assert_eq!(correction.offset(), Vec3::ZERO);
        assert!(correction.is_complete());
    }

    #[test]
    fn ease_out_cubic_endpoints() {
        assert!(ease_out_cubic(0.0).abs() < f32::EPSILON);
        assert!((ease_out_cubic(1.0) - 1.0).abs() < f32::EPSILON);
        assert!(ease_out_cubic(0.5) > 0.5);
    }
}
