/// Value the transition timer converges to; the shader treats it as degrees.
pub const TIMER_TARGET: f64 = 90.0;
/// Fraction of the remaining distance covered on every tick.
pub const DEFAULT_DECAY: f64 = 0.04;
/// Once a tick lands at or above this value the timer snaps to [`TIMER_TARGET`].
pub const DEFAULT_SNAP_THRESHOLD: f64 = 88.5;

const MAX_FRAMES: u32 = 100_000;

/// Frame-driven exponential ease-out toward [`TIMER_TARGET`].
///
/// There is no fixed duration: each tick covers `decay` of whatever distance
/// is left, so the curve is fast at first and slows down near the end. The
/// snap threshold bounds the number of ticks to completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EaseOut {
    decay: f64,
    snap_threshold: f64,
}

impl EaseOut {
    pub fn new(decay: f64, snap_threshold: f64) -> Self {
        Self {
            decay,
            snap_threshold,
        }
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    pub fn snap_threshold(&self) -> f64 {
        self.snap_threshold
    }

    /// Produces the progress value for the next frame.
    pub fn advance(&self, progress: f64) -> f64 {
        let next = progress + (TIMER_TARGET - progress) * self.decay;
        if next >= self.snap_threshold && next != TIMER_TARGET {
            TIMER_TARGET
        } else {
            next
        }
    }

    /// Number of ticks needed to go from 0 to the target.
    ///
    /// Returns `None` when the parameters never reach the target (a zero decay
    /// or a threshold above the target).
    pub fn frames_to_target(&self) -> Option<u32> {
        if self.decay <= 0.0 || self.snap_threshold > TIMER_TARGET {
            return None;
        }
        let mut progress = 0.0;
        for frame in 1..=MAX_FRAMES {
            progress = self.advance(progress);
            if progress == TIMER_TARGET {
                return Some(frame);
            }
        }
        None
    }
}

impl Default for EaseOut {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY, DEFAULT_SNAP_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_curve_completes_in_101_ticks() {
        assert_eq!(EaseOut::default().frames_to_target(), Some(101));
    }

    #[test]
    fn hundredth_tick_is_still_below_threshold() {
        let ease = EaseOut::default();
        let mut progress = 0.0;
        for _ in 0..100 {
            progress = ease.advance(progress);
        }
        assert!(progress < DEFAULT_SNAP_THRESHOLD);
        assert!((progress - 88.481_671_257_703_52).abs() < 1e-9);
        assert_eq!(ease.advance(progress), TIMER_TARGET);
    }

    #[test]
    fn first_tick_covers_four_percent() {
        let ease = EaseOut::default();
        assert!((ease.advance(0.0) - 3.6).abs() < 1e-12);
    }

    #[test]
    fn advance_is_monotonic_and_bounded() {
        let ease = EaseOut::default();
        let mut progress = 0.0;
        for _ in 0..200 {
            let next = ease.advance(progress);
            assert!(next >= progress);
            assert!(next <= TIMER_TARGET);
            progress = next;
        }
        assert_eq!(progress, TIMER_TARGET);
    }

    #[test]
    fn target_is_a_fixed_point() {
        assert_eq!(EaseOut::default().advance(TIMER_TARGET), TIMER_TARGET);
    }

    #[test]
    fn degenerate_parameters_never_finish() {
        assert_eq!(EaseOut::new(0.0, 88.5).frames_to_target(), None);
        assert_eq!(EaseOut::new(0.04, 95.0).frames_to_target(), None);
    }
}
