//! Timebase helpers for timeline comparisons.
//!
//! Two tolerances are used and deliberately kept apart:
//! - the sample-period epsilon (`1 / sample_rate`) decides whether clips touch
//!   and whether a window equals a unit span;
//! - the split threshold decides whether a clip straddles a window edge far
//!   enough to be worth cutting.

/// Epsilon used when the project sample rate is unknown.
pub const FALLBACK_EPSILON_SECS: f64 = 1e-6;

/// Minimum overhang past a window edge before a clip is split there.
pub const SPLIT_THRESHOLD_SECS: f64 = 0.002;

/// Time tolerance derived from the project sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timebase {
    epsilon: f64,
}

impl Timebase {
    /// Build a timebase from the project sample rate, if known.
    pub fn from_sample_rate(sample_rate: Option<u32>) -> Self {
        let epsilon = match sample_rate {
            Some(rate) if rate > 0 => 1.0 / rate as f64,
            _ => FALLBACK_EPSILON_SECS,
        };
        Self { epsilon }
    }

    /// Build a timebase with an explicit epsilon (tests, fixtures).
    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            epsilon: if epsilon > 0.0 {
                epsilon
            } else {
                FALLBACK_EPSILON_SECS
            },
        }
    }

    /// One sample period in seconds.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Whether two timeline positions are equal within one sample period.
    pub fn nearly_equal(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.epsilon
    }

    /// Whether `[a_start, a_end]` and `[b_start, b_end]` overlap or touch.
    pub fn intervals_touch(&self, a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> bool {
        !(a_end < b_start - self.epsilon || b_end < a_start - self.epsilon)
    }

    /// Whether `next_start` lies strictly beyond `current_end` plus one sample period.
    pub fn is_gap(&self, current_end: f64, next_start: f64) -> bool {
        next_start > current_end + self.epsilon
    }

    /// Whether the two intervals share more than one sample period.
    pub fn overlaps_beyond(&self, a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> bool {
        a_end.min(b_end) - a_start.max(b_start) > self.epsilon
    }
}

impl Default for Timebase {
    fn default() -> Self {
        Self::from_sample_rate(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsilon_from_sample_rate() {
        let tb = Timebase::from_sample_rate(Some(48_000));
        assert!((tb.epsilon() - 1.0 / 48_000.0).abs() < 1e-15);
    }

    #[test]
    fn test_epsilon_fallback() {
        assert_eq!(Timebase::from_sample_rate(None).epsilon(), FALLBACK_EPSILON_SECS);
        assert_eq!(Timebase::from_sample_rate(Some(0)).epsilon(), FALLBACK_EPSILON_SECS);
        assert_eq!(Timebase::with_epsilon(-1.0).epsilon(), FALLBACK_EPSILON_SECS);
    }

    #[test]
    fn test_intervals_touch() {
        let tb = Timebase::from_sample_rate(Some(48_000));
        assert!(tb.intervals_touch(0.0, 2.0, 2.0, 3.0));
        assert!(tb.intervals_touch(0.0, 2.0, 2.0 + tb.epsilon() * 0.5, 3.0));
        assert!(!tb.intervals_touch(0.0, 2.0, 2.01, 3.0));
        assert!(tb.intervals_touch(1.0, 1.5, 0.0, 4.0));
    }

    #[test]
    fn test_is_gap() {
        let tb = Timebase::with_epsilon(0.001);
        assert!(!tb.is_gap(2.0, 2.0));
        assert!(!tb.is_gap(2.0, 2.0005));
        assert!(tb.is_gap(2.0, 2.002));
        assert!(!tb.is_gap(2.0, 1.0));
    }

    #[test]
    fn test_split_threshold_is_coarser_than_sample_period() {
        let tb = Timebase::from_sample_rate(Some(44_100));
        assert!(SPLIT_THRESHOLD_SECS > tb.epsilon());
    }

    #[test]
    fn test_overlaps_beyond_ignores_touching_edges() {
        let tb = Timebase::from_sample_rate(Some(48_000));
        assert!(!tb.overlaps_beyond(0.0, 2.0, 2.0, 3.0));
        assert!(!tb.overlaps_beyond(0.0, 2.0 + tb.epsilon() * 0.5, 2.0, 3.0));
        assert!(tb.overlaps_beyond(0.0, 2.1, 2.0, 3.0));
        assert!(tb.overlaps_beyond(1.0, 1.5, 0.0, 4.0));
        assert!(!tb.overlaps_beyond(5.0, 6.0, 0.0, 4.0));
    }
}
