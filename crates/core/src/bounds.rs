//! Inclusive `[low, high]` bounds evaluation.
//!
//! [`evaluate`] is the raw policy and does not care whether the pair is
//! ordered. [`Bounds`] is the validated pair that watchers store: it can
//! only be built from finite values with `low <= high`, so a rejected
//! write never replaces the previous pair.

use serde::Serialize;

use crate::error::CoreError;

/// Outcome of checking a sample against a bounds pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsCheck {
    InBounds,
    OutOfBounds,
}

/// `InBounds` iff `low <= value <= high`.
///
/// A NaN sample is never in bounds.
pub fn evaluate(value: f64, low: f64, high: f64) -> BoundsCheck {
    if low <= value && value <= high {
        BoundsCheck::InBounds
    } else {
        BoundsCheck::OutOfBounds
    }
}

/// A validated, ordered pair of finite bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    low: f64,
    high: f64,
}

impl Bounds {
    /// Accept `(low, high)` if both are finite and `low <= high`.
    pub fn new(low: f64, high: f64) -> Result<Self, CoreError> {
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(CoreError::InvalidBounds { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Replace the low bound, keeping the current high bound.
    pub fn with_low(&self, low: f64) -> Result<Self, CoreError> {
        Self::new(low, self.high)
    }

    /// Replace the high bound, keeping the current low bound.
    pub fn with_high(&self, high: f64) -> Result<Self, CoreError> {
        Self::new(self.low, high)
    }

    pub fn evaluate(&self, value: f64) -> BoundsCheck {
        evaluate(value, self.low, self.high)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW,
            high: DEFAULT_HIGH,
        }
    }
}

/// Default low bound for targets that do not configure one.
pub const DEFAULT_LOW: f64 = 0.0;

/// Default high bound for targets that do not configure one.
pub const DEFAULT_HIGH: f64 = 100.0;

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn boundaries_are_inclusive() {
        assert_eq!(evaluate(10.0, 10.0, 20.0), BoundsCheck::InBounds);
        assert_eq!(evaluate(20.0, 10.0, 20.0), BoundsCheck::InBounds);
        assert_eq!(evaluate(15.0, 10.0, 20.0), BoundsCheck::InBounds);
    }

    #[test]
    fn outside_is_out_of_bounds() {
        assert_eq!(evaluate(9.999, 10.0, 20.0), BoundsCheck::OutOfBounds);
        assert_eq!(evaluate(20.001, 10.0, 20.0), BoundsCheck::OutOfBounds);
        assert_eq!(evaluate(-1e9, 10.0, 20.0), BoundsCheck::OutOfBounds);
    }

    #[test]
    fn degenerate_range_accepts_single_point() {
        assert_eq!(evaluate(5.0, 5.0, 5.0), BoundsCheck::InBounds);
        assert_eq!(evaluate(5.1, 5.0, 5.0), BoundsCheck::OutOfBounds);
    }

    #[test]
    fn nan_sample_is_out_of_bounds() {
        assert_eq!(evaluate(f64::NAN, 0.0, 100.0), BoundsCheck::OutOfBounds);
    }

    #[test]
    fn evaluate_does_not_reject_inverted_pair() {
        // Ordering is enforced by `Bounds`, not by the policy.
        assert_eq!(evaluate(15.0, 20.0, 10.0), BoundsCheck::OutOfBounds);
    }

    #[test]
    fn sweep_matches_inclusive_definition() {
        let pairs = [(-5.0, 5.0), (0.0, 0.0), (10.0, 20.0), (-100.0, -50.0)];
        for (low, high) in pairs {
            let mut value = low - 3.0;
            while value <= high + 3.0 {
                let expected = low <= value && value <= high;
                assert_eq!(
                    evaluate(value, low, high) == BoundsCheck::InBounds,
                    expected,
                    "value {value} in [{low}, {high}]"
                );
                value += 0.5;
            }
        }
    }

    #[test]
    fn new_rejects_inverted_pair() {
        assert_matches!(
            Bounds::new(20.0, 10.0),
            Err(CoreError::InvalidBounds { low, high }) if low == 20.0 && high == 10.0
        );
    }

    #[test]
    fn new_rejects_non_finite() {
        assert!(Bounds::new(f64::NAN, 10.0).is_err());
        assert!(Bounds::new(0.0, f64::INFINITY).is_err());
        assert!(Bounds::new(f64::NEG_INFINITY, 0.0).is_err());
    }

    #[test]
    fn with_low_and_with_high_pair_with_current_bound() {
        let bounds = Bounds::new(10.0, 20.0).unwrap();

        let lowered = bounds.with_low(5.0).unwrap();
        assert_eq!((lowered.low(), lowered.high()), (5.0, 20.0));

        let raised = bounds.with_high(30.0).unwrap();
        assert_eq!((raised.low(), raised.high()), (10.0, 30.0));

        assert!(bounds.with_low(25.0).is_err());
        assert!(bounds.with_high(5.0).is_err());
    }

    #[test]
    fn default_bounds_are_zero_to_hundred() {
        let bounds = Bounds::default();
        assert_eq!(bounds.low(), 0.0);
        assert_eq!(bounds.high(), 100.0);
    }
}
