//! Score bands used for every badge and threshold decision.

use std::fmt;

use serde::Serialize;

use crate::model::{Percentage, PercentageError};

/// Lowest percentage that counts as [`ScoreBand::High`].
pub const HIGH_THRESHOLD: f64 = 80.0;
/// Lowest percentage that counts as [`ScoreBand::Medium`].
pub const MEDIUM_THRESHOLD: f64 = 50.0;

/// Qualitative band for a score. Ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ScoreBand {
    Low,
    Medium,
    High,
}

impl ScoreBand {
    /// Badge text shown next to a percentage.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::High => "High",
            ScoreBand::Medium => "Medium",
            ScoreBand::Low => "Low",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a validated percentage.
#[must_use]
pub fn classify(percentage: Percentage) -> ScoreBand {
    let value = percentage.value();
    if value >= HIGH_THRESHOLD {
        ScoreBand::High
    } else if value >= MEDIUM_THRESHOLD {
        ScoreBand::Medium
    } else {
        ScoreBand::Low
    }
}

/// Classify a raw value, rejecting anything outside `0..=100`.
///
/// # Errors
///
/// Returns `PercentageError` for non-finite or out-of-range input.
pub fn classify_value(value: f64) -> Result<ScoreBand, PercentageError> {
    Percentage::new(value).map(classify)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(value: f64) -> ScoreBand {
        classify_value(value).unwrap()
    }

    #[test]
    fn thresholds_are_inclusive_lower_bounds() {
        assert_eq!(band(100.0), ScoreBand::High);
        assert_eq!(band(80.0), ScoreBand::High);
        assert_eq!(band(79.99), ScoreBand::Medium);
        assert_eq!(band(50.0), ScoreBand::Medium);
        assert_eq!(band(49.99), ScoreBand::Low);
        assert_eq!(band(0.0), ScoreBand::Low);
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(classify_value(-1.0).is_err());
        assert!(classify_value(100.5).is_err());
        assert!(classify_value(f64::INFINITY).is_err());
    }

    #[test]
    fn classification_is_monotonic() {
        let steps: Vec<f64> = (0..=1000).map(|i| f64::from(i) / 10.0).collect();
        for pair in steps.windows(2) {
            assert!(
                band(pair[0]) <= band(pair[1]),
                "{} classified better than {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn labels_match_display() {
        for b in [ScoreBand::High, ScoreBand::Medium, ScoreBand::Low] {
            assert_eq!(b.to_string(), b.label());
        }
    }
}
