use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum PercentageError {
    #[error("percentage must be a finite number")]
    NotFinite,

    #[error("percentage {value} is outside 0..=100")]
    OutOfRange { value: f64 },

    #[error("cannot derive a percentage from {score}/{total}")]
    InvalidRatio { score: u32, total: u32 },
}

/// A score percentage, guaranteed finite and within `0..=100`.
///
/// Every percentage that reaches the classifier or the aggregator goes through
/// this type, so out-of-range values are rejected once at the boundary instead
/// of being clamped later.
#[derive(Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Percentage(f64);

impl Percentage {
    pub const ZERO: Self = Self(0.0);
    pub const FULL: Self = Self(100.0);

    /// Validate a raw percentage.
    ///
    /// # Errors
    ///
    /// Returns `PercentageError::NotFinite` for NaN/infinite values and
    /// `PercentageError::OutOfRange` outside `0..=100`.
    pub fn new(value: f64) -> Result<Self, PercentageError> {
        if !value.is_finite() {
            return Err(PercentageError::NotFinite);
        }
        if !(0.0..=100.0).contains(&value) {
            return Err(PercentageError::OutOfRange { value });
        }
        // Normalize -0.0 so equal percentages compare and print the same.
        Ok(Self(value + 0.0))
    }

    /// Derive `round(score / total * 100)`, the convention the backend grades with.
    ///
    /// # Errors
    ///
    /// Returns `PercentageError::InvalidRatio` when `total` is zero or `score > total`.
    pub fn from_score(score: u32, total: u32) -> Result<Self, PercentageError> {
        if total == 0 || score > total {
            return Err(PercentageError::InvalidRatio { score, total });
        }
        Self::new((f64::from(score) / f64::from(total) * 100.0).round())
    }

    /// Arithmetic mean of the given percentages; zero when empty.
    #[must_use]
    pub fn mean<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Percentage>,
    {
        let (sum, count) = values
            .into_iter()
            .fold((0.0_f64, 0_u32), |(sum, count), p| (sum + p.0, count + 1));
        if count == 0 {
            return Self::ZERO;
        }
        // The mean of values in 0..=100 stays in range; `min` guards float drift.
        Self((sum / f64::from(count)).min(100.0))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Rounded to the nearest whole percent, for display.
    #[must_use]
    pub fn rounded(self) -> u8 {
        // In range by construction, so the cast cannot truncate.
        self.0.round() as u8
    }

    /// Total order usable for sorting and max selection.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl TryFrom<f64> for Percentage {
    type Error = PercentageError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for f64 {
    fn from(value: Percentage) -> Self {
        value.0
    }
}

impl fmt::Debug for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Percentage({})", self.0)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Truncated, never rounded up past a band boundary. The epsilon keeps
        // values like 57.7 from flooring to 57.6.
        let tenths = (self.0 * 10.0 + 1e-9).floor() / 10.0;
        if tenths.fract() == 0.0 {
            write!(f, "{tenths}%")
        } else {
            write!(f, "{tenths:.1}%")
        }
    }
}
