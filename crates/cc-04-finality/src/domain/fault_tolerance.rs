//! Exact fault-tolerance values.

use std::fmt;
use std::str::FromStr;

use num_rational::Ratio;
use thiserror::Error;

/// `(2 × clique weight − total weight) / total weight`, kept exact.
///
/// Always within `[-1, 1]`: `-1` means no support, `0` exactly half the
/// weight, `1` every bonded validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaultTolerance(Ratio<i128>);

/// Malformed threshold string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid fault tolerance {input:?}: expected a rational such as 0, 1/3 or -1/2 within [-1, 1]")]
pub struct ParseFaultToleranceError {
    pub input: String,
}

impl FaultTolerance {
    pub const MIN: FaultTolerance = FaultTolerance(Ratio::new_raw(-1, 1));
    pub const ZERO: FaultTolerance = FaultTolerance(Ratio::new_raw(0, 1));
    pub const MAX: FaultTolerance = FaultTolerance(Ratio::new_raw(1, 1));

    /// Value for a clique of `clique_weight` out of `total_weight`.
    ///
    /// A zero total yields [`FaultTolerance::MIN`]; a clique heavier than the
    /// total is clamped to it.
    pub fn from_weights(clique_weight: u128, total_weight: u128) -> Self {
        if total_weight == 0 {
            return Self::MIN;
        }
        let clique = clique_weight.min(total_weight);
        // Scale both down together if the total does not fit an i128.
        let shift = 128 - total_weight.leading_zeros();
        let shift = shift.saturating_sub(126);
        let clique = (clique >> shift) as i128;
        let total = (total_weight >> shift).max(1) as i128;
        Self(Ratio::new(2 * clique - total, total))
    }

    /// Build from a numerator and denominator, clamped to `[-1, 1]`.
    pub fn new(numer: i128, denom: i128) -> Self {
        Self(Ratio::new(numer, denom)).clamped()
    }

    pub fn ratio(&self) -> Ratio<i128> {
        self.0
    }

    /// Lossy conversion for logs and gauges.
    pub fn to_f64(&self) -> f64 {
        *self.0.numer() as f64 / *self.0.denom() as f64
    }

    fn clamped(self) -> Self {
        self.clamp(Self::MIN, Self::MAX)
    }
}

impl Default for FaultTolerance {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for FaultTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FaultTolerance {
    type Err = ParseFaultToleranceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseFaultToleranceError {
            input: s.to_string(),
        };
        let ratio = Ratio::<i128>::from_str(s.trim()).map_err(|_| err())?;
        let value = Self(ratio);
        if value < Self::MIN || value > Self::MAX {
            return Err(err());
        }
        Ok(value)
    }
}
