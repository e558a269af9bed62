//! Scalar-with-uncertainty. Every arithmetic site in the engine that would
//! hold a plain number holds one of these instead, so uncertainty
//! propagates end-to-end. Comparisons collapse to the mean; equality is on
//! the full `(mean, std)` tuple.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Mul, Sub};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProbValue {
    pub mean: f64,
    pub std: f64,
}

impl ProbValue {
    pub fn new(mean: f64, std: f64) -> ProbValue {
        debug_assert!(mean.is_finite() && std.is_finite(), "non-finite ProbValue");
        ProbValue {
            mean,
            std: std.abs(),
        }
    }

    /// Zero-uncertainty value.
    pub fn constant(x: f64) -> ProbValue {
        ProbValue::new(x, 0.0)
    }

    pub fn zero() -> ProbValue {
        ProbValue::constant(0.0)
    }

    /// Boundary-checked constructor. Non-finite inputs are the only failure
    /// mode of this type.
    pub fn checked(mean: f64, std: f64) -> EngineResult<ProbValue> {
        if !mean.is_finite() {
            return Err(EngineError::NonFiniteArithmetic {
                context: "ProbValue mean",
                value: mean,
            });
        }
        if !std.is_finite() {
            return Err(EngineError::NonFiniteArithmetic {
                context: "ProbValue std",
                value: std,
            });
        }
        Ok(ProbValue::new(mean, std))
    }

    /// First two moments of a sample set (population std).
    pub fn from_samples(xs: &[f64]) -> EngineResult<ProbValue> {
        if xs.is_empty() {
            return Err(EngineError::NonFiniteArithmetic {
                context: "ProbValue::from_samples on empty set",
                value: f64::NAN,
            });
        }
        let n = xs.len() as f64;
        let mean = xs.iter().sum::<f64>() / n;
        let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
        ProbValue::checked(mean, var.sqrt())
    }

    pub fn variance(self) -> f64 {
        self.std * self.std
    }

    /// Collapse to a scalar.
    pub fn collapse(self) -> f64 {
        self.mean
    }

    pub fn scale(self, k: f64) -> ProbValue {
        ProbValue::new(self.mean * k, self.std * k.abs())
    }

    /// Clamp the mean; uncertainty is kept as-is.
    pub fn clamp(self, min: f64, max: f64) -> ProbValue {
        ProbValue::new(self.mean.clamp(min, max), self.std)
    }

    pub fn max_mean(self, floor: f64) -> ProbValue {
        if self.mean < floor {
            ProbValue::new(floor, self.std)
        } else {
            self
        }
    }
}

impl Add for ProbValue {
    type Output = ProbValue;
    fn add(self, rhs: ProbValue) -> ProbValue {
        // Variances combine in quadrature.
        ProbValue::new(
            self.mean + rhs.mean,
            (self.variance() + rhs.variance()).sqrt(),
        )
    }
}

impl AddAssign for ProbValue {
    fn add_assign(&mut self, rhs: ProbValue) {
        *self = *self + rhs;
    }
}

impl Sub for ProbValue {
    type Output = ProbValue;
    fn sub(self, rhs: ProbValue) -> ProbValue {
        ProbValue::new(
            self.mean - rhs.mean,
            (self.variance() + rhs.variance()).sqrt(),
        )
    }
}

impl Mul<f64> for ProbValue {
    type Output = ProbValue;
    fn mul(self, k: f64) -> ProbValue {
        self.scale(k)
    }
}

impl Mul for ProbValue {
    type Output = ProbValue;
    fn mul(self, rhs: ProbValue) -> ProbValue {
        // First-order propagation: var = (a·σb)² + (b·σa)².
        let var = (self.mean * rhs.std).powi(2) + (rhs.mean * self.std).powi(2);
        ProbValue::new(self.mean * rhs.mean, var.sqrt())
    }
}

impl PartialEq for ProbValue {
    fn eq(&self, other: &Self) -> bool {
        self.mean == other.mean && self.std == other.std
    }
}

impl PartialOrd for ProbValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(prob_compare(self, other))
    }
}

/// Total order on means, for sort/select sites. NaN never occurs in valid
/// pipelines; it sorts last so a defect stays visible instead of shuffling.
pub fn prob_compare(a: &ProbValue, b: &ProbValue) -> Ordering {
    a.mean.partial_cmp(&b.mean).unwrap_or(Ordering::Greater)
}
