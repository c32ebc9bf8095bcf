//! Gaussian distribution in both moment and canonical (precision) form
//!
//! Products and quotients of Gaussians are the core of every message-passing
//! update, and they are exact additions/subtractions in precision form. The
//! moment form is kept alongside so callers never have to synchronize two views.

use statrs::function::erf::{erfc, erfc_inv};
use std::f64::consts::{PI, SQRT_2};
use std::fmt;
use std::ops::{Div, Mul};

/// ln(√(2π))
const LOG_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

/// A normal distribution stored as two synchronized views of one value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    mean: f64,
    stddev: f64,
    variance: f64,
    precision: f64,
    precision_mean: f64,
}

impl Gaussian {
    /// Create a Gaussian from its mean and standard deviation
    pub fn new(mean: f64, stddev: f64) -> Self {
        let variance = stddev * stddev;
        let precision = 1.0 / variance;
        Self {
            mean,
            stddev,
            variance,
            precision,
            precision_mean: precision * mean,
        }
    }

    /// Create a Gaussian from its canonical parameters.
    ///
    /// A zero precision yields the uniform distribution: mean 0, infinite variance.
    pub fn from_precision_mean(precision_mean: f64, precision: f64) -> Self {
        if precision == 0.0 {
            return Self {
                mean: 0.0,
                stddev: f64::INFINITY,
                variance: f64::INFINITY,
                precision: 0.0,
                precision_mean,
            };
        }

        let variance = 1.0 / precision;
        Self {
            mean: precision_mean / precision,
            stddev: variance.sqrt(),
            variance,
            precision,
            precision_mean,
        }
    }

    /// The vague prior every factor graph variable and message starts from
    pub fn uniform() -> Self {
        Self::from_precision_mean(0.0, 0.0)
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn stddev(&self) -> f64 {
        self.stddev
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn precision_mean(&self) -> f64 {
        self.precision_mean
    }

    /// True when this carries no information (zero precision)
    pub fn is_uniform(&self) -> bool {
        self.precision == 0.0
    }

    /// Density of this distribution at `x`
    pub fn density_at(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.stddev;
        at(z) / self.stddev
    }

    /// Probability that a sample of this distribution is at most `x`
    pub fn cumulative_at(&self, x: f64) -> f64 {
        cumulative_to((x - self.mean) / self.stddev)
    }

    /// Log of the normalization constant of the product `a * b`
    pub fn log_product_normalization(a: &Gaussian, b: &Gaussian) -> f64 {
        if a.precision == 0.0 || b.precision == 0.0 {
            return 0.0;
        }

        let variance_sum = a.variance + b.variance;
        let mean_diff = a.mean - b.mean;

        -LOG_SQRT_2PI - variance_sum.ln() / 2.0 - mean_diff * mean_diff / (2.0 * variance_sum)
    }

    /// Log of the normalization constant of the ratio `numerator / denominator`
    pub fn log_ratio_normalization(numerator: &Gaussian, denominator: &Gaussian) -> f64 {
        if numerator.precision == 0.0 || denominator.precision == 0.0 {
            return 0.0;
        }

        let variance_diff = denominator.variance - numerator.variance;
        let mean_diff = numerator.mean - denominator.mean;

        denominator.variance.ln() + LOG_SQRT_2PI - variance_diff.ln() / 2.0
            + mean_diff * mean_diff / (2.0 * variance_diff)
    }

    /// Distance used to decide when message passing has settled
    pub fn absolute_difference(a: &Gaussian, b: &Gaussian) -> f64 {
        (a.precision_mean - b.precision_mean)
            .abs()
            .max((a.precision - b.precision).abs().sqrt())
    }
}

impl Mul for Gaussian {
    type Output = Gaussian;

    fn mul(self, rhs: Gaussian) -> Gaussian {
        Gaussian::from_precision_mean(
            self.precision_mean + rhs.precision_mean,
            self.precision + rhs.precision,
        )
    }
}

impl Div for Gaussian {
    type Output = Gaussian;

    fn div(self, rhs: Gaussian) -> Gaussian {
        Gaussian::from_precision_mean(
            self.precision_mean - rhs.precision_mean,
            self.precision - rhs.precision,
        )
    }
}

impl fmt::Display for Gaussian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{μ:{:.6} σ:{:.6}}}", self.mean, self.stddev)
    }
}

/// Standard normal density φ(x)
pub fn at(x: f64) -> f64 {
    (-x * x / 2.0).exp() / (2.0 * PI).sqrt()
}

/// Standard normal cumulative distribution Φ(x)
pub fn cumulative_to(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Inverse of the cumulative distribution of N(mean, stddev²)
pub fn inverse_cumulative_to(p: f64, mean: f64, stddev: f64) -> f64 {
    mean - SQRT_2 * stddev * erfc_inv(2.0 * p)
}
