//! Error types for rating calculations
//!
//! Every failure here is a local validation or numeric failure. None of them are
//! transient, so callers should fix the input rather than retry.

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RatingError>;

/// Errors produced by the solvers, the numerics and configuration validation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RatingError {
    #[error("Invalid {what} count: {actual} (expected {expected})")]
    InvalidCardinality {
        what: &'static str,
        actual: usize,
        expected: String,
    },

    #[error("Dimension mismatch in {context}: {left} vs {right}")]
    DimensionMismatch {
        context: &'static str,
        left: String,
        right: String,
    },

    #[error("Message passing did not converge after {iterations} iterations (last delta {delta})")]
    ConvergenceFailed { iterations: usize, delta: f64 },

    #[error("Matrix is singular and cannot be inverted")]
    SingularMatrix,

    #[error("Partial play weight must be within [0, 1]: {weight}")]
    InvalidPartialPlay { weight: f64 },

    #[error("Invalid game info: {reason}")]
    InvalidGameInfo { reason: String },
}

impl RatingError {
    pub(crate) fn dimension_mismatch(
        context: &'static str,
        left: impl std::fmt::Display,
        right: impl std::fmt::Display,
    ) -> Self {
        RatingError::DimensionMismatch {
            context,
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}
