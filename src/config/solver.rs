//! Settings for the iterative factor graph solver

use serde::{Deserialize, Serialize};

/// Convergence controls for the message-passing loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Largest marginal change that still counts as converged
    pub convergence_tolerance: f64,
    /// Forward/backward passes allowed before giving up
    pub max_iterations: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            convergence_tolerance: 0.0001,
            max_iterations: 100,
        }
    }
}
