//! Configuration for the rating calculators
//!
//! This module holds the game parameters, the factor graph solver settings,
//! and loading of both from TOML files or environment variables.

pub mod app;
pub mod rating;
pub mod solver;

// Re-export commonly used types
pub use app::{validate_config, RatingConfig};
pub use rating::GameInfo;
pub use solver::SolverSettings;
