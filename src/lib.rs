//! TrueSkill Engine - Bayesian skill ratings for ranked matches
//!
//! This crate computes posterior player ratings after a match between any
//! number of teams, and the quality (draw probability) of a prospective match.

pub mod config;
pub mod error;
pub mod numerics;
pub mod rating;
pub mod types;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use config::{GameInfo, RatingConfig, SolverSettings};
pub use rating::{
    select_calculator, FactorGraphCalculator, SkillCalculator, TwoPlayerCalculator,
    TwoTeamCalculator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
