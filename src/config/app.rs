//! Top-level configuration
//!
//! Loads the game parameters and solver settings from a TOML file or from
//! environment variables, falling back to defaults, and validates the result.

use crate::config::{GameInfo, SolverSettings};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Everything a calculator needs besides the match itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub game: GameInfo,
    pub solver: SolverSettings,
}

impl RatingConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(mean) = parse_env("TRUESKILL_INITIAL_MEAN")? {
            config.game.initial_mean = mean;
        }
        if let Some(stddev) = parse_env("TRUESKILL_INITIAL_STDDEV")? {
            config.game.initial_stddev = stddev;
        }
        if let Some(beta) = parse_env("TRUESKILL_BETA")? {
            config.game.beta = beta;
        }
        if let Some(tau) = parse_env("TRUESKILL_DYNAMICS_FACTOR")? {
            config.game.dynamics_factor = tau;
        }
        if let Some(draw) = parse_env("TRUESKILL_DRAW_PROBABILITY")? {
            config.game.draw_probability = draw;
        }
        if let Some(tolerance) = parse_env("TRUESKILL_CONVERGENCE_TOLERANCE")? {
            config.solver.convergence_tolerance = tolerance;
        }
        if let Some(iterations) = parse_env("TRUESKILL_MAX_ITERATIONS")? {
            config.solver.max_iterations = iterations;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("Invalid rating configuration")?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: {}", name, value)),
        Err(_) => Ok(None),
    }
}

/// Validate configuration values
pub fn validate_config(config: &RatingConfig) -> Result<()> {
    config.game.validate()?;

    if !(config.solver.convergence_tolerance > 0.0) {
        return Err(anyhow!(
            "Convergence tolerance must be positive: {}",
            config.solver.convergence_tolerance
        ));
    }
    if config.solver.max_iterations == 0 {
        return Err(anyhow!("Max iterations must be greater than 0"));
    }

    Ok(())
}
