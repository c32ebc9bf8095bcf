//! Rating system parameters for one kind of game

use crate::error::{RatingError, Result};
use crate::rating::draw_margin::draw_margin_from_draw_probability;
use crate::types::Rating;
use serde::{Deserialize, Serialize};

pub const DEFAULT_INITIAL_MEAN: f64 = 25.0;
pub const DEFAULT_INITIAL_STDDEV: f64 = DEFAULT_INITIAL_MEAN / 3.0;
pub const DEFAULT_BETA: f64 = DEFAULT_INITIAL_MEAN / 6.0;
pub const DEFAULT_DYNAMICS_FACTOR: f64 = DEFAULT_INITIAL_MEAN / 300.0;
pub const DEFAULT_DRAW_PROBABILITY: f64 = 0.10;

/// Parameters of the skill model shared by every calculator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameInfo {
    /// Mean of a new player's skill
    pub initial_mean: f64,
    /// Standard deviation of a new player's skill
    pub initial_stddev: f64,
    /// Standard deviation of single-match performance around skill
    pub beta: f64,
    /// Standard deviation added to every prior before a match (τ)
    pub dynamics_factor: f64,
    /// Probability that two equally skilled players draw
    pub draw_probability: f64,
}

impl Default for GameInfo {
    fn default() -> Self {
        Self {
            initial_mean: DEFAULT_INITIAL_MEAN,
            initial_stddev: DEFAULT_INITIAL_STDDEV,
            beta: DEFAULT_BETA,
            dynamics_factor: DEFAULT_DYNAMICS_FACTOR,
            draw_probability: DEFAULT_DRAW_PROBABILITY,
        }
    }
}

impl GameInfo {
    pub fn new(
        initial_mean: f64,
        initial_stddev: f64,
        beta: f64,
        dynamics_factor: f64,
        draw_probability: f64,
    ) -> Result<Self> {
        let info = Self {
            initial_mean,
            initial_stddev,
            beta,
            dynamics_factor,
            draw_probability,
        };
        info.validate()?;
        Ok(info)
    }

    /// Game where draws are impossible (e.g. chess with forced tiebreaks)
    pub fn without_draws() -> Self {
        Self {
            draw_probability: 0.0,
            ..Self::default()
        }
    }

    /// Rating given to a player with no history
    pub fn default_rating(&self) -> Rating {
        Rating::new(self.initial_mean, self.initial_stddev)
    }

    /// Latent performance margin ε below which an outcome counts as a draw
    pub fn draw_margin(&self) -> f64 {
        draw_margin_from_draw_probability(self.draw_probability, self.beta)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        let all_finite = [
            self.initial_mean,
            self.initial_stddev,
            self.beta,
            self.dynamics_factor,
            self.draw_probability,
        ]
        .iter()
        .all(|v| v.is_finite());

        if !all_finite {
            return Err(RatingError::InvalidGameInfo {
                reason: "All parameters must be finite".to_string(),
            });
        }

        if self.initial_stddev <= 0.0 {
            return Err(RatingError::InvalidGameInfo {
                reason: "Initial standard deviation must be positive".to_string(),
            });
        }

        if self.beta <= 0.0 {
            return Err(RatingError::InvalidGameInfo {
                reason: "Beta must be positive".to_string(),
            });
        }

        if self.dynamics_factor < 0.0 {
            return Err(RatingError::InvalidGameInfo {
                reason: "Dynamics factor must be non-negative".to_string(),
            });
        }

        if !(0.0..1.0).contains(&self.draw_probability) {
            return Err(RatingError::InvalidGameInfo {
                reason: format!(
                    "Draw probability must be in [0, 1): {}",
                    self.draw_probability
                ),
            });
        }

        Ok(())
    }
}
