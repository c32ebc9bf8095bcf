//! Conversion between draw probability and the latent draw margin ε

use crate::numerics::gaussian::inverse_cumulative_to;
use std::f64::consts::SQRT_2;

/// Performance margin ε such that two equal players draw with probability `draw_probability`
pub fn draw_margin_from_draw_probability(draw_probability: f64, beta: f64) -> f64 {
    inverse_cumulative_to((draw_probability + 1.0) / 2.0, 0.0, 1.0) * SQRT_2 * beta
}
