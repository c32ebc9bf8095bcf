//! Message passing schedules
//!
//! A schedule is a tree of single message updates, sequences and bounded loops.
//! Running one yields the largest marginal change it caused.

use super::factors::{FactorArena, FactorId};
use crate::error::{RatingError, Result};
use tracing::{trace, warn};

#[derive(Debug, Clone)]
pub(crate) enum Schedule {
    /// Update one message of one factor
    Step { factor: FactorId, message: usize },
    /// Run each child in order
    Sequence(Vec<Schedule>),
    /// Repeat the body until a pass moves no marginal by more than `tolerance`
    Loop {
        body: Box<Schedule>,
        tolerance: f64,
        max_iterations: usize,
    },
}

impl Schedule {
    pub(crate) fn step(factor: FactorId, message: usize) -> Self {
        Schedule::Step { factor, message }
    }

    pub(crate) fn run(&self, arena: &mut FactorArena) -> Result<f64> {
        match self {
            Schedule::Step { factor, message } => Ok(arena.update_message(*factor, *message)),
            Schedule::Sequence(children) => {
                let mut max_delta: f64 = 0.0;
                for child in children {
                    max_delta = max_delta.max(child.run(arena)?);
                }
                Ok(max_delta)
            }
            Schedule::Loop {
                body,
                tolerance,
                max_iterations,
            } => {
                let mut iterations = 0;
                loop {
                    let delta = body.run(arena)?;
                    iterations += 1;
                    trace!(iterations, delta, "Schedule loop pass");

                    if delta <= *tolerance {
                        return Ok(delta);
                    }
                    if iterations >= *max_iterations {
                        warn!(iterations, delta, "Factor graph did not converge");
                        return Err(RatingError::ConvergenceFailed { iterations, delta });
                    }
                }
            }
        }
    }
}
