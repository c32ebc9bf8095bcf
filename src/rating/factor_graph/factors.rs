//! Factor arena and the message updates of each factor kind
//!
//! Variables are indices into a flat vector of marginals. Each factor keeps one
//! message per attached variable, in the same order as its variable list, and
//! every update returns how far the touched marginal moved.

use crate::numerics::gaussian::cumulative_to;
use crate::numerics::Gaussian;
use crate::rating::truncation::{
    v_exceeds_margin, v_within_margin, w_exceeds_margin, w_within_margin,
};

pub(crate) type VariableId = usize;
pub(crate) type FactorId = usize;

/// Per-target coefficients of a weighted sum rearranged to solve for that target
#[derive(Debug, Clone)]
pub(crate) struct SumArrangement {
    weights: Vec<f64>,
    weights_squared: Vec<f64>,
    /// Target position first, then the positions the weights apply to
    positions: Vec<usize>,
}

#[derive(Debug, Clone)]
pub(crate) enum FactorKind {
    /// Fixed Gaussian belief on a single variable
    Prior { message: Gaussian },
    /// Gaussian noise of the given precision linking two variables
    Likelihood { precision: f64 },
    /// First variable equals the weighted sum of the rest
    WeightedSum { arrangements: Vec<SumArrangement> },
    /// Variable is greater than epsilon (decisive result)
    GreaterThan { epsilon: f64 },
    /// Variable lies within ±epsilon (draw)
    Within { epsilon: f64 },
}

#[derive(Debug, Clone)]
pub(crate) struct Factor {
    kind: FactorKind,
    variables: Vec<VariableId>,
    messages: Vec<Gaussian>,
}

impl Factor {
    fn with_variables(kind: FactorKind, variables: Vec<VariableId>) -> Self {
        let messages = vec![Gaussian::uniform(); variables.len()];
        Self {
            kind,
            variables,
            messages,
        }
    }

    pub(crate) fn prior(mean: f64, variance: f64, variable: VariableId) -> Self {
        Self::with_variables(
            FactorKind::Prior {
                message: Gaussian::new(mean, variance.sqrt()),
            },
            vec![variable],
        )
    }

    /// Message 0 flows into `performance`, message 1 into `skill`
    pub(crate) fn likelihood(beta_squared: f64, performance: VariableId, skill: VariableId) -> Self {
        Self::with_variables(
            FactorKind::Likelihood {
                precision: 1.0 / beta_squared,
            },
            vec![performance, skill],
        )
    }

    /// `sum = Σ weights[i] · terms[i]`; message 0 flows into `sum`, message i into `terms[i - 1]`
    pub(crate) fn weighted_sum(sum: VariableId, terms: &[VariableId], weights: &[f64]) -> Self {
        debug_assert_eq!(terms.len(), weights.len());

        let mut arrangements = Vec::with_capacity(terms.len() + 1);
        arrangements.push(SumArrangement {
            weights: weights.to_vec(),
            weights_squared: weights.iter().map(|w| w * w).collect(),
            positions: (0..=terms.len()).collect(),
        });

        // Solving for term j: term_j = sum / w_j - Σ_{i≠j} (w_i / w_j) · term_i
        for target in 1..=terms.len() {
            let target_weight = weights[target - 1];
            let mut arranged = Vec::with_capacity(terms.len());
            let mut positions = Vec::with_capacity(terms.len() + 1);
            positions.push(target);

            for (source, weight) in weights.iter().enumerate() {
                if source == target - 1 {
                    continue;
                }
                arranged.push(if target_weight == 0.0 {
                    0.0
                } else {
                    -weight / target_weight
                });
                positions.push(source + 1);
            }
            arranged.push(if target_weight == 0.0 {
                0.0
            } else {
                1.0 / target_weight
            });
            positions.push(0);

            arrangements.push(SumArrangement {
                weights_squared: arranged.iter().map(|w| w * w).collect(),
                weights: arranged,
                positions,
            });
        }

        let mut variables = Vec::with_capacity(terms.len() + 1);
        variables.push(sum);
        variables.extend_from_slice(terms);
        Self::with_variables(FactorKind::WeightedSum { arrangements }, variables)
    }

    pub(crate) fn greater_than(epsilon: f64, variable: VariableId) -> Self {
        Self::with_variables(FactorKind::GreaterThan { epsilon }, vec![variable])
    }

    pub(crate) fn within(epsilon: f64, variable: VariableId) -> Self {
        Self::with_variables(FactorKind::Within { epsilon }, vec![variable])
    }

    pub(crate) fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Recompute message `index` and fold it into its variable's marginal.
    ///
    /// Returns the absolute difference between the old and new marginal.
    pub(crate) fn update_message(&mut self, index: usize, marginals: &mut [Gaussian]) -> f64 {
        let (target, new_message, new_marginal) = match &self.kind {
            FactorKind::Prior { message } => {
                let old_marginal = marginals[self.variables[0]];
                let old_message = self.messages[0];
                let new_marginal = Gaussian::from_precision_mean(
                    old_marginal.precision_mean() + message.precision_mean()
                        - old_message.precision_mean(),
                    old_marginal.precision() + message.precision() - old_message.precision(),
                );
                (0, *message, new_marginal)
            }
            FactorKind::Likelihood { precision } => {
                let other = 1 - index;
                let other_marginal = marginals[self.variables[other]];
                let other_message = self.messages[other];

                let a = precision / (precision + other_marginal.precision() - other_message.precision());
                let new_message = Gaussian::from_precision_mean(
                    a * (other_marginal.precision_mean() - other_message.precision_mean()),
                    a * (other_marginal.precision() - other_message.precision()),
                );
                let new_marginal =
                    marginals[self.variables[index]] / self.messages[index] * new_message;
                (index, new_message, new_marginal)
            }
            FactorKind::WeightedSum { arrangements } => {
                let arrangement = &arrangements[index];
                let mut inverse_precision_sum = 0.0;
                let mut weighted_mean_sum = 0.0;

                for (i, &position) in arrangement.positions.iter().skip(1).enumerate() {
                    let marginal = marginals[self.variables[position]];
                    let message = self.messages[position];
                    let precision_diff = marginal.precision() - message.precision();

                    inverse_precision_sum += arrangement.weights_squared[i] / precision_diff;
                    weighted_mean_sum += arrangement.weights[i]
                        * (marginal.precision_mean() - message.precision_mean())
                        / precision_diff;
                }

                let new_precision = 1.0 / inverse_precision_sum;
                let new_message =
                    Gaussian::from_precision_mean(new_precision * weighted_mean_sum, new_precision);
                let target = arrangement.positions[0];
                let new_marginal =
                    marginals[self.variables[target]] / self.messages[target] * new_message;
                (target, new_message, new_marginal)
            }
            FactorKind::GreaterThan { epsilon } | FactorKind::Within { epsilon } => {
                let old_marginal = marginals[self.variables[0]];
                let old_message = self.messages[0];
                let from_variable = old_marginal / old_message;

                let c = from_variable.precision();
                let d = from_variable.precision_mean();
                let sqrt_c = c.sqrt();
                let d_on_sqrt_c = d / sqrt_c;
                let epsilon_times_sqrt_c = epsilon * sqrt_c;

                let (v, w) = match self.kind {
                    FactorKind::Within { .. } => (
                        v_within_margin(d_on_sqrt_c, epsilon_times_sqrt_c),
                        w_within_margin(d_on_sqrt_c, epsilon_times_sqrt_c),
                    ),
                    _ => (
                        v_exceeds_margin(d_on_sqrt_c, epsilon_times_sqrt_c),
                        w_exceeds_margin(d_on_sqrt_c, epsilon_times_sqrt_c),
                    ),
                };

                let denom = 1.0 - w;
                let new_marginal = Gaussian::from_precision_mean((d + sqrt_c * v) / denom, c / denom);
                let new_message = old_message * new_marginal / old_marginal;
                (0, new_message, new_marginal)
            }
        };

        let variable = self.variables[target];
        let old_marginal = marginals[variable];
        self.messages[target] = new_message;
        marginals[variable] = new_marginal;

        Gaussian::absolute_difference(&new_marginal, &old_marginal)
    }

    /// Multiply message `index` into its variable, returning the log normalization of the product
    pub(crate) fn send_message(&self, index: usize, marginals: &mut [Gaussian]) -> f64 {
        let variable = self.variables[index];
        let marginal = marginals[variable];
        let message = self.messages[index];

        let log_z = Gaussian::log_product_normalization(&marginal, &message);
        marginals[variable] = marginal * message;
        log_z
    }

    /// This factor's contribution to the log evidence given the current marginals
    pub(crate) fn log_normalization(&self, marginals: &[Gaussian]) -> f64 {
        match &self.kind {
            FactorKind::Prior { .. } => 0.0,
            FactorKind::Likelihood { .. } => {
                Gaussian::log_ratio_normalization(&marginals[self.variables[0]], &self.messages[0])
            }
            FactorKind::WeightedSum { .. } => self
                .variables
                .iter()
                .zip(&self.messages)
                .skip(1)
                .map(|(&variable, message)| {
                    Gaussian::log_ratio_normalization(&marginals[variable], message)
                })
                .sum(),
            FactorKind::GreaterThan { epsilon } => {
                let message = self.messages[0];
                let from_variable = marginals[self.variables[0]] / message;
                -Gaussian::log_product_normalization(&from_variable, &message)
                    + cumulative_to((from_variable.mean() - epsilon) / from_variable.stddev()).ln()
            }
            FactorKind::Within { epsilon } => {
                let message = self.messages[0];
                let from_variable = marginals[self.variables[0]] / message;
                let mean = from_variable.mean();
                let stddev = from_variable.stddev();
                let mass = cumulative_to((epsilon - mean) / stddev)
                    - cumulative_to((-epsilon - mean) / stddev);
                -Gaussian::log_product_normalization(&from_variable, &message) + mass.ln()
            }
        }
    }
}

/// Flat storage for every variable marginal and factor of one graph
#[derive(Debug, Clone, Default)]
pub(crate) struct FactorArena {
    marginals: Vec<Gaussian>,
    factors: Vec<Factor>,
}

impl FactorArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// New variable starting from the uniform distribution
    pub(crate) fn add_variable(&mut self) -> VariableId {
        self.marginals.push(Gaussian::uniform());
        self.marginals.len() - 1
    }

    pub(crate) fn add_factor(&mut self, factor: Factor) -> FactorId {
        self.factors.push(factor);
        self.factors.len() - 1
    }

    pub(crate) fn marginal(&self, variable: VariableId) -> Gaussian {
        self.marginals[variable]
    }

    pub(crate) fn variable_count(&self) -> usize {
        self.marginals.len()
    }

    pub(crate) fn factor_count(&self) -> usize {
        self.factors.len()
    }

    pub(crate) fn message_count(&self, factor: FactorId) -> usize {
        self.factors[factor].message_count()
    }

    pub(crate) fn update_message(&mut self, factor: FactorId, index: usize) -> f64 {
        self.factors[factor].update_message(index, &mut self.marginals)
    }

    /// Log evidence of the graph as currently converged.
    ///
    /// Marginals are rebuilt from uniform out of the stored messages, so the
    /// arena itself is left untouched.
    pub(crate) fn log_normalization(&self) -> f64 {
        let mut marginals = vec![Gaussian::uniform(); self.marginals.len()];

        let mut sum_log_z = 0.0;
        for factor in &self.factors {
            for index in 0..factor.message_count() {
                sum_log_z += factor.send_message(index, &mut marginals);
            }
        }

        let sum_log_s: f64 = self
            .factors
            .iter()
            .map(|factor| factor.log_normalization(&marginals))
            .sum();

        sum_log_z + sum_log_s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_prior_sets_marginal() {
        let mut arena = FactorArena::new();
        let skill = arena.add_variable();
        let prior = arena.add_factor(Factor::prior(25.0, 64.0, skill));

        let delta = arena.update_message(prior, 0);
        assert!(delta > 0.0);
        assert_abs_diff_eq!(arena.marginal(skill).mean(), 25.0, epsilon = 1e-12);
        assert_abs_diff_eq!(arena.marginal(skill).stddev(), 8.0, epsilon = 1e-12);

        // Sending the same message again changes nothing
        assert_abs_diff_eq!(arena.update_message(prior, 0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_likelihood_adds_noise() {
        let mut arena = FactorArena::new();
        let skill = arena.add_variable();
        let performance = arena.add_variable();
        let prior = arena.add_factor(Factor::prior(10.0, 9.0, skill));
        let likelihood = arena.add_factor(Factor::likelihood(16.0, performance, skill));

        arena.update_message(prior, 0);
        arena.update_message(likelihood, 0);

        let marginal = arena.marginal(performance);
        assert_abs_diff_eq!(marginal.mean(), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(marginal.variance(), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_weighted_sum_forward_and_back() {
        let mut arena = FactorArena::new();
        let a = arena.add_variable();
        let b = arena.add_variable();
        let sum = arena.add_variable();
        let prior_a = arena.add_factor(Factor::prior(3.0, 1.0, a));
        let prior_b = arena.add_factor(Factor::prior(5.0, 4.0, b));
        let sum_factor = arena.add_factor(Factor::weighted_sum(sum, &[a, b], &[1.0, -1.0]));
        let observed_sum = arena.add_factor(Factor::prior(0.0, 1.0, sum));

        arena.update_message(prior_a, 0);
        arena.update_message(prior_b, 0);
        arena.update_message(sum_factor, 0);

        let marginal = arena.marginal(sum);
        assert_abs_diff_eq!(marginal.mean(), -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(marginal.variance(), 5.0, epsilon = 1e-9);

        // a = sum + b with sum ~ N(0, 1) and b ~ N(5, 4) gives N(5, 5), times the prior N(3, 1)
        arena.update_message(observed_sum, 0);
        arena.update_message(sum_factor, 1);
        let marginal = arena.marginal(a);
        assert_abs_diff_eq!(marginal.mean(), 10.0 / 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(marginal.variance(), 5.0 / 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_greater_than_truncates() {
        let mut arena = FactorArena::new();
        let diff = arena.add_variable();
        let prior = arena.add_factor(Factor::prior(0.0, 1.0, diff));
        let greater = arena.add_factor(Factor::greater_than(0.0, diff));

        arena.update_message(prior, 0);
        arena.update_message(greater, 0);

        // Moments of a standard normal truncated below at zero
        let marginal = arena.marginal(diff);
        assert_abs_diff_eq!(marginal.mean(), 0.7978845608, epsilon = 1e-9);
        assert_abs_diff_eq!(marginal.variance(), 1.0 - 2.0 / std::f64::consts::PI, epsilon = 1e-9);

        // ln P(x > 0)
        assert_abs_diff_eq!(arena.log_normalization(), 0.5f64.ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_within_keeps_symmetric_mean() {
        let mut arena = FactorArena::new();
        let diff = arena.add_variable();
        let prior = arena.add_factor(Factor::prior(0.0, 4.0, diff));
        let within = arena.add_factor(Factor::within(1.0, diff));

        arena.update_message(prior, 0);
        arena.update_message(within, 0);

        let marginal = arena.marginal(diff);
        assert_abs_diff_eq!(marginal.mean(), 0.0, epsilon = 1e-12);
        assert!(marginal.variance() < 1.0);

        // ln P(|x| < 1) for x ~ N(0, 4)
        let mass = cumulative_to(0.5) - cumulative_to(-0.5);
        assert_abs_diff_eq!(arena.log_normalization(), mass.ln(), epsilon = 1e-9);
        assert_eq!(arena.variable_count(), 1);
        assert_eq!(arena.factor_count(), 2);
        assert_eq!(arena.message_count(within), 1);
    }
}
