//! Layered TrueSkill factor graph for a ranked match
//!
//! Layers, top to bottom: skill priors, skill to performance likelihoods,
//! player performances summed into team performances, differences of adjacent
//! teams, and the comparison (win or draw) on each difference.

use super::factors::{Factor, FactorArena, FactorId, VariableId};
use super::schedule::Schedule;
use crate::config::{GameInfo, SolverSettings};
use crate::error::Result;
use crate::rating::ranking::RankedTeam;
use crate::types::{PlayerKey, PlayerRatings, Rating};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct PlayerNodes {
    skill: VariableId,
    prior: FactorId,
    likelihood: FactorId,
}

pub(crate) struct TrueSkillFactorGraph<'a, P: PlayerKey> {
    arena: FactorArena,
    players: Vec<(&'a P, PlayerNodes)>,
    team_sums: Vec<FactorId>,
    differences: Vec<FactorId>,
    comparisons: Vec<FactorId>,
}

impl<'a, P: PlayerKey> TrueSkillFactorGraph<'a, P> {
    /// Build the graph for teams already sorted by rank
    pub(crate) fn build(game_info: &GameInfo, ranked: &[RankedTeam<'a, P>]) -> Self {
        let beta_squared = game_info.beta * game_info.beta;
        let tau_squared = game_info.dynamics_factor * game_info.dynamics_factor;
        let epsilon = game_info.draw_margin();

        let mut arena = FactorArena::new();
        let mut players = Vec::new();
        let mut team_sums = Vec::with_capacity(ranked.len());
        let mut team_performances = Vec::with_capacity(ranked.len());

        for entry in ranked {
            let team_performance = arena.add_variable();
            let mut performances = Vec::with_capacity(entry.team.player_count());
            let mut weights = Vec::with_capacity(entry.team.player_count());

            for (player, member) in entry.team.iter() {
                let skill = arena.add_variable();
                let performance = arena.add_variable();

                let prior = arena.add_factor(Factor::prior(
                    member.rating.mean,
                    member.rating.variance() + tau_squared,
                    skill,
                ));
                let likelihood =
                    arena.add_factor(Factor::likelihood(beta_squared, performance, skill));

                players.push((
                    player,
                    PlayerNodes {
                        skill,
                        prior,
                        likelihood,
                    },
                ));
                performances.push(performance);
                weights.push(member.weight());
            }

            team_sums.push(arena.add_factor(Factor::weighted_sum(
                team_performance,
                &performances,
                &weights,
            )));
            team_performances.push(team_performance);
        }

        let mut differences = Vec::with_capacity(ranked.len().saturating_sub(1));
        let mut comparisons = Vec::with_capacity(ranked.len().saturating_sub(1));
        for (i, pair) in ranked.windows(2).enumerate() {
            let difference = arena.add_variable();
            differences.push(arena.add_factor(Factor::weighted_sum(
                difference,
                &[team_performances[i], team_performances[i + 1]],
                &[1.0, -1.0],
            )));

            let comparison = if pair[0].rank == pair[1].rank {
                Factor::within(epsilon, difference)
            } else {
                Factor::greater_than(epsilon, difference)
            };
            comparisons.push(arena.add_factor(comparison));
        }

        debug!(
            teams = ranked.len(),
            players = players.len(),
            variables = arena.variable_count(),
            factors = arena.factor_count(),
            "Built factor graph"
        );

        Self {
            arena,
            players,
            team_sums,
            differences,
            comparisons,
        }
    }

    fn difference_schedule(&self, settings: &SolverSettings) -> Schedule {
        let count = self.differences.len();

        let inner = if count == 1 {
            Schedule::Sequence(vec![
                Schedule::step(self.differences[0], 0),
                Schedule::step(self.comparisons[0], 0),
            ])
        } else {
            let mut passes = Vec::with_capacity(6 * count);
            for i in 0..count - 1 {
                passes.push(Schedule::step(self.differences[i], 0));
                passes.push(Schedule::step(self.comparisons[i], 0));
                passes.push(Schedule::step(self.differences[i], 2));
            }
            for i in (1..count).rev() {
                passes.push(Schedule::step(self.differences[i], 0));
                passes.push(Schedule::step(self.comparisons[i], 0));
                passes.push(Schedule::step(self.differences[i], 1));
            }
            Schedule::Loop {
                body: Box::new(Schedule::Sequence(passes)),
                tolerance: settings.convergence_tolerance,
                max_iterations: settings.max_iterations,
            }
        };

        Schedule::Sequence(vec![
            inner,
            Schedule::step(self.differences[0], 1),
            Schedule::step(self.differences[count - 1], 2),
        ])
    }

    fn prior_schedule(&self, settings: &SolverSettings) -> Schedule {
        let priors = self
            .players
            .iter()
            .map(|(_, nodes)| Schedule::step(nodes.prior, 0));
        let likelihoods = self
            .players
            .iter()
            .map(|(_, nodes)| Schedule::step(nodes.likelihood, 0));
        let team_sums = self.team_sums.iter().map(|&sum| Schedule::step(sum, 0));

        let mut steps: Vec<Schedule> = priors.chain(likelihoods).chain(team_sums).collect();
        steps.push(self.difference_schedule(settings));
        Schedule::Sequence(steps)
    }

    fn posterior_schedule(&self) -> Schedule {
        let mut steps = Vec::new();
        for &sum in &self.team_sums {
            for message in 1..self.arena.message_count(sum) {
                steps.push(Schedule::step(sum, message));
            }
        }
        steps.extend(
            self.players
                .iter()
                .map(|(_, nodes)| Schedule::step(nodes.likelihood, 1)),
        );
        Schedule::Sequence(steps)
    }

    /// Run prior and posterior passes, iterating the difference layer to convergence
    pub(crate) fn run_schedule(&mut self, settings: &SolverSettings) -> Result<()> {
        let schedule = Schedule::Sequence(vec![
            self.prior_schedule(settings),
            self.posterior_schedule(),
        ]);
        schedule.run(&mut self.arena)?;
        Ok(())
    }

    /// Skill marginals, in finishing order then team order
    pub(crate) fn updated_ratings(&self) -> PlayerRatings<P> {
        self.players
            .iter()
            .map(|(player, nodes)| {
                let marginal = self.arena.marginal(nodes.skill);
                ((*player).clone(), Rating::new(marginal.mean(), marginal.stddev()))
            })
            .collect()
    }

    /// Probability of the observed ranking under the prior ratings
    pub(crate) fn probability_of_ranking(&self) -> f64 {
        self.arena.log_normalization().exp()
    }
}
