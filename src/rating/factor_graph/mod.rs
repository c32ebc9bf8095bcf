//! Approximate inference for any number of teams
//!
//! Ratings come from expectation propagation over a TrueSkill factor graph.
//! Match quality is closed form in the player/team assignment matrix.

mod factors;
mod graph;
mod schedule;

use crate::config::{GameInfo, SolverSettings};
use crate::error::{RatingError, Result};
use crate::numerics::CountRange;
use crate::rating::calculator::SkillCalculator;
use crate::rating::ranking::{sort_by_rank, validate_team_layout};
use crate::types::{PlayerKey, PlayerRatings, Team};
use graph::TrueSkillFactorGraph;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

const TEAM_RANGE: CountRange = CountRange::at_least(2);
const PLAYER_RANGE: CountRange = CountRange::at_least(1);

/// Calculator for two or more teams of any size, with ties and partial play
#[derive(Debug, Clone, Copy, Default)]
pub struct FactorGraphCalculator {
    settings: SolverSettings,
}

impl FactorGraphCalculator {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    fn validate<P: PlayerKey>(game_info: &GameInfo, teams: &[Team<P>]) -> Result<()> {
        validate_team_layout(teams, TEAM_RANGE, PLAYER_RANGE)?;
        teams.iter().try_for_each(Team::validate_partial_play)?;
        game_info.validate()
    }

    fn run_graph<'a, P: PlayerKey>(
        &self,
        game_info: &GameInfo,
        teams: &'a [Team<P>],
        ranks: &[u32],
    ) -> Result<TrueSkillFactorGraph<'a, P>> {
        Self::validate(game_info, teams)?;
        let ranked = sort_by_rank(teams, ranks)?;

        let mut graph = TrueSkillFactorGraph::build(game_info, &ranked);
        graph.run_schedule(&self.settings)?;
        Ok(graph)
    }

    /// Probability of the given ranking under the prior ratings
    pub fn calc_ranking_probability<P: PlayerKey>(
        &self,
        game_info: &GameInfo,
        teams: &[Team<P>],
        ranks: &[u32],
    ) -> Result<f64> {
        let graph = self.run_graph(game_info, teams, ranks)?;
        let probability = graph.probability_of_ranking();
        debug!(probability, "Ranking probability");
        Ok(probability)
    }
}

/// Players × (teams − 1) matrix: column i holds the weights of team i and the
/// negated weights of team i + 1.
fn player_team_assignment_matrix<P: PlayerKey>(teams: &[Team<P>]) -> DMatrix<f64> {
    let total_players = teams.iter().map(Team::player_count).sum();
    let mut assignments = DMatrix::zeros(total_players, teams.len() - 1);

    let mut row = 0;
    for (team_index, team) in teams.iter().enumerate() {
        for (_, member) in team.iter() {
            if team_index + 1 < teams.len() {
                assignments[(row, team_index)] = member.weight();
            }
            if team_index > 0 {
                assignments[(row, team_index - 1)] = -member.weight();
            }
            row += 1;
        }
    }
    assignments
}

impl<P: PlayerKey> SkillCalculator<P> for FactorGraphCalculator {
    fn calc_new_ratings(
        &self,
        game_info: &GameInfo,
        teams: &[Team<P>],
        ranks: &[u32],
    ) -> Result<PlayerRatings<P>> {
        let graph = self.run_graph(game_info, teams, ranks)?;
        Ok(graph.updated_ratings())
    }

    fn calc_match_quality(&self, game_info: &GameInfo, teams: &[Team<P>]) -> Result<f64> {
        Self::validate(game_info, teams)?;

        let ratings: Vec<_> = teams
            .iter()
            .flat_map(|team| team.ratings().map(|(_, rating)| *rating))
            .collect();
        let means = DVector::from_iterator(ratings.len(), ratings.iter().map(|r| r.mean));
        let variances =
            DVector::from_iterator(ratings.len(), ratings.iter().map(|r| r.variance()));

        let skills = DMatrix::from_diagonal(&variances);
        let assignments = player_team_assignment_matrix(teams);
        let assignments_transpose = assignments.transpose();
        let beta_squared = game_info.beta * game_info.beta;

        let a_t_a = &assignments_transpose * &assignments * beta_squared;
        let a_t_s_a = &assignments_transpose * &skills * &assignments;
        let middle = &a_t_a + &a_t_s_a;
        let middle_inverse = middle
            .clone()
            .try_inverse()
            .ok_or(RatingError::SingularMatrix)?;

        let team_differences = &assignments_transpose * &means;
        let exp_part = -0.5 * team_differences.dot(&(&middle_inverse * &team_differences));
        let sqrt_part = a_t_a.determinant() / middle.determinant();

        Ok(exp_part.exp() * sqrt_part.sqrt())
    }

    fn supported_teams(&self) -> CountRange {
        TEAM_RANGE
    }

    fn supported_players_per_team(&self) -> CountRange {
        PLAYER_RANGE
    }

    fn name(&self) -> &'static str {
        "factor_graph"
    }
}
