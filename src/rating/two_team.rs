//! Closed-form update for two teams of any size
//!
//! A team's performance is the sum of its players' performances, so the one
//! truncation between the two team sums still has an exact posterior. Every
//! player on a team shares the team's correction, scaled by their own variance.

use crate::config::GameInfo;
use crate::error::Result;
use crate::numerics::CountRange;
use crate::rating::calculator::SkillCalculator;
use crate::rating::ranking::{sort_by_rank, validate_team_layout};
use crate::rating::two_player::PairOutcome;
use crate::types::{PlayerKey, PlayerRatings, Rating, Team};
use tracing::{debug, warn};

const TEAM_RANGE: CountRange = CountRange::exactly(2);
const PLAYER_RANGE: CountRange = CountRange::at_least(1);

/// Calculator for a match between exactly two teams
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoTeamCalculator;

fn update_player_ratings<P: PlayerKey>(
    game_info: &GameInfo,
    new_ratings: &mut PlayerRatings<P>,
    self_team: &Team<P>,
    other_team: &Team<P>,
    outcome: PairOutcome,
) {
    let draw_margin = game_info.draw_margin();
    let beta_squared = game_info.beta * game_info.beta;
    let tau_squared = game_info.dynamics_factor * game_info.dynamics_factor;

    let total_players = (self_team.player_count() + other_team.player_count()) as f64;
    let c = (self_team.variance_sum() + other_team.variance_sum() + total_players * beta_squared)
        .sqrt();

    let (winning_mean, losing_mean) = match outcome {
        PairOutcome::Lose => (other_team.mean_sum(), self_team.mean_sum()),
        PairOutcome::Win | PairOutcome::Draw => (self_team.mean_sum(), other_team.mean_sum()),
    };
    let (v, w) = outcome.corrections(winning_mean - losing_mean, draw_margin, c);
    let rank_multiplier = outcome.rank_multiplier();

    for (player, rating) in self_team.ratings() {
        let variance_with_dynamics = rating.variance() + tau_squared;
        let mean_multiplier = variance_with_dynamics / c;
        let stddev_multiplier = variance_with_dynamics / (c * c);

        let new_mean = rating.mean + rank_multiplier * mean_multiplier * v;
        let new_stddev = (variance_with_dynamics * (1.0 - w * stddev_multiplier)).sqrt();

        new_ratings.insert(player.clone(), Rating::new(new_mean, new_stddev));
    }
}

impl<P: PlayerKey> SkillCalculator<P> for TwoTeamCalculator {
    fn calc_new_ratings(
        &self,
        game_info: &GameInfo,
        teams: &[Team<P>],
        ranks: &[u32],
    ) -> Result<PlayerRatings<P>> {
        validate_team_layout(teams, TEAM_RANGE, PLAYER_RANGE)?;
        game_info.validate()?;
        if teams.iter().any(Team::has_partial_play) {
            warn!(calculator = "two_team", "Closed form ignores partial play");
        }
        let ranked = sort_by_rank(teams, ranks)?;

        let winners = ranked[0].team;
        let losers = ranked[1].team;
        let was_draw = ranked[0].rank == ranked[1].rank;

        debug!(
            winners = winners.player_count(),
            losers = losers.player_count(),
            was_draw,
            "Two team update"
        );

        let (winner_outcome, loser_outcome) = if was_draw {
            (PairOutcome::Draw, PairOutcome::Draw)
        } else {
            (PairOutcome::Win, PairOutcome::Lose)
        };

        let mut new_ratings = PlayerRatings::new();
        update_player_ratings(game_info, &mut new_ratings, winners, losers, winner_outcome);
        update_player_ratings(game_info, &mut new_ratings, losers, winners, loser_outcome);
        Ok(new_ratings)
    }

    fn calc_match_quality(&self, game_info: &GameInfo, teams: &[Team<P>]) -> Result<f64> {
        validate_team_layout(teams, TEAM_RANGE, PLAYER_RANGE)?;
        game_info.validate()?;

        let team1 = &teams[0];
        let team2 = &teams[1];

        let total_players = (team1.player_count() + team2.player_count()) as f64;
        let beta_squared = game_info.beta * game_info.beta;
        let denominator =
            total_players * beta_squared + team1.variance_sum() + team2.variance_sum();
        let mean_delta = team1.mean_sum() - team2.mean_sum();

        let sqrt_part = (total_players * beta_squared / denominator).sqrt();
        let exp_part = (-(mean_delta * mean_delta) / (2.0 * denominator)).exp();

        Ok(sqrt_part * exp_part)
    }

    fn supported_teams(&self) -> CountRange {
        TEAM_RANGE
    }

    fn supported_players_per_team(&self) -> CountRange {
        PLAYER_RANGE
    }

    fn name(&self) -> &'static str {
        "two_team"
    }
}
