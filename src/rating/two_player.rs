//! Closed-form update for exactly two players
//!
//! With one player per side the posterior of the single truncation factor can
//! be written down directly, so no factor graph is needed.

use crate::config::GameInfo;
use crate::error::{RatingError, Result};
use crate::numerics::CountRange;
use crate::rating::calculator::SkillCalculator;
use crate::rating::ranking::{sort_by_rank, validate_team_layout};
use crate::rating::truncation::{
    v_exceeds_margin_scaled, v_within_margin_scaled, w_exceeds_margin_scaled,
    w_within_margin_scaled,
};
use crate::types::{PlayerKey, PlayerRatings, Rating, Team};
use tracing::{debug, warn};

const TEAM_RANGE: CountRange = CountRange::exactly(2);
const PLAYER_RANGE: CountRange = CountRange::exactly(1);

/// How one side of a two-sided comparison finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    Win,
    Draw,
    Lose,
}

impl PairOutcome {
    pub(crate) fn rank_multiplier(self) -> f64 {
        match self {
            PairOutcome::Win | PairOutcome::Draw => 1.0,
            PairOutcome::Lose => -1.0,
        }
    }

    /// Correction factors (v, w) for a mean difference measured from the winner's side
    pub(crate) fn corrections(self, mean_delta: f64, draw_margin: f64, c: f64) -> (f64, f64) {
        match self {
            PairOutcome::Draw => (
                v_within_margin_scaled(mean_delta, draw_margin, c),
                w_within_margin_scaled(mean_delta, draw_margin, c),
            ),
            PairOutcome::Win | PairOutcome::Lose => (
                v_exceeds_margin_scaled(mean_delta, draw_margin, c),
                w_exceeds_margin_scaled(mean_delta, draw_margin, c),
            ),
        }
    }
}

/// Calculator for a one-on-one match
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoPlayerCalculator;

impl TwoPlayerCalculator {
    fn single_player<P: PlayerKey>(team: &Team<P>) -> Result<(&P, Rating)> {
        team.ratings()
            .next()
            .map(|(player, rating)| (player, *rating))
            .ok_or(RatingError::InvalidCardinality {
                what: "player per team",
                actual: 0,
                expected: PLAYER_RANGE.to_string(),
            })
    }
}

/// New rating for `self_rating` after facing `opponent` with the given outcome
pub fn calculate_new_rating(
    game_info: &GameInfo,
    self_rating: &Rating,
    opponent: &Rating,
    outcome: PairOutcome,
) -> Rating {
    let draw_margin = game_info.draw_margin();
    let beta_squared = game_info.beta * game_info.beta;
    let tau_squared = game_info.dynamics_factor * game_info.dynamics_factor;

    let c = (self_rating.variance() + opponent.variance() + 2.0 * beta_squared).sqrt();

    let (winning_mean, losing_mean) = match outcome {
        PairOutcome::Lose => (opponent.mean, self_rating.mean),
        PairOutcome::Win | PairOutcome::Draw => (self_rating.mean, opponent.mean),
    };
    let (v, w) = outcome.corrections(winning_mean - losing_mean, draw_margin, c);

    let variance_with_dynamics = self_rating.variance() + tau_squared;
    let mean_multiplier = variance_with_dynamics / c;
    let stddev_multiplier = variance_with_dynamics / (c * c);

    let new_mean = self_rating.mean + outcome.rank_multiplier() * mean_multiplier * v;
    let new_stddev = (variance_with_dynamics * (1.0 - w * stddev_multiplier)).sqrt();

    Rating::new(new_mean, new_stddev)
}

impl<P: PlayerKey> SkillCalculator<P> for TwoPlayerCalculator {
    fn calc_new_ratings(
        &self,
        game_info: &GameInfo,
        teams: &[Team<P>],
        ranks: &[u32],
    ) -> Result<PlayerRatings<P>> {
        validate_team_layout(teams, TEAM_RANGE, PLAYER_RANGE)?;
        game_info.validate()?;
        if teams.iter().any(Team::has_partial_play) {
            warn!(calculator = "two_player", "Closed form ignores partial play");
        }
        let ranked = sort_by_rank(teams, ranks)?;

        let (winner, winner_rating) = Self::single_player(ranked[0].team)?;
        let (loser, loser_rating) = Self::single_player(ranked[1].team)?;
        let was_draw = ranked[0].rank == ranked[1].rank;

        debug!(?winner, ?loser, was_draw, "Two player update");

        let (winner_outcome, loser_outcome) = if was_draw {
            (PairOutcome::Draw, PairOutcome::Draw)
        } else {
            (PairOutcome::Win, PairOutcome::Lose)
        };

        let mut new_ratings = PlayerRatings::new();
        new_ratings.insert(
            winner.clone(),
            calculate_new_rating(game_info, &winner_rating, &loser_rating, winner_outcome),
        );
        new_ratings.insert(
            loser.clone(),
            calculate_new_rating(game_info, &loser_rating, &winner_rating, loser_outcome),
        );
        Ok(new_ratings)
    }

    fn calc_match_quality(&self, game_info: &GameInfo, teams: &[Team<P>]) -> Result<f64> {
        validate_team_layout(teams, TEAM_RANGE, PLAYER_RANGE)?;
        game_info.validate()?;

        let (_, player1) = Self::single_player(&teams[0])?;
        let (_, player2) = Self::single_player(&teams[1])?;

        let beta_squared = game_info.beta * game_info.beta;
        let denominator = 2.0 * beta_squared + player1.variance() + player2.variance();
        let mean_delta = player1.mean - player2.mean;

        let sqrt_part = (2.0 * beta_squared / denominator).sqrt();
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
        "two_player"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TOLERANCE: f64 = 1e-6;

    fn one_on_one(first: Rating, second: Rating) -> Vec<Team<&'static str>> {
        vec![Team::single("p1", first), Team::single("p2", second)]
    }

    #[test]
    fn test_two_player_not_drawn() {
        let game_info = GameInfo::default();
        let teams = one_on_one(game_info.default_rating(), game_info.default_rating());

        let new_ratings = TwoPlayerCalculator
            .calc_new_ratings(&game_info, &teams, &[1, 2])
            .unwrap();

        assert_abs_diff_eq!(new_ratings["p1"].mean, 29.396015208382977, epsilon = TOLERANCE);
        assert_abs_diff_eq!(new_ratings["p1"].stddev, 7.171374368455832, epsilon = TOLERANCE);
        assert_abs_diff_eq!(new_ratings["p2"].mean, 20.603984791617023, epsilon = TOLERANCE);
        assert_abs_diff_eq!(new_ratings["p2"].stddev, 7.171374368455832, epsilon = TOLERANCE);

        let quality = TwoPlayerCalculator.calc_match_quality(&game_info, &teams).unwrap();
        assert_abs_diff_eq!(quality, 0.4472135954999579, epsilon = 1e-12);
    }

    #[test]
    fn test_two_player_drawn() {
        let game_info = GameInfo::default();
        let teams = one_on_one(game_info.default_rating(), game_info.default_rating());

        let new_ratings = TwoPlayerCalculator
            .calc_new_ratings(&game_info, &teams, &[1, 1])
            .unwrap();

        for player in ["p1", "p2"] {
            assert_abs_diff_eq!(new_ratings[player].mean, 25.0, epsilon = 1e-9);
            assert_abs_diff_eq!(new_ratings[player].stddev, 6.457343957590725, epsilon = TOLERANCE);
            assert!(new_ratings[player].stddev < game_info.initial_stddev);
        }
    }

    #[test]
    fn test_ranks_decide_winner_not_position() {
        let game_info = GameInfo::default();
        let teams = one_on_one(game_info.default_rating(), game_info.default_rating());

        let new_ratings = TwoPlayerCalculator
            .calc_new_ratings(&game_info, &teams, &[2, 1])
            .unwrap();

        assert!(new_ratings["p2"].mean > 25.0);
        assert!(new_ratings["p1"].mean < 25.0);
    }

    #[test]
    fn test_upset_moves_more_than_expected_win() {
        let game_info = GameInfo::default();
        let strong = Rating::new(35.0, 3.0);
        let weak = Rating::new(15.0, 3.0);

        let expected = TwoPlayerCalculator
            .calc_new_ratings(&game_info, &one_on_one(strong, weak), &[1, 2])
            .unwrap();
        let upset = TwoPlayerCalculator
            .calc_new_ratings(&game_info, &one_on_one(strong, weak), &[2, 1])
            .unwrap();

        let expected_gain = expected["p1"].mean - strong.mean;
        let upset_gain = upset["p2"].mean - weak.mean;
        assert!(expected_gain > 0.0);
        assert!(upset_gain > expected_gain);
    }

    #[test]
    fn test_invalid_cardinality() {
        let game_info = GameInfo::default();
        let rating = game_info.default_rating();

        let three = vec![
            Team::single(1, rating),
            Team::single(2, rating),
            Team::single(3, rating),
        ];
        assert!(matches!(
            TwoPlayerCalculator.calc_new_ratings(&game_info, &three, &[1, 2, 3]),
            Err(RatingError::InvalidCardinality { what: "team", .. })
        ));

        let crowded = vec![
            Team::new().with_player(1, rating).with_player(2, rating),
            Team::single(3, rating),
        ];
        assert!(matches!(
            TwoPlayerCalculator.calc_match_quality(&game_info, &crowded),
            Err(RatingError::InvalidCardinality { .. })
        ));

        let teams = vec![Team::single(1, rating), Team::single(2, rating)];
        assert!(matches!(
            TwoPlayerCalculator.calc_new_ratings(&game_info, &teams, &[1]),
            Err(RatingError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_game_info() {
        let game_info = GameInfo::default();
        let teams = one_on_one(game_info.default_rating(), game_info.default_rating());

        let certain_draw = GameInfo {
            draw_probability: 1.0,
            ..game_info
        };
        assert!(matches!(
            TwoPlayerCalculator.calc_new_ratings(&certain_draw, &teams, &[1, 2]),
            Err(RatingError::InvalidGameInfo { .. })
        ));

        let no_noise = GameInfo {
            beta: 0.0,
            ..game_info
        };
        assert!(matches!(
            TwoPlayerCalculator.calc_match_quality(&no_noise, &teams),
            Err(RatingError::InvalidGameInfo { .. })
        ));
    }
}
