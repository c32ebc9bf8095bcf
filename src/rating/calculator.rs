//! Rating calculator trait and calculator selection
//!
//! Every solver implements the same two operations: new ratings from an
//! outcome, and the quality (draw probability) of a matchup.

use crate::config::{GameInfo, SolverSettings};
use crate::error::Result;
use crate::numerics::CountRange;
use crate::rating::factor_graph::FactorGraphCalculator;
use crate::rating::two_player::TwoPlayerCalculator;
use crate::rating::two_team::TwoTeamCalculator;
use crate::types::{PlayerKey, PlayerRatings, Team};
use serde::Serialize;
use tracing::debug;

/// Ratings after a match together with the quality of the matchup before it
#[derive(Debug, Clone, Serialize)]
pub struct RatingCalculationResult<P: PlayerKey + Serialize> {
    pub new_ratings: PlayerRatings<P>,
    /// Quality of the match (0.0 to 1.0, higher is better)
    pub match_quality: f64,
}

/// Trait for calculating rating changes after games
pub trait SkillCalculator<P: PlayerKey>: Send + Sync {
    /// Calculate new ratings for every player from the prior ratings and ranks.
    ///
    /// `ranks` runs parallel to `teams`; lower is better and equal ranks are ties.
    fn calc_new_ratings(
        &self,
        game_info: &GameInfo,
        teams: &[Team<P>],
        ranks: &[u32],
    ) -> Result<PlayerRatings<P>>;

    /// Probability that this matchup ends in a draw (0.0 to 1.0, higher is fairer)
    fn calc_match_quality(&self, game_info: &GameInfo, teams: &[Team<P>]) -> Result<f64>;

    /// Team counts this calculator accepts
    fn supported_teams(&self) -> CountRange;

    /// Players per team this calculator accepts
    fn supported_players_per_team(&self) -> CountRange;

    fn name(&self) -> &'static str;

    fn is_supported(&self, teams: &[Team<P>]) -> bool {
        self.supported_teams().contains(teams.len())
            && teams
                .iter()
                .all(|team| self.supported_players_per_team().contains(team.player_count()))
    }

    /// Match quality and new ratings in one call
    fn rate_match(
        &self,
        game_info: &GameInfo,
        teams: &[Team<P>],
        ranks: &[u32],
    ) -> Result<RatingCalculationResult<P>>
    where
        P: Serialize,
    {
        let match_quality = self.calc_match_quality(game_info, teams)?;
        let new_ratings = self.calc_new_ratings(game_info, teams, ranks)?;
        Ok(RatingCalculationResult {
            new_ratings,
            match_quality,
        })
    }
}

/// Pick the cheapest exact calculator that supports this team layout.
///
/// The closed forms assume full participation, so any partial play goes to the
/// factor graph.
pub fn select_calculator<P: PlayerKey + 'static>(
    teams: &[Team<P>],
    settings: SolverSettings,
) -> Box<dyn SkillCalculator<P>> {
    if teams.iter().any(Team::has_partial_play) {
        debug!(calculator = "factor_graph", "Selected calculator for partial play");
        return Box::new(FactorGraphCalculator::new(settings));
    }

    let two_player = TwoPlayerCalculator;
    if SkillCalculator::<P>::is_supported(&two_player, teams) {
        debug!(calculator = "two_player", "Selected calculator");
        return Box::new(two_player);
    }

    let two_team = TwoTeamCalculator;
    if SkillCalculator::<P>::is_supported(&two_team, teams) {
        debug!(calculator = "two_team", "Selected calculator");
        return Box::new(two_team);
    }

    debug!(calculator = "factor_graph", "Selected calculator");
    Box::new(FactorGraphCalculator::new(settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rating;

    fn team(ids: &[u32]) -> Team<u32> {
        ids.iter().fold(Team::new(), |team, id| {
            team.with_player(*id, Rating::new(25.0, 25.0 / 3.0))
        })
    }

    #[test]
    fn test_select_calculator() {
        let settings = SolverSettings::default();

        let one_on_one = vec![team(&[1]), team(&[2])];
        assert_eq!(select_calculator(&one_on_one, settings).name(), "two_player");

        let two_on_two = vec![team(&[1, 2]), team(&[3, 4])];
        assert_eq!(select_calculator(&two_on_two, settings).name(), "two_team");

        let free_for_all = vec![team(&[1]), team(&[2]), team(&[3])];
        assert_eq!(select_calculator(&free_for_all, settings).name(), "factor_graph");
    }

    #[test]
    fn test_partial_play_selects_factor_graph() {
        let game_info = GameInfo::default();
        let rating = game_info.default_rating();
        let teams = vec![
            Team::new()
                .with_player(1, rating)
                .with_partial_player(2, rating, 0.1),
            team(&[3, 4]),
        ];

        let calculator = select_calculator(&teams, SolverSettings::default());
        assert_eq!(calculator.name(), "factor_graph");

        let new_ratings = calculator.calc_new_ratings(&game_info, &teams, &[1, 2]).unwrap();
        assert!(new_ratings[&1].mean > new_ratings[&2].mean + 5.0);
        assert!(new_ratings[&2].mean > game_info.initial_mean);

        let one_on_one = vec![Team::new().with_partial_player(1, rating, 0.5), team(&[2])];
        assert_eq!(
            select_calculator(&one_on_one, SolverSettings::default()).name(),
            "factor_graph"
        );
    }

    #[test]
    fn test_rate_match() {
        let teams = vec![team(&[1]), team(&[2])];
        let result = TwoPlayerCalculator
            .rate_match(&GameInfo::default(), &teams, &[1, 2])
            .unwrap();

        assert_eq!(result.new_ratings.len(), 2);
        assert!((result.match_quality - 0.447).abs() < 0.001);
        assert!(result.new_ratings[&1].mean > result.new_ratings[&2].mean);
    }
}
