//! Association of teams with their finishing ranks
//!
//! Solvers work on a private, rank-ordered list of borrows so the caller's
//! slices are never reordered.

use crate::error::{RatingError, Result};
use crate::numerics::CountRange;
use crate::types::{PlayerKey, Team};

/// A team paired with the rank it finished at (lower is better)
#[derive(Debug)]
pub struct RankedTeam<'a, P: PlayerKey> {
    pub team: &'a Team<P>,
    pub rank: u32,
}

/// Pair teams with ranks and stably sort ascending by rank.
///
/// Tied teams keep their input order.
pub fn sort_by_rank<'a, P: PlayerKey>(
    teams: &'a [Team<P>],
    ranks: &[u32],
) -> Result<Vec<RankedTeam<'a, P>>> {
    if teams.len() != ranks.len() {
        return Err(RatingError::dimension_mismatch(
            "ranks",
            format!("{} teams", teams.len()),
            format!("{} ranks", ranks.len()),
        ));
    }

    let mut ranked: Vec<RankedTeam<'a, P>> = teams
        .iter()
        .zip(ranks)
        .map(|(team, &rank)| RankedTeam { team, rank })
        .collect();
    ranked.sort_by_key(|entry| entry.rank);
    Ok(ranked)
}

/// Check the team count and every team's player count against a solver's limits
pub fn validate_team_layout<P: PlayerKey>(
    teams: &[Team<P>],
    teams_allowed: CountRange,
    players_allowed: CountRange,
) -> Result<()> {
    if !teams_allowed.contains(teams.len()) {
        return Err(RatingError::InvalidCardinality {
            what: "team",
            actual: teams.len(),
            expected: teams_allowed.to_string(),
        });
    }

    for team in teams {
        if !players_allowed.contains(team.player_count()) {
            return Err(RatingError::InvalidCardinality {
                what: "player per team",
                actual: team.player_count(),
                expected: players_allowed.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rating;

    fn teams() -> Vec<Team<&'static str>> {
        ["a", "b", "c", "d"]
            .into_iter()
            .map(|id| Team::single(id, Rating::new(25.0, 8.0)))
            .collect()
    }

    fn first_player(entry: &RankedTeam<'_, &'static str>) -> &'static str {
        *entry.team.players().next().unwrap()
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let teams = teams();
        let ranked = sort_by_rank(&teams, &[3, 1, 3, 1]).unwrap();

        let order: Vec<_> = ranked.iter().map(first_player).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
        let ranks: Vec<_> = ranked.iter().map(|entry| entry.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3, 3]);

        // The caller's slice is untouched
        assert_eq!(*teams[0].players().next().unwrap(), "a");
    }

    #[test]
    fn test_non_contiguous_ranks() {
        let teams = teams();
        let ranked = sort_by_rank(&teams, &[40, 10, 30, 20]).unwrap();
        let order: Vec<_> = ranked.iter().map(first_player).collect();
        assert_eq!(order, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_rank_length_mismatch() {
        let teams = teams();
        assert!(matches!(
            sort_by_rank(&teams, &[1, 2]),
            Err(RatingError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_team_layout() {
        let teams = teams();
        assert!(validate_team_layout(&teams, CountRange::at_least(2), CountRange::exactly(1)).is_ok());
        assert!(matches!(
            validate_team_layout(&teams, CountRange::exactly(2), CountRange::exactly(1)),
            Err(RatingError::InvalidCardinality { what: "team", actual: 4, .. })
        ));

        let empty: Vec<Team<&str>> = vec![Team::new(), Team::single("x", Rating::new(1.0, 1.0))];
        assert!(matches!(
            validate_team_layout(&empty, CountRange::exactly(2), CountRange::at_least(1)),
            Err(RatingError::InvalidCardinality { what: "player per team", actual: 0, .. })
        ));
    }
}
