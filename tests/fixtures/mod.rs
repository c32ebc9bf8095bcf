//! Test fixtures for integration and property tests
#![allow(dead_code)]

use trueskill_engine::config::GameInfo;
use trueskill_engine::types::{Rating, Team};

/// A match ready to hand to a calculator
pub struct MatchScenario {
    pub teams: Vec<Team<String>>,
    pub ranks: Vec<u32>,
}

impl MatchScenario {
    /// One single-player team per rank, every player at the default rating
    pub fn free_for_all(game_info: &GameInfo, ranks: &[u32]) -> Self {
        let teams = (0..ranks.len())
            .map(|i| Team::single(player_name(i, 0), game_info.default_rating()))
            .collect();
        Self {
            teams,
            ranks: ranks.to_vec(),
        }
    }

    /// Teams of the given sizes, every player at the default rating
    pub fn teams_of(game_info: &GameInfo, sizes: &[usize], ranks: &[u32]) -> Self {
        let teams = sizes
            .iter()
            .enumerate()
            .map(|(team, &size)| {
                (0..size).fold(Team::new(), |roster, seat| {
                    roster.with_player(player_name(team, seat), game_info.default_rating())
                })
            })
            .collect();
        Self {
            teams,
            ranks: ranks.to_vec(),
        }
    }

    pub fn player_count(&self) -> usize {
        self.teams.iter().map(Team::player_count).sum()
    }
}

pub fn player_name(team: usize, seat: usize) -> String {
    format!("team{}_player{}", team, seat)
}

/// Two single-player teams with explicit ratings
pub fn one_on_one(first: Rating, second: Rating) -> Vec<Team<String>> {
    vec![
        Team::single(player_name(0, 0), first),
        Team::single(player_name(1, 0), second),
    ]
}
