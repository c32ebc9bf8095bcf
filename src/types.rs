//! Common types shared by every rating calculator

use crate::error::{RatingError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Multiplier on the standard deviation used for the conservative skill estimate
pub const CONSERVATIVE_STDDEV_MULTIPLIER: f64 = 3.0;

/// Partial play weights below this are raised to it when building team sums
pub const MIN_PARTIAL_PLAY: f64 = 0.0001;

/// Opaque, caller-supplied player identity
pub trait PlayerKey: Clone + Eq + Hash + fmt::Debug {}

impl<T: Clone + Eq + Hash + fmt::Debug> PlayerKey for T {}

/// New ratings keyed by player, in finishing order then team order
pub type PlayerRatings<P> = IndexMap<P, Rating>;

/// A player's current skill belief
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub mean: f64,
    pub stddev: f64,
}

impl Rating {
    pub fn new(mean: f64, stddev: f64) -> Self {
        Self { mean, stddev }
    }

    pub fn variance(&self) -> f64 {
        self.stddev * self.stddev
    }

    /// Skill the player is very likely to be above (mean minus three deviations)
    pub fn conservative_rating(&self) -> f64 {
        self.mean - CONSERVATIVE_STDDEV_MULTIPLIER * self.stddev
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{μ:{:.6} σ:{:.6}}}", self.mean, self.stddev)
    }
}

/// A team member's rating together with the share of the match they played
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub rating: Rating,
    pub partial_play: f64,
}

impl TeamMember {
    /// Participation weight as used in team sums (clamped away from zero)
    pub fn weight(&self) -> f64 {
        self.partial_play.max(MIN_PARTIAL_PLAY)
    }
}

/// Ordered mapping from player to rating for one side of a match
#[derive(Debug, Clone, PartialEq)]
pub struct Team<P: PlayerKey> {
    members: IndexMap<P, TeamMember>,
}

impl<P: PlayerKey> Default for Team<P> {
    fn default() -> Self {
        Self {
            members: IndexMap::new(),
        }
    }
}

impl<P: PlayerKey> Team<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Team with a single full-time player
    pub fn single(player: P, rating: Rating) -> Self {
        Self::new().with_player(player, rating)
    }

    /// Add a player who took part in the whole match
    pub fn with_player(self, player: P, rating: Rating) -> Self {
        self.with_partial_player(player, rating, 1.0)
    }

    /// Add a player who took part in `partial_play` (0 to 1) of the match
    pub fn with_partial_player(mut self, player: P, rating: Rating, partial_play: f64) -> Self {
        self.add_player(player, rating, partial_play);
        self
    }

    pub fn add_player(&mut self, player: P, rating: Rating, partial_play: f64) {
        self.members.insert(
            player,
            TeamMember {
                rating,
                partial_play,
            },
        );
    }

    pub fn player_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn players(&self) -> impl Iterator<Item = &P> {
        self.members.keys()
    }

    pub fn rating(&self, player: &P) -> Option<&Rating> {
        self.members.get(player).map(|member| &member.rating)
    }

    /// Participation weight as used by the factor graph (clamped away from zero)
    pub fn partial_play(&self, player: &P) -> Option<f64> {
        self.members.get(player).map(TeamMember::weight)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&P, &TeamMember)> {
        self.members.iter()
    }

    pub fn ratings(&self) -> impl Iterator<Item = (&P, &Rating)> {
        self.members.iter().map(|(player, member)| (player, &member.rating))
    }

    pub fn mean_sum(&self) -> f64 {
        self.members.values().map(|m| m.rating.mean).sum()
    }

    pub fn variance_sum(&self) -> f64 {
        self.members.values().map(|m| m.rating.variance()).sum()
    }

    /// Whether any member sat out part of the match
    pub fn has_partial_play(&self) -> bool {
        self.members.values().any(|member| member.partial_play != 1.0)
    }

    /// Reject partial play weights outside [0, 1]
    pub fn validate_partial_play(&self) -> Result<()> {
        for member in self.members.values() {
            let weight = member.partial_play;
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(RatingError::InvalidPartialPlay { weight });
            }
        }
        Ok(())
    }
}
