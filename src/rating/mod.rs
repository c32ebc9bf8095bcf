//! TrueSkill rating calculators
//!
//! Two closed-form solvers cover one-on-one and team-versus-team matches; the
//! factor graph solver handles everything else, including ties between any
//! number of teams and partial play.

pub mod calculator;
pub mod draw_margin;
pub mod factor_graph;
pub mod ranking;
pub mod truncation;
pub mod two_player;
pub mod two_team;

// Re-export commonly used types
pub use calculator::{select_calculator, RatingCalculationResult, SkillCalculator};
pub use draw_margin::draw_margin_from_draw_probability;
pub use factor_graph::FactorGraphCalculator;
pub use ranking::{sort_by_rank, RankedTeam};
pub use two_player::TwoPlayerCalculator;
pub use two_team::TwoTeamCalculator;
