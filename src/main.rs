//! Command-line front end for the TrueSkill engine
//!
//! Reads a match description from a TOML file, runs the requested calculation
//! and prints the result as JSON on stdout. Logs go to stderr.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use trueskill_engine::config::{GameInfo, RatingConfig, SolverSettings};
use trueskill_engine::rating::{
    select_calculator, FactorGraphCalculator, SkillCalculator, TwoPlayerCalculator,
    TwoTeamCalculator,
};
use trueskill_engine::{Rating, Team};

/// TrueSkill Calculator - Bayesian skill ratings for ranked matches
#[derive(Parser)]
#[command(
    name = "trueskill-calc",
    version,
    about = "Compute TrueSkill rating updates and match quality",
    long_about = "trueskill-calc reads a match (teams, players, ratings and ranks) from a TOML \
                 file and prints updated ratings, match quality or the draw margin as JSON."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to rating configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        default_value = "warn",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute new ratings from a finished match
    Rate {
        /// Match description (TOML)
        #[arg(value_name = "MATCH_FILE")]
        match_file: PathBuf,

        /// Calculator to use
        #[arg(long, value_enum, default_value_t = CalculatorChoice::Auto)]
        calculator: CalculatorChoice,

        /// Also report the probability of the observed ranking
        #[arg(long)]
        probability: bool,
    },
    /// Compute the quality (draw probability) of a prospective match
    Quality {
        /// Match description (TOML); ranks are ignored
        #[arg(value_name = "MATCH_FILE")]
        match_file: PathBuf,

        /// Calculator to use
        #[arg(long, value_enum, default_value_t = CalculatorChoice::Auto)]
        calculator: CalculatorChoice,
    },
    /// Convert a draw probability into the latent draw margin
    DrawMargin {
        /// Draw probability between equal players (defaults to the configured value)
        #[arg(long)]
        draw_probability: Option<f64>,

        /// Performance standard deviation (defaults to the configured value)
        #[arg(long)]
        beta: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CalculatorChoice {
    Auto,
    TwoPlayer,
    TwoTeam,
    FactorGraph,
}

/// A match as written in the input file
#[derive(Debug, Deserialize)]
struct MatchFile {
    game: Option<GameInfo>,
    teams: Vec<TeamEntry>,
}

#[derive(Debug, Deserialize)]
struct TeamEntry {
    rank: Option<u32>,
    players: Vec<PlayerEntry>,
}

#[derive(Debug, Deserialize)]
struct PlayerEntry {
    id: String,
    mean: Option<f64>,
    stddev: Option<f64>,
    #[serde(default = "full_participation")]
    partial_play: f64,
}

fn full_participation() -> f64 {
    1.0
}

impl MatchFile {
    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid match file")
    }

    fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read match file {}", path.display()))?;
        Self::parse(&contents)
    }

    /// Teams in file order, filling missing ratings from the game defaults
    fn teams(&self, game_info: &GameInfo) -> Vec<Team<String>> {
        let default_rating = game_info.default_rating();
        let teams = self
            .teams
            .iter()
            .map(|entry| {
                entry.players.iter().fold(Team::new(), |team, player| {
                    let rating = Rating::new(
                        player.mean.unwrap_or(default_rating.mean),
                        player.stddev.unwrap_or(default_rating.stddev),
                    );
                    team.with_partial_player(player.id.clone(), rating, player.partial_play)
                })
            })
            .collect();
        teams
    }

    /// Ranks in team order; every team needs one to rate the match
    fn ranks(&self) -> Result<Vec<u32>> {
        self.teams
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                entry
                    .rank
                    .ok_or_else(|| anyhow!("Team {} has no rank", index + 1))
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct PlayerOutput {
    mean: f64,
    stddev: f64,
    conservative_rating: f64,
}

impl From<&Rating> for PlayerOutput {
    fn from(rating: &Rating) -> Self {
        Self {
            mean: rating.mean,
            stddev: rating.stddev,
            conservative_rating: rating.conservative_rating(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RateOutput {
    calculator: &'static str,
    match_quality: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    ranking_probability: Option<f64>,
    ratings: indexmap::IndexMap<String, PlayerOutput>,
}

#[derive(Debug, Serialize)]
struct QualityOutput {
    calculator: &'static str,
    match_quality: f64,
}

#[derive(Debug, Serialize)]
struct DrawMarginOutput {
    draw_probability: f64,
    beta: f64,
    draw_margin: f64,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load configuration from the given file, or from the environment
fn load_config(args: &Args) -> Result<RatingConfig> {
    match &args.config {
        Some(config_path) => {
            info!("Loading configuration from: {}", config_path.display());
            RatingConfig::from_file(config_path)
        }
        None => RatingConfig::from_env(),
    }
}

fn build_calculator(
    choice: CalculatorChoice,
    teams: &[Team<String>],
    settings: SolverSettings,
) -> Box<dyn SkillCalculator<String>> {
    match choice {
        CalculatorChoice::Auto => select_calculator(teams, settings),
        CalculatorChoice::TwoPlayer => Box::new(TwoPlayerCalculator),
        CalculatorChoice::TwoTeam => Box::new(TwoTeamCalculator),
        CalculatorChoice::FactorGraph => Box::new(FactorGraphCalculator::new(settings)),
    }
}

/// Game parameters from the match file when present, else from configuration
fn resolve_game_info(config: &RatingConfig, match_file: &MatchFile) -> Result<GameInfo> {
    let game_info = match_file.game.unwrap_or(config.game);
    game_info.validate()?;
    Ok(game_info)
}

fn run_rate(
    config: &RatingConfig,
    match_path: &Path,
    choice: CalculatorChoice,
    probability: bool,
) -> Result<String> {
    let match_file = MatchFile::load(match_path)?;
    let game_info = resolve_game_info(config, &match_file)?;
    let teams = match_file.teams(&game_info);
    let ranks = match_file.ranks()?;

    let calculator = build_calculator(choice, &teams, config.solver);
    debug!(calculator = calculator.name(), teams = teams.len(), "Rating match");

    let result = calculator.rate_match(&game_info, &teams, &ranks)?;
    let ranking_probability = if probability {
        Some(
            FactorGraphCalculator::new(config.solver)
                .calc_ranking_probability(&game_info, &teams, &ranks)?,
        )
    } else {
        None
    };

    let output = RateOutput {
        calculator: calculator.name(),
        match_quality: result.match_quality,
        ranking_probability,
        ratings: result
            .new_ratings
            .iter()
            .map(|(player, rating)| (player.clone(), PlayerOutput::from(rating)))
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

fn run_quality(config: &RatingConfig, match_path: &Path, choice: CalculatorChoice) -> Result<String> {
    let match_file = MatchFile::load(match_path)?;
    let game_info = resolve_game_info(config, &match_file)?;
    let teams = match_file.teams(&game_info);

    let calculator = build_calculator(choice, &teams, config.solver);
    let output = QualityOutput {
        calculator: calculator.name(),
        match_quality: calculator.calc_match_quality(&game_info, &teams)?,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

fn run_draw_margin(
    config: &RatingConfig,
    draw_probability: Option<f64>,
    beta: Option<f64>,
) -> Result<String> {
    let game_info = GameInfo {
        draw_probability: draw_probability.unwrap_or(config.game.draw_probability),
        beta: beta.unwrap_or(config.game.beta),
        ..config.game
    };
    game_info.validate()?;

    let output = DrawMarginOutput {
        draw_probability: game_info.draw_probability,
        beta: game_info.beta,
        draw_margin: game_info.draw_margin(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    let output = match &args.command {
        Command::Rate {
            match_file,
            calculator,
            probability,
        } => run_rate(&config, match_file, *calculator, *probability),
        Command::Quality {
            match_file,
            calculator,
        } => run_quality(&config, match_file, *calculator),
        Command::DrawMargin {
            draw_probability,
            beta,
        } => run_draw_margin(&config, *draw_probability, *beta),
    }?;

    println!("{}", output);
    Ok(())
}
