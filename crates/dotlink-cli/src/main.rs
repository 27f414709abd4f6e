//! dotlink: play connect-the-dots rounds from the command line.
//!
//! Each round scatters points (or loads a fixed layout), then draws
//! segments from a recorded gesture script or with the automatic player,
//! and reports the score. Useful for:
//!
//! - Replaying a recorded drag sequence against a known layout
//! - Checking how configuration changes affect generated layouts
//! - Rendering a round to SVG
//! - Keeping a best score and round history per player
//!
//! # Usage
//!
//! ```text
//! cargo run --bin dotlink -- [OPTIONS]
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod autoplay;
mod history;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use dotlink_engine::{
    Bounds, Difficulty, EngineError, EventSink, Game, GameConfig, Gesture, GestureOutcome,
    MemoryScoreStore, Point, RoundOutcome, RoundSnapshot, ScoreStore, SystemClock, WinRule,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::history::{History, HistoryError, RoundRecorder};

/// Connect-the-dots rounds from the command line.
///
/// Draws with the automatic player unless a gesture script is given.
#[derive(Parser)]
#[command(name = "dotlink", version)]
struct Cli {
    /// Gesture script to replay: a JSON array of
    /// `{"type": "pointer_down" | "pointer_move" | "pointer_up", "at": {"x": .., "y": ..}}`.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Fixed original points as a JSON array of `{"x": .., "y": ..}`,
    /// used instead of generating a layout.
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Number of original points per round.
    #[arg(long, default_value_t = GameConfig::DEFAULT_POINT_COUNT)]
    points: usize,

    /// Drawn node radius.
    #[arg(long, default_value_t = GameConfig::DEFAULT_NODE_RADIUS)]
    node_radius: f64,

    /// Snap radius (default: 1.5x node radius).
    #[arg(long)]
    snap_radius: Option<f64>,

    /// Minimum distance between generated points (default: 2x node radius).
    #[arg(long)]
    min_separation: Option<f64>,

    /// Score multiplier.
    #[arg(long, value_enum, default_value_t = Level::Medium)]
    difficulty: Level,

    /// Which nodes must be connected to win.
    #[arg(long, value_enum, default_value_t = Rule::Originals)]
    win_rule: Rule,

    /// Play area width.
    #[arg(long, default_value_t = GameConfig::DEFAULT_BOUNDS.width)]
    width: f64,

    /// Play area height.
    #[arg(long, default_value_t = GameConfig::DEFAULT_BOUNDS.height)]
    height: f64,

    /// Seed for point generation (random when omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// Number of rounds to play.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    rounds: usize,

    /// Write the last round to an SVG file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the action log of completed rounds to a JSON file.
    #[arg(long)]
    log: Option<PathBuf>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Full game config as a JSON string.
    ///
    /// When provided, all other game parameter flags are ignored.
    /// The JSON must be a valid `GameConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// History file holding best scores and completed rounds per player.
    #[arg(long)]
    history: Option<PathBuf>,

    /// Player token (default: the last player in the history file, or a
    /// new random token).
    #[arg(long, requires = "history")]
    player: Option<String>,
}

/// Difficulty selection.
#[derive(Clone, Copy, ValueEnum)]
enum Level {
    /// Score x0.8.
    Easy,
    /// Score x1.0.
    Medium,
    /// Score x1.2.
    Hard,
}

/// Win rule selection.
#[derive(Clone, Copy, ValueEnum)]
enum Rule {
    /// Original points only.
    Originals,
    /// Original points and junctions.
    All,
}

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Error parsing --config-json: {0}")]
    Config(serde_json::Error),

    #[error("Error reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Error writing {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Export(#[from] dotlink_export::ExportError),
}

/// Build a [`GameConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<GameConfig, CliError> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(CliError::Config);
    }

    Ok(GameConfig {
        point_count: cli.points,
        node_radius: cli.node_radius,
        snap_radius: cli.snap_radius,
        min_separation: cli.min_separation,
        difficulty: match cli.difficulty {
            Level::Easy => Difficulty::Easy,
            Level::Medium => Difficulty::Medium,
            Level::Hard => Difficulty::Hard,
        },
        win_rule: match cli.win_rule {
            Rule::Originals => WinRule::OriginalNodes,
            Rule::All => WinRule::AllNodes,
        },
        bounds: Bounds::new(cli.width, cli.height),
        ..GameConfig::default()
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    std::fs::write(path, contents).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    eprintln!("Written {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Log to stderr, `info` and up unless `RUST_LOG` says otherwise.
fn init_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Everything a run needs besides the collaborators.
struct RunSpec {
    config: GameConfig,
    seed: u64,
    layout: Option<Vec<Point>>,
    script: Option<Vec<Gesture>>,
}

#[derive(Serialize)]
struct Report {
    seed: u64,
    player: Option<String>,
    rounds: Vec<RoundReport>,
}

#[derive(Serialize)]
struct RoundReport {
    round: usize,
    components: usize,
    outcome: Option<RoundOutcome>,
    snapshot: RoundSnapshot,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = config_from_cli(cli)?;
    config.validate()?;

    let seed = cli.seed.unwrap_or_else(rand::random);
    let spec = RunSpec {
        config,
        seed,
        layout: cli.layout.as_deref().map(read_json::<Vec<Point>>).transpose()?,
        script: cli.script.as_deref().map(read_json::<Vec<Gesture>>).transpose()?,
    };

    eprintln!("Seed: {seed}");
    eprintln!("Config: {:#?}", spec.config);

    let (report, game_log) = match &cli.history {
        Some(path) => {
            let player = history::resolve_player(
                path,
                cli.player.as_deref(),
                &mut rand::thread_rng(),
            )?;
            let history = History::new(path, player);
            eprintln!("History: {}", history.path().display());
            eprintln!("Player: {}", history.player());
            let (mut report, log) = play(
                cli,
                &spec,
                history.clone(),
                RoundRecorder::new(Some(history.clone())),
            )?;
            report.player = Some(history.player().to_owned());
            (report, log)
        }
        None => play(
            cli,
            &spec,
            MemoryScoreStore::default(),
            RoundRecorder::new(None),
        )?,
    };

    if cli.json {
        let json =
            serde_json::to_string_pretty(&report).map_err(dotlink_export::ExportError::from)?;
        println!("{json}");
    } else {
        print_report(&report);
    }

    if let Some(ref log_path) = cli.log {
        write_file(log_path, &game_log)?;
    }

    Ok(())
}

/// Play every round, writing the SVG of the last one. Returns the report
/// and the encoded action log.
fn play<S: ScoreStore>(
    cli: &Cli,
    spec: &RunSpec,
    scores: S,
    recorder: RoundRecorder,
) -> Result<(Report, String), CliError> {
    let mut rng = ChaCha8Rng::seed_from_u64(spec.seed);
    let mut game = Game::new(spec.config.clone(), SystemClock, scores, recorder);
    let mut rounds = Vec::with_capacity(cli.rounds);

    for round in 1..=cli.rounds {
        match &spec.layout {
            Some(points) => game.start_round_with_points(points.iter().copied())?,
            None => game.start_round(&mut rng)?,
        };

        match &spec.script {
            Some(gestures) => replay(&mut game, gestures),
            None => auto_play(&mut game),
        }

        let Some(state) = game.round() else {
            return Err(EngineError::NoRound.into());
        };
        let components = state.engine().components().len();
        let outcome = state.outcome().cloned();
        let Some(snapshot) = game.snapshot() else {
            return Err(EngineError::NoRound.into());
        };
        rounds.push(RoundReport {
            round,
            components,
            outcome,
            snapshot,
        });
    }

    if let (Some(svg_path), Some(last)) = (&cli.svg, rounds.last()) {
        let title = format!("dotlink seed {}", spec.seed);
        let description = summary_line(last);
        let config_json =
            serde_json::to_string(&spec.config).map_err(dotlink_export::ExportError::from)?;
        let metadata = dotlink_export::SvgMetadata {
            title: Some(&title),
            description: Some(&description),
            config_json: Some(&config_json),
        };
        let svg = dotlink_export::to_svg(
            &last.snapshot,
            spec.config.bounds,
            spec.config.node_radius,
            &metadata,
            game.preview().as_ref(),
        );
        write_file(svg_path, &svg)?;
    }

    let log = dotlink_export::action_log_to_json(game.events().log().completed())?;
    Ok((
        Report {
            seed: spec.seed,
            player: None,
            rounds,
        },
        log,
    ))
}

fn replay<S: ScoreStore, E: EventSink>(game: &mut Game<SystemClock, S, E>, gestures: &[Gesture]) {
    for gesture in gestures {
        match game.handle_gesture(*gesture) {
            GestureOutcome::Rejected(e) => {
                tracing::warn!(?gesture, error = %e, "gesture rejected");
            }
            GestureOutcome::Committed(recorded) => {
                tracing::debug!(
                    start = %recorded.segment.start,
                    end = %recorded.segment.end,
                    "segment committed",
                );
            }
            GestureOutcome::DragStarted { .. }
            | GestureOutcome::PreviewMoved
            | GestureOutcome::Ignored => {}
        }
    }
}

fn auto_play<S: ScoreStore, E: EventSink>(game: &mut Game<SystemClock, S, E>) {
    loop {
        let Some(round) = game.round() else { return };
        if round.is_won() {
            return;
        }
        let Some(gestures) = autoplay::next_move(round.engine()) else {
            return;
        };
        for gesture in gestures {
            if let GestureOutcome::Rejected(e) = game.handle_gesture(gesture) {
                // Coincident points cannot be linked; stop instead of retrying.
                tracing::warn!(?gesture, error = %e, "automatic move rejected");
                return;
            }
        }
    }
}

fn summary_line(report: &RoundReport) -> String {
    match &report.outcome {
        Some(outcome) => format!(
            "Round {}: won, score {}, length {:.1}, time {:.2}s{}",
            report.round,
            outcome.score,
            outcome.total_length,
            outcome.elapsed.as_secs_f64(),
            if outcome.new_best { " (new best)" } else { "" },
        ),
        None => format!(
            "Round {}: unfinished, {} components, length {:.1}",
            report.round, report.components, report.snapshot.total_length,
        ),
    }
}

fn print_report(report: &Report) {
    for round in &report.rounds {
        println!("{}", summary_line(round));
    }
    let best = report
        .rounds
        .iter()
        .rev()
        .find_map(|r| r.outcome.as_ref().and_then(|o| o.best_score));
    if let Some(best) = best {
        println!("Best score: {best}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dotlink").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_build_config() {
        let cli = parse(&["--points", "6", "--difficulty", "hard", "--win-rule", "all"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.point_count, 6);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.win_rule, WinRule::AllNodes);
        assert_eq!(config.bounds, GameConfig::DEFAULT_BOUNDS);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "--points",
            "6",
            "--config-json",
            r#"{"point_count": 4, "difficulty": "easy"}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.point_count, 4);
        assert_eq!(config.difficulty, Difficulty::Easy);
        assert!((config.node_radius - GameConfig::DEFAULT_NODE_RADIUS).abs() < f64::EPSILON);
    }

    #[test]
    fn bad_config_json_is_reported() {
        let cli = parse(&["--config-json", "{"]);
        let err = config_from_cli(&cli).unwrap_err();
        assert!(err.to_string().starts_with("Error parsing --config-json"));
    }

    #[test]
    fn player_requires_history() {
        assert!(Cli::try_parse_from(["dotlink", "--player", "abc"]).is_err());
    }

    #[test]
    fn seeded_auto_play_wins_every_round() {
        let cli = parse(&["--seed", "11", "--rounds", "2"]);
        let spec = RunSpec {
            config: config_from_cli(&cli).unwrap(),
            seed: 11,
            layout: None,
            script: None,
        };
        let (report, log) = play(
            &cli,
            &spec,
            MemoryScoreStore::default(),
            RoundRecorder::new(None),
        )
        .unwrap();
        assert_eq!(report.rounds.len(), 2);
        assert!(report.rounds.iter().all(|r| r.outcome.is_some()));
        assert!(report.rounds.iter().all(|r| r.components == 1));
        assert_eq!(dotlink_export::action_log_from_json(&log).unwrap().len(), 2);
    }
}
