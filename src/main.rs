//! Headless match-3 runner (default binary).
//!
//! Plays a sequence of levels with a simple autoplayer: every time the board
//! is idle it proposes one of the legal moves at random, the way a player
//! would by clicking two cells. Under driven pacing the runner also acts as
//! the view and acknowledges every animation right away.
//!
//! Logs go to stderr (`RUST_LOG=candy_match_core=debug` for the cascade
//! trace); the run summary is printed to stdout as JSON.

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use candy_match::core::{GameConfig, GameState, Level, Pacing, SessionProgress, SimpleRng};
use candy_match::types::{Color, GameEvent, Intent, LevelResult, LevelState, PassConditionKind};

/// Built-in level used when no `--level` is given
const DEMO_LAYOUT: [&str; 7] = [
    ". . . . . . .",
    ". . . # . . .",
    ". . . . . . .",
    ". 1:. . . . 1:. .",
    ". . . . . . .",
    ". . . # . . .",
    ". . . . . . .",
];

#[derive(Debug, Parser)]
#[command(
    name = "candy-match",
    version,
    about = "Autoplay match-3 levels headlessly and print a JSON summary."
)]
struct Args {
    /// Level descriptor (JSON). Repeat to play a sequence; defaults to a built-in level.
    #[arg(short, long, value_name = "FILE")]
    level: Vec<PathBuf>,

    /// Seed for both the board and the autoplayer.
    #[arg(short, long, default_value = "1")]
    seed: u32,

    /// Stop proposing moves after this many per level; the clock still runs out.
    #[arg(long, default_value = "200", value_name = "N")]
    max_moves: u32,

    /// Simulated seconds between two autoplayer decisions.
    #[arg(long, default_value = "0.5", value_name = "SECS")]
    tick_secs: f32,

    /// `immediate` or `driven`. Overrides CANDY_PACING.
    #[arg(long, value_parser = parse_pacing)]
    pacing: Option<Pacing>,

    /// Print every game event to stdout as it happens.
    #[arg(long)]
    events: bool,
}

fn parse_pacing(s: &str) -> Result<Pacing, String> {
    Pacing::from_str(s).ok_or_else(|| format!("unknown pacing `{s}` (expected immediate or driven)"))
}

#[derive(Debug, Serialize)]
struct LevelSummary {
    level: u32,
    source: String,
    result: &'static str,
    score: u32,
    moves: u32,
    max_combo: u32,
    time_played: f32,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    seed: u32,
    pacing: &'static str,
    levels: Vec<LevelSummary>,
    max_reached_level: u32,
    total_score: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    ensure!(args.tick_secs > 0.0, "--tick-secs must be positive");

    let mut config = GameConfig::from_env();
    if let Some(pacing) = args.pacing {
        config = config.with_pacing(pacing);
    }

    let levels = load_levels(&args.level)?;
    let mut session = SessionProgress::new(levels.len() as u32);
    let mut summaries = Vec::new();

    for (source, level) in levels {
        let number = session.current_level();
        info!(level = number, %source, "starting level");
        let (result, summary) = play_level(&args, config.clone(), source, level, &mut session)
            .with_context(|| format!("level {number}"))?;
        summaries.push(summary);

        if !result.is_win() {
            session.fail_level();
            warn!(level = number, "level failed, stopping run");
            break;
        }
        if session.complete_level() {
            break;
        }
    }

    let summary = RunSummary {
        seed: args.seed,
        pacing: config.pacing.as_str(),
        levels: summaries,
        max_reached_level: session.max_reached_level(),
        total_score: session.total_score(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn load_levels(paths: &[PathBuf]) -> Result<Vec<(String, Level)>> {
    if paths.is_empty() {
        let level = Level::from_layout(&DEMO_LAYOUT)?
            .with_conditions([
                (PassConditionKind::CellClear, 2),
                (PassConditionKind::Collect(Color::Blue), 15),
            ])
            .with_time_limit(90.0);
        return Ok(vec![("<demo>".to_string(), level)]);
    }

    paths
        .iter()
        .map(|path| {
            let level = Level::load(path).with_context(|| format!("failed to load {}", path.display()))?;
            Ok((path.display().to_string(), level))
        })
        .collect()
}

fn play_level(
    args: &Args,
    config: GameConfig,
    source: String,
    level: Level,
    session: &mut SessionProgress,
) -> Result<(LevelResult, LevelSummary)> {
    let pacing = config.pacing;
    let mut game = GameState::new(level, config, args.seed)?;
    let mut player = SimpleRng::new(args.seed ^ 0x9E37_79B9);
    let mut moves = 0;

    while !game.result().is_finished() {
        if game.state() == LevelState::Idle && !game.paused() && moves < args.max_moves {
            if let Some(&pair) = player.pick(game.possible_moves()) {
                game.apply_intent(Intent::SelectCell(pair.first));
                game.apply_intent(Intent::SelectCell(pair.second));
                moves += 1;
            }
        }

        if pacing == Pacing::Driven {
            acknowledge_animations(&mut game);
        }
        drain_events(&mut game, args.events, session);
        game.tick(args.tick_secs);
        drain_events(&mut game, args.events, session);
    }

    let result = game.result();
    let summary = LevelSummary {
        level: session.current_level(),
        source,
        result: result.as_str(),
        score: game.score(),
        moves,
        max_combo: game.max_combo(),
        time_played: game.timer().time_played(),
    };
    Ok((result, summary))
}

/// Stand in for a view that finishes every animation instantly
fn acknowledge_animations(game: &mut GameState) {
    if game.hint().is_some() {
        game.apply_intent(Intent::HintComplete);
    }
    loop {
        let next = game.pending_items().next();
        match next {
            Some(id) if game.apply_intent(Intent::ItemAnimationComplete(id)) => {}
            _ => break,
        }
    }
}

fn drain_events(game: &mut GameState, print: bool, session: &mut SessionProgress) {
    for event in game.take_events() {
        if let GameEvent::ScoreChanged { delta, .. } = event {
            session.add_score(delta);
        }
        if print {
            println!("{event:?}");
        }
    }
}
