//! Bubble Pop headless driver
//!
//! Starts a game, applies taps, runs every cascade to completion and prints
//! the event stream and final board. Rendering lives elsewhere.

use anyhow::{Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use bubble_pop::settings::BounceAnchor;
use bubble_pop::sim::{CascadeEngine, EventRecord, GamePhase};
use bubble_pop::{GameConfig, GameEvent};

/// Chain-reaction grid puzzle, played from the command line.
#[derive(Debug, Parser)]
#[command(
    name = "bubble-pop",
    version,
    about = "Tap cells, pop bubbles, chain the drops. Clears the board to win.",
    long_about = "Each tap adds one to a cell. A cell above the maximum value pops: it \
        resets to zero and sends a drop in every direction. Drops skip over empty cells and \
        land on the next filled one, which may pop in turn. Every chained pop refunds a move.\n\n\
        Taps are given as ROW,COL pairs (zero-based). Use --auto to let a seeded random \
        player tap filled cells until the game ends."
)]
struct Args {
    /// JSON config file (missing fields use the defaults)
    #[arg(short, long, value_name = "FILE")]
    config: Option<std::path::PathBuf>,

    /// Board fill seed (overrides the config)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Grid rows (overrides the config)
    #[arg(long, value_name = "ROWS")]
    height: Option<usize>,

    /// Grid columns (overrides the config)
    #[arg(long, value_name = "COLS")]
    width: Option<usize>,

    /// Move budget (overrides the config)
    #[arg(long, value_name = "N")]
    moves: Option<u32>,

    /// Bounce anchor: origin (growing stride) or advance (cell by cell)
    #[arg(long, value_parser = parse_anchor)]
    anchor: Option<BounceAnchor>,

    /// Tap a cell, e.g. --tap 2,2 (repeatable, applied in order)
    #[arg(short, long, value_name = "ROW,COL", value_parser = parse_cell)]
    tap: Vec<(usize, usize)>,

    /// After the scripted taps, make up to N random taps on filled cells
    #[arg(long, value_name = "N")]
    auto: Option<u32>,

    /// Print events as JSON lines instead of text
    #[arg(long)]
    json: bool,

    /// Print the effective config and exit
    #[arg(long)]
    print_config: bool,
}

fn parse_cell(s: &str) -> Result<(usize, usize), String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got '{s}'"))?;
    let row = row.trim().parse().map_err(|e| format!("bad row: {e}"))?;
    let col = col.trim().parse().map_err(|e| format!("bad column: {e}"))?;
    Ok((row, col))
}

fn parse_anchor(s: &str) -> Result<BounceAnchor, String> {
    BounceAnchor::from_str(s).ok_or_else(|| format!("unknown bounce anchor '{s}'"))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(moves) = args.moves {
        config.initial_moves = moves;
    }
    if let Some(anchor) = args.anchor {
        config.bounce_anchor = anchor;
    }

    if args.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let mut engine = CascadeEngine::new();
    engine.start_game(config).context("starting game")?;
    log::info!("Bubble Pop starting (seed {})", engine.seed());
    println!("{}\n", engine.board());

    for &(row, col) in &args.tap {
        if engine.phase() != GamePhase::Playing {
            break;
        }
        play(&mut engine, row, col, args.json)?;
    }

    if let Some(limit) = args.auto {
        let mut rng = Pcg32::seed_from_u64(engine.seed().wrapping_add(1));
        for _ in 0..limit {
            if engine.phase() != GamePhase::Playing {
                break;
            }
            let cells = engine.board().cells();
            let mut candidates: Vec<(usize, usize)> = cells
                .iter()
                .filter(|c| c.value > 0)
                .map(|c| (c.row, c.col))
                .collect();
            if candidates.is_empty() {
                // A freshly filled board can start out all zero
                candidates = cells.iter().map(|c| (c.row, c.col)).collect();
            }
            let (row, col) = candidates[rng.random_range(0..candidates.len())];
            play(&mut engine, row, col, args.json)?;
        }
    }

    let totals = engine.total_stats();
    println!("\n{}", engine.board());
    println!(
        "{:?} after {} taps: {} pops ({} chained), {} drops, {} bounces",
        engine.phase(),
        engine.taps_taken(),
        totals.pops,
        totals.chain_pops,
        totals.walks_spawned,
        totals.bounces
    );
    Ok(())
}

/// Apply one tap and run its cascade to completion
fn play(engine: &mut CascadeEngine, row: usize, col: usize, json: bool) -> Result<()> {
    if let Err(err) = engine.player_tap(row, col) {
        log::warn!("Tap ({row}, {col}) rejected: {err}");
        return Ok(());
    }
    engine.run_until_idle();
    for record in engine.drain_events() {
        print_event(&record, json)?;
    }
    Ok(())
}

fn print_event(record: &EventRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(record)?);
        return Ok(());
    }
    let at = record.at_ms;
    match &record.event {
        GameEvent::CellValueChanged { row, col, value } => {
            println!("{at:>7}ms  ({row}, {col}) = {value}")
        }
        GameEvent::MovesChanged { remaining } => println!("{at:>7}ms  moves {remaining}"),
        GameEvent::PopStarted { row, col } => println!("{at:>7}ms  pop ({row}, {col})"),
        GameEvent::CascadeCompleted { stats } => println!(
            "{at:>7}ms  cascade done: {} pops, {} chained",
            stats.pops, stats.chain_pops
        ),
        GameEvent::GameWon => println!("{at:>7}ms  YOU WIN"),
        GameEvent::GameLost => println!("{at:>7}ms  GAME OVER"),
        // Animation brackets are only interesting to renderers
        GameEvent::GameStarted { .. }
        | GameEvent::PopEnded { .. }
        | GameEvent::DropPassageStarted { .. }
        | GameEvent::DropPassageEnded { .. } => {}
    }
    Ok(())
}
