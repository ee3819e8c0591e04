//! Othello-Arena command line.
//!
//! ## Usage
//!
//! - `othello-arena` - Run the default tournament (Minimax1 vs Minimax2)
//! - `othello-arena tournament --a minimax1 --b monte-carlo --matches 20`
//! - `othello-arena play --black astar --white minimax3 --show-board`
//!
//! Set `RUST_LOG=debug` to see per-depth search progress.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use othello_arena::constants::{
    DEFAULT_GRACE_MS, DEFAULT_MATCHES, DEFAULT_MAX_DEPTH, DEFAULT_TIME_LIMIT,
};
use othello_arena::game::{MatchSettings, MoveEvent, play_match};
use othello_arena::strategy::{Contender, StrategyKind};
use othello_arena::tournament::{
    Entrant, MatchReport, Observer, Outcome, Tournament, TournamentConfig, TournamentStats,
};

/// Othello-Arena: pit Othello strategies against each other
#[derive(Parser)]
#[command(name = "othello-arena")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a series of matches with alternating colors and report statistics
    Tournament(TournamentArgs),
    /// Play a single match and print every move
    Play(PlayArgs),
}

/// Limits shared by both subcommands.
#[derive(Args, Clone)]
struct Limits {
    /// Per-move time limit in seconds
    #[arg(long, default_value_t = DEFAULT_TIME_LIMIT)]
    time_limit: f64,
    /// Maximum search depth in plies
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    depth: u8,
    /// Extra milliseconds allowed past the time limit before a move is forced
    #[arg(long, default_value_t = DEFAULT_GRACE_MS)]
    grace_ms: u64,
    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Print the board after every move
    #[arg(long)]
    show_board: bool,
}

#[derive(Args)]
struct TournamentArgs {
    /// First strategy
    #[arg(long, value_enum, default_value_t = StrategyKind::Minimax1)]
    a: StrategyKind,
    /// Second strategy
    #[arg(long, value_enum, default_value_t = StrategyKind::Minimax2)]
    b: StrategyKind,
    /// Number of matches
    #[arg(long, default_value_t = DEFAULT_MATCHES)]
    matches: usize,
    /// Worker threads; matches run in parallel when greater than 1
    #[arg(long, default_value_t = 1)]
    threads: usize,
    #[command(flatten)]
    limits: Limits,
}

impl Default for TournamentArgs {
    fn default() -> Self {
        Self {
            a: StrategyKind::Minimax1,
            b: StrategyKind::Minimax2,
            matches: DEFAULT_MATCHES,
            threads: 1,
            limits: Limits {
                time_limit: DEFAULT_TIME_LIMIT,
                depth: DEFAULT_MAX_DEPTH,
                grace_ms: DEFAULT_GRACE_MS,
                seed: None,
                show_board: false,
            },
        }
    }
}

#[derive(Args)]
struct PlayArgs {
    /// Strategy playing Black
    #[arg(long, value_enum, default_value_t = StrategyKind::Minimax1)]
    black: StrategyKind,
    /// Strategy playing White
    #[arg(long, value_enum, default_value_t = StrategyKind::MonteCarlo)]
    white: StrategyKind,
    #[command(flatten)]
    limits: Limits,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Play(args)) => run_play(args),
        Some(Commands::Tournament(args)) => run_tournament(args),
        None => run_tournament(TournamentArgs::default()),
    }
}

/// Prints progress as the tournament runs.
struct Console {
    show_board: bool,
}

impl Observer for Console {
    fn on_move(&mut self, match_index: usize, event: &MoveEvent, _stats: &TournamentStats) {
        if self.show_board {
            print_move(Some(match_index), event);
        }
    }

    fn on_match(&mut self, report: &MatchReport, stats: &TournamentStats) {
        let black = report.black;
        let verdict = match report.outcome {
            Outcome::Win(winner) => format!("{} wins", stats.name(winner)),
            Outcome::Draw => "draw".to_string(),
        };
        println!(
            "Match {}: {} (Black) {}-{} {} (White), {verdict}",
            report.index + 1,
            stats.name(black),
            report.result.black,
            report.result.white,
            stats.name(black.other()),
        );
        for entrant in [Entrant::A, Entrant::B] {
            let record = stats.record(entrant);
            println!(
                "  {}: {}W {}L {}D",
                stats.name(entrant),
                record.wins,
                record.losses,
                record.draws
            );
        }
    }
}

fn print_move(match_index: Option<usize>, event: &MoveEvent) {
    let prefix = match_index.map_or(String::new(), |i| format!("[match {}] ", i + 1));
    let note = match event.ply.fallback {
        Some(fallback) => format!(" (fallback: {fallback:?})"),
        None => String::new(),
    };
    println!(
        "{prefix}{}. {} plays {}, flips {} in {:.3}s{note}",
        event.number,
        event.ply.player,
        event.ply.mv,
        event.ply.flipped,
        event.think_time.as_secs_f64()
    );
    println!("{}", event.board);
}

fn run_tournament(args: TournamentArgs) -> Result<()> {
    let config = TournamentConfig {
        matches: args.matches,
        time_limit: args.limits.time_limit,
        max_depth: args.limits.depth,
        grace: Duration::from_millis(args.limits.grace_ms),
        threads: args.threads,
        seed: args.limits.seed,
    };
    let tournament =
        Tournament::from_kinds(args.a, args.b, config).context("invalid tournament settings")?;

    println!(
        "{} vs {}: {} matches, {}s per move",
        args.a, args.b, args.matches, args.limits.time_limit
    );
    let stats = tournament.run(&mut Console {
        show_board: args.limits.show_board,
    });
    println!();
    print!("{stats}");
    Ok(())
}

fn run_play(args: PlayArgs) -> Result<()> {
    // Reuse the tournament checks on the shared limits.
    let config = TournamentConfig {
        matches: 1,
        time_limit: args.limits.time_limit,
        max_depth: args.limits.depth,
        ..TournamentConfig::default()
    };
    config.validate().context("invalid match settings")?;
    let time_budget = config.time_budget().context("invalid match settings")?;

    let black = Contender::from_kind(args.black);
    let white = Contender::from_kind(args.white);
    let settings = MatchSettings {
        max_depth: args.limits.depth,
        time_budget: Some(time_budget),
        grace: Duration::from_millis(args.limits.grace_ms),
        seed: args.limits.seed.unwrap_or_else(|| fastrand::u64(..)),
    };

    let show_board = args.limits.show_board;
    let result = play_match(&black, &white, settings, &mut |event| {
        if show_board {
            print_move(None, &event);
        } else {
            println!(
                "{}. {} plays {}",
                event.number, event.ply.player, event.ply.mv
            );
        }
    });

    println!("{}", result.board);
    let verdict = match result.winner() {
        Some(player) => format!("{player} wins"),
        None => "draw".to_string(),
    };
    println!(
        "{} (Black) {}-{} {} (White): {verdict}",
        args.black, result.black, result.white, args.white
    );
    for fault in &result.faults {
        println!("  fault: {fault}");
    }
    Ok(())
}
