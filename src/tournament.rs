//! Tournament coordinator: repeated matches between two contenders.
//!
//! Contender A plays Black in even-numbered matches (0, 2, ...) and White in
//! odd ones. Each match gets fresh strategy instances. Results are folded
//! into [`TournamentStats`] by a single owner on the calling thread, also
//! when matches run in parallel on a rayon pool, so observers always see
//! consistent running statistics.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::{info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::board::Player;
use crate::constants::{DEFAULT_GRACE_MS, DEFAULT_MATCHES, DEFAULT_MAX_DEPTH, DEFAULT_TIME_LIMIT};
use crate::game::{MatchResult, MatchRunner, MatchSettings, MoveEvent};
use crate::strategy::{Contender, StrategyKind};

/// Rejected tournament configuration. Reported before any match starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("number of matches must be positive")]
    NoMatches,
    #[error("time limit must be a positive number of seconds, got {0}")]
    InvalidTimeLimit(f64),
    #[error("search depth must be at least 1")]
    InvalidDepth,
    #[error("thread count must be at least 1")]
    InvalidThreads,
}

/// Tournament parameters.
#[derive(Debug, Clone)]
pub struct TournamentConfig {
    pub matches: usize,
    /// Per-move time limit in seconds.
    pub time_limit: f64,
    pub max_depth: u8,
    /// Watchdog grace past the time limit.
    pub grace: Duration,
    /// Worker threads; 1 runs every match on the calling thread.
    pub threads: usize,
    /// Fixes every random choice of the tournament when set.
    pub seed: Option<u64>,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            matches: DEFAULT_MATCHES,
            time_limit: DEFAULT_TIME_LIMIT,
            max_depth: DEFAULT_MAX_DEPTH,
            grace: Duration::from_millis(DEFAULT_GRACE_MS),
            threads: 1,
            seed: None,
        }
    }
}

impl TournamentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.matches == 0 {
            return Err(ConfigError::NoMatches);
        }
        self.time_budget()?;
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidDepth);
        }
        if self.threads == 0 {
            return Err(ConfigError::InvalidThreads);
        }
        Ok(())
    }

    /// The per-move time limit as a `Duration`. Rejects limits that are not
    /// positive or too large to represent.
    pub fn time_budget(&self) -> Result<Duration, ConfigError> {
        match Duration::try_from_secs_f64(self.time_limit) {
            Ok(budget) if !budget.is_zero() => Ok(budget),
            _ => Err(ConfigError::InvalidTimeLimit(self.time_limit)),
        }
    }
}

/// One of the two configured contenders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entrant {
    A,
    B,
}

impl Entrant {
    pub fn other(self) -> Entrant {
        match self {
            Entrant::A => Entrant::B,
            Entrant::B => Entrant::A,
        }
    }

    /// Who plays Black in match `index`.
    pub fn black_in(index: usize) -> Entrant {
        if index % 2 == 0 { Entrant::A } else { Entrant::B }
    }

    fn idx(self) -> usize {
        match self {
            Entrant::A => 0,
            Entrant::B => 1,
        }
    }
}

/// How a match ended, in terms of entrants rather than colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win(Entrant),
    Draw,
}

/// Per-entrant tallies.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Decision time of every move this entrant made.
    pub think_times: Vec<Duration>,
}

impl Record {
    /// Mean decision time, zero before any move was made.
    pub fn average_think_time(&self) -> Duration {
        if self.think_times.is_empty() {
            return Duration::ZERO;
        }
        self.think_times.iter().sum::<Duration>() / self.think_times.len() as u32
    }
}

/// One entrant's line of the tournament summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
    pub draw_rate: f64,
    pub average_think_time: Duration,
}

/// Running tournament statistics.
#[derive(Debug, Clone)]
pub struct TournamentStats {
    names: [String; 2],
    records: [Record; 2],
    played: u32,
    draws: u32,
    abandoned: u32,
}

impl TournamentStats {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            names: [a.into(), b.into()],
            records: Default::default(),
            played: 0,
            draws: 0,
            abandoned: 0,
        }
    }

    pub fn name(&self, entrant: Entrant) -> &str {
        &self.names[entrant.idx()]
    }

    pub fn record(&self, entrant: Entrant) -> &Record {
        &self.records[entrant.idx()]
    }

    /// Matches that completed and count towards the rates.
    pub fn played(&self) -> u32 {
        self.played
    }

    pub fn draws(&self) -> u32 {
        self.draws
    }

    /// Matches lost to an internal failure of the runner.
    pub fn abandoned(&self) -> u32 {
        self.abandoned
    }

    pub fn win_rate(&self, entrant: Entrant) -> f64 {
        self.rate(self.record(entrant).wins)
    }

    pub fn draw_rate(&self) -> f64 {
        self.rate(self.draws)
    }

    pub fn average_think_time(&self, entrant: Entrant) -> Duration {
        self.record(entrant).average_think_time()
    }

    /// Per-entrant figures, A first.
    pub fn summary(&self) -> [Summary; 2] {
        [Entrant::A, Entrant::B].map(|entrant| {
            let record = self.record(entrant);
            Summary {
                name: self.name(entrant).to_string(),
                wins: record.wins,
                losses: record.losses,
                win_rate: self.win_rate(entrant),
                draw_rate: self.draw_rate(),
                average_think_time: record.average_think_time(),
            }
        })
    }

    fn rate(&self, count: u32) -> f64 {
        if self.played == 0 {
            0.0
        } else {
            count as f64 / self.played as f64
        }
    }

    /// Fold in one finished match where `black` played Black.
    ///
    /// Think times are attributed per move to whoever made it, so passes and
    /// fallbacks cannot shift samples to the wrong entrant.
    pub fn record_match(&mut self, black: Entrant, result: &MatchResult) -> Outcome {
        let white = black.other();
        let outcome = match result.winner() {
            Some(Player::Black) => Outcome::Win(black),
            Some(Player::White) => Outcome::Win(white),
            None => Outcome::Draw,
        };

        self.played += 1;
        match outcome {
            Outcome::Win(winner) => {
                self.records[winner.idx()].wins += 1;
                self.records[winner.other().idx()].losses += 1;
            }
            Outcome::Draw => {
                self.draws += 1;
                self.records[0].draws += 1;
                self.records[1].draws += 1;
            }
        }

        for (ply, &time) in result.moves.iter().zip(&result.think_times) {
            let mover = if ply.player == Player::Black { black } else { white };
            self.records[mover.idx()].think_times.push(time);
        }
        outcome
    }

    pub fn record_abandoned(&mut self) {
        self.abandoned += 1;
    }
}

impl fmt::Display for TournamentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results after {} matches:", self.played)?;
        for line in self.summary() {
            writeln!(
                f,
                "{}: win rate {:.1}%, average think time {:.3}s",
                line.name,
                line.win_rate * 100.0,
                line.average_think_time.as_secs_f64()
            )?;
        }
        if self.draws > 0 {
            writeln!(f, "Draws: {:.1}%", self.draw_rate() * 100.0)?;
        }
        if self.abandoned > 0 {
            writeln!(f, "Abandoned: {}", self.abandoned)?;
        }
        Ok(())
    }
}

/// A finished match as seen by observers.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub index: usize,
    pub black: Entrant,
    pub outcome: Outcome,
    pub result: MatchResult,
}

/// Presentation hook. The core never depends on what, if anything, is
/// done with these snapshots.
pub trait Observer {
    /// After each applied move of match `match_index`, with the statistics
    /// of the matches finished so far.
    fn on_move(&mut self, _match_index: usize, _event: &MoveEvent, _stats: &TournamentStats) {}

    /// After each finished match, with the statistics including it.
    fn on_match(&mut self, _report: &MatchReport, _stats: &TournamentStats) {}
}

impl Observer for () {}

enum Message {
    Move(usize, MoveEvent),
    Done(usize, Option<MatchResult>),
}

/// Runs a configured number of matches between two contenders.
#[derive(Debug)]
pub struct Tournament {
    contenders: [Contender; 2],
    config: TournamentConfig,
    budget: Duration,
}

impl Tournament {
    pub fn new(a: Contender, b: Contender, config: TournamentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let budget = config.time_budget()?;
        Ok(Self {
            contenders: [a, b],
            config,
            budget,
        })
    }

    pub fn from_kinds(
        a: StrategyKind,
        b: StrategyKind,
        config: TournamentConfig,
    ) -> Result<Self, ConfigError> {
        Self::new(Contender::from_kind(a), Contender::from_kind(b), config)
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    /// Play every match and return the final statistics.
    ///
    /// A panic inside a match abandons that match only. A panic raised by
    /// the observer is not caught and reaches the caller.
    pub fn run(&self, observer: &mut dyn Observer) -> TournamentStats {
        let mut stats = TournamentStats::new(self.contenders[0].name(), self.contenders[1].name());
        let base_seed = self.config.seed.unwrap_or_else(|| fastrand::u64(..));

        if self.config.threads > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()
            {
                Ok(pool) => {
                    self.run_parallel(pool, base_seed, &mut stats, observer);
                    return self.finish(stats);
                }
                Err(err) => warn!("could not build thread pool, running sequentially: {err}"),
            }
        }

        for index in 0..self.config.matches {
            // Observer panics belong to the caller, not to the match.
            let mut observer_panic = None;
            let result = self.play(index, base_seed, &mut |event| {
                if observer_panic.is_some() {
                    return;
                }
                let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
                    observer.on_move(index, &event, &stats)
                }));
                if let Err(payload) = delivered {
                    observer_panic = Some(payload);
                }
            });
            if let Some(payload) = observer_panic {
                panic::resume_unwind(payload);
            }
            self.absorb(index, result, &mut stats, observer);
        }
        self.finish(stats)
    }

    fn run_parallel(
        &self,
        pool: rayon::ThreadPool,
        base_seed: u64,
        stats: &mut TournamentStats,
        observer: &mut dyn Observer,
    ) {
        let (tx, rx) = mpsc::channel();
        let matches = self.config.matches;

        thread::scope(|scope| {
            scope.spawn(move || {
                pool.install(|| {
                    (0..matches).into_par_iter().for_each_with(tx, |tx, index| {
                        let result = self.play(index, base_seed, &mut |event| {
                            let _ = tx.send(Message::Move(index, event));
                        });
                        let _ = tx.send(Message::Done(index, result));
                    });
                });
            });

            // Ends once the last worker drops its sender.
            for message in rx {
                match message {
                    Message::Move(index, event) => observer.on_move(index, &event, stats),
                    Message::Done(index, result) => self.absorb(index, result, stats, observer),
                }
            }
        });
    }

    fn settings(&self, index: usize, base_seed: u64) -> MatchSettings {
        MatchSettings {
            max_depth: self.config.max_depth,
            time_budget: Some(self.budget),
            grace: self.config.grace,
            seed: base_seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Play match `index`. `None` if the runner itself failed.
    fn play(
        &self,
        index: usize,
        base_seed: u64,
        on_move: &mut dyn FnMut(MoveEvent),
    ) -> Option<MatchResult> {
        let black = Entrant::black_in(index);
        let settings = self.settings(index, base_seed);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            MatchRunner::new(
                &self.contenders[black.idx()],
                &self.contenders[black.other().idx()],
                settings,
            )
            .run(on_move)
        }));
        match outcome {
            Ok(result) => Some(result),
            Err(_) => {
                warn!("match {} abandoned after an internal failure", index + 1);
                None
            }
        }
    }

    fn absorb(
        &self,
        index: usize,
        result: Option<MatchResult>,
        stats: &mut TournamentStats,
        observer: &mut dyn Observer,
    ) {
        let Some(result) = result else {
            stats.record_abandoned();
            return;
        };
        let black = Entrant::black_in(index);
        let outcome = stats.record_match(black, &result);
        info!(
            "match {}/{}: {} (Black) {}-{} {} (White)",
            index + 1,
            self.config.matches,
            stats.name(black),
            result.black,
            result.white,
            stats.name(black.other())
        );
        let report = MatchReport {
            index,
            black,
            outcome,
            result,
        };
        observer.on_match(&report, stats);
    }

    fn finish(&self, stats: TournamentStats) -> TournamentStats {
        info!("tournament complete\n{stats}");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Move};
    use crate::game::Ply;

    fn result(black: usize, white: usize, moves: Vec<(Player, u64)>) -> MatchResult {
        MatchResult {
            black,
            white,
            moves: moves
                .iter()
                .map(|&(player, _)| Ply {
                    player,
                    mv: Move::new(0, 0),
                    flipped: 1,
                    fallback: None,
                })
                .collect(),
            think_times: moves.iter().map(|&(_, ms)| Duration::from_millis(ms)).collect(),
            passes: 0,
            turns: moves.len(),
            faults: Vec::new(),
            board: Board::new(),
        }
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let base = TournamentConfig::default();
        assert_eq!(base.validate(), Ok(()));

        let config = TournamentConfig { matches: 0, ..base.clone() };
        assert_eq!(config.validate(), Err(ConfigError::NoMatches));

        let config = TournamentConfig { time_limit: 0.0, ..base.clone() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeLimit(0.0)));

        let config = TournamentConfig { time_limit: f64::NAN, ..base.clone() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeLimit(_))));

        let config = TournamentConfig { time_limit: 1e30, ..base.clone() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeLimit(1e30)));

        let config = TournamentConfig { time_limit: 1e-12, ..base.clone() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeLimit(1e-12)));

        let config = TournamentConfig { time_limit: 0.25, ..base.clone() };
        assert_eq!(config.time_budget(), Ok(Duration::from_millis(250)));

        let config = TournamentConfig { max_depth: 0, ..base.clone() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidDepth));

        let config = TournamentConfig { threads: 0, ..base };
        assert_eq!(config.validate(), Err(ConfigError::InvalidThreads));
    }

    #[test]
    fn test_colors_alternate() {
        assert_eq!(Entrant::black_in(0), Entrant::A);
        assert_eq!(Entrant::black_in(1), Entrant::B);
        assert_eq!(Entrant::black_in(2), Entrant::A);
    }

    #[test]
    fn test_win_is_credited_through_color_swap() {
        let mut stats = TournamentStats::new("a", "b");
        // B plays Black and wins on discs.
        let outcome = stats.record_match(Entrant::B, &result(40, 24, vec![]));
        assert_eq!(outcome, Outcome::Win(Entrant::B));
        assert_eq!(stats.record(Entrant::B).wins, 1);
        assert_eq!(stats.record(Entrant::A).losses, 1);

        let outcome = stats.record_match(Entrant::A, &result(32, 32, vec![]));
        assert_eq!(outcome, Outcome::Draw);
        assert_eq!(stats.played(), 2);
        assert_eq!(stats.draws(), 1);
        assert_eq!(stats.win_rate(Entrant::B), 0.5);
        assert_eq!(stats.draw_rate(), 0.5);
    }

    #[test]
    fn test_think_times_follow_the_mover() {
        let mut stats = TournamentStats::new("a", "b");
        // White passes once, so black makes two moves in a row.
        let moves = vec![
            (Player::Black, 10),
            (Player::White, 30),
            (Player::Black, 20),
            (Player::Black, 30),
        ];
        stats.record_match(Entrant::B, &result(10, 5, moves));
        assert_eq!(stats.record(Entrant::B).think_times.len(), 3);
        assert_eq!(stats.average_think_time(Entrant::B), Duration::from_millis(20));
        assert_eq!(stats.average_think_time(Entrant::A), Duration::from_millis(30));
    }

    #[test]
    fn test_empty_stats() {
        let stats = TournamentStats::new("a", "b");
        assert_eq!(stats.win_rate(Entrant::A), 0.0);
        assert_eq!(stats.draw_rate(), 0.0);
        assert_eq!(stats.average_think_time(Entrant::A), Duration::ZERO);
    }

    #[test]
    fn test_summary() {
        let mut stats = TournamentStats::new("a", "b");
        stats.record_match(Entrant::A, &result(10, 54, vec![(Player::White, 40)]));
        let [a, b] = stats.summary();
        assert_eq!((a.wins, a.losses), (0, 1));
        assert_eq!(b.name, "b");
        assert_eq!(b.win_rate, 1.0);
        assert_eq!(b.draw_rate, 0.0);
        assert_eq!(b.average_think_time, Duration::from_millis(40));
    }

    #[test]
    fn test_display() {
        let mut stats = TournamentStats::new("Minimax1", "MonteCarlo");
        stats.record_match(Entrant::A, &result(40, 24, vec![(Player::Black, 500)]));
        stats.record_match(Entrant::B, &result(32, 32, vec![]));
        let text = stats.to_string();
        assert!(text.contains("Minimax1: win rate 50.0%, average think time 0.500s"));
        assert!(text.contains("MonteCarlo: win rate 0.0%"));
        assert!(text.contains("Draws: 50.0%"));
    }
}
