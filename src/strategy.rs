//! The pluggable strategy contract and the fixed set of named strategies.
//!
//! A strategy receives a read-only board, the side to move and a
//! [`SearchConfig`], and answers with a move or `None` when it has nothing
//! to play. Strategies are untrusted: the match runner validates whatever
//! they return and substitutes a fallback when needed.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant, TryFromFloatSecsError};

use clap::ValueEnum;
use thiserror::Error;

use crate::alphabeta::AlphaBeta;
use crate::board::{Board, Move, Player};
use crate::constants::{DEFAULT_MAX_DEPTH, DISC_MINIMAX_DEPTH, FIXED_MINIMAX_DEPTH};
use crate::eval::{DiscDifferential, Positional};
use crate::random::RandomStrategy;

/// Failures a strategy may report instead of a move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("strategy failed: {0}")]
    Failed(String),
    #[error("no search iteration completed within {budget:?}")]
    NoCompletedIteration { budget: Duration },
}

/// A move-choosing strategy.
pub trait Strategy: Send {
    /// Human-readable name used in logs and reports.
    fn name(&self) -> &str;

    /// Choose a move for `player` on `board`.
    ///
    /// Returns `Ok(None)` when `player` has no legal move. Implementations
    /// must not take longer than `config.time_budget` by more than a small
    /// margin.
    fn choose_move(
        &mut self,
        board: &Board,
        player: Player,
        config: &SearchConfig,
    ) -> Result<Option<Move>, StrategyError>;
}

impl fmt::Debug for dyn Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Strategy({})", self.name())
    }
}

const NO_MOVE: u8 = u8::MAX;

/// A slot where a search publishes the best move of its deepest completed
/// iteration, so the runner can still use it if the search overruns.
#[derive(Debug, Clone)]
pub struct CommittedMove(Arc<AtomicU8>);

impl Default for CommittedMove {
    fn default() -> Self {
        Self(Arc::new(AtomicU8::new(NO_MOVE)))
    }
}

impl CommittedMove {
    pub fn store(&self, mv: Move) {
        let code = mv.index().map_or(NO_MOVE, |i| i as u8);
        self.0.store(code, Ordering::Release);
    }

    pub fn load(&self) -> Option<Move> {
        match self.0.load(Ordering::Acquire) {
            NO_MOVE => None,
            code => Move::from_index(code as usize),
        }
    }

    pub fn clear(&self) {
        self.0.store(NO_MOVE, Ordering::Release);
    }
}

/// Limits governing one strategy invocation.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum search depth in plies.
    pub max_depth: u8,
    /// Wall-clock budget. `None` means unlimited.
    pub time_budget: Option<Duration>,
    /// Where the search publishes its last committed move.
    pub committed: CommittedMove,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH, None)
    }
}

impl SearchConfig {
    pub fn new(max_depth: u8, time_budget: Option<Duration>) -> Self {
        Self {
            max_depth,
            time_budget,
            committed: CommittedMove::default(),
        }
    }

    /// Budget given in (fractional) seconds, as the boundary contract does.
    /// Fails for negative, non-finite or unrepresentably large values.
    pub fn with_seconds(max_depth: u8, seconds: f64) -> Result<Self, TryFromFloatSecsError> {
        Ok(Self::new(max_depth, Some(Duration::try_from_secs_f64(seconds)?)))
    }

    /// The instant at which a search started at `start` must stop.
    pub fn deadline(&self, start: Instant) -> Option<Instant> {
        self.time_budget.map(|budget| start + budget)
    }

    /// A copy sharing the limits but with a fresh, empty commit slot.
    pub fn fresh(&self) -> Self {
        Self::new(self.max_depth, self.time_budget)
    }
}

/// The named strategies offered to configuration layers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum StrategyKind {
    /// Alpha-beta, positional leaf, iterative deepening under the time limit
    Minimax1,
    /// Alpha-beta, disc-differential leaf, fixed depth 3
    Minimax2,
    /// Alpha-beta, positional leaf, fixed depth 4
    Minimax3,
    /// Named "A* search"; plays via the alpha-beta search
    #[value(name = "astar")]
    AStar,
    /// Named "Monte Carlo"; plays a uniformly random legal move
    #[value(name = "monte-carlo")]
    MonteCarlo,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Minimax1,
        StrategyKind::Minimax2,
        StrategyKind::Minimax3,
        StrategyKind::AStar,
        StrategyKind::MonteCarlo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Minimax1 => "Minimax1",
            StrategyKind::Minimax2 => "Minimax2",
            StrategyKind::Minimax3 => "Minimax3",
            StrategyKind::AStar => "A*",
            StrategyKind::MonteCarlo => "MonteCarlo",
        }
    }

    /// Build a fresh instance. `seed` feeds strategies that use randomness.
    pub fn build(self, seed: u64) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Minimax1 => Box::new(AlphaBeta::new(self.name(), Positional::default())),
            StrategyKind::Minimax2 => Box::new(
                AlphaBeta::new(self.name(), DiscDifferential).fixed_depth(DISC_MINIMAX_DEPTH),
            ),
            StrategyKind::Minimax3 => Box::new(
                AlphaBeta::new(self.name(), Positional::default()).fixed_depth(FIXED_MINIMAX_DEPTH),
            ),
            StrategyKind::AStar => Box::new(AlphaBeta::new(self.name(), Positional::default())),
            StrategyKind::MonteCarlo => Box::new(RandomStrategy::with_seed(self.name(), seed)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type Factory = dyn Fn(u64) -> Box<dyn Strategy> + Send + Sync;

/// A named recipe for strategy instances. The coordinator builds a fresh
/// instance per match, and the runner rebuilds one if it had to abandon an
/// instance that overran its budget.
#[derive(Clone)]
pub struct Contender {
    name: String,
    factory: Arc<Factory>,
}

impl Contender {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(u64) -> Box<dyn Strategy> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }

    pub fn from_kind(kind: StrategyKind) -> Self {
        Self::new(kind.name(), move |seed| kind.build(seed))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(&self, seed: u64) -> Box<dyn Strategy> {
        (self.factory)(seed)
    }
}

impl fmt::Debug for Contender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contender").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::is_legal_move;

    #[test]
    fn test_committed_move_slot() {
        let slot = CommittedMove::default();
        assert_eq!(slot.load(), None);
        slot.store(Move::new(2, 3));
        assert_eq!(slot.load(), Some(Move::new(2, 3)));
        let shared = slot.clone();
        shared.clear();
        assert_eq!(slot.load(), None);
    }

    #[test]
    fn test_fresh_config_has_empty_slot() {
        let config = SearchConfig::with_seconds(3, 0.5).unwrap();
        config.committed.store(Move::new(0, 0));
        let fresh = config.fresh();
        assert_eq!(fresh.committed.load(), None);
        assert_eq!(fresh.max_depth, 3);
        assert_eq!(fresh.time_budget, Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_seconds_out_of_range() {
        assert!(SearchConfig::with_seconds(3, 1e30).is_err());
        assert!(SearchConfig::with_seconds(3, -1.0).is_err());
        assert!(SearchConfig::with_seconds(3, f64::INFINITY).is_err());
    }

    #[test]
    fn test_every_kind_plays_a_legal_opening() {
        let board = Board::new();
        let config = SearchConfig::new(2, None);
        for kind in StrategyKind::ALL {
            let mut strategy = kind.build(7);
            assert_eq!(strategy.name(), kind.name());
            let mv = strategy
                .choose_move(&board, Player::Black, &config)
                .unwrap()
                .unwrap();
            assert!(is_legal_move(&board, mv, Player::Black), "{kind} played {mv}");
        }
    }

    #[test]
    fn test_contender_builds_named_instances() {
        let contender = Contender::from_kind(StrategyKind::MonteCarlo);
        assert_eq!(contender.name(), "MonteCarlo");
        assert_eq!(contender.build(1).name(), "MonteCarlo");
    }
}
