//! Match runner: plays one full game between two contenders.
//!
//! The runner owns the only mutable board of the game. Each turn it checks
//! whether the side to move can play; if not, the side passes, and two
//! consecutive passes finish the game. Otherwise the side's strategy is
//! asked for a move on a dedicated thread, with a watchdog of
//! `budget + grace`. Whatever comes back is validated before it is applied.
//!
//! Faults never end a match:
//!
//! - an illegal move is replaced by the first legal move
//! - a failure, a panic or "no move" is replaced by a random legal move
//! - an overrun uses the move the search last committed, or a random one,
//!   and the abandoned strategy instance is replaced by a fresh one

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, trace, warn};
use thiserror::Error;

use crate::board::{Board, Move, Player};
use crate::constants::{DEFAULT_GRACE_MS, DEFAULT_MAX_DEPTH};
use crate::rules::{is_legal_move, legal_moves, play_move, score};
use crate::strategy::{Contender, SearchConfig, Strategy};

/// Something that went wrong with a strategy during a match. Faults are
/// recorded, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("{player} returned illegal move {mv}")]
    IllegalMoveReturned { player: Player, mv: Move },
    #[error("{player} strategy failed: {reason}")]
    StrategyFailure { player: Player, reason: String },
    #[error("{player} overran its budget ({elapsed:?} > {budget:?})")]
    TimeoutOverrun {
        player: Player,
        elapsed: Duration,
        budget: Duration,
    },
}

/// How a substituted move was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// First legal move in row-major order.
    FirstLegal,
    /// Uniformly random legal move.
    Random,
    /// Best move of the last completed search iteration.
    Committed,
}

/// One applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ply {
    pub player: Player,
    pub mv: Move,
    pub flipped: u32,
    /// Set when the runner substituted this move for the strategy's answer.
    pub fallback: Option<Fallback>,
}

/// Published after every applied move.
#[derive(Debug, Clone, Copy)]
pub struct MoveEvent {
    /// 1-based index of the move within the match.
    pub number: usize,
    pub ply: Ply,
    pub think_time: Duration,
    /// Board after the move.
    pub board: Board,
}

/// Turn-level state of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ToMove(Player),
    /// `player` just passed.
    Passed(Player),
    Finished,
}

/// Outcome of one match.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub black: usize,
    pub white: usize,
    /// Applied moves in order. Passes are not included.
    pub moves: Vec<Ply>,
    /// Decision time for each entry of `moves`.
    pub think_times: Vec<Duration>,
    pub passes: usize,
    /// Turns simulated, passes included.
    pub turns: usize,
    pub faults: Vec<Fault>,
    pub board: Board,
}

impl MatchResult {
    /// The side with more discs, or `None` on a draw.
    pub fn winner(&self) -> Option<Player> {
        match self.black.cmp(&self.white) {
            std::cmp::Ordering::Greater => Some(Player::Black),
            std::cmp::Ordering::Less => Some(Player::White),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Limits applied to every decision in a match.
#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub max_depth: u8,
    /// Per-move budget. `None` disables both the search deadline and the watchdog.
    pub time_budget: Option<Duration>,
    /// How long past the budget the watchdog waits before giving up.
    pub grace: Duration,
    /// Seeds the runner's fallback RNG and the strategies it builds.
    pub seed: u64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            time_budget: None,
            grace: Duration::from_millis(DEFAULT_GRACE_MS),
            seed: 0,
        }
    }
}

impl MatchSettings {
    fn search_config(&self) -> SearchConfig {
        SearchConfig::new(self.max_depth, self.time_budget)
    }

    fn watchdog(&self) -> Option<Duration> {
        self.time_budget.map(|budget| budget + self.grace)
    }
}

/// What came back from one strategy invocation.
enum Answer {
    Move(Move),
    Failed(String),
    Overran,
}

/// The move the runner will apply, plus how it was obtained.
struct Decision {
    mv: Move,
    fallback: Option<Fallback>,
    fault: Option<Fault>,
    elapsed: Duration,
}

#[inline]
fn seat(player: Player) -> usize {
    match player {
        Player::Black => 0,
        Player::White => 1,
    }
}

/// Drives a single game between two contenders.
pub struct MatchRunner<'a> {
    contenders: [&'a Contender; 2],
    strategies: [Option<Box<dyn Strategy>>; 2],
    settings: MatchSettings,
    rng: fastrand::Rng,
    board: Board,
    first: Player,
}

impl<'a> MatchRunner<'a> {
    pub fn new(black: &'a Contender, white: &'a Contender, settings: MatchSettings) -> Self {
        let mut rng = fastrand::Rng::with_seed(settings.seed);
        let strategies = [Some(black.build(rng.u64(..))), Some(white.build(rng.u64(..)))];
        Self {
            contenders: [black, white],
            strategies,
            settings,
            rng,
            board: Board::new(),
            first: Player::Black,
        }
    }

    /// Start from `board` with `first` to move instead of the standard opening.
    pub fn with_position(mut self, board: Board, first: Player) -> Self {
        self.board = board;
        self.first = first;
        self
    }

    /// Play the game to the end, calling `on_move` after every applied move.
    pub fn run(mut self, on_move: &mut dyn FnMut(MoveEvent)) -> MatchResult {
        let mut moves = Vec::new();
        let mut think_times = Vec::new();
        let mut faults = Vec::new();
        let mut passes = 0;
        let mut turns = 0;
        let mut consecutive_passes = 0;
        let mut phase = Phase::ToMove(self.first);

        loop {
            let player = match phase {
                Phase::Finished => break,
                Phase::Passed(passer) => {
                    phase = Phase::ToMove(passer.opponent());
                    continue;
                }
                Phase::ToMove(player) => player,
            };
            turns += 1;

            let legal = legal_moves(&self.board, player);
            if legal.is_empty() {
                passes += 1;
                consecutive_passes += 1;
                debug!("{player} has no legal move and passes");
                phase = if consecutive_passes >= 2 {
                    Phase::Finished
                } else {
                    Phase::Passed(player)
                };
                continue;
            }
            consecutive_passes = 0;

            let decision = self.decide(player, &legal);
            let undo = match play_move(&mut self.board, decision.mv, player) {
                Ok(undo) => undo,
                Err(err) => {
                    // Every candidate was checked against this board, so this is a rules bug.
                    error!("validated move rejected: {err}");
                    phase = Phase::Finished;
                    continue;
                }
            };

            let ply = Ply {
                player,
                mv: decision.mv,
                flipped: undo.flip_count(),
                fallback: decision.fallback,
            };
            trace!("{player} plays {} in {:?}", ply.mv, decision.elapsed);
            moves.push(ply);
            think_times.push(decision.elapsed);
            faults.extend(decision.fault);

            on_move(MoveEvent {
                number: moves.len(),
                ply,
                think_time: decision.elapsed,
                board: self.board,
            });
            phase = Phase::ToMove(player.opponent());
        }

        let (black, white) = score(&self.board);
        info!(
            "{} (Black) vs {} (White): {black}-{white} after {} moves, {} faults",
            self.contenders[0].name(),
            self.contenders[1].name(),
            moves.len(),
            faults.len()
        );
        MatchResult {
            black,
            white,
            moves,
            think_times,
            passes,
            turns,
            faults,
            board: self.board,
        }
    }

    /// Ask `player`'s strategy for a move and turn the answer into a legal one.
    fn decide(&mut self, player: Player, legal: &[Move]) -> Decision {
        let contender: &'a Contender = self.contenders[seat(player)];
        let config = self.settings.search_config();
        let committed = config.committed.clone();
        let start = Instant::now();
        let answer = self.invoke(player, config);
        let elapsed = start.elapsed();

        let (mv, fallback, fault) = match answer {
            Answer::Move(mv) if is_legal_move(&self.board, mv, player) => (mv, None, None),
            Answer::Move(mv) => {
                let fault = Fault::IllegalMoveReturned { player, mv };
                (legal[0], Some(Fallback::FirstLegal), Some(fault))
            }
            Answer::Failed(reason) => {
                let fault = Fault::StrategyFailure { player, reason };
                (self.random_move(legal), Some(Fallback::Random), Some(fault))
            }
            Answer::Overran => {
                let fault = Fault::TimeoutOverrun {
                    player,
                    elapsed,
                    budget: self.settings.time_budget.unwrap_or_default(),
                };
                match committed.load() {
                    Some(mv) if is_legal_move(&self.board, mv, player) => {
                        (mv, Some(Fallback::Committed), Some(fault))
                    }
                    _ => (self.random_move(legal), Some(Fallback::Random), Some(fault)),
                }
            }
        };

        if let Some(fault) = &fault {
            warn!("{}: {fault}; playing {mv} instead", contender.name());
        }
        Decision {
            mv,
            fallback,
            fault,
            elapsed,
        }
    }

    /// Run the strategy on its own thread under the watchdog.
    fn invoke(&mut self, player: Player, config: SearchConfig) -> Answer {
        let idx = seat(player);
        let mut strategy = match self.strategies[idx].take() {
            Some(strategy) => strategy,
            None => self.contenders[idx].build(self.rng.u64(..)),
        };

        let (tx, rx) = mpsc::channel();
        let board = self.board;
        let spawned = thread::Builder::new()
            .name(format!("strategy-{}", self.contenders[idx].name()))
            .spawn(move || {
                let result = strategy.choose_move(&board, player, &config);
                // The runner may have stopped listening after an overrun.
                let _ = tx.send((strategy, result));
            });
        if let Err(err) = spawned {
            return Answer::Failed(format!("could not start strategy thread: {err}"));
        }

        let received = match self.settings.watchdog() {
            Some(limit) => rx.recv_timeout(limit),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok((strategy, result)) => {
                self.strategies[idx] = Some(strategy);
                match result {
                    Ok(Some(mv)) => Answer::Move(mv),
                    Ok(None) => Answer::Failed("returned no move while legal moves exist".into()),
                    Err(err) => Answer::Failed(err.to_string()),
                }
            }
            // The instance stays with its thread; a fresh one is built next turn.
            Err(RecvTimeoutError::Timeout) => Answer::Overran,
            Err(RecvTimeoutError::Disconnected) => Answer::Failed("strategy panicked".into()),
        }
    }

    fn random_move(&mut self, legal: &[Move]) -> Move {
        legal[self.rng.usize(..legal.len())]
    }
}

/// Play one match from the standard opening.
pub fn play_match(
    black: &Contender,
    white: &Contender,
    settings: MatchSettings,
    on_move: &mut dyn FnMut(MoveEvent),
) -> MatchResult {
    MatchRunner::new(black, white, settings).run(on_move)
}
