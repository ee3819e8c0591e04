//! Depth-limited minimax with alpha-beta pruning and iterative deepening.
//!
//! The search is tied to a fixed root player: every leaf is scored from the
//! root player's point of view, nodes where the root player is to move
//! maximize and the others minimize. Some details:
//!
//! - A side with no legal move passes inside the tree. The pass consumes a
//!   ply, so maximizing nodes stay at even distance from the root. A node
//!   where neither side can move is a terminal leaf.
//! - Ties keep the first move in generation (row-major) order.
//! - The deadline is checked on entry to every node. An iteration that runs
//!   out of time is thrown away and the deepest completed one stands.
//! - The tree is walked on one private board with make/undo rather than a
//!   copy per node.

use std::time::Instant;

use log::debug;

use crate::board::{Board, Move, Player};
use crate::eval::Evaluator;
use crate::rules::{has_any_legal_move, legal_moves, play_move, undo_move};
use crate::strategy::{SearchConfig, Strategy, StrategyError};

/// Result of the deepest completed iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub best_move: Move,
    /// Score of `best_move` for the root player.
    pub score: i32,
    /// Depth of the iteration that produced it.
    pub depth: u8,
    /// Nodes visited across all iterations.
    pub nodes: u64,
}

/// Alpha-beta minimax strategy over a pluggable leaf evaluator.
pub struct AlphaBeta<E: Evaluator> {
    name: String,
    evaluator: E,
    /// Search exactly this depth instead of deepening up to the configured maximum.
    fixed_depth: Option<u8>,
    deadline: Option<Instant>,
    nodes: u64,
}

impl<E: Evaluator> AlphaBeta<E> {
    pub fn new(name: impl Into<String>, evaluator: E) -> Self {
        Self {
            name: name.into(),
            evaluator,
            fixed_depth: None,
            deadline: None,
            nodes: 0,
        }
    }

    /// Skip deepening and always search `depth` plies.
    pub fn fixed_depth(mut self, depth: u8) -> Self {
        self.fixed_depth = Some(depth.max(1));
        self
    }

    /// Run the search for `player` and report the deepest completed result.
    ///
    /// Returns `Ok(None)` when `player` has no legal move, and
    /// `Err(NoCompletedIteration)` when the deadline expired before even the
    /// first iteration finished.
    pub fn search(
        &mut self,
        board: &Board,
        player: Player,
        config: &SearchConfig,
    ) -> Result<Option<SearchOutcome>, StrategyError> {
        let moves = legal_moves(board, player);
        if moves.is_empty() {
            return Ok(None);
        }

        let start = Instant::now();
        self.deadline = config.deadline(start);
        self.nodes = 0;

        let max_depth = self.fixed_depth.unwrap_or(config.max_depth).max(1);
        let first_depth = if self.fixed_depth.is_some() { max_depth } else { 1 };

        let mut work = *board;
        let mut outcome = None;
        for depth in first_depth..=max_depth {
            let Some((best_move, score)) = self.search_root(&mut work, player, &moves, depth) else {
                debug!(
                    "{}: depth {depth} abandoned after {:?}, keeping depth {}",
                    self.name,
                    start.elapsed(),
                    outcome.map_or(0, |o: SearchOutcome| o.depth)
                );
                break;
            };
            config.committed.store(best_move);
            debug!(
                "{}: depth {depth} best {best_move} score {score} nodes {} in {:?}",
                self.name,
                self.nodes,
                start.elapsed()
            );
            outcome = Some(SearchOutcome {
                best_move,
                score,
                depth,
                nodes: self.nodes,
            });
        }
        self.deadline = None;

        match outcome {
            Some(outcome) => Ok(Some(outcome)),
            None => Err(StrategyError::NoCompletedIteration {
                budget: config.time_budget.unwrap_or_default(),
            }),
        }
    }

    #[inline]
    fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// One full-width iteration at the root. `None` if time ran out.
    fn search_root(
        &mut self,
        board: &mut Board,
        root: Player,
        moves: &[Move],
        depth: u8,
    ) -> Option<(Move, i32)> {
        let mut alpha = i32::MIN;
        let mut best: Option<(Move, i32)> = None;

        for &mv in moves {
            let Ok(undo) = play_move(board, mv, root) else {
                continue;
            };
            let score = self.alphabeta(board, depth - 1, alpha, i32::MAX, root.opponent(), root);
            undo_move(board, &undo);
            let score = score?;

            // Strict comparison keeps the earliest of equally scored moves.
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((mv, score));
            }
            alpha = alpha.max(score);
        }
        best
    }

    fn alphabeta(
        &mut self,
        board: &mut Board,
        depth: u8,
        mut alpha: i32,
        mut beta: i32,
        to_move: Player,
        root: Player,
    ) -> Option<i32> {
        if self.expired() {
            return None;
        }
        self.nodes += 1;

        if depth == 0 {
            return Some(self.evaluator.evaluate(board, root));
        }

        let moves = legal_moves(board, to_move);
        if moves.is_empty() {
            if !has_any_legal_move(board, to_move.opponent()) {
                return Some(self.evaluator.evaluate(board, root));
            }
            return self.alphabeta(board, depth - 1, alpha, beta, to_move.opponent(), root);
        }

        let maximizing = to_move == root;
        let mut best = if maximizing { i32::MIN } else { i32::MAX };

        for mv in moves {
            let Ok(undo) = play_move(board, mv, to_move) else {
                continue;
            };
            let score = self.alphabeta(board, depth - 1, alpha, beta, to_move.opponent(), root);
            undo_move(board, &undo);
            let score = score?;

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }
            if alpha >= beta {
                break;
            }
        }
        Some(best)
    }
}

impl<E: Evaluator> Strategy for AlphaBeta<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(
        &mut self,
        board: &Board,
        player: Player,
        config: &SearchConfig,
    ) -> Result<Option<Move>, StrategyError> {
        Ok(self
            .search(board, player, config)?
            .map(|outcome| outcome.best_move))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::board::Cell;
    use crate::eval::{DiscDifferential, Positional};

    #[test]
    fn test_depth_one_takes_first_of_equal_moves() {
        // All four opening moves are symmetric and flip one disc.
        let mut search = AlphaBeta::new("ab", DiscDifferential).fixed_depth(1);
        let outcome = search
            .search(&Board::new(), Player::Black, &SearchConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(outcome.best_move, Move::new(2, 3));
        assert_eq!(outcome.score, 3);
        assert_eq!(outcome.depth, 1);
    }

    #[test]
    fn test_prefers_corner() {
        // Black can take the corner (0,0) or play (2,0), which hands white
        // the X-square; the positional table strongly prefers the corner.
        let mut board = Board::empty();
        board.set(1, 1, Cell::White);
        board.set(2, 2, Cell::Black);
        board.set(0, 1, Cell::White);
        board.set(0, 2, Cell::Black);
        let mut search = AlphaBeta::new("ab", Positional::default());
        let mv = search
            .choose_move(&board, Player::Black, &SearchConfig::new(2, None))
            .unwrap();
        assert_eq!(mv, Some(Move::new(0, 0)));
    }

    #[test]
    fn test_no_moves_returns_none() {
        let mut search = AlphaBeta::new("ab", Positional::default());
        let mv = search
            .choose_move(&Board::empty(), Player::Black, &SearchConfig::default())
            .unwrap();
        assert_eq!(mv, None);
    }

    #[test]
    fn test_deepening_commits_each_iteration() {
        let mut search = AlphaBeta::new("ab", Positional::default());
        let config = SearchConfig::new(3, None);
        let outcome = search
            .search(&Board::new(), Player::Black, &config)
            .unwrap()
            .unwrap();
        assert_eq!(outcome.depth, 3);
        assert_eq!(config.committed.load(), Some(outcome.best_move));
    }

    #[test]
    fn test_zero_budget_completes_nothing() {
        let mut search = AlphaBeta::new("ab", Positional::default());
        let config = SearchConfig::new(4, Some(Duration::ZERO));
        let result = search.choose_move(&Board::new(), Player::Black, &config);
        assert_eq!(
            result,
            Err(StrategyError::NoCompletedIteration {
                budget: Duration::ZERO
            })
        );
        assert_eq!(config.committed.load(), None);
    }

    #[test]
    fn test_budget_stops_deepening() {
        let budget = Duration::from_millis(100);
        let mut search = AlphaBeta::new("ab", Positional::default());
        let config = SearchConfig::new(30, Some(budget));
        let start = Instant::now();
        let outcome = search
            .search(&Board::new(), Player::Black, &config)
            .unwrap()
            .unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed < budget + Duration::from_millis(100), "took {elapsed:?}");
        // The unfinished iteration is dropped; the deepest completed one stands.
        assert!(outcome.depth >= 1 && outcome.depth < 30);
        assert_eq!(config.committed.load(), Some(outcome.best_move));

        let mut fixed = AlphaBeta::new("ab", Positional::default()).fixed_depth(outcome.depth);
        let expected = fixed
            .search(&Board::new(), Player::Black, &SearchConfig::new(30, None))
            .unwrap()
            .unwrap();
        assert_eq!((outcome.best_move, outcome.score), (expected.best_move, expected.score));
    }

    #[test]
    fn test_search_leaves_board_untouched() {
        let board = Board::new();
        let copy = board;
        let mut search = AlphaBeta::new("ab", Positional::default());
        search
            .choose_move(&board, Player::White, &SearchConfig::new(4, None))
            .unwrap();
        assert_eq!(board, copy);
    }
}
