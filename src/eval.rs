//! Static evaluation of leaf positions.
//!
//! Scores are always from the point of view of the player passed in, and
//! every evaluator is antisymmetric: `evaluate(b, White) == -evaluate(b, Black)`.

use crate::board::{Board, Cell, Player};
use crate::constants::{N, POSITION_WEIGHTS};

/// A leaf scorer used by the search strategies.
pub trait Evaluator: Send {
    /// Score `board` for `player`. Higher is better for `player`.
    fn evaluate(&self, board: &Board, player: Player) -> i32;
}

/// Sum of per-square weights over `player`'s discs minus the same sum over
/// the opponent's discs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Positional {
    weights: [[i32; N]; N],
}

impl Default for Positional {
    fn default() -> Self {
        Self {
            weights: POSITION_WEIGHTS,
        }
    }
}

impl Positional {
    pub fn with_weights(weights: [[i32; N]; N]) -> Self {
        Self { weights }
    }
}

impl Evaluator for Positional {
    fn evaluate(&self, board: &Board, player: Player) -> i32 {
        let own = Cell::from(player);
        board
            .iter()
            .map(|(r, c, cell)| match cell {
                Cell::Empty => 0,
                cell if cell == own => self.weights[r][c],
                _ => -self.weights[r][c],
            })
            .sum()
    }
}

/// Raw disc differential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscDifferential;

impl Evaluator for DiscDifferential {
    fn evaluate(&self, board: &Board, player: Player) -> i32 {
        let own = board.count(Cell::from(player)) as i32;
        let opp = board.count(Cell::from(player.opponent())) as i32;
        own - opp
    }
}

/// Positional evaluation with the standard weight table.
pub fn evaluate(board: &Board, player: Player) -> i32 {
    Positional::default().evaluate(board, player)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Move;
    use crate::rules::apply_move;

    #[test]
    fn test_start_position_is_balanced() {
        let board = Board::new();
        assert_eq!(evaluate(&board, Player::Black), 0);
        assert_eq!(DiscDifferential.evaluate(&board, Player::Black), 0);
    }

    #[test]
    fn test_corner_dominates() {
        let mut board = Board::empty();
        board.set(0, 0, Cell::Black);
        board.set(1, 1, Cell::White);
        assert_eq!(evaluate(&board, Player::Black), 150);
        assert_eq!(evaluate(&board, Player::White), -150);
    }

    #[test]
    fn test_disc_differential_after_opening() {
        let board = apply_move(&Board::new(), Move::new(2, 3), Player::Black);
        assert_eq!(DiscDifferential.evaluate(&board, Player::Black), 3);
        assert_eq!(DiscDifferential.evaluate(&board, Player::White), -3);
    }

    #[test]
    fn test_custom_weights() {
        let mut weights = [[0; N]; N];
        weights[3][4] = 7;
        let eval = Positional::with_weights(weights);
        assert_eq!(eval.evaluate(&Board::new(), Player::Black), 7);
    }
}
