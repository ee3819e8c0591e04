//! Board state, players and moves.
//!
//! The boundary encoding used by strategies and presentation layers is an
//! 8x8 grid of integer codes: 0 = empty, 1 = black, 2 = white, row-major.

use std::fmt;

use thiserror::Error;

use crate::constants::{N, SQUARES};

/// A side in the game. Black always moves first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    Black,
    White,
}

impl Player {
    /// The other side.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// Boundary code of this player (1 = black, 2 = white).
    pub fn code(self) -> u8 {
        match self {
            Player::Black => 1,
            Player::White => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Player> {
        match code {
            1 => Some(Player::Black),
            2 => Some(Player::White),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Black => write!(f, "Black"),
            Player::White => write!(f, "White"),
        }
    }
}

/// Content of a single square.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Black,
    White,
}

impl Cell {
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Black => 1,
            Cell::White => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Cell> {
        match code {
            0 => Some(Cell::Empty),
            1 => Some(Cell::Black),
            2 => Some(Cell::White),
            _ => None,
        }
    }

    /// The player owning this square, if any.
    pub fn owner(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::Black => Some(Player::Black),
            Cell::White => Some(Player::White),
        }
    }
}

impl From<Player> for Cell {
    fn from(player: Player) -> Cell {
        match player {
            Player::Black => Cell::Black,
            Player::White => Cell::White,
        }
    }
}

/// A move as proposed by a strategy.
///
/// Coordinates are not validated on construction: strategies are untrusted,
/// and an off-board move is simply one that the rules reject.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub row: u8,
    pub col: u8,
}

impl Move {
    pub const fn new(row: u8, col: u8) -> Move {
        Move { row, col }
    }

    /// Whether both coordinates lie in `[0, 7]`.
    #[inline]
    pub fn is_on_board(self) -> bool {
        (self.row as usize) < N && (self.col as usize) < N
    }

    /// Flat square index `row * 8 + col`, or `None` when off the board.
    #[inline]
    pub fn index(self) -> Option<usize> {
        self.is_on_board()
            .then(|| self.row as usize * N + self.col as usize)
    }

    pub fn from_index(index: usize) -> Option<Move> {
        (index < SQUARES).then(|| Move::new((index / N) as u8, (index % N) as u8))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Errors decoding a board from its boundary encoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("invalid cell code {code} at ({row}, {col})")]
    InvalidCell { row: usize, col: usize, code: u8 },
}

/// An 8x8 Othello board.
///
/// Boards are small and `Copy`; strategies work on their own copy and never
/// touch the match runner's board.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Cell; N]; N],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// The standard starting position: white on (3,3) and (4,4), black on
    /// (3,4) and (4,3).
    pub fn new() -> Self {
        let mut board = Self::empty();
        board.cells[3][3] = Cell::White;
        board.cells[3][4] = Cell::Black;
        board.cells[4][3] = Cell::Black;
        board.cells[4][4] = Cell::White;
        board
    }

    /// A board with no discs at all.
    pub fn empty() -> Self {
        Self {
            cells: [[Cell::Empty; N]; N],
        }
    }

    /// Content of `(row, col)`, or `None` when off the board.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        if row >= N || col >= N {
            return None;
        }
        Some(self.cells[row][col])
    }

    /// Overwrite a square directly, bypassing the rules. Out-of-range
    /// coordinates are ignored.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if row < N && col < N {
            self.cells[row][col] = cell;
        }
    }

    /// Number of squares holding `cell`.
    pub fn count(&self, cell: Cell) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&c| c == cell)
            .count()
    }

    /// Number of non-empty squares.
    pub fn disc_count(&self) -> usize {
        SQUARES - self.count(Cell::Empty)
    }

    /// Iterate over `(row, col, cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, &cell)| (r, c, cell)))
    }

    /// Decode a board from the boundary grid encoding.
    pub fn from_grid(grid: &[[u8; N]; N]) -> Result<Board, BoardError> {
        let mut board = Board::empty();
        for (row, line) in grid.iter().enumerate() {
            for (col, &code) in line.iter().enumerate() {
                board.cells[row][col] =
                    Cell::from_code(code).ok_or(BoardError::InvalidCell { row, col, code })?;
            }
        }
        Ok(board)
    }

    /// Encode this board into the boundary grid encoding.
    pub fn to_grid(&self) -> [[u8; N]; N] {
        self.cells.map(|row| row.map(Cell::code))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " ")?;
        for col in 0..N {
            write!(f, " {col}")?;
        }
        writeln!(f)?;
        for (r, row) in self.cells.iter().enumerate() {
            write!(f, "{r}")?;
            for cell in row {
                let ch = match cell {
                    Cell::Black => 'B',
                    Cell::White => 'W',
                    Cell::Empty => '.',
                };
                write!(f, " {ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_position() {
        let board = Board::new();
        assert_eq!(board.get(3, 3), Some(Cell::White));
        assert_eq!(board.get(3, 4), Some(Cell::Black));
        assert_eq!(board.get(4, 3), Some(Cell::Black));
        assert_eq!(board.get(4, 4), Some(Cell::White));
        assert_eq!(board.disc_count(), 4);
    }

    #[test]
    fn test_get_off_board() {
        let board = Board::new();
        assert_eq!(board.get(8, 0), None);
        assert_eq!(board.get(0, 8), None);
    }

    #[test]
    fn test_grid_roundtrip() {
        let board = Board::new();
        let grid = board.to_grid();
        assert_eq!(grid[3][3], 2);
        assert_eq!(grid[3][4], 1);
        assert_eq!(Board::from_grid(&grid), Ok(board));
    }

    #[test]
    fn test_grid_rejects_bad_code() {
        let mut grid = [[0u8; N]; N];
        grid[2][5] = 7;
        assert_eq!(
            Board::from_grid(&grid),
            Err(BoardError::InvalidCell {
                row: 2,
                col: 5,
                code: 7
            })
        );
    }

    #[test]
    fn test_move_index() {
        assert_eq!(Move::new(2, 3).index(), Some(19));
        assert_eq!(Move::new(8, 0).index(), None);
        assert_eq!(Move::from_index(63), Some(Move::new(7, 7)));
        assert_eq!(Move::from_index(64), None);
    }

    #[test]
    fn test_player_codes() {
        assert_eq!(Player::from_code(1), Some(Player::Black));
        assert_eq!(Player::from_code(2), Some(Player::White));
        assert_eq!(Player::from_code(0), None);
        assert_eq!(Player::Black.opponent(), Player::White);
    }

    #[test]
    fn test_display() {
        let text = Board::new().to_string();
        assert!(text.starts_with("  0 1 2 3 4 5 6 7\n"));
        assert!(text.contains("3 . . . W B . . ."));
    }
}
