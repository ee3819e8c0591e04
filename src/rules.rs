//! Othello rules: legality, move application with flipping, terminal
//! detection and scoring.
//!
//! A move is legal when it lands on an empty square and, in at least one of
//! the eight directions, brackets a contiguous run of opponent discs ending
//! on one of the mover's own discs. Every bracketed run is flipped.
//!
//! Besides the pure [`apply_move`], this module offers a make/undo pair
//! ([`play_move`] / [`undo_move`]) used by the search so that it can walk
//! the tree on a single private board.

use thiserror::Error;

use crate::board::{Board, Cell, Move, Player};
use crate::constants::{DIRECTIONS, N};

/// Why a move was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move {0}: off the board")]
    OffBoard(Move),
    #[error("illegal move {0}: square not empty")]
    Occupied(Move),
    #[error("illegal move {0}: flips nothing")]
    NoFlips(Move),
}

/// What [`undo_move`] needs to restore the board exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Undo {
    pub mv: Move,
    pub player: Player,
    /// Bitmask of flipped squares, bit `row * 8 + col`.
    pub flipped: u64,
}

impl Undo {
    /// Number of discs this move flipped.
    pub fn flip_count(&self) -> u32 {
        self.flipped.count_ones()
    }
}

/// Bitmask of discs flipped by `player` moving at `(row, col)` along one
/// direction, or 0 when the run is not bracketed.
fn flips_in_direction(board: &Board, row: usize, col: usize, dir: (i8, i8), player: Player) -> u64 {
    let own = Cell::from(player);
    let opp = Cell::from(player.opponent());
    let (dr, dc) = dir;
    let mut r = row as i8 + dr;
    let mut c = col as i8 + dc;
    let mut run = 0u64;

    while let Some(cell) = cell_at(board, r, c) {
        if cell == opp {
            run |= 1 << (r as usize * N + c as usize);
        } else if cell == own {
            return run;
        } else {
            return 0;
        }
        r += dr;
        c += dc;
    }
    0
}

#[inline]
fn cell_at(board: &Board, r: i8, c: i8) -> Option<Cell> {
    if r < 0 || c < 0 {
        return None;
    }
    board.get(r as usize, c as usize)
}

/// Bitmask of every disc `player` would flip by playing `mv`. Zero means the
/// move is illegal (or off the board, or on an occupied square).
pub fn flips(board: &Board, mv: Move, player: Player) -> u64 {
    if !mv.is_on_board() {
        return 0;
    }
    let (row, col) = (mv.row as usize, mv.col as usize);
    if board.get(row, col) != Some(Cell::Empty) {
        return 0;
    }
    DIRECTIONS
        .iter()
        .fold(0, |acc, &dir| acc | flips_in_direction(board, row, col, dir, player))
}

/// Check whether `player` may play `mv` on `board`.
pub fn is_legal_move(board: &Board, mv: Move, player: Player) -> bool {
    if !mv.is_on_board() {
        return false;
    }
    let (row, col) = (mv.row as usize, mv.col as usize);
    if board.get(row, col) != Some(Cell::Empty) {
        return false;
    }
    DIRECTIONS
        .iter()
        .any(|&dir| flips_in_direction(board, row, col, dir, player) != 0)
}

/// All legal moves for `player`, in row-major order.
///
/// The order is part of the contract: searches break ties by keeping the
/// first move generated, and the runner's deterministic fallback is the
/// first element.
pub fn legal_moves(board: &Board, player: Player) -> Vec<Move> {
    let mut moves = Vec::with_capacity(16);
    for row in 0..N as u8 {
        for col in 0..N as u8 {
            let mv = Move::new(row, col);
            if is_legal_move(board, mv, player) {
                moves.push(mv);
            }
        }
    }
    moves
}

/// Whether `player` has at least one legal move.
pub fn has_any_legal_move(board: &Board, player: Player) -> bool {
    (0..N as u8).any(|row| {
        (0..N as u8).any(|col| is_legal_move(board, Move::new(row, col), player))
    })
}

/// The game is over once neither side can move. Checking only the side to
/// move is not enough: a side that cannot move just passes.
pub fn is_terminal(board: &Board) -> bool {
    !has_any_legal_move(board, Player::Black) && !has_any_legal_move(board, Player::White)
}

/// Disc tally as `(black, white)`.
pub fn score(board: &Board) -> (usize, usize) {
    (board.count(Cell::Black), board.count(Cell::White))
}

/// Play `mv` for `player` in place, returning the information needed to
/// undo it. The board is left untouched on error.
pub fn play_move(board: &mut Board, mv: Move, player: Player) -> Result<Undo, MoveError> {
    if !mv.is_on_board() {
        return Err(MoveError::OffBoard(mv));
    }
    let (row, col) = (mv.row as usize, mv.col as usize);
    if board.get(row, col) != Some(Cell::Empty) {
        return Err(MoveError::Occupied(mv));
    }
    let flipped = flips(board, mv, player);
    if flipped == 0 {
        return Err(MoveError::NoFlips(mv));
    }

    let own = Cell::from(player);
    board.set(row, col, own);
    for_each_square(flipped, |r, c| board.set(r, c, own));

    Ok(Undo {
        mv,
        player,
        flipped,
    })
}

/// Revert a move previously made with [`play_move`].
pub fn undo_move(board: &mut Board, undo: &Undo) {
    let opp = Cell::from(undo.player.opponent());
    for_each_square(undo.flipped, |r, c| board.set(r, c, opp));
    board.set(undo.mv.row as usize, undo.mv.col as usize, Cell::Empty);
}

/// Return the board after `player` plays `mv`. An illegal move is a no-op:
/// the returned board equals the input.
pub fn apply_move(board: &Board, mv: Move, player: Player) -> Board {
    let mut next = *board;
    // An illegal move leaves `next` untouched, which is the no-op we want.
    let _ = play_move(&mut next, mv, player);
    next
}

fn for_each_square(mut mask: u64, mut f: impl FnMut(usize, usize)) {
    while mask != 0 {
        let idx = mask.trailing_zeros() as usize;
        f(idx / N, idx % N);
        mask &= mask - 1;
    }
}
