//! Constants for board geometry, evaluation weights and match defaults.
//!
//! The board is a fixed 8x8 grid addressed by `(row, col)`, row 0 / column 0
//! in the top-left corner. Squares are also addressed by a flat index
//! `row * N + col` where a compact form is convenient (bitmasks, commit slots).

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size (NxN). Othello is always played on 8x8.
pub const N: usize = 8;

/// Total number of squares.
pub const SQUARES: usize = N * N;

/// Discs on the board at the start of a game.
pub const INITIAL_DISCS: usize = 4;

/// The eight unit vectors used to scan for flips, as `(drow, dcol)`.
/// Order: N, NE, E, SE, S, SW, W, NW
pub const DIRECTIONS: [(i8, i8); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

// =============================================================================
// Evaluation
// =============================================================================

/// Positional weight per square. Corners are strongly positive, the squares
/// touching a corner strongly negative, edges moderately positive and the
/// interior close to neutral.
pub const POSITION_WEIGHTS: [[i32; N]; N] = [
    [100, -20, 10, 5, 5, 10, -20, 100],
    [-20, -50, -2, -2, -2, -2, -50, -20],
    [10, -2, -1, -1, -1, -1, -2, 10],
    [5, -2, -1, -1, -1, -1, -2, 5],
    [5, -2, -1, -1, -1, -1, -2, 5],
    [10, -2, -1, -1, -1, -1, -2, 10],
    [-20, -50, -2, -2, -2, -2, -50, -20],
    [100, -20, 10, 5, 5, 10, -20, 100],
];

// =============================================================================
// Search and Match Defaults
// =============================================================================

/// Default maximum ply depth for iterative deepening.
pub const DEFAULT_MAX_DEPTH: u8 = 4;

/// Fixed depth of the disc-differential minimax entry.
pub const DISC_MINIMAX_DEPTH: u8 = 3;

/// Fixed depth of the plain positional minimax entry.
pub const FIXED_MINIMAX_DEPTH: u8 = 4;

/// Default per-move time limit in seconds.
pub const DEFAULT_TIME_LIMIT: f64 = 5.0;

/// Default number of matches in a tournament.
pub const DEFAULT_MATCHES: usize = 10;

/// Extra time a strategy gets past its budget before the watchdog gives up
/// on it, in milliseconds.
pub const DEFAULT_GRACE_MS: u64 = 250;
