//! Othello-Arena: an Othello engine and strategy tournament harness.
//!
//! Two strategies play repeated games of Othello against each other with
//! colors alternating, and the harness reports win rates, draw rate and
//! average thinking time per strategy.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions, weight table and defaults
//! - [`board`] - Board, cell, player and move types
//! - [`rules`] - Legality, flips, move application and scoring
//! - [`eval`] - Static evaluation (positional weights, disc differential)
//! - [`strategy`] - The strategy contract and the named strategy set
//! - [`alphabeta`] - Alpha-beta minimax with iterative deepening
//! - [`random`] - Uniformly random play
//! - [`game`] - Match runner with move validation and fallbacks
//! - [`tournament`] - Repeated matches, color alternation and statistics
//!
//! ## Example
//!
//! ```
//! use othello_arena::strategy::StrategyKind;
//! use othello_arena::tournament::{Tournament, TournamentConfig};
//!
//! let config = TournamentConfig {
//!     matches: 2,
//!     time_limit: 0.5,
//!     max_depth: 1,
//!     seed: Some(7),
//!     ..TournamentConfig::default()
//! };
//! let tournament =
//!     Tournament::from_kinds(StrategyKind::MonteCarlo, StrategyKind::Minimax2, config).unwrap();
//! let stats = tournament.run(&mut ());
//! assert_eq!(stats.played(), 2);
//! println!("{stats}");
//! ```

pub mod alphabeta;
pub mod board;
pub mod constants;
pub mod eval;
pub mod game;
pub mod random;
pub mod rules;
pub mod strategy;
pub mod tournament;
