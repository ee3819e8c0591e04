//! Uniformly random move selection.
//!
//! Used as a baseline opponent and, through [`random_legal_move`], as the
//! match runner's fallback when a strategy fails.

use crate::board::{Board, Move, Player};
use crate::rules::legal_moves;
use crate::strategy::{SearchConfig, Strategy, StrategyError};

/// Pick a legal move for `player` uniformly at random.
pub fn random_legal_move(rng: &mut fastrand::Rng, board: &Board, player: Player) -> Option<Move> {
    let moves = legal_moves(board, player);
    if moves.is_empty() {
        return None;
    }
    Some(moves[rng.usize(..moves.len())])
}

/// A strategy that plays a uniformly random legal move.
pub struct RandomStrategy {
    name: String,
    rng: fastrand::Rng,
}

impl RandomStrategy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rng: fastrand::Rng::new(),
        }
    }

    /// A reproducible instance.
    pub fn with_seed(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Strategy for RandomStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(
        &mut self,
        board: &Board,
        player: Player,
        _config: &SearchConfig,
    ) -> Result<Option<Move>, StrategyError> {
        Ok(random_legal_move(&mut self.rng, board, player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::is_legal_move;

    #[test]
    fn test_random_move_is_legal() {
        let board = Board::new();
        let mut strategy = RandomStrategy::with_seed("rnd", 42);
        for _ in 0..20 {
            let mv = strategy
                .choose_move(&board, Player::White, &SearchConfig::default())
                .unwrap()
                .unwrap();
            assert!(is_legal_move(&board, mv, Player::White));
        }
    }

    #[test]
    fn test_random_covers_all_moves() {
        let board = Board::new();
        let mut rng = fastrand::Rng::with_seed(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(random_legal_move(&mut rng, &board, Player::Black).unwrap());
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_seeded_instances_agree() {
        let board = Board::new();
        let config = SearchConfig::default();
        let mut a = RandomStrategy::with_seed("a", 9);
        let mut b = RandomStrategy::with_seed("b", 9);
        for _ in 0..10 {
            assert_eq!(
                a.choose_move(&board, Player::Black, &config).unwrap(),
                b.choose_move(&board, Player::Black, &config).unwrap()
            );
        }
    }

    #[test]
    fn test_no_moves() {
        let mut rng = fastrand::Rng::with_seed(3);
        assert_eq!(random_legal_move(&mut rng, &Board::empty(), Player::Black), None);
    }
}
