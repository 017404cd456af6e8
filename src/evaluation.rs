//! Static evaluation of Othello positions.
//!
//! Four differential heuristics are computed from a board and a point of
//! view, then combined with an [`EvaluationWeights`] tuple. Every function
//! here reads the board only.

use serde::{Deserialize, Serialize};

use crate::{Board, OthelloState, Player, Piece, Square};

/// Weights of the four heuristics in the final score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationWeights {
    pub parity: f64,
    pub mobility: f64,
    pub corners: f64,
    pub frontier: f64,
}

impl EvaluationWeights {
    /// Every heuristic counts the same.
    pub const MEDIUM: EvaluationWeights = EvaluationWeights {
        parity: 25.0,
        mobility: 25.0,
        corners: 25.0,
        frontier: 25.0,
    };

    /// Tuned weights dominated by corner ownership.
    pub const HARD: EvaluationWeights = EvaluationWeights {
        parity: 21.45,
        mobility: 3.37,
        corners: 70.0,
        frontier: 5.38,
    };
}

/// Raw heuristic values from one player's point of view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Heuristics {
    /// Piece-count ratio in `[-100, 100]`.
    pub parity: f64,
    /// Placement-count ratio in `[-100, 100]`.
    pub mobility: f64,
    /// Corners held minus corners held by the opponent, in `[-4, 4]`.
    pub corners: f64,
    /// Inverted frontier-exposure ratio in `[-100, 100]`.
    pub frontier: f64,
}

impl Heuristics {
    /// Computes the heuristics for `player` on `board`.
    pub fn compute(board: &Board, player: Player) -> Self {
        let opponent = player.opponent();

        let parity = ratio(board.count(player), board.count(opponent));
        let mobility = ratio(board.count_placements(player), board.count_placements(opponent));

        let (own_corners, opp_corners) = tally(Square::CORNERS.iter().map(|&s| board.get(s)), player);

        let occupied_frontier = Square::all()
            .filter(|&s| board.get(s) != Piece::Empty && board.touches_empty(s))
            .map(|s| board.get(s));
        let (own_frontier, opp_frontier) = tally(occupied_frontier, player);

        Heuristics {
            parity,
            mobility,
            corners: own_corners as f64 - opp_corners as f64,
            frontier: -ratio(own_frontier, opp_frontier),
        }
    }

    /// Weighted sum of the heuristics.
    #[inline]
    pub fn weighted(&self, weights: &EvaluationWeights) -> f64 {
        weights.parity * self.parity
            + weights.mobility * self.mobility
            + weights.corners * self.corners
            + weights.frontier * self.frontier
    }
}

/// `100 * (own - opp) / (own + opp)`, or 0 when both are zero.
fn ratio(own: usize, opp: usize) -> f64 {
    if own + opp == 0 {
        return 0.0;
    }
    100.0 * (own as f64 - opp as f64) / (own + opp) as f64
}

fn tally(pieces: impl Iterator<Item = Piece>, player: Player) -> (usize, usize) {
    pieces.fold((0, 0), |(own, opp), piece| match piece.owner() {
        Some(owner) if owner == player => (own + 1, opp),
        Some(_) => (own, opp + 1),
        None => (own, opp),
    })
}

/// Scores `board` for `player`; higher is better for that player.
pub fn evaluate_for(board: &Board, player: Player, weights: &EvaluationWeights) -> f64 {
    Heuristics::compute(board, player).weighted(weights)
}

/// Scores `state` for its player to move.
pub fn evaluate(state: &OthelloState, weights: &EvaluationWeights) -> f64 {
    evaluate_for(state.board(), state.player_to_move(), weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_utils::approx_eq, OthelloAction, RulesError};

    fn sq(row: usize, col: usize) -> Square {
        Square::new(row, col).unwrap()
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(3, 3), 0.0);
        assert_eq!(ratio(4, 0), 100.0);
        assert_eq!(ratio(0, 4), -100.0);
        assert!(approx_eq(ratio(1, 4), -60.0));
    }

    #[test]
    fn test_initial_position_is_balanced() {
        let state = OthelloState::new();
        let h = Heuristics::compute(state.board(), Player::Black);

        assert_eq!(h, Heuristics { parity: 0.0, mobility: 0.0, corners: 0.0, frontier: 0.0 });
        assert_eq!(evaluate(&state, &EvaluationWeights::HARD), 0.0);
    }

    #[test]
    fn test_after_first_move() -> Result<(), RulesError> {
        let state = OthelloState::new().apply(&OthelloAction::place(sq(2, 3), Player::Black))?;

        let white = Heuristics::compute(state.board(), Player::White);
        assert!(approx_eq(white.parity, -60.0));
        assert!(approx_eq(white.mobility, 0.0));
        assert!(approx_eq(white.corners, 0.0));
        assert!(approx_eq(white.frontier, 60.0));

        let black = Heuristics::compute(state.board(), Player::Black);
        assert!(approx_eq(black.parity, 60.0));
        assert!(approx_eq(black.frontier, -60.0));

        assert!(approx_eq(evaluate(&state, &EvaluationWeights::MEDIUM), 0.0));
        Ok(())
    }

    #[test]
    fn test_corners_and_hidden_frontier() {
        let mut board = Board::empty();
        for s in Square::all() {
            board.set(s, Piece::Black);
        }
        board.set(sq(0, 0), Piece::White);
        board.set(sq(4, 4), Piece::Empty);

        let h = Heuristics::compute(&board, Player::White);
        assert_eq!(h.corners, -2.0);
        // Only the 8 black pieces around (4, 4) touch an empty cell.
        assert_eq!(h.frontier, 100.0);
        assert!(approx_eq(h.parity, ratio(1, 62)));
    }

    #[test]
    fn test_weighted_sum() {
        let h = Heuristics { parity: 10.0, mobility: -20.0, corners: 2.0, frontier: 5.0 };
        let weights = EvaluationWeights { parity: 1.0, mobility: 0.5, corners: 10.0, frontier: 2.0 };

        assert!(approx_eq(h.weighted(&weights), 10.0 - 10.0 + 20.0 + 10.0));
    }

    #[test]
    fn test_evaluation_is_read_only() {
        let state = OthelloState::new();
        let before = state.clone();

        evaluate(&state, &EvaluationWeights::MEDIUM);
        evaluate_for(state.board(), Player::White, &EvaluationWeights::HARD);

        assert_eq!(state, before);
    }
}
