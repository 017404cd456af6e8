//! Othello rules engine.
//!
//! [`OthelloState`] is an immutable snapshot of a position. Every transition
//! goes through [`OthelloState::apply`], which copies the board and returns a
//! new state.
//!
//! When the player to move has no placement, the only legal action is a pass
//! synthesised by the engine. The turn always alternates after any action,
//! so a stuck player faces a pass rather than the opponent moving twice.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Board, Game, Outcome, Player, Square};

/// Result of a finished Othello game.
pub type GameResult = Outcome<Player>;

/// Errors raised by the rules engine.
///
/// Every variant except `InvalidEncoding` is a contract violation by the
/// caller: the action did not come from [`OthelloState::legal_actions`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("not {found}'s turn: {expected} is to move")]
    WrongMover { expected: Player, found: Player },

    #[error("cell ({row}, {col}) is outside the board")]
    OutOfBounds { row: usize, col: usize },

    #[error("{square} is occupied or brackets no opponent piece")]
    IllegalPlacement { square: Square },

    #[error("{player} cannot pass while a placement is available")]
    PassNotAllowed { player: Player },

    #[error("invalid board encoding: {message}")]
    InvalidEncoding { message: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Move {
    Place(Square),
    Pass,
}

/// A move by one player: a placement or a pass.
///
/// Pass actions can only be obtained from [`OthelloState::legal_actions`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OthelloAction {
    mv: Move,
    player: Player,
}

impl OthelloAction {
    /// A placement of `player`'s piece on `square`.
    pub fn place(square: Square, player: Player) -> Self {
        OthelloAction { mv: Move::Place(square), player }
    }

    fn pass(player: Player) -> Self {
        OthelloAction { mv: Move::Pass, player }
    }

    /// The target cell, or `None` for a pass.
    #[inline]
    pub fn square(&self) -> Option<Square> {
        match self.mv {
            Move::Place(square) => Some(square),
            Move::Pass => None,
        }
    }

    #[inline]
    pub fn is_pass(&self) -> bool {
        self.mv == Move::Pass
    }

    #[inline]
    pub fn player(&self) -> Player {
        self.player
    }
}

impl fmt::Display for OthelloAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mv {
            Move::Place(square) => write!(f, "{} plays {}", self.player, square),
            Move::Pass => write!(f, "{} passes", self.player),
        }
    }
}

/// Immutable Othello position: board, side to move, and a lazily computed
/// terminal result.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OthelloState {
    board: Board,
    to_move: Player,
    outcome: OnceLock<Option<GameResult>>,
}

impl OthelloState {
    /// The starting position with black to move.
    pub fn new() -> Self {
        Self::from_parts(Board::initial(), Player::Black)
    }

    /// A state holding an arbitrary board, e.g. one decoded from text.
    pub fn from_parts(board: Board, to_move: Player) -> Self {
        OthelloState { board, to_move, outcome: OnceLock::new() }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn player_to_move(&self) -> Player {
        self.to_move
    }

    /// Piece tally as `(black, white)`.
    pub fn score(&self) -> (usize, usize) {
        (self.board.count(Player::Black), self.board.count(Player::White))
    }

    /// Placements for the player to move in row-major order, or the single
    /// pass action when there are none.
    pub fn legal_actions(&self) -> Vec<OthelloAction> {
        let actions: Vec<OthelloAction> = self
            .board
            .placements(self.to_move)
            .map(|square| OthelloAction::place(square, self.to_move))
            .collect();

        if actions.is_empty() {
            vec![OthelloAction::pass(self.to_move)]
        } else {
            actions
        }
    }

    /// Plays `action` and returns the resulting state. `self` is unchanged.
    ///
    /// # Errors
    /// - `WrongMover` if the action belongs to the player not on move.
    /// - `IllegalPlacement` if the target is occupied or flips nothing.
    /// - `PassNotAllowed` if the mover still has a placement.
    pub fn apply(&self, action: &OthelloAction) -> Result<OthelloState, RulesError> {
        if action.player != self.to_move {
            return Err(RulesError::WrongMover { expected: self.to_move, found: action.player });
        }

        let mut board = self.board;
        match action.mv {
            Move::Pass => {
                if self.board.count_placements(self.to_move) != 0 {
                    return Err(RulesError::PassNotAllowed { player: self.to_move });
                }
            }
            Move::Place(square) => {
                if !self.board.is_placement(square, self.to_move) {
                    return Err(RulesError::IllegalPlacement { square });
                }
                board.place(square, self.to_move);
            }
        }

        Ok(Self::from_parts(board, self.to_move.opponent()))
    }

    /// Whether the game is over: the board is full or neither side can place.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.evaluate_terminal().is_some()
    }

    /// The result once the game is over, comparing piece counts.
    pub fn evaluate_terminal(&self) -> Option<GameResult> {
        *self.outcome.get_or_init(|| {
            let ended = self.board.is_full()
                || (self.board.count_placements(self.to_move) == 0
                    && self.board.count_placements(self.to_move.opponent()) == 0);

            if !ended {
                return None;
            }

            let (black, white) = self.score();
            Some(match black.cmp(&white) {
                std::cmp::Ordering::Greater => Outcome::Winner(Player::Black),
                std::cmp::Ordering::Less => Outcome::Winner(Player::White),
                std::cmp::Ordering::Equal => Outcome::Draw,
            })
        })
    }
}

impl Default for OthelloState {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for OthelloState {
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board && self.to_move == other.to_move
    }
}

impl Eq for OthelloState {}

impl Game for OthelloState {
    type Action = OthelloAction;
    type Player = Player;
    type Error = RulesError;

    fn initial() -> Self {
        Self::new()
    }

    fn player_to_move(&self) -> Player {
        self.to_move
    }

    fn legal_actions(&self) -> Vec<OthelloAction> {
        OthelloState::legal_actions(self)
    }

    fn apply(&self, action: &OthelloAction) -> Result<Self, RulesError> {
        OthelloState::apply(self, action)
    }

    fn outcome(&self) -> Option<GameResult> {
        self.evaluate_terminal()
    }
}

/// Text form: the 64-character board, a space, then `b` or `w` for the
/// side to move.
impl fmt::Display for OthelloState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.board.encode(), self.to_move.symbol())
    }
}

impl FromStr for OthelloState {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (board, mover) = s.trim().split_once(' ').ok_or_else(|| RulesError::InvalidEncoding {
            message: "missing side to move".to_string(),
        })?;

        let mut mover_chars = mover.chars();
        let to_move = match (mover_chars.next().and_then(Player::from_symbol), mover_chars.next()) {
            (Some(player), None) => player,
            _ => {
                return Err(RulesError::InvalidEncoding {
                    message: format!("invalid side to move '{}'", mover),
                })
            }
        };

        Ok(Self::from_parts(board.parse()?, to_move))
    }
}

impl TryFrom<String> for OthelloState {
    type Error = RulesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OthelloState> for String {
    fn from(state: OthelloState) -> Self {
        state.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Piece;

    fn sq(row: usize, col: usize) -> Square {
        Square::new(row, col).unwrap()
    }

    /// Fills all 64 cells, giving `minority` every `period`-th cell in scan
    /// order and `majority` the rest.
    fn patterned(majority: Player, minority: Player, period: usize) -> OthelloState {
        let mut board = Board::empty();
        for (i, s) in Square::all().enumerate() {
            let owner = if i % period == 0 { minority } else { majority };
            board.set(s, Piece::from(owner));
        }
        OthelloState::from_parts(board, Player::Black)
    }

    #[test]
    fn test_initial_state() {
        let state = OthelloState::new();
        let (black, white) = state.score();

        assert_eq!(state.player_to_move(), Player::Black);
        assert_eq!((black, white), (2, 2));
        assert_eq!(state.board().empty_count(), 60);
        assert!(!state.is_terminal());
        assert_eq!(state.evaluate_terminal(), None);
    }

    #[test]
    fn test_initial_legal_actions() {
        let actions = OthelloState::new().legal_actions();

        assert_eq!(actions.len(), 4);
        assert!(actions.iter().all(|a| !a.is_pass()));
        assert!(actions.iter().all(|a| a.player() == Player::Black));
        assert_eq!(actions[0].square(), Some(sq(2, 3)));
    }

    #[test]
    fn test_apply_produces_new_state() -> Result<(), RulesError> {
        let state = OthelloState::new();
        let before = state.clone();

        let next = state.apply(&OthelloAction::place(sq(2, 3), Player::Black))?;

        assert_eq!(state, before);
        assert_eq!(state.board().encode(), before.board().encode());
        assert_eq!(state.board().get(sq(2, 3)), Piece::Empty);

        assert_eq!(next.player_to_move(), Player::White);
        assert_eq!(next.board().get(sq(2, 3)), Piece::Black);
        assert_eq!(next.board().get(sq(3, 3)), Piece::Black);
        assert_eq!(next.score(), (4, 1));
        Ok(())
    }

    #[test]
    fn test_wrong_mover() {
        let state = OthelloState::new();
        let result = state.apply(&OthelloAction::place(sq(2, 4), Player::White));

        assert_eq!(
            result,
            Err(RulesError::WrongMover { expected: Player::Black, found: Player::White })
        );
    }

    #[test]
    fn test_occupied_cell() {
        let state = OthelloState::new();
        let result = state.apply(&OthelloAction::place(sq(3, 3), Player::Black));

        assert_eq!(result, Err(RulesError::IllegalPlacement { square: sq(3, 3) }));
    }

    #[test]
    fn test_non_bracketing_cell() {
        let state = OthelloState::new();
        let result = state.apply(&OthelloAction::place(sq(0, 0), Player::Black));

        assert!(matches!(result, Err(RulesError::IllegalPlacement { .. })));
    }

    #[test]
    fn test_out_of_bounds_target() {
        assert_eq!(Square::new(9, 9), Err(RulesError::OutOfBounds { row: 9, col: 9 }));
    }

    #[test]
    fn test_forced_pass() -> Result<(), RulesError> {
        // Black cannot bracket the corner white piece; white can take (0, 2).
        let state: OthelloState = format!("wb{} b", ".".repeat(62)).parse()?;

        let actions = state.legal_actions();
        assert_eq!(actions.len(), 1);
        assert!(actions[0].is_pass());
        assert_eq!(state.board().count_placements(Player::Black), 0);
        assert_eq!(state.board().count_placements(Player::White), 1);
        assert!(!state.is_terminal());

        let next = state.apply(&actions[0])?;
        assert_eq!(next.board(), state.board());
        assert_eq!(next.player_to_move(), Player::White);
        assert_eq!(next.legal_actions(), vec![OthelloAction::place(sq(0, 2), Player::White)]);
        Ok(())
    }

    #[test]
    fn test_pass_not_allowed_with_moves() {
        let state = OthelloState::new();
        let pass = OthelloAction::pass(Player::Black);

        assert_eq!(state.apply(&pass), Err(RulesError::PassNotAllowed { player: Player::Black }));
    }

    #[test]
    fn test_both_players_stuck_is_terminal() -> Result<(), RulesError> {
        let state: OthelloState = format!("b{} w", ".".repeat(63)).parse()?;

        assert_eq!(state.board().count_placements(Player::White), 0);
        assert_eq!(state.board().count_placements(Player::Black), 0);
        assert!(state.is_terminal());
        assert_eq!(state.evaluate_terminal(), Some(Outcome::Winner(Player::Black)));

        let actions = state.legal_actions();
        assert_eq!(actions.len(), 1);
        assert!(actions[0].is_pass());
        Ok(())
    }

    #[test]
    fn test_full_board_draw() {
        let state = patterned(Player::Black, Player::White, 2);

        assert_eq!(state.score(), (32, 32));
        assert!(state.is_terminal());
        assert_eq!(state.evaluate_terminal(), Some(Outcome::Draw));
    }

    #[test]
    fn test_full_board_majority_wins() {
        let state = patterned(Player::Black, Player::White, 3);
        assert_eq!(state.score(), (42, 22));
        assert_eq!(state.evaluate_terminal(), Some(Outcome::Winner(Player::Black)));

        let state = patterned(Player::White, Player::Black, 3);
        assert_eq!(state.evaluate_terminal(), Some(Outcome::Winner(Player::White)));
    }

    #[test]
    fn test_cell_total_is_constant() -> Result<(), RulesError> {
        let mut state = OthelloState::new();

        while !state.is_terminal() {
            let (black, white) = state.score();
            assert_eq!(black + white + state.board().empty_count(), 64);

            let actions = state.legal_actions();
            if actions.len() > 1 {
                assert!(actions.iter().all(|a| !a.is_pass()));
            }
            state = state.apply(&actions[actions.len() / 2])?;
        }

        let (black, white) = state.score();
        assert_eq!(black + white + state.board().empty_count(), 64);
        Ok(())
    }

    #[test]
    fn test_text_round_trip() -> Result<(), RulesError> {
        let state = OthelloState::new()
            .apply(&OthelloAction::place(sq(2, 3), Player::Black))?;

        let text = state.to_string();
        assert!(text.ends_with(" w"));

        let decoded: OthelloState = text.parse()?;
        assert_eq!(decoded, state);
        assert_eq!(decoded.player_to_move(), Player::White);
        Ok(())
    }

    #[test]
    fn test_text_rejects_missing_mover() {
        let board = Board::initial().encode();

        assert!(board.parse::<OthelloState>().is_err());
        assert!(format!("{} x", board).parse::<OthelloState>().is_err());
        assert!(format!("{} bw", board).parse::<OthelloState>().is_err());
    }

    #[test]
    fn test_serde_uses_text_form() {
        let state = OthelloState::new();
        let value = toml::Value::try_from(&Wrapper { state: state.clone() }).unwrap();

        assert_eq!(
            value.get("state").and_then(|v| v.as_str()),
            Some(state.to_string().as_str())
        );

        let back: Wrapper = value.try_into().unwrap();
        assert_eq!(back.state, state);
    }

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        state: OthelloState,
    }
}
