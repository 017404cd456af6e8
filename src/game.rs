//! Module defining the game abstraction used by MCTS.

use std::fmt::Debug;

/// Final result of a finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome<P> {
    /// The given player won.
    Winner(P),
    Draw,
}

impl<P: PartialEq> Outcome<P> {
    /// Score representing a victory for the evaluated player.
    pub const VICTORY_SCORE: f64 = 1.0;
    /// Score representing a defeat for the evaluated player.
    pub const DEFEAT_SCORE: f64 = -1.0;
    /// Score representing a draw.
    pub const EQUALITY_SCORE: f64 = 0.0;

    /// The outcome scored from `player`'s point of view.
    ///
    /// # Examples
    /// ```rust
    /// use othello_mcts::Outcome;
    /// assert_eq!(Outcome::Winner(1u8).value_for(&1), 1.0);
    /// assert_eq!(Outcome::Winner(1u8).value_for(&0), -1.0);
    /// assert_eq!(Outcome::<u8>::Draw.value_for(&0), 0.0);
    /// ```
    #[inline]
    pub fn value_for(&self, player: &P) -> f64 {
        match self {
            Outcome::Winner(winner) if winner == player => Self::VICTORY_SCORE,
            Outcome::Winner(_) => Self::DEFEAT_SCORE,
            Outcome::Draw => Self::EQUALITY_SCORE,
        }
    }
}

/// Trait defining the interface for a two-player, zero-sum game that can be
/// searched with MCTS.
///
/// States have value semantics: [`Game::apply`] returns a new state and
/// leaves `self` untouched, so search branches never share mutable storage.
pub trait Game: Clone {
    /// A move, including any engine-synthesised pass.
    type Action: Clone + PartialEq + Debug;
    /// Identifies the side to move.
    type Player: Copy + Eq + Debug;
    /// Raised when an action violates the rules.
    type Error: std::error::Error;

    /// Creates the starting state of a fresh game.
    ///
    /// # Examples
    /// ```rust
    /// use othello_mcts::Game;
    /// use othello_mcts::test_utils::GameTest;
    /// let game = GameTest::initial();
    /// assert!(!game.is_terminal());
    /// ```
    fn initial() -> Self;

    /// The side whose turn it is.
    fn player_to_move(&self) -> Self::Player;

    /// Every action available to the player to move, in a fixed
    /// deterministic order. Never empty for a non-terminal state.
    ///
    /// # Examples
    /// ```rust
    /// use othello_mcts::Game;
    /// use othello_mcts::test_utils::GameTest;
    /// let game = GameTest::initial();
    /// assert_eq!(game.legal_actions(), vec![0, 1, 2, 3]);
    /// ```
    fn legal_actions(&self) -> Vec<Self::Action>;

    /// Produces the state reached by playing `action`.
    ///
    /// # Errors
    /// Returns the game's error when `action` is not legal for this state.
    /// Implementations must not correct or reinterpret illegal input.
    fn apply(&self, action: &Self::Action) -> Result<Self, Self::Error>;

    /// The result of the game, or `None` while it is still in progress.
    fn outcome(&self) -> Option<Outcome<Self::Player>>;

    /// Whether the game is over.
    #[inline]
    fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }
}
