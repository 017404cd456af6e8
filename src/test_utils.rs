//! Test utilities for the search and policy modules

use thiserror::Error;

use crate::{Game, Outcome};

/// Error raised by [`GameTest`] for an action outside `0..4` or already played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameTestError {
    #[error("action {0} is not available")]
    IllegalAction(usize),
}

/// A tiny two-player game: the numbers `0..4` are picked in turn, each once.
///
/// Player `0` makes the moves at positions 0 and 2, player `1` at 1 and 3.
/// Whoever picked the larger total wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameTest {
    state: Vec<usize>,
}

impl GameTest {
    /// Replays `actions` from the empty game.
    pub fn from_actions(actions: &[usize]) -> Result<Self, GameTestError> {
        actions
            .iter()
            .try_fold(GameTest::default(), |game, action| game.apply(action))
    }
}

impl Game for GameTest {
    type Action = usize;
    type Player = u8;
    type Error = GameTestError;

    fn initial() -> Self {
        GameTest::default()
    }

    fn player_to_move(&self) -> u8 {
        (self.state.len() % 2) as u8
    }

    fn legal_actions(&self) -> Vec<usize> {
        (0..4).filter(|action| !self.state.contains(action)).collect()
    }

    fn apply(&self, action: &usize) -> Result<Self, GameTestError> {
        if *action >= 4 || self.state.contains(action) {
            return Err(GameTestError::IllegalAction(*action));
        }

        let mut state = self.state.clone();
        state.push(*action);
        Ok(GameTest { state })
    }

    fn outcome(&self) -> Option<Outcome<u8>> {
        if self.state.len() != 4 {
            return None;
        }

        let first = (self.state[0] + self.state[2]) as i64;
        let second = (self.state[1] + self.state[3]) as i64;

        Some(match first.cmp(&second) {
            std::cmp::Ordering::Greater => Outcome::Winner(0),
            std::cmp::Ordering::Less => Outcome::Winner(1),
            std::cmp::Ordering::Equal => Outcome::Draw,
        })
    }
}

/// Compares two floats with a `1e-8` tolerance.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-8
}
