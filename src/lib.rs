//! An Othello (Reversi) rules engine with a Monte Carlo Tree Search (MCTS)
//! opponent.
//!
//! The search is generic over the [`Game`] trait; [`OthelloState`] is the
//! concrete game shipped here. Rollouts are played by a [`RolloutPolicy`],
//! either uniformly random or greedy over a weighted static evaluation.
//!
//! # Modules
//! - `board`: 10x10 sentinel board, bracket search and flips.
//! - `othello`: game state, actions and rule checks.
//! - `game`: the game abstraction consumed by the search.
//! - `evaluation`: parity, mobility, corner and frontier heuristics.
//! - `policy`: rollout policies and difficulty presets.
//! - `tree`: arena tree used by MCTS.
//! - `mcts`: the search driver.
//! - `config`: settings file and environment overrides.
//! - `utils`: general utility functions.
//! - `test_utils`: a tiny mock game for testing the search.
//!
//! # Examples
//! ```rust
//! use othello_mcts::{search, Difficulty, MctsError, OthelloState, RulesError};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! fn main() -> Result<(), MctsError<RulesError>> {
//!     let mut state = OthelloState::new();
//!     let policy = Difficulty::Medium.rollout_policy();
//!     let mut rng = ChaCha20Rng::seed_from_u64(1);
//!
//!     // Let the computer play both sides for a few moves
//!     for _ in 0..4 {
//!         let action = search(&state, &policy, 30, &mut rng)?;
//!         state = state.apply(&action).map_err(MctsError::Game)?;
//!     }
//!
//!     let (black, white) = state.score();
//!     assert_eq!(black + white, 8);
//!     println!("{state}");
//!     Ok(())
//! }
//! ```

mod board;
mod evaluation;
mod game;
mod mcts;
mod othello;
mod policy;
mod tree;
pub mod config;
pub mod utils;

#[doc(hidden)]
pub mod test_utils;

pub use board::*;
pub use config::{load_settings, ConfigError, Settings};
pub use evaluation::*;
pub use game::*;
pub use mcts::*;
pub use othello::*;
pub use policy::*;
pub use tree::*;
