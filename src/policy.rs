//! Rollout policies used to play simulations to the end of the game.

use std::fmt;
use std::str::FromStr;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{evaluate, EvaluationWeights, Game, OthelloAction, OthelloState};

/// Picks the next action during a rollout.
///
/// Returns `None` only when `state` has no legal action.
pub trait RolloutPolicy<G: Game> {
    fn select(&self, state: &G, rng: &mut dyn RngCore) -> Option<G::Action>;
}

/// Uniformly random choice among the legal actions.
///
/// A lone legal action is returned without drawing from `rng`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UniformRandom;

impl<G: Game> RolloutPolicy<G> for UniformRandom {
    fn select(&self, state: &G, rng: &mut dyn RngCore) -> Option<G::Action> {
        let mut actions = state.legal_actions();

        match actions.len() {
            0 => None,
            1 => actions.pop(),
            n => Some(actions.swap_remove(rng.random_range(0..n))),
        }
    }
}

/// One-ply lookahead: plays each legal action on a copy of the state and
/// keeps the one whose successor has the highest [`evaluate`] score, i.e.
/// scored for the successor's player to move. Ties go to the first action
/// in scan order.
///
/// Returns `None` if the rules engine rejects one of its own legal actions;
/// the search then stops with an error instead of skipping the action.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GreedyHeuristic {
    pub weights: EvaluationWeights,
}

impl GreedyHeuristic {
    pub fn new(weights: EvaluationWeights) -> Self {
        GreedyHeuristic { weights }
    }
}

impl RolloutPolicy<OthelloState> for GreedyHeuristic {
    fn select(&self, state: &OthelloState, _rng: &mut dyn RngCore) -> Option<OthelloAction> {
        let mut actions = state.legal_actions();
        if actions.len() <= 1 {
            return actions.pop();
        }

        let mut best: Option<(OthelloAction, f64)> = None;
        for action in actions {
            let next = match state.apply(&action) {
                Ok(next) => next,
                Err(err) => {
                    error!(%action, %err, "rules engine rejected its own legal action");
                    debug_assert!(false, "legal action {action} rejected: {err}");
                    return None;
                }
            };
            let score = evaluate(&next, &self.weights);

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((action, score));
            }
        }
        best.map(|(action, _)| action)
    }
}

/// The rollout policies behind the difficulty levels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OthelloRollout {
    Random(UniformRandom),
    Greedy(GreedyHeuristic),
}

impl RolloutPolicy<OthelloState> for OthelloRollout {
    #[inline]
    fn select(&self, state: &OthelloState, rng: &mut dyn RngCore) -> Option<OthelloAction> {
        match self {
            OthelloRollout::Random(policy) => policy.select(state, rng),
            OthelloRollout::Greedy(policy) => policy.select(state, rng),
        }
    }
}

/// Human-facing difficulty labels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Uniformly random rollouts.
    #[default]
    Easy,
    /// Greedy rollouts with [`EvaluationWeights::MEDIUM`].
    Medium,
    /// Greedy rollouts with [`EvaluationWeights::HARD`].
    Hard,
}

impl Difficulty {
    /// Heuristic weights for this level, `None` for random rollouts.
    pub fn weights(self) -> Option<EvaluationWeights> {
        match self {
            Difficulty::Easy => None,
            Difficulty::Medium => Some(EvaluationWeights::MEDIUM),
            Difficulty::Hard => Some(EvaluationWeights::HARD),
        }
    }

    pub fn rollout_policy(self) -> OthelloRollout {
        match self.weights() {
            Some(weights) => OthelloRollout::Greedy(GreedyHeuristic::new(weights)),
            None => OthelloRollout::Random(UniformRandom),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        })
    }
}

/// Error returned when a difficulty label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty '{0}', expected easy, medium or hard")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(UnknownDifficulty(s.to_string())),
        }
    }
}
