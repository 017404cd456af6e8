use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// How to choose among equally scored candidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep the first candidate in iteration order.
    #[default]
    FirstFound,
    /// Pick uniformly among the tied candidates.
    Random,
}

/// Returns the position of the highest score.
///
/// Scores are compared with `total_cmp`. With [`TieBreak::Random`] each
/// tied maximum is kept with equal probability (reservoir sampling), so
/// `rng` is only drawn from when a tie actually occurs.
///
/// # Returns
/// `None` if `scores` is empty.
pub fn argmax<I>(scores: I, tie_break: TieBreak, rng: &mut dyn RngCore) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;
    let mut ties = 0u32;

    for (index, score) in scores.into_iter().enumerate() {
        match best {
            Some((_, best_score)) if score.total_cmp(&best_score).is_lt() => {}
            Some((_, best_score)) if score.total_cmp(&best_score).is_eq() => {
                if tie_break == TieBreak::Random {
                    ties += 1;
                    if rng.random_range(0..=ties) == 0 {
                        best = Some((index, score));
                    }
                }
            }
            _ => {
                best = Some((index, score));
                ties = 0;
            }
        }
    }

    best.map(|(index, _)| index)
}
