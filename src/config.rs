//! Settings loading.
//!
//! Settings come from a TOML file, then environment variables override
//! individual fields. Lookup order for the file:
//! 1. Path given by `OTHELLO_MCTS_CONFIG`
//! 2. `othello.toml` in the search directory
//! 3. Built-in defaults
//!
//! ```toml
//! iterations = 2000
//! difficulty = "hard"
//! exploration_coef = 1.0
//! tie_break = "random"
//! seed = 7
//!
//! [weights]
//! parity = 10.0
//! mobility = 10.0
//! corners = 70.0
//! frontier = 10.0
//! ```

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::utils::TieBreak;
use crate::{Difficulty, EvaluationWeights, GreedyHeuristic, MctsConfig, OthelloRollout};

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "OTHELLO_MCTS_CONFIG";
/// File name searched for when `CONFIG_ENV` is unset.
pub const CONFIG_FILE: &str = "othello.toml";

pub const ITERATIONS_ENV: &str = "OTHELLO_MCTS_ITERATIONS";
pub const DIFFICULTY_ENV: &str = "OTHELLO_MCTS_DIFFICULTY";
pub const EXPLORATION_ENV: &str = "OTHELLO_MCTS_EXPLORATION";
pub const SEED_ENV: &str = "OTHELLO_MCTS_SEED";

/// Iterations per AI move when nothing else is configured.
pub const DEFAULT_ITERATIONS: u32 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidOverride {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// User-facing knobs for the AI opponent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Simulations per AI move.
    pub iterations: u32,
    pub difficulty: Difficulty,
    /// UCB exploration constant.
    pub exploration_coef: f64,
    pub tie_break: TieBreak,
    /// Fixed seed for reproducible play; entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Replaces the preset weights of the medium and hard levels.
    pub weights: Option<EvaluationWeights>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            iterations: DEFAULT_ITERATIONS,
            difficulty: Difficulty::default(),
            exploration_coef: MctsConfig::DEFAULT.exploration_coef,
            tie_break: MctsConfig::DEFAULT.tie_break,
            seed: None,
            weights: None,
        }
    }
}

impl Settings {
    /// Parses and validates settings from TOML text. Missing fields keep
    /// their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.exploration_coef.is_finite() || self.exploration_coef < 0.0 {
            return Err(ConfigError::Invalid {
                field: "exploration_coef",
                reason: format!("expected a finite non-negative number, got {}", self.exploration_coef),
            });
        }

        if let Some(weights) = &self.weights {
            let all = [weights.parity, weights.mobility, weights.corners, weights.frontier];
            if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(ConfigError::Invalid {
                    field: "weights",
                    reason: "weights must be finite and non-negative".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Search parameters derived from these settings.
    pub fn mcts_config(&self) -> MctsConfig {
        MctsConfig {
            exploration_coef: self.exploration_coef,
            tie_break: self.tie_break,
            ..MctsConfig::DEFAULT
        }
    }

    /// The rollout policy of the configured difficulty, with custom weights
    /// applied to the greedy levels.
    pub fn rollout_policy(&self) -> OthelloRollout {
        match (self.difficulty.weights(), self.weights) {
            (Some(_), Some(custom)) => OthelloRollout::Greedy(GreedyHeuristic::new(custom)),
            _ => self.difficulty.rollout_policy(),
        }
    }

    /// Random source for rollouts and tie-breaks.
    pub fn rng(&self) -> ChaCha20Rng {
        match self.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_rng(&mut rand::rng()),
        }
    }
}

/// Loads settings from a specific file.
pub fn load_from_path(path: &Path) -> Result<Settings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Settings::from_toml_str(&content)
}

/// Loads settings from the process environment and working directory.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("."), |key| std::env::var(key).ok())
}

/// Loads settings, searching `dir` for [`CONFIG_FILE`] and reading
/// variables through `lookup`.
pub fn load_settings_from<F>(dir: &Path, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = None;

    if let Some(path) = lookup(CONFIG_ENV).map(PathBuf::from) {
        if path.exists() {
            info!("Loading settings from {}: {}", CONFIG_ENV, path.display());
            settings = Some(load_from_path(&path)?);
        } else {
            warn!("{}={} not found, searching defaults", CONFIG_ENV, path.display());
        }
    }

    if settings.is_none() {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            info!("Loading settings from {}", path.display());
            settings = Some(load_from_path(&path)?);
        }
    }

    let settings = settings.unwrap_or_else(|| {
        debug!("No {} found, using built-in defaults", CONFIG_FILE);
        Settings::default()
    });

    apply_overrides(settings, lookup)
}

fn parse_override<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::InvalidOverride {
        key,
        reason: e.to_string(),
        value,
    })
}

/// Applies `OTHELLO_MCTS_*` overrides read through `lookup`.
///
/// A value that fails to parse is an error; it is never skipped.
pub fn apply_overrides<F>(mut settings: Settings, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ITERATIONS_ENV) {
        settings.iterations = parse_override(ITERATIONS_ENV, value)?;
    }
    if let Some(value) = lookup(DIFFICULTY_ENV) {
        settings.difficulty = parse_override(DIFFICULTY_ENV, value)?;
    }
    if let Some(value) = lookup(EXPLORATION_ENV) {
        settings.exploration_coef = parse_override(EXPLORATION_ENV, value)?;
    }
    if let Some(value) = lookup(SEED_ENV) {
        settings.seed = Some(parse_override(SEED_ENV, value)?);
    }

    settings.validate()?;
    debug!(?settings, "settings resolved");
    Ok(settings)
}
