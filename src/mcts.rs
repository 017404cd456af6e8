//! Implementation of Monte Carlo Tree Search (MCTS) algorithm.
//!
//! Each iteration walks the tree with an upper-confidence rule, expands one
//! untried action, plays the new position out to the end with a
//! [`RolloutPolicy`], and backpropagates the result. After the budget is
//! spent the most visited root child is chosen (robust child).
//!
//! The driver is generic over [`Game`] and runs on a single thread.

use rand::RngCore;
use thiserror::Error;
use tracing::{debug, trace};

use crate::utils::{argmax, TieBreak};
use crate::{Game, NodeId, Outcome, RolloutPolicy, Tree};

/// Statistics and game position stored in each node of the MCTS tree.
#[derive(Debug)]
struct MctsNodeData<G: Game> {
    /// Position reached at this node.
    state: G,
    /// Action played from the parent, `None` at the root.
    action: Option<G::Action>,
    /// Side to move in `state`; `score` is accumulated from its view.
    player: G::Player,
    /// Actions with no child yet, reversed so `pop` yields scan order.
    untried: Vec<G::Action>,
    /// Sum of simulation results from `player`'s point of view.
    score: f64,
    /// Visit count, incremented during backpropagation.
    n: u32,
    finish: bool,
}

impl<G: Game> MctsNodeData<G> {
    fn new(state: G, action: Option<G::Action>) -> Self {
        let finish = state.is_terminal();
        let untried = if finish {
            Vec::new()
        } else {
            let mut actions = state.legal_actions();
            actions.reverse();
            actions
        };

        MctsNodeData {
            player: state.player_to_move(),
            state,
            action,
            untried,
            score: 0.0,
            n: 0,
            finish,
        }
    }

    /// Mean result per visit, `0.0` before the first visit.
    #[inline]
    fn get_value(&self) -> f64 {
        if self.n != 0 { self.score / self.n as f64 } else { 0.0 }
    }

    #[inline]
    fn add_score(&mut self, score: f64) {
        self.score += score;
        self.n += 1;
    }
}

/// Errors that can occur during MCTS operations.
#[derive(Debug, Error)]
pub enum MctsError<E> {
    /// The root position is already finished; there is nothing to choose.
    #[error("search cannot proceed: the root state is terminal")]
    SearchAlreadyOver,

    /// A non-terminal position reported no legal action.
    #[error("non-terminal state has no legal action")]
    NoLegalActions,

    /// The game rejected an action, either one passed to [`Mcts::play`] or
    /// one produced inside the search by a faulty policy or game.
    #[error("game rejected an action: {0}")]
    Game(#[source] E),
}

/// Scores a child during selection.
///
/// Parameters, in order:
/// - `value`: mean result of the child from the parent mover's point of view.
/// - `n_visits`: visits of the child.
/// - `parent_n_visits`: visits of the parent.
/// - `exploration_coef`: exploration coefficient from `MctsConfig`.
pub type SelectionFunction =
    fn(value: f64, n_visits: f64, parent_n_visits: f64, exploration_coef: f64) -> f64;

/// The standard Upper Confidence Bound 1 (UCB1) selection function:
/// `value + c * sqrt(ln(parent_n) / n)`.
pub fn ucb1(value: f64, n_visits: f64, parent_n_visits: f64, exploration_coef: f64) -> f64 {
    value + exploration_coef * (parent_n_visits.ln() / n_visits).sqrt()
}

/// Configuration parameters for a Monte Carlo Tree Search.
#[derive(Clone, Copy, Debug)]
pub struct MctsConfig {
    /// Weight of the exploration term in the selection score. Larger values
    /// spread visits over rarely tried children.
    pub exploration_coef: f64,
    /// The function used to calculate the selection score for a child node.
    pub selection_function: SelectionFunction,
    /// Resolves equal scores, both during selection and when picking the
    /// final action by visit count.
    pub tie_break: TieBreak,
}

impl MctsConfig {
    /// The default MCTS configuration.
    ///
    /// - `exploration_coef`: `std::f64::consts::SQRT_2`, the usual UCB1 constant.
    /// - `selection_function`: [`ucb1`].
    /// - `tie_break`: [`TieBreak::FirstFound`], which keeps the search
    ///   reproducible for a given random source.
    pub const DEFAULT: MctsConfig = MctsConfig {
        exploration_coef: std::f64::consts::SQRT_2,
        selection_function: ucb1,
        tie_break: TieBreak::FirstFound,
    };
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The Monte Carlo Tree Search driver.
///
/// Holds the search tree rooted at the current game position. The tree can
/// be kept between moves with [`Mcts::play`].
///
/// # Type Parameters
/// - `G`: The game type that implements the `Game` trait.
pub struct Mcts<G: Game> {
    tree: Tree<MctsNodeData<G>>,
    config: MctsConfig,
}

impl<G: Game> Mcts<G> {
    /// Creates a new MCTS instance at the initial position with the default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::from_game(G::initial())
    }

    /// Creates a new MCTS instance rooted at `game` with the default configuration.
    #[inline]
    pub fn from_game(game: G) -> Self {
        Self::from_game_with_config(game, &MctsConfig::DEFAULT)
    }

    /// Creates a new MCTS instance rooted at `game` with a custom configuration.
    #[inline]
    pub fn from_game_with_config(game: G, config: &MctsConfig) -> Self {
        Mcts {
            tree: Tree::new_root(MctsNodeData::new(game, None)),
            config: *config,
        }
    }

    /// The position at the root of the tree.
    pub fn get_game(&self) -> &G {
        &self.root().state
    }

    #[inline]
    fn root(&self) -> &MctsNodeData<G> {
        self.tree.get(self.tree.root())
    }

    /// Whether the root position is finished.
    #[inline]
    pub fn is_finish(&self) -> bool {
        self.root().finish
    }

    /// Number of nodes in the tree.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    /// Selection score of `child` seen from `parent`.
    #[inline]
    fn get_selection_score(&self, parent: &MctsNodeData<G>, child: &MctsNodeData<G>) -> f64 {
        let value = if child.player == parent.player {
            child.get_value()
        } else {
            -child.get_value()
        };

        (self.config.selection_function)(
            value,
            child.n as f64,
            parent.n as f64,
            self.config.exploration_coef,
        )
    }

    /// Performs the selection phase of MCTS
    ///
    /// # Returns
    /// The first node on the tree policy path that is terminal or still has
    /// an untried action.
    fn selection(&self, rng: &mut dyn RngCore) -> NodeId {
        let mut id = self.tree.root();

        loop {
            let data = self.tree.get(id);
            if data.finish || !data.untried.is_empty() {
                return id;
            }

            let children = self.tree.node(id).children();
            let scores = children
                .iter()
                .map(|&child| self.get_selection_score(data, self.tree.get(child)));

            match argmax(scores, self.config.tie_break, rng) {
                Some(index) => id = children[index],
                None => return id,
            }
        }
    }

    /// Performs the expansion phase of MCTS
    ///
    /// # Returns
    /// The new child, or `id` itself when there is nothing left to expand.
    fn expansion(&mut self, id: NodeId) -> Result<NodeId, MctsError<G::Error>> {
        let data = self.tree.get_mut(id);
        let Some(action) = data.untried.pop() else {
            return Ok(id);
        };

        let state = data.state.apply(&action).map_err(MctsError::Game)?;
        let child = self.tree.add_child(id, MctsNodeData::new(state, Some(action)));

        trace!(nodes = self.tree.len(), "expanded node");
        Ok(child)
    }

    /// Performs the simulation phase of MCTS: plays `policy` from the node's
    /// position until the game ends.
    fn simulation(
        &self,
        id: NodeId,
        policy: &dyn RolloutPolicy<G>,
        rng: &mut dyn RngCore,
    ) -> Result<Outcome<G::Player>, MctsError<G::Error>> {
        let mut state = self.tree.get(id).state.clone();

        loop {
            if let Some(outcome) = state.outcome() {
                return Ok(outcome);
            }

            let action = policy.select(&state, rng).ok_or(MctsError::NoLegalActions)?;
            state = state.apply(&action).map_err(MctsError::Game)?;
        }
    }

    /// Performs the backpropagation phase of MCTS
    ///
    /// Every node from `id` up to the root gains one visit and the outcome
    /// scored for its own player to move.
    fn backpropagation(&mut self, id: NodeId, outcome: &Outcome<G::Player>) {
        let path: Vec<NodeId> = self.tree.path_to_root(id).collect();

        for node in path {
            let data = self.tree.get_mut(node);
            data.add_score(outcome.value_for(&data.player));
        }
    }

    /// Performs one full iteration of MCTS (selection, expansion, simulation, backpropagation).
    ///
    /// # Returns
    /// `Err(MctsError::SearchAlreadyOver)` if the root position is finished.
    pub fn iterate(
        &mut self,
        policy: &dyn RolloutPolicy<G>,
        rng: &mut dyn RngCore,
    ) -> Result<(), MctsError<G::Error>> {
        if self.is_finish() {
            return Err(MctsError::SearchAlreadyOver);
        }

        let leaf = self.selection(rng);
        let child = self.expansion(leaf)?;
        let outcome = self.simulation(child, policy, rng)?;
        self.backpropagation(child, &outcome);

        Ok(())
    }

    /// Visit count of the root, i.e. the number of completed iterations
    /// since the tree was rooted here.
    #[inline]
    pub fn count_visit(&self) -> u32 {
        self.root().n
    }

    /// Mean result at the root from the root mover's point of view.
    #[inline]
    pub fn get_score(&self) -> f64 {
        self.root().get_value()
    }

    /// Expanded root actions with their visit counts, in expansion order.
    pub fn get_statistics(&self) -> Vec<(G::Action, u32)> {
        self.tree
            .node(self.tree.root())
            .children()
            .iter()
            .filter_map(|&id| {
                let child = self.tree.get(id);
                child.action.clone().map(|action| (action, child.n))
            })
            .collect()
    }

    /// The root child with the highest visit count.
    ///
    /// Before any child exists the first legal action is returned.
    ///
    /// # Returns
    /// `None` if the root position is finished.
    pub fn best_action(&self, rng: &mut dyn RngCore) -> Option<G::Action> {
        if self.is_finish() {
            return None;
        }

        let statistics = self.get_statistics();
        match argmax(statistics.iter().map(|(_, n)| *n as f64), self.config.tie_break, rng) {
            Some(index) => Some(statistics[index].0.clone()),
            None => self.get_game().legal_actions().into_iter().next(),
        }
    }

    /// Plays `action` at the root and keeps the matching subtree, if any.
    ///
    /// # Returns
    /// - `Err(MctsError::SearchAlreadyOver)` if the root position is finished.
    /// - `Err(MctsError::Game(_))` if the game rejects `action`.
    pub fn play(&mut self, action: &G::Action) -> Result<(), MctsError<G::Error>> {
        if self.is_finish() {
            return Err(MctsError::SearchAlreadyOver);
        }

        let root = self.tree.root();
        let existing = self
            .tree
            .node(root)
            .children()
            .iter()
            .copied()
            .find(|&id| self.tree.get(id).action.as_ref() == Some(action));

        match existing {
            Some(child) => {
                self.tree.reroot(child);
                let root = self.tree.root();
                self.tree.get_mut(root).action = None;
            }
            None => {
                let state = self.get_game().apply(action).map_err(MctsError::Game)?;
                self.tree = Tree::new_root(MctsNodeData::new(state, None));
            }
        }

        Ok(())
    }
}

impl<G: Game> Default for Mcts<G> {
    fn default() -> Self {
        Self::new()
    }
}

/// Chooses an action for the player to move in `state` with the default
/// configuration. See [`search_with_config`].
pub fn search<G: Game>(
    state: &G,
    policy: &dyn RolloutPolicy<G>,
    iteration_budget: u32,
    rng: &mut dyn RngCore,
) -> Result<G::Action, MctsError<G::Error>> {
    search_with_config(state, policy, iteration_budget, &MctsConfig::DEFAULT, rng)
}

/// Runs `iteration_budget` simulations from `state` and returns the most
/// visited root action.
///
/// A position with a single legal action (a forced pass included) returns
/// it at once, whatever the budget.
///
/// # Errors
/// - `MctsError::SearchAlreadyOver` if `state` is terminal.
/// - `MctsError::NoLegalActions` if a non-terminal state offers no action.
///
/// # Examples
/// ```rust
/// use othello_mcts::{search, Difficulty, OthelloState};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha20Rng;
///
/// let state = OthelloState::new();
/// let policy = Difficulty::Easy.rollout_policy();
/// let mut rng = ChaCha20Rng::seed_from_u64(42);
///
/// let action = search(&state, &policy, 50, &mut rng).unwrap();
/// assert!(state.legal_actions().contains(&action));
/// ```
pub fn search_with_config<G: Game>(
    state: &G,
    policy: &dyn RolloutPolicy<G>,
    iteration_budget: u32,
    config: &MctsConfig,
    rng: &mut dyn RngCore,
) -> Result<G::Action, MctsError<G::Error>> {
    if state.is_terminal() {
        return Err(MctsError::SearchAlreadyOver);
    }

    let mut actions = state.legal_actions();
    if actions.len() == 1 {
        debug!(action = ?actions[0], "single legal action, skipping search");
        return Ok(actions.swap_remove(0));
    }

    let mut mcts = Mcts::from_game_with_config(state.clone(), config);
    for _ in 0..iteration_budget {
        mcts.iterate(policy, rng)?;
    }

    let action = mcts.best_action(rng).ok_or(MctsError::NoLegalActions)?;
    debug!(
        iterations = iteration_budget,
        nodes = mcts.node_count(),
        root_score = mcts.get_score(),
        action = ?action,
        "search finished"
    );
    Ok(action)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::test_utils::{GameTest, GameTestError};
    use crate::{Difficulty, OthelloAction, OthelloState, Player, RulesError, UniformRandom};

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(42)
    }

    #[test]
    fn test_ucb1() {
        assert_eq!(ucb1(0.5, 3.0, 1.0, 2.0), 0.5);
        let score = ucb1(0.0, 1.0, std::f64::consts::E, 2.0);
        assert!((score - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_iteration_empty() -> Result<(), MctsError<GameTestError>> {
        let mut mcts = Mcts::<GameTest>::new();
        mcts.iterate(&UniformRandom, &mut rng())?;

        assert_eq!(mcts.count_visit(), 1);
        assert_eq!(mcts.node_count(), 2);
        assert_eq!(mcts.get_statistics(), vec![(0, 1)]);
        assert!(!mcts.is_finish());
        Ok(())
    }

    #[test]
    fn test_expansion_follows_scan_order() -> Result<(), MctsError<GameTestError>> {
        let mut mcts = Mcts::<GameTest>::new();
        let mut rng = rng();

        for _ in 0..4 {
            mcts.iterate(&UniformRandom, &mut rng)?;
        }

        assert_eq!(mcts.get_statistics(), vec![(0, 1), (1, 1), (2, 1), (3, 1)]);
        assert_eq!(mcts.count_visit(), 4);
        Ok(())
    }

    #[test]
    fn test_prefers_winning_action() -> Result<(), MctsError<GameTestError>> {
        // First player to move: 2 wins, 0 only draws.
        let game = GameTest::from_actions(&[3, 1]).map_err(MctsError::Game)?;
        let mut mcts = Mcts::from_game(game.clone());
        let mut rng = rng();

        for _ in 0..50 {
            mcts.iterate(&UniformRandom, &mut rng)?;
        }

        let stats = mcts.get_statistics();
        assert_eq!(stats.len(), 2);
        assert!(stats[1].1 > stats[0].1);
        assert_eq!(mcts.best_action(&mut rng), Some(2));
        assert!(mcts.get_score() > 0.5);

        assert_eq!(search(&game, &UniformRandom, 50, &mut rng)?, 2);
        Ok(())
    }

    #[test]
    fn test_avoids_losing_action() -> Result<(), MctsError<GameTestError>> {
        // Second player to move: 3 wins for them, 0 loses.
        let game = GameTest::from_actions(&[2, 1, 3]).map_err(MctsError::Game)?;
        assert_eq!(game.legal_actions(), vec![0]);
        assert_eq!(search(&game, &UniformRandom, 10, &mut rng())?, 0);

        let game = GameTest::from_actions(&[2]).map_err(MctsError::Game)?;
        let action = search(&game, &UniformRandom, 200, &mut rng())?;
        assert_eq!(action, 3);
        Ok(())
    }

    #[test]
    fn test_single_action_short_circuit() -> Result<(), MctsError<GameTestError>> {
        let game = GameTest::from_actions(&[3, 1, 2]).map_err(MctsError::Game)?;

        assert_eq!(search(&game, &UniformRandom, 0, &mut rng())?, 0);
        assert_eq!(search(&game, &UniformRandom, 100, &mut rng())?, 0);
        Ok(())
    }

    #[test]
    fn test_terminal_root_fails_fast() -> Result<(), GameTestError> {
        let game = GameTest::from_actions(&[0, 1, 2, 3])?;

        assert!(matches!(
            search(&game, &UniformRandom, 10, &mut rng()),
            Err(MctsError::SearchAlreadyOver)
        ));

        let mut mcts = Mcts::from_game(game);
        assert!(mcts.is_finish());
        assert!(matches!(
            mcts.iterate(&UniformRandom, &mut rng()),
            Err(MctsError::SearchAlreadyOver)
        ));
        assert_eq!(mcts.best_action(&mut rng()), None);
        Ok(())
    }

    #[test]
    fn test_zero_budget_returns_first_action() -> Result<(), MctsError<GameTestError>> {
        assert_eq!(search(&GameTest::initial(), &UniformRandom, 0, &mut rng())?, 0);
        Ok(())
    }

    #[test]
    fn test_root_visits_match_iterations() -> Result<(), MctsError<GameTestError>> {
        let mut mcts = Mcts::<GameTest>::new();
        let mut rng = rng();

        assert_eq!(mcts.count_visit(), 0);
        for _ in 0..25 {
            mcts.iterate(&UniformRandom, &mut rng)?;
        }

        assert_eq!(mcts.count_visit(), 25);
        let child_visits: u32 = mcts.get_statistics().iter().map(|(_, n)| n).sum();
        assert_eq!(child_visits, 25);
        Ok(())
    }

    #[test]
    fn test_exhausted_tree_keeps_iterating() -> Result<(), MctsError<GameTestError>> {
        // 4! = 24 leaves; iterating past that only revisits terminal nodes.
        let mut mcts = Mcts::<GameTest>::new();
        let mut rng = rng();

        for _ in 0..200 {
            mcts.iterate(&UniformRandom, &mut rng)?;
        }

        assert!(mcts.node_count() <= 1 + 4 + 12 + 24 + 24);
        assert_eq!(mcts.count_visit(), 200);
        Ok(())
    }

    #[test]
    fn test_play_and_count_visit() -> Result<(), MctsError<GameTestError>> {
        let mut mcts = Mcts::<GameTest>::new();
        let mut rng = rng();

        for _ in 0..12 {
            mcts.iterate(&UniformRandom, &mut rng)?;
        }

        let visits = mcts
            .get_statistics()
            .into_iter()
            .find(|(action, _)| *action == 3)
            .map(|(_, n)| n)
            .unwrap_or(0);
        assert!(visits > 0);

        mcts.play(&3)?;
        assert_eq!(mcts.count_visit(), visits);
        assert_eq!(mcts.get_game().legal_actions(), vec![0, 1, 2]);
        assert_eq!(mcts.get_game().player_to_move(), 1);

        mcts.iterate(&UniformRandom, &mut rng)?;
        assert_eq!(mcts.count_visit(), visits + 1);
        Ok(())
    }

    #[test]
    fn test_play_empty() -> Result<(), MctsError<GameTestError>> {
        let mut mcts = Mcts::<GameTest>::new();

        mcts.play(&2)?;
        assert_eq!(mcts.count_visit(), 0);
        assert_eq!(mcts.node_count(), 1);
        assert_eq!(mcts.get_game().legal_actions(), vec![0, 1, 3]);
        Ok(())
    }

    #[test]
    fn test_play_illegal_action() {
        let mut mcts = Mcts::<GameTest>::new();

        assert!(matches!(
            mcts.play(&7),
            Err(MctsError::Game(GameTestError::IllegalAction(7)))
        ));
    }

    #[test]
    fn test_random_tie_break() -> Result<(), MctsError<GameTestError>> {
        // Four iterations visit each root child once, so the final choice is
        // a four-way tie on visit counts.
        let game = GameTest::initial();
        let legal = game.legal_actions();

        let random = MctsConfig { tie_break: TieBreak::Random, ..MctsConfig::DEFAULT };
        let mut chosen = Vec::new();
        for seed in 0..32 {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let action = search_with_config(&game, &UniformRandom, 4, &random, &mut rng)?;
            assert!(legal.contains(&action));
            if !chosen.contains(&action) {
                chosen.push(action);
            }
        }
        assert!(chosen.len() > 1);

        for seed in 0..8 {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            assert_eq!(search(&game, &UniformRandom, 4, &mut rng)?, 0);
        }
        Ok(())
    }

    /// Gives up on every position, as the greedy policy does when the rules
    /// engine rejects one of its own actions.
    struct GivesUp;

    impl RolloutPolicy<GameTest> for GivesUp {
        fn select(&self, _state: &GameTest, _rng: &mut dyn RngCore) -> Option<usize> {
            None
        }
    }

    #[test]
    fn test_policy_without_action_fails_the_search() {
        assert!(matches!(
            search(&GameTest::initial(), &GivesUp, 3, &mut rng()),
            Err(MctsError::NoLegalActions)
        ));

        // A forced action never reaches the rollout.
        let game = GameTest::from_actions(&[3, 1, 2]).unwrap();
        assert_eq!(search(&game, &GivesUp, 3, &mut rng()).unwrap(), 0);
    }

    #[test]
    fn test_othello_search_returns_legal_action() -> Result<(), MctsError<RulesError>> {
        let state = OthelloState::new();
        let legal = state.legal_actions();
        let policy = Difficulty::Easy.rollout_policy();
        let mut rng = rng();

        for _ in 0..3 {
            let action = search(&state, &policy, 20, &mut rng)?;
            assert!(legal.contains(&action));
        }
        Ok(())
    }

    #[test]
    fn test_othello_search_is_reproducible() -> Result<(), MctsError<RulesError>> {
        let state = OthelloState::new();
        let policy = Difficulty::Medium.rollout_policy();

        let first = search(&state, &policy, 12, &mut ChaCha20Rng::seed_from_u64(9))?;
        let second = search(&state, &policy, 12, &mut ChaCha20Rng::seed_from_u64(9))?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_othello_search_leaves_state_untouched() -> Result<(), MctsError<RulesError>> {
        let state = OthelloState::new();
        let before = state.clone();

        search(&state, &Difficulty::Hard.rollout_policy(), 8, &mut rng())?;
        assert_eq!(state, before);
        Ok(())
    }

    #[test]
    fn test_othello_forced_pass() -> Result<(), MctsError<RulesError>> {
        let state: OthelloState =
            format!("wb{} b", ".".repeat(62)).parse().map_err(MctsError::Game)?;
        let policy = Difficulty::Easy.rollout_policy();

        let action: OthelloAction = search(&state, &policy, 0, &mut rng())?;
        assert!(action.is_pass());
        assert_eq!(action.player(), Player::Black);
        Ok(())
    }

    #[test]
    fn test_othello_terminal_root() -> Result<(), RulesError> {
        let state: OthelloState = format!("b{} w", ".".repeat(63)).parse()?;

        assert!(matches!(
            search(&state, &Difficulty::Easy.rollout_policy(), 5, &mut rng()),
            Err(MctsError::SearchAlreadyOver)
        ));
        Ok(())
    }
}
