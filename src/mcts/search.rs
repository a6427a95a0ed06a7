//! Core MCTS search algorithm.
//!
//! Both seats are searched: every node selects from the point of view of
//! its own player to move. States are immutable values, so each iteration
//! walks the tree by applying actions to fresh copies.

use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::codec::{encode, ActionId};
use crate::core::{Action, GameRng, GameState, PlayerId, PlayerMap};
use crate::oracle::AdvisoryOracle;
use crate::rules::{RulesEngine, RulesError};

use super::config::MCTSConfig;
use super::node::{terminal_rewards, Edge, MCTSNode, NodeId};
use super::policy::{cutoff_rewards, RandomSimulation, SelectionPolicy, SimulationPolicy, UCB1};
use super::stats::SearchStats;
use super::tree::MCTSTree;

/// Main MCTS search context.
///
/// Owns the tree, the RNG and the policies. Reuse one context for several
/// searches; each call to [`MCTSSearch::search`] starts a fresh tree.
pub struct MCTSSearch<E: RulesEngine> {
    engine: E,
    config: MCTSConfig,
    tree: MCTSTree,
    rng: GameRng,
    selection: Box<dyn SelectionPolicy>,
    simulation: Box<dyn SimulationPolicy<E>>,
    /// Supplies edge priors when set; otherwise priors are uniform.
    priors: Option<Arc<dyn AdvisoryOracle>>,
    stats: SearchStats,
}

impl<E: RulesEngine + Send + Sync> MCTSSearch<E> {
    pub fn new(engine: E, config: MCTSConfig) -> Self {
        let rng = GameRng::new(config.seed);
        let tree = MCTSTree::with_capacity(PlayerId::ZERO, config.max_nodes.min(1 << 16));

        Self {
            engine,
            config,
            tree,
            rng,
            selection: Box::new(UCB1),
            simulation: Box::new(RandomSimulation),
            priors: None,
            stats: SearchStats::default(),
        }
    }

    pub fn with_selection<S: SelectionPolicy + 'static>(mut self, selection: S) -> Self {
        self.selection = Box::new(selection);
        self
    }

    pub fn with_simulation<S: SimulationPolicy<E> + 'static>(mut self, simulation: S) -> Self {
        self.simulation = Box::new(simulation);
        self
    }

    /// Use an oracle's probabilities as edge priors (pairs with `PUCT`).
    pub fn with_priors(mut self, oracle: Arc<dyn AdvisoryOracle>) -> Self {
        self.priors = Some(oracle);
        self
    }

    /// Search with the configured iteration count.
    pub fn search(&mut self, state: &GameState) -> Result<Option<Action>, RulesError> {
        self.search_iterations(state, self.config.iterations)
    }

    /// Run `iterations` iterations from `state` and pick an action for its
    /// player to move. `None` if the game is already decided.
    pub fn search_iterations(
        &mut self,
        state: &GameState,
        iterations: u32,
    ) -> Result<Option<Action>, RulesError> {
        let start = Instant::now();
        self.stats.reset();
        self.tree.reset(state.to_move);

        self.expand_node(NodeId::ROOT, state);

        if self.tree.root_node().is_decided() {
            return Ok(None);
        }
        if let [only] = self.tree.root_node().edges.as_slice() {
            return Ok(Some(only.action()));
        }

        for _ in 0..iterations {
            self.iteration(state)?;
            self.stats.iterations += 1;

            if self.tree.len() >= self.config.max_nodes {
                break;
            }
        }

        self.stats.time_us = start.elapsed().as_micros() as u64;
        tracing::debug!(
            iterations = self.stats.iterations,
            nodes = self.tree.len(),
            pv = ?self.tree.principal_variation(),
            "search finished"
        );
        Ok(self.best_action())
    }

    /// Select, expand, simulate, backpropagate.
    fn iteration(&mut self, root_state: &GameState) -> Result<(), RulesError> {
        let mut path: SmallVec<[(NodeId, usize); 32]> = SmallVec::new();
        let mut current = NodeId::ROOT;
        let mut state = root_state.clone();

        loop {
            let node = self.tree.get(current);

            if let Some(rewards) = node.decided {
                self.stats.terminal_hits += 1;
                self.backpropagate(&path, rewards);
                return Ok(());
            }

            if self.config.max_depth > 0 && u32::from(node.depth) >= self.config.max_depth {
                self.backpropagate(&path, cutoff_rewards(&state));
                return Ok(());
            }

            if node.has_unexpanded() {
                let edge_idx = self.select_unexpanded(current);
                path.push((current, edge_idx));

                let action = self.tree.get(current).edges[edge_idx].action();
                state = self.engine.apply(&state, action)?;
                let child = self.expand_child(current, edge_idx, &state);

                let rewards = match self.tree.get(child).decided {
                    Some(rewards) => rewards,
                    None => {
                        self.stats.simulations += 1;
                        self.simulate(&state)?
                    }
                };
                self.backpropagate(&path, rewards);
                return Ok(());
            }

            let edge_idx = self.selection.select(node, &self.config);
            path.push((current, edge_idx));

            let edge = &self.tree.get(current).edges[edge_idx];
            let (action, child) = (edge.action(), edge.child);
            state = self.engine.apply(&state, action)?;
            match child {
                Some(child) => current = child,
                // Selection only runs once every edge has a child.
                None => return Ok(()),
            }
        }
    }

    /// Attach one edge per legal action, or mark the node terminal.
    fn expand_node(&mut self, node_id: NodeId, state: &GameState) {
        if let Some(terminal) = self.engine.is_terminal(state) {
            self.tree.get_mut(node_id).decided = Some(terminal_rewards(&terminal));
            return;
        }

        let actions = self.engine.legal_actions(state);
        let priors = self.priors_for(state, &actions);
        let uniform = 1.0 / actions.len().max(1) as f32;

        let node = self.tree.get_mut(node_id);
        node.edges = actions
            .into_iter()
            .map(|action| {
                let id = encode(action);
                let prior = match &priors {
                    Some(priors) => priors.get(&id).copied().unwrap_or(0.0),
                    None => uniform,
                };
                Edge::new(id, prior)
            })
            .collect();

        self.stats.nodes_expanded += 1;
    }

    fn priors_for(
        &self,
        state: &GameState,
        actions: &[Action],
    ) -> Option<FxHashMap<ActionId, f32>> {
        let oracle = self.priors.as_ref()?;
        Some(
            oracle
                .advise(state, actions)
                .into_iter()
                .map(|advice| (advice.action_id, advice.probability))
                .collect(),
        )
    }

    fn select_unexpanded(&mut self, node_id: NodeId) -> usize {
        let unexpanded: Vec<usize> = self.tree.get(node_id).unexpanded_edges().collect();
        match unexpanded.len() {
            0 => 0,
            1 => unexpanded[0],
            n => unexpanded[self.rng.gen_range_usize(0..n)],
        }
    }

    fn expand_child(&mut self, parent_id: NodeId, edge_idx: usize, state: &GameState) -> NodeId {
        let depth = self.tree.get(parent_id).depth + 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);

        let child = MCTSNode::new(Some((parent_id, edge_idx as u16)), state.to_move, depth);
        let child_id = self.tree.attach(parent_id, edge_idx, child);

        self.expand_node(child_id, state);
        child_id
    }

    fn simulate(&mut self, state: &GameState) -> Result<PlayerMap<f64>, RulesError> {
        let mut sim_rng = self.rng.fork();
        self.simulation
            .simulate(&self.engine, state, &mut sim_rng, self.config.rollout_depth)
    }

    /// Credit each edge on the path with the reward of the player who
    /// chose it.
    fn backpropagate(&mut self, path: &[(NodeId, usize)], rewards: PlayerMap<f64>) {
        for &(node_id, edge_idx) in path.iter().rev() {
            let node = self.tree.get_mut(node_id);
            node.visits += 1;
            let reward = rewards[node.to_move];

            let edge = &mut node.edges[edge_idx];
            edge.visits += 1;
            edge.value += reward;
        }
    }

    fn best_action(&mut self) -> Option<Action> {
        let root = self.tree.root_node();

        if self.config.temperature <= 0.0 {
            return root.most_visited().map(Edge::action);
        }

        let exponent = 1.0 / self.config.temperature;
        let weights: Vec<f32> = root
            .edges
            .iter()
            .map(|e| f64::from(e.visits).powf(exponent) as f32)
            .collect();
        self.rng
            .choose_weighted(&weights)
            .and_then(|idx| root.edges.get(idx))
            .map(Edge::action)
    }

    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    #[must_use]
    pub fn tree(&self) -> &MCTSTree {
        &self.tree
    }

    /// (action, visit count) pairs at the root.
    pub fn action_visits(&self) -> Vec<(Action, u32)> {
        self.tree
            .root_node()
            .edges
            .iter()
            .map(|e| (e.action(), e.visits))
            .collect()
    }

    /// Visit shares at the root. Uniform if nothing was visited.
    pub fn action_probabilities(&self) -> Vec<(Action, f64)> {
        let root = self.tree.root_node();
        let total: u32 = root.edges.iter().map(|e| e.visits).sum();

        if total == 0 {
            let uniform = 1.0 / root.edges.len().max(1) as f64;
            return root.edges.iter().map(|e| (e.action(), uniform)).collect();
        }

        root.edges
            .iter()
            .map(|e| (e.action(), f64::from(e.visits) / f64::from(total)))
            .collect()
    }

    /// Mean reward at the root for `player`, in `[0, 1]`.
    #[must_use]
    pub fn root_value(&self, player: PlayerId) -> f64 {
        self.tree.root_node().value_for(player)
    }

    /// Expected continuation from the root, most visited edge first.
    pub fn principal_variation(&self) -> Vec<Action> {
        self.tree
            .principal_variation()
            .into_iter()
            .map(ActionId::action)
            .collect()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &MCTSConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::is_winning_move;
    use crate::core::{InitialSnapshot, Position, SnapshotBuilder, Worker, WorkerIndex};
    use crate::mcts::PUCT;
    use crate::oracle::HeuristicOracle;
    use crate::rules::{self, StandardRules};

    fn at(row: u8, col: u8) -> Position {
        Position::new(row, col).unwrap()
    }

    fn near_win() -> GameState {
        SnapshotBuilder::new()
            .level(at(2, 2), 2)
            .level(at(2, 3), 3)
            .place(at(2, 2), Worker::new(PlayerId::ZERO, WorkerIndex::FIRST))
            .place(at(0, 0), Worker::new(PlayerId::ZERO, WorkerIndex::SECOND))
            .place(at(4, 4), Worker::new(PlayerId::ONE, WorkerIndex::FIRST))
            .place(at(4, 0), Worker::new(PlayerId::ONE, WorkerIndex::SECOND))
            .build()
            .unwrap()
            .state()
            .clone()
    }

    fn search(config: MCTSConfig) -> MCTSSearch<StandardRules> {
        MCTSSearch::new(StandardRules, config)
    }

    #[test]
    fn test_search_returns_legal_action() {
        let state = InitialSnapshot::standard().state().clone();
        let mut search = search(MCTSConfig::default().with_iterations(100));

        let action = search.search(&state).unwrap().unwrap();
        assert!(rules::legal_actions(&state).contains(&action));
    }

    #[test]
    fn test_search_stats() {
        let state = InitialSnapshot::standard().state().clone();
        let mut search = search(MCTSConfig::default().with_rollout_depth(6));
        search.search_iterations(&state, 50).unwrap();

        let stats = search.stats();
        assert_eq!(stats.iterations, 50);
        assert!(stats.simulations > 0);
        assert!(stats.nodes_expanded > 0);
        assert_eq!(search.tree().root_node().visits, 50);
    }

    #[test]
    fn test_principal_variation_starts_with_chosen_action() {
        let state = InitialSnapshot::standard().state().clone();
        let mut search = search(MCTSConfig::default().with_iterations(120).with_rollout_depth(6));
        let chosen = search.search(&state).unwrap().unwrap();

        let line = search.principal_variation();
        assert_eq!(line.first(), Some(&chosen));

        let mut replayed = state;
        for action in line {
            assert!(rules::legal_actions(&replayed).contains(&action));
            replayed = rules::apply(&replayed, action).unwrap();
        }
    }

    #[test]
    fn test_search_deterministic() {
        let state = InitialSnapshot::standard().state().clone();
        let config = MCTSConfig::default().with_seed(12345).with_iterations(150);

        let first = search(config.clone()).search(&state).unwrap();
        let second = search(config).search(&state).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_decided_game_has_no_action() {
        let state = near_win();
        let winning = rules::legal_actions(&state)
            .into_iter()
            .find(|&a| is_winning_move(&state, a))
            .unwrap();
        let over = rules::apply(&state, winning).unwrap();

        assert_eq!(search(MCTSConfig::default()).search(&over).unwrap(), None);
    }

    #[test]
    fn test_finds_winning_move() {
        let state = near_win();
        let config = MCTSConfig::default()
            .with_exploration(0.25)
            .with_iterations(1000)
            .with_rollout_depth(10);

        let action = search(config).search(&state).unwrap().unwrap();
        assert!(is_winning_move(&state, action));
    }

    #[test]
    fn test_priors_from_oracle() {
        let state = near_win();
        let mut search = search(MCTSConfig::default().with_iterations(200))
            .with_selection(PUCT)
            .with_priors(Arc::new(HeuristicOracle::default()));

        let action = search.search(&state).unwrap().unwrap();
        assert!(is_winning_move(&state, action));

        let priors: f32 = search.tree().root_node().edges.iter().map(|e| e.prior).sum();
        assert!((priors - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_action_probabilities_sum_to_one() {
        let state = InitialSnapshot::standard().state().clone();
        let mut search = search(MCTSConfig::default().with_rollout_depth(6));
        search.search_iterations(&state, 80).unwrap();

        let sum: f64 = search.action_probabilities().iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 0.01);
        let value = search.root_value(PlayerId::ZERO);
        assert!((0.0..=1.0).contains(&value));
    }
}
