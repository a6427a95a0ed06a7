//! MCTS policies for selection and simulation.
//!
//! - `SelectionPolicy`: which child to descend into (UCB1, PUCT)
//! - `SimulationPolicy`: how to score a new leaf (random rollouts)

use crate::core::{GameRng, GameState, PlayerMap};
use crate::oracle::evaluate;
use crate::rules::{RulesEngine, RulesError};

use super::config::MCTSConfig;
use super::node::{terminal_rewards, MCTSNode};

// =============================================================================
// Selection Policy
// =============================================================================

/// Picks the edge to descend through once a node is fully expanded.
///
/// Edge values are already scored for the player to move at `node`, so
/// both seats maximize.
pub trait SelectionPolicy: Send + Sync {
    /// Index of the edge to follow.
    fn select(&self, node: &MCTSNode, config: &MCTSConfig) -> usize;
}

/// UCB1: Q(a) + c * sqrt(ln(N) / n(a))
#[derive(Clone, Debug, Default)]
pub struct UCB1;

impl SelectionPolicy for UCB1 {
    fn select(&self, node: &MCTSNode, config: &MCTSConfig) -> usize {
        let ln_parent = f64::from(node.visits.max(1)).ln();

        node.edges
            .iter()
            .enumerate()
            .map(|(i, edge)| {
                let exploitation = edge.mean_value();
                let exploration = if edge.visits == 0 {
                    f64::INFINITY
                } else {
                    config.exploration_constant * (ln_parent / f64::from(edge.visits)).sqrt()
                };
                (i, exploitation + exploration)
            })
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

/// PUCT: Q(a) + c * P(a) * sqrt(N) / (1 + n(a))
#[derive(Clone, Debug, Default)]
pub struct PUCT;

impl SelectionPolicy for PUCT {
    fn select(&self, node: &MCTSNode, config: &MCTSConfig) -> usize {
        let sqrt_parent = f64::from(node.visits.max(1)).sqrt();

        node.edges
            .iter()
            .enumerate()
            .map(|(i, edge)| {
                let q = edge.mean_value();
                let u = config.exploration_constant * f64::from(edge.prior) * sqrt_parent
                    / (1.0 + f64::from(edge.visits));
                (i, q + u)
            })
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

// =============================================================================
// Simulation Policy
// =============================================================================

/// Scores a freshly expanded leaf, returning a reward per player.
pub trait SimulationPolicy<E: RulesEngine>: Send + Sync {
    fn simulate(
        &self,
        engine: &E,
        state: &GameState,
        rng: &mut GameRng,
        max_depth: u32,
    ) -> Result<PlayerMap<f64>, RulesError>;
}

/// Plays uniformly random legal actions until the game ends or the depth
/// limit is hit, then scores with [`cutoff_rewards`].
#[derive(Clone, Debug, Default)]
pub struct RandomSimulation;

impl<E: RulesEngine> SimulationPolicy<E> for RandomSimulation {
    fn simulate(
        &self,
        engine: &E,
        state: &GameState,
        rng: &mut GameRng,
        max_depth: u32,
    ) -> Result<PlayerMap<f64>, RulesError> {
        let mut state = state.clone();
        let mut depth = 0;

        loop {
            if let Some(terminal) = engine.is_terminal(&state) {
                return Ok(terminal_rewards(&terminal));
            }
            if max_depth > 0 && depth >= max_depth {
                return Ok(cutoff_rewards(&state));
            }

            let Some(action) = rng.pick(&engine.legal_actions(&state)) else {
                return Ok(cutoff_rewards(&state));
            };
            state = engine.apply(&state, action)?;
            depth += 1;
        }
    }
}

/// Static evaluation mapped to `[0, 1]` rewards per player.
#[must_use]
pub fn cutoff_rewards(state: &GameState) -> PlayerMap<f64> {
    let mover = (f64::from(evaluate(state)) + 1.0) / 2.0;
    PlayerMap::new(|player| {
        if player == state.to_move {
            mover
        } else {
            1.0 - mover
        }
    })
}
