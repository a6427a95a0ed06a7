//! Tree search as an advisory oracle.

use std::sync::Arc;

use crate::codec::encode;
use crate::core::{Action, GameState};
use crate::oracle::{rank, Advice, AdvisoryOracle};
use crate::rules::StandardRules;

use super::config::MCTSConfig;
use super::policy::PUCT;
use super::search::MCTSSearch;

/// Ranks moves by their share of root visits after a fresh search.
///
/// Each call builds its own search context, so the oracle can be shared
/// between threads. A given config and state always produce the same
/// advice.
#[derive(Clone)]
pub struct MCTSOracle {
    config: MCTSConfig,
    priors: Option<Arc<dyn AdvisoryOracle>>,
}

impl MCTSOracle {
    pub fn new(config: MCTSConfig) -> Self {
        Self {
            config,
            priors: None,
        }
    }

    /// Search with PUCT, taking priors from another oracle.
    pub fn with_priors(mut self, oracle: Arc<dyn AdvisoryOracle>) -> Self {
        self.priors = Some(oracle);
        self
    }

    pub fn config(&self) -> &MCTSConfig {
        &self.config
    }
}

impl std::fmt::Debug for MCTSOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MCTSOracle")
            .field("config", &self.config)
            .field("priors", &self.priors.is_some())
            .finish()
    }
}

impl AdvisoryOracle for MCTSOracle {
    fn advise(&self, state: &GameState, legal: &[Action]) -> Vec<Advice> {
        if legal.is_empty() {
            return Vec::new();
        }

        let mut search = MCTSSearch::new(StandardRules, self.config.clone());
        if let Some(priors) = &self.priors {
            search = search.with_selection(PUCT).with_priors(Arc::clone(priors));
        }
        if let Err(error) = search.search(state) {
            tracing::warn!(%error, "search aborted");
            return Vec::new();
        }

        let root = search.tree().root_node();
        let total: u32 = root.edges.iter().map(|e| e.visits).sum();
        let fallback = 2.0 * search.root_value(state.to_move) - 1.0;

        let advice = legal
            .iter()
            .map(|&action| {
                let action_id = encode(action);
                let edge = root.edge_for(action_id);
                let visits = edge.map_or(0, |e| e.visits);
                let probability = if total == 0 {
                    1.0 / legal.len() as f32
                } else {
                    visits as f32 / total as f32
                };
                let evaluation = match edge {
                    Some(e) if e.visits > 0 => 2.0 * e.mean_value() - 1.0,
                    _ => fallback,
                };
                Advice {
                    action_id,
                    probability,
                    evaluation: evaluation as f32,
                }
            })
            .collect();
        rank(advice)
    }
}
