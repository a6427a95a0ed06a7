//! Monte Carlo Tree Search over Santorini positions.
//!
//! ## Overview
//!
//! - **Two-seat search**: each node selects for its own player to move
//! - **Configurable policies**: selection (UCB1/PUCT) and simulation
//! - **Oracle priors**: any `AdvisoryOracle` can seed PUCT priors
//! - **Deterministic**: same seed and state, same result
//!
//! ## Usage
//!
//! ```rust
//! use santorini_sync::core::InitialSnapshot;
//! use santorini_sync::mcts::{MCTSConfig, MCTSSearch};
//! use santorini_sync::rules::StandardRules;
//!
//! let state = InitialSnapshot::standard().state().clone();
//! let config = MCTSConfig::default().with_iterations(50).with_rollout_depth(5);
//! let mut search = MCTSSearch::new(StandardRules, config);
//!
//! let best = search.search(&state).unwrap();
//! assert!(best.is_some());
//!
//! let probs = search.action_probabilities();
//! let total: f64 = probs.iter().map(|(_, p)| p).sum();
//! assert!((total - 1.0).abs() < 1e-6);
//! ```

pub mod config;
pub mod node;
pub mod oracle;
pub mod policy;
pub mod search;
pub mod stats;
pub mod tree;

pub use config::MCTSConfig;
pub use node::{terminal_rewards, Edge, MCTSNode, NodeId};
pub use oracle::MCTSOracle;
pub use policy::{cutoff_rewards, RandomSimulation, SelectionPolicy, SimulationPolicy, PUCT, UCB1};
pub use search::MCTSSearch;
pub use stats::SearchStats;
pub use tree::{MCTSTree, TreeStats};
