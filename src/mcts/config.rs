//! Search settings.

use serde::{Deserialize, Serialize};

/// Tuning for one [`MCTSSearch`](super::MCTSSearch).
///
/// Deserializes from a partial object; missing fields keep their defaults,
/// which suit interactive advice on a laptop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MCTSConfig {
    /// `c` in UCB1 and PUCT.
    pub exploration_constant: f64,
    pub iterations: u32,
    /// Tree depth at which leaves are scored statically (0 = no limit).
    pub max_depth: u32,
    /// Random plies per rollout before the static score takes over
    /// (0 = play to the end; Santorini games always finish).
    pub rollout_depth: u32,
    /// Stop early once the arena holds this many nodes.
    pub max_nodes: usize,
    pub seed: u64,
    /// 0 plays the most visited move; higher values sample by visit count.
    pub temperature: f64,
}

impl Default for MCTSConfig {
    fn default() -> Self {
        Self {
            exploration_constant: std::f64::consts::SQRT_2,
            iterations: 400,
            max_depth: 0,
            rollout_depth: 30,
            max_nodes: 100_000,
            seed: 42,
            temperature: 0.0,
        }
    }
}

impl MCTSConfig {
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration_constant = c;
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_rollout_depth(mut self, depth: u32) -> Self {
        self.rollout_depth = depth;
        self
    }

    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MCTSConfig::default();
        assert!((config.exploration_constant - std::f64::consts::SQRT_2).abs() < 0.001);
        assert_eq!(config.max_depth, 0);
        assert_eq!(config.seed, 42);
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_builder_pattern() {
        let config = MCTSConfig::default()
            .with_exploration(2.75)
            .with_seed(123)
            .with_iterations(50)
            .with_rollout_depth(8);

        assert_eq!(config.exploration_constant, 2.75);
        assert_eq!(config.seed, 123);
        assert_eq!(config.iterations, 50);
        assert_eq!(config.rollout_depth, 8);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: MCTSConfig = serde_json::from_str(r#"{"iterations": 10}"#).unwrap();
        assert_eq!(config.iterations, 10);
        assert_eq!(config.seed, 42);
    }
}
