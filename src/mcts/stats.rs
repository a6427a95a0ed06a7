//! Search counters for diagnostics and tuning.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub iterations: u32,

    /// Nodes given their edges (or marked decided).
    pub nodes_expanded: u32,

    /// Rollouts run from new leaves.
    pub simulations: u32,

    /// Iterations that ended on an already decided node.
    pub terminal_hits: u32,

    /// Deepest node created.
    pub max_depth: u16,

    /// Wall time of the last search, in microseconds.
    pub time_us: u64,
}

impl SearchStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn iterations_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            f64::from(self.iterations) / (self.time_us as f64 / 1_000_000.0)
        }
    }
}
