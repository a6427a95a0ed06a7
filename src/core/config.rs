//! Match configuration types.
//!
//! A match is configured once at creation time:
//! - `ClockConfig`: Per-player time budget and increment
//! - `Placement`: How the initial snapshot positions the workers
//! - `MatchConfig`: Combines all of the above
//!
//! Configurations are plain serde values so the surrounding product can
//! load them from a JSON document.

use serde::{Deserialize, Serialize};

/// Per-player clock settings, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Starting budget for each player.
    pub initial_ms: u64,

    /// Added to the mover's clock after every accepted move.
    pub increment_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            initial_ms: 5 * 60 * 1000,
            increment_ms: 5_000,
        }
    }
}

impl ClockConfig {
    /// Create a clock configuration.
    #[must_use]
    pub const fn new(initial_ms: u64, increment_ms: u64) -> Self {
        Self {
            initial_ms,
            increment_ms,
        }
    }
}

/// How workers are positioned in a fresh snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// Fixed cross around the centre: player 0 at (2,1) and (2,3),
    /// player 1 at (1,2) and (3,2).
    #[default]
    Standard,

    /// Four distinct cells drawn from a seeded RNG.
    Random { seed: u64 },
}

/// Configuration for a single match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub clocks: ClockConfig,

    /// Whether undo negotiation is offered at all.
    pub allow_undo: bool,

    pub placement: Placement,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            clocks: ClockConfig::default(),
            allow_undo: true,
            placement: Placement::default(),
        }
    }
}

impl MatchConfig {
    /// Create a new config with the given clocks.
    #[must_use]
    pub fn with_clocks(mut self, clocks: ClockConfig) -> Self {
        self.clocks = clocks;
        self
    }

    /// Create a new config with undo enabled or disabled.
    #[must_use]
    pub fn with_undo(mut self, allow: bool) -> Self {
        self.allow_undo = allow;
        self
    }

    /// Create a new config with a placement rule.
    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Parse a configuration document.
    ///
    /// Missing fields are an error; use `MatchConfig::default()` and the
    /// `with_*` builders for partial configuration.
    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }
}
