//! The rules engine: legal actions, transitions, terminal detection.
//!
//! Everything downstream (codec validation, the match machine, replay, the
//! client predictor, search) calls into `RulesEngine` and never interprets
//! board geometry on its own. The free functions below are shorthands for
//! `StandardRules`.

pub mod engine;

pub use engine::{IllegalReason, Resolution, RulesEngine, RulesError, StandardRules};

use crate::core::{Action, GameState, Terminal};

/// Legal actions for the player to move, in canonical order.
#[must_use]
pub fn legal_actions(state: &GameState) -> Vec<Action> {
    StandardRules.legal_actions(state)
}

/// Apply an action with the standard rules.
pub fn apply(state: &GameState, action: Action) -> Result<GameState, RulesError> {
    StandardRules.apply(state, action)
}

/// Terminal outcome of a state under the standard rules, if any.
#[must_use]
pub fn is_terminal(state: &GameState) -> Option<Terminal> {
    StandardRules.is_terminal(state)
}
