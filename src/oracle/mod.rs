//! Read-only move advice.
//!
//! An oracle looks at a state and its legal actions and ranks them. It never
//! touches a match: the authoritative path (rules, match machine, sync)
//! does not depend on any oracle and behaves identically without one.
//!
//! - `HeuristicOracle`: height and mobility scoring, no model needed
//! - `NetworkOracle`: masks a policy/value network to the legal actions
//! - `MCTSOracle` (in `crate::mcts`): visit counts of a tree search

pub mod encoder;
pub mod heuristic;
pub mod network;

use serde::{Deserialize, Serialize};

use crate::codec::ActionId;
use crate::core::{Action, GameState, PlayerId, PlayerMap};

pub use encoder::{BoardEncoder, StateEncoder};
pub use heuristic::{evaluate, HeuristicOracle};
pub use network::{
    EncodedState, NetworkOracle, PolicyNetwork, PolicyValueNetwork, SplitNetwork, UniformPolicy,
    UniformPolicyZeroValue, ValueNetwork, ZeroValue,
};

/// Most moves a shortlist keeps.
pub const SHORTLIST_LEN: usize = 3;

/// One ranked suggestion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub action_id: ActionId,
    pub probability: f32,
    /// Expected outcome in `[-1, 1]` for the player to move.
    pub evaluation: f32,
}

impl Advice {
    #[must_use]
    pub fn action(&self) -> Action {
        self.action_id.action()
    }

    /// The moves worth showing: at most three, each with at least a third
    /// of the best probability. `advice` must already be ranked.
    #[must_use]
    pub fn shortlist(advice: &[Advice]) -> Vec<Advice> {
        let Some(best) = advice.first() else {
            return Vec::new();
        };
        let floor = best.probability / 3.0;
        advice
            .iter()
            .take(SHORTLIST_LEN)
            .take_while(|a| a.probability >= floor)
            .copied()
            .collect()
    }
}

/// Ranks legal actions for the player to move.
pub trait AdvisoryOracle: Send + Sync {
    /// One entry per legal action, sorted by probability, highest first.
    fn advise(&self, state: &GameState, legal: &[Action]) -> Vec<Advice>;

    fn best(&self, state: &GameState, legal: &[Action]) -> Option<Advice> {
        self.advise(state, legal).into_iter().next()
    }
}

/// Split a mover-relative evaluation into one value per seat.
#[must_use]
pub fn per_player(mover: PlayerId, evaluation: f32) -> PlayerMap<f32> {
    PlayerMap::new(|player| if player == mover { evaluation } else { -evaluation })
}

/// Sort by probability descending; ties go to the lower wire id.
pub(crate) fn rank(mut advice: Vec<Advice>) -> Vec<Advice> {
    advice.sort_by(|a, b| {
        b.probability
            .total_cmp(&a.probability)
            .then(a.action_id.cmp(&b.action_id))
    });
    advice
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advice(id: u32, probability: f32) -> Advice {
        Advice {
            action_id: ActionId::try_from(id).unwrap(),
            probability,
            evaluation: 0.0,
        }
    }

    #[test]
    fn test_rank_orders_by_probability_then_id() {
        let ranked = rank(vec![advice(9, 0.2), advice(3, 0.5), advice(1, 0.2)]);
        let ids: Vec<u8> = ranked.iter().map(|a| a.action_id.raw()).collect();
        assert_eq!(ids, vec![3, 1, 9]);
    }

    #[test]
    fn test_shortlist_drops_weak_moves() {
        let ranked = rank(vec![advice(1, 0.6), advice(2, 0.25), advice(3, 0.15)]);
        let short = Advice::shortlist(&ranked);
        assert_eq!(short.len(), 2);
        assert_eq!(short[1].action_id.raw(), 2);
    }

    #[test]
    fn test_shortlist_caps_at_three() {
        let ranked = rank((10..15).map(|id| advice(id, 0.2)).collect());
        assert_eq!(Advice::shortlist(&ranked).len(), 3);
        assert!(Advice::shortlist(&[]).is_empty());
    }

    #[test]
    fn test_per_player() {
        let values = per_player(PlayerId::ONE, 0.4);
        assert_eq!(values[PlayerId::ONE], 0.4);
        assert_eq!(values[PlayerId::ZERO], -0.4);
    }
}
