//! Model-free advice from board height and mobility.

use crate::codec::{encode, is_winning_move};
use crate::core::{Action, GameState};
use crate::rules::{self, RulesEngine, StandardRules};

use super::{rank, Advice, AdvisoryOracle};

/// Value of having a winning move on the board next turn.
const THREAT: f32 = 0.9;
const HEIGHT_WEIGHT: f32 = 0.4;
const MOBILITY_WEIGHT: f32 = 0.6;

/// Static evaluation in `[-1, 1]` for the player to move.
///
/// Decided games score exactly ±1. Otherwise an immediate winning move
/// scores [`THREAT`], and everything else blends the height difference
/// between the players' highest workers with their share of legal actions.
#[must_use]
pub fn evaluate(state: &GameState) -> f32 {
    let mover = state.to_move;
    if let Some(terminal) = rules::is_terminal(state) {
        return if terminal.is_winner(mover) { 1.0 } else { -1.0 };
    }

    let mine = rules::legal_actions(state);
    if mine.iter().any(|&action| is_winning_move(state, action)) {
        return THREAT;
    }

    let mut flipped = state.clone();
    flipped.to_move = mover.other();
    let theirs = StandardRules.legal_actions(&flipped).len() as f32;
    let ours = mine.len() as f32;

    let height = f32::from(state.board.highest_level(mover))
        - f32::from(state.board.highest_level(mover.other()));
    let mobility = (ours - theirs) / (ours + theirs).max(1.0);

    (HEIGHT_WEIGHT * height + MOBILITY_WEIGHT * mobility).tanh()
}

/// Scores each action by the evaluation of the position it leads to and
/// turns the scores into probabilities with a softmax.
#[derive(Clone, Copy, Debug)]
pub struct HeuristicOracle {
    /// Softmax inverse temperature. Higher concentrates on the best move.
    pub sharpness: f32,
}

impl Default for HeuristicOracle {
    fn default() -> Self {
        Self { sharpness: 4.0 }
    }
}

impl HeuristicOracle {
    pub fn new(sharpness: f32) -> Self {
        Self { sharpness }
    }

    /// Mover-relative value of playing `action`.
    fn score(state: &GameState, action: Action) -> f32 {
        match rules::apply(state, action) {
            Ok(next) => match next.terminal {
                Some(terminal) => {
                    if terminal.is_winner(state.to_move) {
                        1.0
                    } else {
                        -1.0
                    }
                }
                None => -evaluate(&next),
            },
            Err(_) => -1.0,
        }
    }
}

impl AdvisoryOracle for HeuristicOracle {
    fn advise(&self, state: &GameState, legal: &[Action]) -> Vec<Advice> {
        let scored: Vec<(Action, f32)> = legal
            .iter()
            .map(|&action| (action, Self::score(state, action)))
            .collect();
        let Some(top) = scored.iter().map(|(_, s)| *s).reduce(f32::max) else {
            return Vec::new();
        };

        let weights: Vec<f32> = scored
            .iter()
            .map(|(_, s)| ((s - top) * self.sharpness).exp())
            .collect();
        let total: f32 = weights.iter().sum();

        let advice = scored
            .iter()
            .zip(&weights)
            .map(|(&(action, evaluation), &w)| Advice {
                action_id: encode(action),
                probability: w / total,
                evaluation,
            })
            .collect();
        rank(advice)
    }
}
