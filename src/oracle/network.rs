//! Policy/value network seam and the oracle built on it.
//!
//! A network sees the board only through an [`EncodedState`] and answers
//! with one probability per wire id plus a scalar value from the point of
//! view of the player to move. Trained models live outside this crate
//! (typically behind the Python bindings); the baselines here keep the
//! advisory path testable without one.

use serde::{Deserialize, Serialize};

use crate::codec::{encode, ACTION_SPACE_SIZE};
use crate::core::{Action, GameState};

use super::encoder::{BoardEncoder, StateEncoder};
use super::{rank, Advice, AdvisoryOracle};

/// Encoded game state as a flat tensor for network input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedState {
    /// Flattened tensor data (row-major order).
    pub tensor: Vec<f32>,

    /// Shape of the tensor, e.g. `[25, 3]` for cells by channels.
    pub shape: Vec<usize>,
}

impl EncodedState {
    pub fn new(tensor: Vec<f32>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(
            tensor.len(),
            shape.iter().product::<usize>(),
            "Tensor length must match shape product"
        );
        Self { tensor, shape }
    }

    /// Create a zero-filled encoded state with the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size = shape.iter().product();
        Self {
            tensor: vec![0.0; size],
            shape,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.tensor.get(index).copied()
    }

    /// Set element at a flat index. Out-of-range writes are ignored.
    pub fn set(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.tensor.get_mut(index) {
            *slot = value;
        }
    }
}

/// Action probabilities over the full wire id space.
pub trait PolicyNetwork: Send + Sync {
    /// One entry per wire id, `ACTION_SPACE_SIZE` long.
    fn predict(&self, encoded: &EncodedState) -> Vec<f32>;

    fn predict_batch(&self, encoded: &[EncodedState]) -> Vec<Vec<f32>> {
        encoded.iter().map(|e| self.predict(e)).collect()
    }
}

/// Position value in `[-1, 1]` for the player to move.
pub trait ValueNetwork: Send + Sync {
    fn predict(&self, encoded: &EncodedState) -> f32;

    fn predict_batch(&self, encoded: &[EncodedState]) -> Vec<f32> {
        encoded.iter().map(|e| self.predict(e)).collect()
    }
}

/// Combined policy-value network (one forward pass for both heads).
pub trait PolicyValueNetwork: Send + Sync {
    /// Returns `(policy, value)`.
    fn predict(&self, encoded: &EncodedState) -> (Vec<f32>, f32);

    fn predict_batch(&self, encoded: &[EncodedState]) -> Vec<(Vec<f32>, f32)> {
        encoded.iter().map(|e| self.predict(e)).collect()
    }
}

/// Uniform policy over every wire id (baseline).
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformPolicy;

impl PolicyNetwork for UniformPolicy {
    fn predict(&self, _encoded: &EncodedState) -> Vec<f32> {
        vec![1.0 / ACTION_SPACE_SIZE as f32; ACTION_SPACE_SIZE]
    }
}

/// Always-even value (baseline).
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroValue;

impl ValueNetwork for ZeroValue {
    fn predict(&self, _encoded: &EncodedState) -> f32 {
        0.0
    }
}

/// Separate policy and value networks used as one.
#[derive(Clone, Debug, Default)]
pub struct SplitNetwork<P, V> {
    pub policy: P,
    pub value: V,
}

impl<P, V> SplitNetwork<P, V> {
    pub fn new(policy: P, value: V) -> Self {
        Self { policy, value }
    }
}

impl<P: PolicyNetwork, V: ValueNetwork> PolicyValueNetwork for SplitNetwork<P, V> {
    fn predict(&self, encoded: &EncodedState) -> (Vec<f32>, f32) {
        (self.policy.predict(encoded), self.value.predict(encoded))
    }
}

/// Uniform policy and zero value in one network.
pub type UniformPolicyZeroValue = SplitNetwork<UniformPolicy, ZeroValue>;

/// Oracle that asks a network and keeps only the legal part of its policy.
///
/// Probabilities of legal actions are renormalized to sum to one. If the
/// network puts no mass on any legal action, the legal actions share it
/// evenly.
#[derive(Clone, Debug)]
pub struct NetworkOracle<N, E = BoardEncoder> {
    network: N,
    encoder: E,
}

impl<N: PolicyValueNetwork> NetworkOracle<N> {
    pub fn new(network: N) -> Self {
        Self {
            network,
            encoder: BoardEncoder,
        }
    }
}

impl<N: PolicyValueNetwork, E: StateEncoder> NetworkOracle<N, E> {
    pub fn with_encoder(network: N, encoder: E) -> Self {
        Self { network, encoder }
    }

    pub fn network(&self) -> &N {
        &self.network
    }
}

impl<N: PolicyValueNetwork, E: StateEncoder> AdvisoryOracle for NetworkOracle<N, E> {
    fn advise(&self, state: &GameState, legal: &[Action]) -> Vec<Advice> {
        if legal.is_empty() {
            return Vec::new();
        }
        let (policy, value) = self.network.predict(&self.encoder.encode(state));

        let raw: Vec<f32> = legal
            .iter()
            .map(|&action| {
                policy
                    .get(encode(action).index())
                    .copied()
                    .filter(|p| p.is_finite() && *p > 0.0)
                    .unwrap_or(0.0)
            })
            .collect();
        let total: f32 = raw.iter().sum();
        let evaluation = value.clamp(-1.0, 1.0);

        let advice = legal
            .iter()
            .zip(&raw)
            .map(|(&action, &p)| Advice {
                action_id: encode(action),
                probability: if total > 0.0 {
                    p / total
                } else {
                    1.0 / legal.len() as f32
                },
                evaluation,
            })
            .collect();
        rank(advice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ActionId;
    use crate::core::InitialSnapshot;
    use crate::rules;

    /// Puts all mass on a single wire id.
    struct Spike(usize);

    impl PolicyValueNetwork for Spike {
        fn predict(&self, _encoded: &EncodedState) -> (Vec<f32>, f32) {
            let mut policy = vec![0.0; ACTION_SPACE_SIZE];
            policy[self.0] = 1.0;
            (policy, 0.25)
        }
    }

    #[test]
    fn test_encoded_state_set_ignores_out_of_range() {
        let mut state = EncodedState::zeros(vec![4]);
        state.set(2, 5.0);
        state.set(9, 1.0);
        assert_eq!(state.tensor, vec![0.0, 0.0, 5.0, 0.0]);
        assert_eq!(state.get(4), None);
    }

    #[test]
    fn test_baseline_network() {
        let network = UniformPolicyZeroValue::default();
        let (policy, value) = PolicyValueNetwork::predict(&network, &EncodedState::zeros(vec![1]));

        assert_eq!(policy.len(), ACTION_SPACE_SIZE);
        assert!((policy.iter().sum::<f32>() - 1.0).abs() < 1e-3);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_uniform_network_oracle_spreads_evenly() {
        let state = InitialSnapshot::standard().state().clone();
        let legal = rules::legal_actions(&state);
        let advice = NetworkOracle::new(UniformPolicyZeroValue::default()).advise(&state, &legal);

        assert_eq!(advice.len(), legal.len());
        let total: f32 = advice.iter().map(|a| a.probability).sum();
        assert!((total - 1.0).abs() < 1e-3);
        assert!(advice.iter().all(|a| a.evaluation == 0.0));
    }

    #[test]
    fn test_illegal_mass_is_dropped() {
        let state = InitialSnapshot::standard().state().clone();
        let legal = rules::legal_actions(&state);
        let target = encode(legal[3]);

        let advice = NetworkOracle::new(Spike(target.index())).advise(&state, &legal);
        assert_eq!(advice[0].action_id, target);
        assert!((advice[0].probability - 1.0).abs() < 1e-6);
        assert_eq!(advice[0].evaluation, 0.25);

        // All mass on an illegal id: fall back to an even split.
        let illegal = ActionId::try_from(0u32).unwrap();
        assert!(!legal.contains(&illegal.action()));
        let advice = NetworkOracle::new(Spike(illegal.index())).advise(&state, &legal);
        assert!((advice[0].probability - 1.0 / legal.len() as f32).abs() < 1e-6);
    }
}
