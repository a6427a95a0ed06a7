//! A local game session for analysis tools and the browser proxy.
//!
//! The session keeps every intermediate state, so taking moves back never
//! replays anything. It is not a match: there are no clocks, seats or undo
//! negotiation, and nothing here is authoritative.

use std::sync::Arc;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::codec::{decode_for, encode};
use crate::core::{Action, GameState, InitialSnapshot, PlayerId, Placement};
use crate::mcts::{MCTSConfig, MCTSOracle};
use crate::oracle::{
    Advice, AdvisoryOracle, BoardEncoder, HeuristicOracle, NetworkOracle, StateEncoder,
};
use crate::rules;

use super::py_nn::{PyEncodedState, PyPolicyValueNetwork};

#[pyclass(name = "Session")]
pub struct PySession {
    /// `states[0]` is the starting position; `states[i + 1]` follows `actions[i]`.
    states: Vec<GameState>,
    actions: Vec<Action>,
}

impl PySession {
    fn current(&self) -> &GameState {
        // `states` always holds at least the starting position.
        &self.states[self.states.len() - 1]
    }

    fn legal(&self) -> Vec<Action> {
        rules::legal_actions(self.current())
    }
}

#[pymethods]
impl PySession {
    /// Start a session. With a `seed` the four workers are placed at random,
    /// otherwise on the standard cross.
    #[new]
    #[pyo3(signature = (seed = None))]
    fn new(seed: Option<u64>) -> Self {
        let placement = match seed {
            Some(seed) => Placement::Random { seed },
            None => Placement::Standard,
        };
        let snapshot = InitialSnapshot::from_placement(placement);
        Self {
            states: vec![snapshot.state().clone()],
            actions: Vec::new(),
        }
    }

    /// Legal action ids for the player to move, ascending.
    fn legal_actions(&self) -> Vec<u32> {
        self.legal().into_iter().map(|a| u32::from(encode(a))).collect()
    }

    /// Play an action id for the player to move.
    fn play(&mut self, action_id: u32) -> PyResult<()> {
        let current = self.current();
        let action =
            decode_for(current, action_id).map_err(|e| PyValueError::new_err(e.to_string()))?;
        let next = rules::apply(current, action).map_err(|e| PyValueError::new_err(e.to_string()))?;
        self.actions.push(action);
        self.states.push(next);
        Ok(())
    }

    /// Go back to just before `player`'s most recent move, dropping every
    /// move after it. Defaults to the player to move. Returns `False` if
    /// that player has not moved yet.
    #[pyo3(signature = (player = None))]
    fn undo_to_previous_move(&mut self, player: Option<u8>) -> PyResult<bool> {
        let player = match player {
            Some(raw) => PlayerId::try_from(raw).map_err(|e| PyValueError::new_err(e.to_string()))?,
            None => self.current().to_move,
        };
        let target = (0..self.actions.len())
            .rev()
            .find(|&index| self.states[index].to_move == player);
        let Some(index) = target else {
            return Ok(false);
        };
        self.actions.truncate(index);
        self.states.truncate(index + 1);
        Ok(true)
    }

    /// Ranked `(action_id, probability, evaluation)` triples.
    ///
    /// A `network` takes precedence, then `iterations > 0` runs a tree
    /// search, else the heuristic answers. With `shortlist` only the moves
    /// worth showing are returned.
    #[pyo3(signature = (network = None, iterations = 0, shortlist = false))]
    fn advise(
        &self,
        py: Python<'_>,
        network: Option<&Bound<'_, PyPolicyValueNetwork>>,
        iterations: u32,
        shortlist: bool,
    ) -> Vec<(u32, f32, f32)> {
        let state = self.current();
        let legal = self.legal();
        let advice: Vec<Advice> = match network {
            Some(network) => {
                let network = network.borrow().clone_ref(py);
                NetworkOracle::new(network).advise(state, &legal)
            }
            None if iterations > 0 => {
                let config = MCTSConfig::default().with_iterations(iterations);
                MCTSOracle::new(config)
                    .with_priors(Arc::new(HeuristicOracle::default()))
                    .advise(state, &legal)
            }
            None => HeuristicOracle::default().advise(state, &legal),
        };
        let advice = if shortlist {
            Advice::shortlist(&advice)
        } else {
            advice
        };
        advice
            .into_iter()
            .map(|a| (u32::from(a.action_id), a.probability, a.evaluation))
            .collect()
    }

    /// `(winner, reason)` once the game is over.
    fn is_terminal(&self) -> Option<(u8, String)> {
        let terminal = rules::is_terminal(self.current())?;
        let winner = terminal.winner?;
        Some((winner.raw(), terminal.reason.to_string()))
    }

    /// Board tensor for a network, from the mover's point of view.
    fn encode(&self) -> PyEncodedState {
        PyEncodedState(BoardEncoder.encode(self.current()))
    }

    /// Human-readable text for an action id.
    #[staticmethod]
    fn describe(action_id: u32) -> PyResult<String> {
        crate::codec::decode(action_id)
            .map(|a| a.to_string())
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[getter]
    fn to_move(&self) -> u8 {
        self.current().to_move.raw()
    }

    #[getter]
    fn ply(&self) -> u32 {
        self.current().ply
    }

    /// Actions played so far, as ids.
    #[getter]
    fn history(&self) -> Vec<u32> {
        self.actions.iter().map(|&a| u32::from(encode(a))).collect()
    }

    /// Hex digest of the current state.
    #[getter]
    fn digest(&self) -> String {
        self.current().digest().to_string()
    }

    fn __str__(&self) -> String {
        self.current().board.to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "Session(ply={}, to_move={})",
            self.current().ply,
            self.current().to_move
        )
    }
}
