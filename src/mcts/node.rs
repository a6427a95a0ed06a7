//! Search tree nodes and the edges between them.
//!
//! Nodes sit in the [`MCTSTree`](super::MCTSTree) arena and refer to each
//! other by [`NodeId`]. Edges carry the wire id of their action, so oracle
//! priors and the advice built from a finished search share one numbering.

use serde::{Deserialize, Serialize};

use crate::codec::ActionId;
use crate::core::{Action, PlayerId, PlayerMap, Terminal};

/// Position of a node in the tree arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    #[must_use]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One legal action out of a node.
///
/// `value` is the summed reward of every playout through this edge, scored
/// for the player who chose it. Each visit adds a reward in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: ActionId,
    pub child: Option<NodeId>,
    pub visits: u32,
    pub value: f64,
    pub prior: f32,
}

impl Edge {
    pub fn new(id: ActionId, prior: f32) -> Self {
        Self {
            id,
            child: None,
            visits: 0,
            value: 0.0,
            prior,
        }
    }

    #[must_use]
    pub fn action(&self) -> Action {
        self.id.action()
    }

    /// Mean reward for the chooser; zero before the first visit.
    #[must_use]
    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value / f64::from(self.visits)
        }
    }

    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.child.is_some()
    }
}

/// One for the winner, zero for the loser.
#[must_use]
pub fn terminal_rewards(terminal: &Terminal) -> PlayerMap<f64> {
    PlayerMap::new(|player| if terminal.is_winner(player) { 1.0 } else { 0.0 })
}

/// A position reached during search.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MCTSNode {
    /// Parent node and the index of the edge that leads here.
    pub parent: Option<(NodeId, u16)>,
    pub to_move: PlayerId,
    pub depth: u16,
    pub visits: u32,
    /// Set once the game is known to be over at this node.
    pub decided: Option<PlayerMap<f64>>,
    /// Sorted by ascending wire id, like the legal action list.
    pub edges: Vec<Edge>,
}

impl MCTSNode {
    pub fn new(parent: Option<(NodeId, u16)>, to_move: PlayerId, depth: u16) -> Self {
        Self {
            parent,
            to_move,
            depth,
            visits: 0,
            decided: None,
            edges: Vec::new(),
        }
    }

    pub fn root(to_move: PlayerId) -> Self {
        Self::new(None, to_move, 0)
    }

    #[must_use]
    pub fn is_decided(&self) -> bool {
        self.decided.is_some()
    }

    #[must_use]
    pub fn has_unexpanded(&self) -> bool {
        self.edges.iter().any(|e| !e.is_expanded())
    }

    pub fn unexpanded_edges(&self) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_expanded())
            .map(|(i, _)| i)
    }

    #[must_use]
    pub fn edge_for(&self, id: ActionId) -> Option<&Edge> {
        self.edges
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|idx| &self.edges[idx])
    }

    /// Most visited edge. Ties go to the lower wire id.
    #[must_use]
    pub fn most_visited(&self) -> Option<&Edge> {
        self.edges.iter().rev().max_by_key(|e| e.visits)
    }

    /// Mean reward of this node for `player`, or one half before any visit.
    #[must_use]
    pub fn value_for(&self, player: PlayerId) -> f64 {
        if self.visits == 0 {
            return 0.5;
        }
        let mover: f64 = self.edges.iter().map(|e| e.value).sum::<f64>() / f64::from(self.visits);
        if player == self.to_move {
            mover
        } else {
            1.0 - mover
        }
    }
}
