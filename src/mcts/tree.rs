//! Node arena for one search.
//!
//! The root is always the first node. A new search clears the arena but
//! keeps its allocation.

use serde::{Deserialize, Serialize};

use super::node::{MCTSNode, NodeId};
use crate::codec::ActionId;
use crate::core::PlayerId;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MCTSTree {
    nodes: Vec<MCTSNode>,
}

impl MCTSTree {
    pub fn new(root_player: PlayerId) -> Self {
        Self::with_capacity(root_player, 1024)
    }

    pub fn with_capacity(root_player: PlayerId, capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(MCTSNode::root(root_player));
        Self { nodes }
    }

    /// Drop every node and start over from a fresh root.
    pub fn reset(&mut self, root_player: PlayerId) {
        self.nodes.clear();
        self.nodes.push(MCTSNode::root(root_player));
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &MCTSNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MCTSNode {
        &mut self.nodes[id.index()]
    }

    #[must_use]
    pub fn root_node(&self) -> &MCTSNode {
        self.get(NodeId::ROOT)
    }

    /// Add `node` as the child behind edge `edge_idx` of `parent`.
    pub fn attach(&mut self, parent: NodeId, edge_idx: usize, node: MCTSNode) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        self.get_mut(parent).edges[edge_idx].child = Some(id);
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The line both sides are expected to play: from the root, follow the
    /// most visited edge until it leads to an unvisited or missing node.
    #[must_use]
    pub fn principal_variation(&self) -> Vec<ActionId> {
        let mut line = Vec::new();
        let mut current = NodeId::ROOT;
        while let Some(edge) = self.get(current).most_visited() {
            if edge.visits == 0 {
                break;
            }
            line.push(edge.id);
            match edge.child {
                Some(child) => current = child,
                None => break,
            }
        }
        line
    }

    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            node_count: self.nodes.len(),
            ..TreeStats::default()
        };
        for node in &self.nodes {
            stats.max_depth = stats.max_depth.max(node.depth);
            stats.decided_count += usize::from(node.is_decided());
            stats.total_edges += node.edges.len();
            stats.expanded_edges += node.edges.iter().filter(|e| e.is_expanded()).count();
        }
        stats
    }
}

/// Shape of a finished search tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeStats {
    pub node_count: usize,
    pub max_depth: u16,
    /// Nodes where the game is over.
    pub decided_count: usize,
    pub total_edges: usize,
    pub expanded_edges: usize,
}

impl TreeStats {
    /// Average legal actions per node.
    #[must_use]
    pub fn branching_factor(&self) -> f64 {
        if self.node_count == 0 {
            0.0
        } else {
            self.total_edges as f64 / self.node_count as f64
        }
    }

    #[must_use]
    pub fn expansion_ratio(&self) -> f64 {
        if self.total_edges == 0 {
            0.0
        } else {
            self.expanded_edges as f64 / self.total_edges as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerMap;
    use crate::mcts::node::Edge;

    fn id(raw: u32) -> ActionId {
        ActionId::try_from(raw).unwrap()
    }

    fn with_edges(player: PlayerId, raw_ids: &[u32]) -> MCTSNode {
        let mut node = MCTSNode::root(player);
        node.edges = raw_ids.iter().map(|&raw| Edge::new(id(raw), 1.0)).collect();
        node
    }

    #[test]
    fn test_attach_links_parent_edge() {
        let mut tree = MCTSTree::new(PlayerId::ZERO);
        tree.get_mut(NodeId::ROOT).edges.push(Edge::new(id(10), 1.0));

        let node = MCTSNode::new(Some((NodeId::ROOT, 0)), PlayerId::ONE, 1);
        let child = tree.attach(NodeId::ROOT, 0, node);

        assert_eq!(child, NodeId::from_index(1));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.root_node().edges[0].child, Some(child));
        assert_eq!(tree.get(child).parent, Some((NodeId::ROOT, 0)));
    }

    #[test]
    fn test_reset_keeps_only_root() {
        let mut tree = MCTSTree::new(PlayerId::ZERO);
        tree.get_mut(NodeId::ROOT).edges.push(Edge::new(id(10), 1.0));
        tree.attach(NodeId::ROOT, 0, MCTSNode::root(PlayerId::ONE));
        tree.reset(PlayerId::ONE);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root_node().to_move, PlayerId::ONE);
        assert!(tree.root_node().edges.is_empty());
    }

    #[test]
    fn test_principal_variation_follows_visits() {
        let mut tree = MCTSTree::new(PlayerId::ZERO);
        *tree.get_mut(NodeId::ROOT) = with_edges(PlayerId::ZERO, &[10, 11]);
        tree.get_mut(NodeId::ROOT).edges[1].visits = 6;

        let reply = with_edges(PlayerId::ONE, &[90, 95, 100]);
        let child = tree.attach(NodeId::ROOT, 1, reply);
        tree.get_mut(child).edges[2].visits = 4;

        assert_eq!(tree.principal_variation(), vec![id(11), id(100)]);
    }

    #[test]
    fn test_tree_stats() {
        let mut tree = MCTSTree::new(PlayerId::ZERO);
        *tree.get_mut(NodeId::ROOT) = with_edges(PlayerId::ZERO, &[10, 11]);

        let node = MCTSNode::new(Some((NodeId::ROOT, 0)), PlayerId::ONE, 1);
        let child = tree.attach(NodeId::ROOT, 0, node);
        tree.get_mut(child).decided = Some(PlayerMap::with_value(0.0));

        let stats = tree.stats();
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.max_depth, 1);
        assert_eq!(stats.decided_count, 1);
        assert_eq!(stats.total_edges, 2);
        assert_eq!(stats.expansion_ratio(), 0.5);
        assert_eq!(stats.branching_factor(), 1.0);
    }

    #[test]
    fn test_tree_serialization() {
        let mut tree = MCTSTree::new(PlayerId::ZERO);
        tree.get_mut(NodeId::ROOT).visits = 50;

        let json = serde_json::to_string(&tree).unwrap();
        let back: MCTSTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.root_node().visits, 50);
    }
}
