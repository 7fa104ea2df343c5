// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph snapshot containing nodes and links.
//!
//! A [`Graph`] is treated as an immutable value: structural edits go through
//! the pure functions in [`crate::helpers`], which return a new graph.

use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId, NodeTypeId};
use crate::socket::SocketType;
use crate::value::Values;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A node graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes in the graph
    pub(crate) nodes: IndexMap<NodeId, Node>,
    /// Links between nodes
    pub(crate) links: IndexMap<LinkId, Link>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph holding only the terminal `ROOT` node
    pub fn with_root(root_type: NodeTypeId, values: Values) -> Self {
        let mut graph = Self::new();
        graph
            .nodes
            .insert(NodeId::root(), Node::new(NodeId::root(), root_type, values));
        graph
    }

    /// Assemble a graph from raw maps, without checking invariants
    pub fn from_parts(nodes: IndexMap<NodeId, Node>, links: IndexMap<LinkId, Link>) -> Self {
        Self { nodes, links }
    }

    /// Split into raw maps
    pub fn into_parts(self) -> (IndexMap<NodeId, Node>, IndexMap<LinkId, Link>) {
        (self.nodes, self.links)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Node map keyed by id
    pub fn node_map(&self) -> &IndexMap<NodeId, Node> {
        &self.nodes
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether a node exists
    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Get a link by ID
    pub fn link(&self, link_id: &LinkId) -> Option<&Link> {
        self.links.get(link_id)
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Link map keyed by id
    pub fn link_map(&self) -> &IndexMap<LinkId, Link> {
        &self.links
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// The link feeding an input socket, if the socket is wired and the
    /// link still exists
    pub fn input_link(&self, node_id: &NodeId, socket: &str) -> Option<&Link> {
        let link_id = self.nodes.get(node_id)?.input_link(socket)?;
        self.links.get(link_id)
    }

    /// Get links touching a node
    pub fn links_for_node<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a Link> {
        self.links.values().filter(move |l| l.involves_node(node_id))
    }

    /// Nodes directly downstream of `node_id`
    pub fn consumers<'a>(&'a self, node_id: &NodeId) -> impl Iterator<Item = &'a NodeId> {
        self.nodes
            .get(node_id)
            .into_iter()
            .flat_map(|n| n.outputs.values().flatten())
            .filter_map(|id| self.links.get(id))
            .map(|l| &l.to_node)
    }

    /// Whether adding a link `from_node → to_node` would close a cycle
    pub fn creates_cycle(&self, from_node: &NodeId, to_node: &NodeId) -> bool {
        if from_node == to_node {
            return true;
        }

        // Walk downstream from the consumer looking for the producer
        let mut visited = HashSet::new();
        let mut stack = vec![to_node];
        while let Some(current) = stack.pop() {
            if current == from_node {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(self.consumers(current));
        }
        false
    }

    /// Check the link bookkeeping invariants, returning a description of
    /// each violation
    pub fn integrity_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for link in self.links.values() {
            match self.nodes.get(&link.to_node) {
                Some(to) if to.input_link(&link.to_socket) == Some(&link.id) => {}
                Some(_) => errors.push(format!("link {} not referenced by its consumer", link.id)),
                None => errors.push(format!("link {} has missing consumer {}", link.id, link.to_node)),
            }
            match self.nodes.get(&link.from_node) {
                Some(from) => {
                    let refs = from
                        .output_links(&link.from_socket)
                        .iter()
                        .filter(|id| **id == link.id)
                        .count();
                    if refs != 1 {
                        errors.push(format!(
                            "link {} referenced {} times by its producer",
                            link.id, refs
                        ));
                    }
                }
                None => errors.push(format!("link {} has missing producer {}", link.id, link.from_node)),
            }
        }

        for node in self.nodes.values() {
            for id in node.link_ids() {
                if !self.links.contains_key(id) {
                    errors.push(format!("node {} references missing link {}", node.id, id));
                }
            }
        }

        errors
    }
}

/// Why a drag-to-connect gesture is refused
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Node type has no registered descriptor
    #[error("Unknown node type: {0}")]
    UnknownNodeType(NodeTypeId),

    /// Socket not declared by the node type
    #[error("Socket {socket} not found on node {node}")]
    SocketNotFound {
        /// Node that was searched
        node: NodeId,
        /// Missing socket
        socket: String,
    },

    /// Producer and consumer share no category
    #[error("Incompatible socket types: {from:?} cannot feed {to:?}")]
    IncompatibleSockets {
        /// Producer socket type
        from: SocketType,
        /// Consumer socket type
        to: SocketType,
    },

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// The link would make a node depend on itself
    #[error("Link would create a cycle")]
    Cycle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers;

    fn chain() -> Graph {
        // a → b → c
        let mut g = Graph::new();
        for id in ["a", "b", "c"] {
            g = helpers::append(&g, NodeId::from(id), NodeTypeId::from("T"), Values::new());
        }
        g = helpers::connect(
            &g,
            Link::with_id("ab".into(), "a".into(), "out", "b".into(), "in", SocketType::NUMBER),
        );
        helpers::connect(
            &g,
            Link::with_id("bc".into(), "b".into(), "out", "c".into(), "in", SocketType::NUMBER),
        )
    }

    #[test]
    fn test_with_root() {
        let g = Graph::with_root(NodeTypeId::from("ROOT"), Values::new());
        assert_eq!(g.node_count(), 1);
        assert!(g.contains_node(&NodeId::root()));
    }

    #[test]
    fn test_input_link_lookup() {
        let g = chain();
        let link = g.input_link(&"c".into(), "in").unwrap();
        assert_eq!(link.from_node, NodeId::from("b"));
        assert!(g.input_link(&"a".into(), "in").is_none());
        assert!(g.input_link(&"missing".into(), "in").is_none());
    }

    #[test]
    fn test_cycle_detection() {
        let g = chain();
        assert!(g.creates_cycle(&"c".into(), &"a".into()));
        assert!(g.creates_cycle(&"b".into(), &"b".into()));
        assert!(!g.creates_cycle(&"a".into(), &"c".into()));
    }

    #[test]
    fn test_integrity_of_helper_built_graph() {
        let g = chain();
        assert!(g.integrity_errors().is_empty());

        let mut broken = g.clone();
        broken.links.swap_remove(&LinkId::from("ab"));
        assert_eq!(broken.integrity_errors().len(), 2);
    }
}
