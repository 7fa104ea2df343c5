// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pure structural edits.
//!
//! Each function takes a graph snapshot and returns the edited copy; the
//! input is never modified. Callers (the store) swap the stored reference.
//! None of these validate socket types: that is the connecting UI's job.

use crate::graph::Graph;
use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId, NodeTypeId};
use crate::value::Values;

/// Install `link`, first severing whatever link already feeds its target
/// input socket.
pub fn connect(graph: &Graph, link: Link) -> Graph {
    let mut next = graph.clone();
    connect_in_place(&mut next, link);
    next
}

/// Remove a link from both of its endpoints and from the link table.
/// A stale id leaves the graph unchanged.
pub fn disconnect(graph: &Graph, link_id: &LinkId) -> Graph {
    let mut next = graph.clone();
    disconnect_in_place(&mut next, link_id);
    next
}

/// Sever every link touching a node, then delete the node.
pub fn remove(graph: &Graph, node_id: &NodeId) -> Graph {
    let mut next = graph.clone();
    remove_in_place(&mut next, node_id);
    next
}

/// Insert a new unlinked node.
pub fn append(graph: &Graph, node_id: NodeId, node_type: NodeTypeId, values: Values) -> Graph {
    let mut next = graph.clone();
    next.nodes
        .insert(node_id.clone(), Node::new(node_id, node_type, values));
    next
}

pub(crate) fn connect_in_place(graph: &mut Graph, link: Link) {
    if !graph.nodes.contains_key(&link.from_node) || !graph.nodes.contains_key(&link.to_node) {
        tracing::warn!(
            "Ignoring link {}: endpoint {} or {} does not exist",
            link.id,
            link.from_node,
            link.to_node
        );
        return;
    }

    // An input socket holds at most one link
    let previous = graph
        .nodes
        .get(&link.to_node)
        .and_then(|n| n.input_link(&link.to_socket))
        .cloned();
    if let Some(previous) = previous {
        tracing::debug!("Replacing link {} on {}.{}", previous, link.to_node, link.to_socket);
        disconnect_in_place(graph, &previous);
    }

    if let Some(to) = graph.nodes.get_mut(&link.to_node) {
        to.inputs
            .insert(link.to_socket.clone(), Some(link.id.clone()));
    }
    if let Some(from) = graph.nodes.get_mut(&link.from_node) {
        from.outputs
            .entry(link.from_socket.clone())
            .or_default()
            .push(link.id.clone());
    }

    tracing::debug!(
        "Connected {}.{} -> {}.{} as {}",
        link.from_node,
        link.from_socket,
        link.to_node,
        link.to_socket,
        link.id
    );
    graph.links.insert(link.id.clone(), link);
}

pub(crate) fn disconnect_in_place(graph: &mut Graph, link_id: &LinkId) {
    let Some(link) = graph.links.shift_remove(link_id) else {
        tracing::debug!("Disconnect of unknown link {} ignored", link_id);
        return;
    };

    if let Some(to) = graph.nodes.get_mut(&link.to_node) {
        if let Some(slot) = to.inputs.get_mut(&link.to_socket) {
            if slot.as_ref() == Some(link_id) {
                *slot = None;
            }
        }
    }
    if let Some(from) = graph.nodes.get_mut(&link.from_node) {
        if let Some(list) = from.outputs.get_mut(&link.from_socket) {
            list.retain(|id| id != link_id);
        }
    }

    tracing::debug!("Disconnected link {}", link_id);
}

pub(crate) fn remove_in_place(graph: &mut Graph, node_id: &NodeId) {
    let Some(node) = graph.nodes.get(node_id) else {
        tracing::debug!("Removal of unknown node {} ignored", node_id);
        return;
    };

    let link_ids: Vec<LinkId> = node.link_ids().cloned().collect();
    for link_id in &link_ids {
        disconnect_in_place(graph, link_id);
    }
    graph.nodes.shift_remove(node_id);

    tracing::debug!("Removed node {} and {} link(s)", node_id, link_ids.len());
}
