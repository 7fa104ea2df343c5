// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the graph.

use crate::node::NodeId;
use crate::socket::SocketType;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a link
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub String);

impl LinkId {
    /// Create a new random link ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for LinkId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A directed, typed edge from an output socket to an input socket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Unique link ID
    pub id: LinkId,
    /// Producer node
    pub from_node: NodeId,
    /// Producer output socket
    pub from_socket: String,
    /// Consumer node
    pub to_node: NodeId,
    /// Consumer input socket
    pub to_socket: String,
    /// Categories carried by this link
    #[serde(rename = "type")]
    pub socket_type: SocketType,
}

impl Link {
    /// Create a new link with a fresh id
    pub fn new(
        from_node: NodeId,
        from_socket: impl Into<String>,
        to_node: NodeId,
        to_socket: impl Into<String>,
        socket_type: SocketType,
    ) -> Self {
        Self::with_id(
            LinkId::new(),
            from_node,
            from_socket,
            to_node,
            to_socket,
            socket_type,
        )
    }

    /// Create a link with a caller-chosen id
    pub fn with_id(
        id: LinkId,
        from_node: NodeId,
        from_socket: impl Into<String>,
        to_node: NodeId,
        to_socket: impl Into<String>,
        socket_type: SocketType,
    ) -> Self {
        Self {
            id,
            from_node,
            from_socket: from_socket.into(),
            to_node,
            to_socket: to_socket.into(),
            socket_type,
        }
    }

    /// Check if this link touches a specific node
    pub fn involves_node(&self, node_id: &NodeId) -> bool {
        self.from_node == *node_id || self.to_node == *node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let link = Link::with_id(
            LinkId::from("l1"),
            NodeId::from("a"),
            "value",
            NodeId::root(),
            "input",
            SocketType::NUMBER,
        );
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["fromNode"], "a");
        assert_eq!(json["fromSocket"], "value");
        assert_eq!(json["toNode"], "ROOT");
        assert_eq!(json["toSocket"], "input");
        assert_eq!(json["type"], 1);
    }

    #[test]
    fn test_fresh_ids_differ() {
        assert_ne!(LinkId::new(), LinkId::new());
    }
}
