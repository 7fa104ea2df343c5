// SPDX-License-Identifier: MIT OR Apache-2.0
//! Save and load of `.trh` documents.
//!
//! A document is the graph plus canvas positions plus panel toggles, as JSON.
//! Loading replaces all three wholesale.

use crate::graph::Graph;
use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId};
use crate::store::{GraphStore, Positions, Toggles};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Document format version written by [`GraphStore::save`]
pub const DOCUMENT_VERSION: &str = "1";

/// File extension of saved documents
pub const DOCUMENT_EXTENSION: &str = "trh";

/// A persisted editor state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Format version
    pub version: String,
    /// Nodes by id
    #[serde(default)]
    pub nodes: IndexMap<NodeId, Node>,
    /// Links by id
    #[serde(default)]
    pub links: IndexMap<LinkId, Link>,
    /// Canvas positions by node
    #[serde(default)]
    pub positions: Positions,
    /// Panel open states by node
    #[serde(default)]
    pub toggles: Toggles,
}

impl Document {
    /// Parse a document
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON.
    ///
    /// Fails on NaN or infinite numbers, which JSON would write as `null`
    /// and then refuse to read back.
    pub fn to_json(&self) -> Result<String, PersistError> {
        self.check_finite()?;
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check_finite(&self) -> Result<(), PersistError> {
        for (node_id, node) in &self.nodes {
            if let Some((field, _)) = node.values.iter().find(|(_, v)| !v.is_finite()) {
                return Err(PersistError::NonFinite {
                    node: node_id.clone(),
                    field: field.clone(),
                });
            }
        }
        for (node_id, position) in &self.positions {
            if !(position.x.is_finite() && position.y.is_finite()) {
                return Err(PersistError::NonFinite {
                    node: node_id.clone(),
                    field: "position".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Error during save or load
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Malformed or mistyped JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A number JSON cannot represent
    #[error("Non-finite number in {field} of node {node}")]
    NonFinite {
        /// Offending node
        node: NodeId,
        /// Value field, or `position`
        field: String,
    },
}

impl GraphStore {
    /// Capture the current graph, positions and toggles
    pub fn save(&self) -> Document {
        let (nodes, links) = Graph::clone(&self.get_graph()).into_parts();
        Document {
            version: DOCUMENT_VERSION.to_string(),
            nodes,
            links,
            positions: Positions::clone(&self.get_positions()),
            toggles: self.toggles(),
        }
    }

    /// Replace the graph, positions and toggles with a document's contents
    pub fn load(&self, document: Document) {
        if document.version != DOCUMENT_VERSION {
            tracing::warn!(
                "Loading document version {} (expected {})",
                document.version,
                DOCUMENT_VERSION
            );
        }

        let graph = Graph::from_parts(document.nodes, document.links);
        for problem in graph.integrity_errors() {
            tracing::warn!("Loaded document: {}", problem);
        }
        tracing::info!(
            "Loaded document with {} nodes and {} links",
            graph.node_count(),
            graph.link_count()
        );

        {
            let mut current_graph = self.graph.write();
            let mut current_positions = self.positions.write();
            let mut current_toggles = self.toggles.write();
            *current_graph = Arc::new(graph);
            *current_positions = Arc::new(document.positions);
            *current_toggles = document.toggles;
        }

        self.graph_subscribers.notify();
        self.position_subscribers.notify();
    }

    /// Serialize the current state to pretty JSON
    pub fn save_json(&self) -> Result<String, PersistError> {
        self.save().to_json()
    }

    /// Parse and load a JSON document; the store is untouched on failure
    pub fn load_json(&self, json: &str) -> Result<(), PersistError> {
        let document = Document::from_json(json).map_err(|e| {
            tracing::error!("Failed to parse document: {}", e);
            e
        })?;
        self.load(document);
        Ok(())
    }

    /// Write the current state to a file
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        std::fs::write(path, self.save_json()?)?;
        tracing::info!("Saved document to {:?}", path);
        Ok(())
    }

    /// Load a document from a file
    pub fn load_from_path(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            tracing::error!("Failed to read {:?}: {}", path, e);
            e
        })?;
        self.load_json(&json)
    }
}
