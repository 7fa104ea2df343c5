// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node instances, node type descriptors and the registry that maps one to
//! the other.

use crate::evaluation::{NodeContext, ResolveError};
use crate::hooks::NodeHooks;
use crate::link::LinkId;
use crate::output::Output;
use crate::socket::SocketSpec;
use crate::value::Values;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Id of the terminal output node
    pub const ROOT: &'static str = "ROOT";

    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The terminal output node
    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    /// Whether this is the terminal output node
    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag naming the descriptor that governs a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeTypeId(pub String);

impl NodeTypeId {
    /// Create a type tag
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw tag
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeTypeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for NodeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cosmetic category of a node type, used for theming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavour {
    /// Plain
    #[default]
    Normal,
    /// Highlighted, used for value sources
    Accent,
    /// Stronger highlight, used for the output node
    Emphasis,
    /// Utility and informational nodes
    Help,
    /// Nodes that can get expensive
    Warning,
    /// Destructive or experimental nodes
    Danger,
}

impl Flavour {
    /// All flavours in menu order
    pub fn all() -> &'static [Flavour] {
        &[
            Flavour::Emphasis,
            Flavour::Accent,
            Flavour::Normal,
            Flavour::Help,
            Flavour::Warning,
            Flavour::Danger,
        ]
    }

    /// Header colour for node panels
    pub fn color(self) -> [u8; 3] {
        match self {
            Flavour::Normal => [70, 100, 130],
            Flavour::Accent => [60, 130, 110],
            Flavour::Emphasis => [140, 90, 170],
            Flavour::Help => [90, 110, 150],
            Flavour::Warning => [180, 140, 60],
            Flavour::Danger => [170, 70, 70],
        }
    }
}

/// Reference to an icon by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconRef(pub &'static str);

/// A node instance in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Descriptor governing this node
    #[serde(rename = "type")]
    pub node_type: NodeTypeId,
    /// Type-specific persisted fields
    #[serde(default)]
    pub values: Values,
    /// Input socket → incoming link, if any
    #[serde(rename = "in", default)]
    pub inputs: IndexMap<String, Option<LinkId>>,
    /// Output socket → outgoing links in connection order
    #[serde(rename = "out", default)]
    pub outputs: IndexMap<String, Vec<LinkId>>,
}

impl Node {
    /// Create a node with no links
    pub fn new(id: NodeId, node_type: NodeTypeId, values: Values) -> Self {
        Self {
            id,
            node_type,
            values,
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
        }
    }

    /// Link currently feeding an input socket
    pub fn input_link(&self, socket: &str) -> Option<&LinkId> {
        self.inputs.get(socket).and_then(Option::as_ref)
    }

    /// Links leaving an output socket
    pub fn output_links(&self, socket: &str) -> &[LinkId] {
        self.outputs.get(socket).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every link id this node references, inputs first
    pub fn link_ids(&self) -> impl Iterator<Item = &LinkId> {
        self.inputs
            .values()
            .filter_map(Option::as_ref)
            .chain(self.outputs.values().flatten())
    }
}

/// Descriptor of a node type: metadata plus the capabilities the engine
/// dispatches to.
pub trait NodeHelper: Send + Sync {
    /// Type tag stored on instances
    fn node_type(&self) -> NodeTypeId;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Icon shown in the add-node menu
    fn button_icon(&self) -> IconRef;

    /// Icon shown in the node header
    fn node_icon(&self) -> IconRef {
        self.button_icon()
    }

    /// Theming category
    fn flavour(&self) -> Flavour {
        Flavour::Normal
    }

    /// Declared input sockets
    fn inputs(&self) -> &'static [SocketSpec] {
        &[]
    }

    /// Declared output sockets
    fn outputs(&self) -> &'static [SocketSpec] {
        &[]
    }

    /// Default values for a freshly created node
    fn initialize(&self) -> Values;

    /// Resolve one of this node's output sockets
    fn get_output(&self, node: &NodeContext<'_>, socket: &str)
        -> Result<Option<Output>, ResolveError>;

    /// Draw the node's manual-entry widgets
    fn controls(&self, _ui: &mut egui::Ui, _hooks: &NodeHooks<'_>) {}
}

/// Registry of available node types
pub struct NodeRegistry {
    /// Registered descriptors by type tag
    types: IndexMap<NodeTypeId, Arc<dyn NodeHelper>>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register a node type, replacing any previous descriptor for the tag
    pub fn register(&mut self, helper: impl NodeHelper + 'static) {
        let id = helper.node_type();
        if self.types.insert(id.clone(), Arc::new(helper)).is_some() {
            tracing::warn!("Node type {} registered twice; keeping the latest", id);
        }
    }

    /// Look up the descriptor for a type tag
    pub fn get(&self, id: &NodeTypeId) -> Option<&dyn NodeHelper> {
        self.types.get(id).map(|h| h.as_ref())
    }

    /// Whether a type tag is registered
    pub fn contains(&self, id: &NodeTypeId) -> bool {
        self.types.contains_key(id)
    }

    /// Get all registered descriptors
    pub fn helpers(&self) -> impl Iterator<Item = &dyn NodeHelper> {
        self.types.values().map(|h| h.as_ref())
    }

    /// Get descriptors by flavour
    pub fn helpers_in_flavour(&self, flavour: Flavour) -> impl Iterator<Item = &dyn NodeHelper> {
        self.helpers().filter(move |h| h.flavour() == flavour)
    }

    /// Default values for a type, if registered
    pub fn initialize(&self, id: &NodeTypeId) -> Option<Values> {
        self.get(id).map(|h| h.initialize())
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}
