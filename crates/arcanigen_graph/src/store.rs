// SPDX-License-Identifier: MIT OR Apache-2.0
//! The mutable graph store.
//!
//! The store owns two independent cells, the graph snapshot and the canvas
//! position map, each with its own subscriber set. Dragging a node churns
//! positions many times per second; keeping that channel separate means
//! graph-dependent state is only recomputed on structural or value edits.
//!
//! Subscribers receive no payload. They are called synchronously after the
//! new snapshot is installed and pull it with [`GraphStore::get_graph`] or
//! [`GraphStore::get_positions`].

use crate::evaluation::{Evaluation, Globals, ResolveError};
use crate::graph::{ConnectionError, Graph};
use crate::helpers;
use crate::hooks::NodeHooks;
use crate::link::{Link, LinkId};
use crate::node::{NodeId, NodeRegistry, NodeTypeId};
use crate::output::{Output, Shape};
use crate::settings::EngineSettings;
use crate::socket::{are_sockets_compatible, find_socket, SocketType};
use crate::value::{Key, ValueKind, Values};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Type tag of the terminal output node
pub const ROOT_TYPE: &str = "ROOT";

/// Output socket of the terminal node holding the finished artwork
pub const ROOT_OUTPUT: &str = "output";

/// Toggle key for a node's main panel
pub const NODE_PANEL: &str = "node";

/// Canvas coordinates of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal
    pub x: f64,
    /// Vertical
    pub y: f64,
}

impl Position {
    /// Create a position
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Canvas positions by node
pub type Positions = IndexMap<NodeId, Position>;

/// Open/closed state of each node's panels, keyed by panel id
pub type Toggles = IndexMap<NodeId, IndexMap<String, bool>>;

/// Replacement for a stored value: a literal, or a function of the
/// previous value
pub enum Setter<T> {
    /// Use this value
    Replace(T),
    /// Derive the new value from the previous one
    Update(Box<dyn FnOnce(T) -> T>),
}

impl<T> Setter<T> {
    /// Wrap an updater function
    pub fn update(f: impl FnOnce(T) -> T + 'static) -> Self {
        Self::Update(Box::new(f))
    }

    /// Produce the new value
    pub fn apply(self, previous: T) -> T {
        match self {
            Self::Replace(value) => value,
            Self::Update(f) => f(previous),
        }
    }
}

impl<T> From<T> for Setter<T> {
    fn from(value: T) -> Self {
        Self::Replace(value)
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(_) => f.write_str("Setter::Replace"),
            Self::Update(_) => f.write_str("Setter::Update"),
        }
    }
}

type Callback = Arc<dyn Fn() + Send + Sync>;

/// A set of change callbacks
#[derive(Default)]
pub(crate) struct SubscriberSet {
    next_id: AtomicU64,
    callbacks: RwLock<IndexMap<u64, Callback>>,
}

impl SubscriberSet {
    fn subscribe(self: &Arc<Self>, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks.write().insert(id, Arc::new(callback));
        Subscription {
            set: Arc::downgrade(self),
            id,
        }
    }

    pub(crate) fn notify(&self) {
        // Snapshot first so callbacks may subscribe, unsubscribe or read the
        // store without contending for this lock
        let callbacks: Vec<Callback> = self.callbacks.read().values().cloned().collect();
        for callback in callbacks {
            callback();
        }
    }

    fn len(&self) -> usize {
        self.callbacks.read().len()
    }
}

/// Handle returned by the `sub_to_*` methods.
///
/// Dropping the handle leaves the callback registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[derive(Debug)]
pub struct Subscription {
    set: Weak<SubscriberSet>,
    id: u64,
}

impl Subscription {
    /// Stop receiving notifications
    pub fn unsubscribe(self) {
        if let Some(set) = self.set.upgrade() {
            set.callbacks.write().shift_remove(&self.id);
        }
    }
}

/// Error from a store operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// No descriptor registered for the requested type
    #[error("Unknown node type: {0}")]
    UnknownNodeType(NodeTypeId),
}

/// Process-wide container of the current graph, positions and panel toggles
pub struct GraphStore {
    pub(crate) registry: Arc<NodeRegistry>,
    pub(crate) settings: EngineSettings,
    pub(crate) graph: RwLock<Arc<Graph>>,
    pub(crate) positions: RwLock<Arc<Positions>>,
    pub(crate) toggles: RwLock<Toggles>,
    pub(crate) graph_subscribers: Arc<SubscriberSet>,
    pub(crate) position_subscribers: Arc<SubscriberSet>,
}

impl GraphStore {
    /// Create a store holding only the `ROOT` node at the origin
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self::with_settings(registry, EngineSettings::default())
    }

    /// Create a store with explicit settings
    pub fn with_settings(registry: Arc<NodeRegistry>, settings: EngineSettings) -> Self {
        let root_type = NodeTypeId::from(ROOT_TYPE);
        if !registry.contains(&root_type) {
            tracing::warn!("Registry has no {} descriptor; the output node will not resolve", ROOT_TYPE);
        }
        let root_values = registry.initialize(&root_type).unwrap_or_default();
        let graph = Graph::with_root(root_type, root_values);
        let positions = Positions::from_iter([(NodeId::root(), Position::default())]);

        Self {
            registry,
            settings,
            graph: RwLock::new(Arc::new(graph)),
            positions: RwLock::new(Arc::new(positions)),
            toggles: RwLock::new(Toggles::new()),
            graph_subscribers: Arc::default(),
            position_subscribers: Arc::default(),
        }
    }

    /// Registry used for initialization and dispatch
    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Active settings
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Snapshots and subscriptions
    // ------------------------------------------------------------------

    /// Current graph snapshot
    pub fn get_graph(&self) -> Arc<Graph> {
        Arc::clone(&self.graph.read())
    }

    /// Current position snapshot
    pub fn get_positions(&self) -> Arc<Positions> {
        Arc::clone(&self.positions.read())
    }

    /// Position of one node
    pub fn position(&self, node_id: &NodeId) -> Option<Position> {
        self.positions.read().get(node_id).copied()
    }

    /// Be told whenever the graph changes
    pub fn sub_to_graph(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.graph_subscribers.subscribe(callback)
    }

    /// Be told whenever positions change
    pub fn sub_to_pos(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.position_subscribers.subscribe(callback)
    }

    /// Number of live graph subscribers
    pub fn graph_subscriber_count(&self) -> usize {
        self.graph_subscribers.len()
    }

    /// Number of live position subscribers
    pub fn position_subscriber_count(&self) -> usize {
        self.position_subscribers.len()
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Link an output socket to an input socket, replacing any link already
    /// on the input. Socket types are not checked here; see
    /// [`validate_connection`](Self::validate_connection).
    ///
    /// Returns `None`, without notifying, when either node is missing.
    pub fn connect(
        &self,
        from_node: &NodeId,
        from_socket: &str,
        to_node: &NodeId,
        to_socket: &str,
        socket_type: SocketType,
    ) -> Option<LinkId> {
        let link = Link::new(
            from_node.clone(),
            from_socket,
            to_node.clone(),
            to_socket,
            socket_type,
        );
        let id = link.id.clone();
        let connected = self.mutate_graph(|graph| {
            if !graph.contains_node(from_node) || !graph.contains_node(to_node) {
                tracing::warn!("connect: endpoint {} or {} does not exist", from_node, to_node);
                return false;
            }
            helpers::connect_in_place(graph, link);
            true
        });
        connected.then_some(id)
    }

    /// Remove a link; unknown ids are ignored
    pub fn disconnect(&self, link_id: &LinkId) {
        self.replace_graph(|graph| helpers::disconnect(graph, link_id));
    }

    /// Create a node of `node_type` at `position` with the type's default
    /// values
    pub fn add_node(&self, node_type: &NodeTypeId, position: Position) -> Result<NodeId, StoreError> {
        let values = self
            .registry
            .initialize(node_type)
            .ok_or_else(|| StoreError::UnknownNodeType(node_type.clone()))?;
        let node_id = NodeId::new();

        {
            let mut graph = self.graph.write();
            let mut positions = self.positions.write();
            *graph = Arc::new(helpers::append(&graph, node_id.clone(), node_type.clone(), values));
            Arc::make_mut(&mut positions).insert(node_id.clone(), position);
        }
        tracing::debug!("Added {} node {}", node_type, node_id);

        self.graph_subscribers.notify();
        self.position_subscribers.notify();
        Ok(node_id)
    }

    /// Sever a node's links and delete it with its position and toggles.
    ///
    /// The engine does not protect `ROOT`; the editor UI does.
    pub fn remove_node(&self, node_id: &NodeId) {
        {
            let mut graph = self.graph.write();
            let mut positions = self.positions.write();
            *graph = Arc::new(helpers::remove(&graph, node_id));
            Arc::make_mut(&mut positions).shift_remove(node_id);
            self.toggles.write().shift_remove(node_id);
        }

        self.graph_subscribers.notify();
        self.position_subscribers.notify();
    }

    /// Move a node on the canvas; ids not in the graph are ignored
    pub fn set_position(&self, node_id: &NodeId, position: Position) {
        if !self.graph.read().contains_node(node_id) {
            tracing::warn!("set_position on missing node {}", node_id);
            return;
        }
        {
            let mut positions = self.positions.write();
            Arc::make_mut(&mut positions).insert(node_id.clone(), position);
        }
        self.position_subscribers.notify();
    }

    // ------------------------------------------------------------------
    // Value edits
    // ------------------------------------------------------------------

    /// Write one field of a node's values.
    ///
    /// An updater receives the current value, or the type's default when
    /// the field is absent. It runs with no lock held, so it may read the
    /// store.
    pub fn set<T: ValueKind>(&self, node_id: &NodeId, key: Key<T>, setter: impl Into<Setter<T>>) {
        let value = match setter.into() {
            Setter::Replace(value) => value,
            Setter::Update(f) => {
                let Some(previous) = self.read_values(node_id, |values| key.get(values).unwrap_or_default())
                else {
                    tracing::warn!("set {} on missing node {}", key.name(), node_id);
                    return;
                };
                f(previous)
            }
        };
        self.mutate_graph(|graph| {
            let Some(node) = graph.nodes.get_mut(node_id) else {
                tracing::warn!("set {} on missing node {}", key.name(), node_id);
                return false;
            };
            key.put(&mut node.values, value);
            true
        });
    }

    /// Shallow-merge a partial values bag into a node's values.
    ///
    /// An updater receives the complete current bag and returns the partial
    /// to merge. Like [`set`](Self::set), it runs with no lock held.
    pub fn set_partial(&self, node_id: &NodeId, partial: impl Into<Setter<Values>>) {
        let partial = match partial.into() {
            Setter::Replace(partial) => partial,
            Setter::Update(f) => {
                let Some(previous) = self.read_values(node_id, Values::clone) else {
                    tracing::warn!("set_partial on missing node {}", node_id);
                    return;
                };
                f(previous)
            }
        };
        self.mutate_graph(|graph| {
            let Some(node) = graph.nodes.get_mut(node_id) else {
                tracing::warn!("set_partial on missing node {}", node_id);
                return false;
            };
            node.values.extend(partial);
            true
        });
    }

    // ------------------------------------------------------------------
    // Connection validation
    // ------------------------------------------------------------------

    /// Check a prospective link the way the editor does before letting a
    /// drag-to-connect gesture through. Returns the categories the link
    /// would carry.
    pub fn validate_connection(
        &self,
        from_node: &NodeId,
        from_socket: &str,
        to_node: &NodeId,
        to_socket: &str,
    ) -> Result<SocketType, ConnectionError> {
        let graph = self.get_graph();
        let producer = graph
            .node(from_node)
            .ok_or_else(|| ConnectionError::NodeNotFound(from_node.clone()))?;
        let consumer = graph
            .node(to_node)
            .ok_or_else(|| ConnectionError::NodeNotFound(to_node.clone()))?;

        if from_node == to_node {
            return Err(ConnectionError::SelfLoop);
        }

        let producer_helper = self
            .registry
            .get(&producer.node_type)
            .ok_or_else(|| ConnectionError::UnknownNodeType(producer.node_type.clone()))?;
        let consumer_helper = self
            .registry
            .get(&consumer.node_type)
            .ok_or_else(|| ConnectionError::UnknownNodeType(consumer.node_type.clone()))?;

        let output = find_socket(producer_helper.outputs(), from_socket).ok_or_else(|| {
            ConnectionError::SocketNotFound {
                node: from_node.clone(),
                socket: from_socket.to_string(),
            }
        })?;
        let input = find_socket(consumer_helper.inputs(), to_socket).ok_or_else(|| {
            ConnectionError::SocketNotFound {
                node: to_node.clone(),
                socket: to_socket.to_string(),
            }
        })?;

        if !are_sockets_compatible(output.socket_type, input.socket_type) {
            return Err(ConnectionError::IncompatibleSockets {
                from: output.socket_type,
                to: input.socket_type,
            });
        }
        if graph.creates_cycle(from_node, to_node) {
            return Err(ConnectionError::Cycle);
        }

        Ok(output.socket_type & input.socket_type)
    }

    /// Validate, then connect
    pub fn try_connect(
        &self,
        from_node: &NodeId,
        from_socket: &str,
        to_node: &NodeId,
        to_socket: &str,
    ) -> Result<LinkId, ConnectionError> {
        let socket_type = self.validate_connection(from_node, from_socket, to_node, to_socket)?;
        // A concurrent removal can still win between validation and connect
        self.connect(from_node, from_socket, to_node, to_socket, socket_type)
            .ok_or_else(|| ConnectionError::NodeNotFound(to_node.clone()))
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Resolve an output socket against the current snapshot
    pub fn evaluate(
        &self,
        node_id: &NodeId,
        socket: &str,
        globals: &Globals,
    ) -> Result<Option<Output>, ResolveError> {
        let graph = self.get_graph();
        Evaluation::with_settings(&graph, &self.registry, self.settings.evaluation)
            .get_output(node_id, socket, globals)
    }

    /// Resolve the finished artwork from the `ROOT` node
    pub fn render(&self) -> Result<Option<Shape>, ResolveError> {
        let output = self.evaluate(&NodeId::root(), ROOT_OUTPUT, &Globals::new())?;
        Ok(match output {
            Some(Output::Shape(shape)) => Some(shape),
            _ => None,
        })
    }

    /// Accessors bound to one node, for control UIs
    pub fn hooks(&self, node_id: &NodeId) -> NodeHooks<'_> {
        NodeHooks::new(self, node_id.clone())
    }

    // ------------------------------------------------------------------
    // Panel toggles
    // ------------------------------------------------------------------

    /// Whether a node panel is open
    pub fn is_open(&self, node_id: &NodeId, panel: &str) -> bool {
        self.toggles
            .read()
            .get(node_id)
            .and_then(|panels| panels.get(panel))
            .copied()
            .unwrap_or(self.settings.default_panel_open)
    }

    /// Open or close a node panel
    pub fn set_open(&self, node_id: &NodeId, panel: &str, open: bool) {
        self.toggles
            .write()
            .entry(node_id.clone())
            .or_default()
            .insert(panel.to_string(), open);
    }

    /// Flip a node panel, returning the new state
    pub fn toggle(&self, node_id: &NodeId, panel: &str) -> bool {
        let open = !self.is_open(node_id, panel);
        self.set_open(node_id, panel, open);
        open
    }

    /// Copy of every stored toggle
    pub fn toggles(&self) -> Toggles {
        self.toggles.read().clone()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Swap in a graph derived from the current one, then notify
    fn replace_graph(&self, f: impl FnOnce(&Graph) -> Graph) {
        {
            let mut graph = self.graph.write();
            let next = f(&graph);
            *graph = Arc::new(next);
        }
        self.graph_subscribers.notify();
    }

    /// Read one node's values under a short-lived read lock
    fn read_values<R>(&self, node_id: &NodeId, f: impl FnOnce(&Values) -> R) -> Option<R> {
        self.graph.read().node(node_id).map(|node| f(&node.values))
    }

    /// Edit the graph in place (copying only if a snapshot is shared);
    /// notify if `f` reports a change
    fn mutate_graph(&self, f: impl FnOnce(&mut Graph) -> bool) -> bool {
        let changed = {
            let mut graph = self.graph.write();
            f(Arc::make_mut(&mut graph))
        };
        if changed {
            self.graph_subscribers.notify();
        }
        changed
    }
}

impl fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.graph.read();
        f.debug_struct("GraphStore")
            .field("nodes", &graph.node_count())
            .field("links", &graph.link_count())
            .field("registry", &self.registry)
            .finish()
    }
}
