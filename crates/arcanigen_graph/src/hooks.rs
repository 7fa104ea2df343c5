// SPDX-License-Identifier: MIT OR Apache-2.0
//! Store-bound accessors for node control UIs.
//!
//! [`NodeHooks`] mirrors [`NodeContext`](crate::evaluation::NodeContext) but
//! reads the store's current snapshot each call and resolves inputs under
//! empty globals, which is what a panel showing a node's live inputs wants.

use crate::evaluation::{Evaluation, Globals, ResolveError};
use crate::graph::Graph;
use crate::node::{NodeId, NodeRegistry};
use crate::output::Output;
use crate::settings::EvaluationSettings;
use crate::store::{GraphStore, Setter};
use crate::value::{Key, ValueKind};
use std::sync::Arc;

/// Accessors bound to one node of a [`GraphStore`]
#[derive(Debug, Clone)]
pub struct NodeHooks<'s> {
    store: &'s GraphStore,
    node_id: NodeId,
}

impl<'s> NodeHooks<'s> {
    /// Bind to `node_id`
    pub fn new(store: &'s GraphStore, node_id: NodeId) -> Self {
        Self { store, node_id }
    }

    /// The bound node
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// The backing store
    pub fn store(&self) -> &'s GraphStore {
        self.store
    }

    /// Stored value of a field
    pub fn value<T: ValueKind>(&self, key: Key<T>) -> Option<T> {
        self.store
            .get_graph()
            .node(&self.node_id)
            .and_then(|n| key.get(&n.values))
    }

    /// Stored value of a field together with a setter for it
    pub fn value_state<T: ValueKind>(&self, key: Key<T>) -> (Option<T>, ValueSetter<'s, T>) {
        let setter = ValueSetter {
            store: self.store,
            node_id: self.node_id.clone(),
            key,
        };
        (self.value(key), setter)
    }

    /// Whether an input socket is wired
    pub fn has_link(&self, socket: &str) -> bool {
        self.store.get_graph().input_link(&self.node_id, socket).is_some()
    }

    /// Resolve whatever feeds an input socket; `None` when unwired
    pub fn input(&self, socket: &str) -> Result<Option<Output>, ResolveError> {
        match self.input_node(socket) {
            Some((resolver, _)) => resolver.resolve(&Globals::new()),
            None => Ok(None),
        }
    }

    /// The wired value if there is one, otherwise the stored value
    pub fn coalesce<T: ValueKind>(&self, socket: &str, key: Key<T>) -> Result<Option<T>, ResolveError> {
        if let Some(wired) = self.input(socket)?.as_ref().and_then(T::from_output) {
            return Ok(Some(wired));
        }
        Ok(self.value(key))
    }

    /// The producer wired into an input socket and a resolver for it
    pub fn input_node(&self, socket: &str) -> Option<(InputResolver, NodeId)> {
        let graph = self.store.get_graph();
        let link = graph.input_link(&self.node_id, socket)?;
        if !graph.contains_node(&link.from_node) {
            return None;
        }
        let producer = link.from_node.clone();
        let resolver = InputResolver {
            producer: producer.clone(),
            socket: link.from_socket.clone(),
            registry: Arc::clone(self.store.registry()),
            settings: self.store.settings().evaluation,
            graph,
        };
        Some((resolver, producer))
    }
}

/// Writes one field of one node through the store
#[derive(Debug)]
pub struct ValueSetter<'s, T> {
    store: &'s GraphStore,
    node_id: NodeId,
    key: Key<T>,
}

impl<T: ValueKind> ValueSetter<'_, T> {
    /// Replace the field, or update it from its previous value
    pub fn set(&self, setter: impl Into<Setter<T>>) {
        self.store.set(&self.node_id, self.key, setter);
    }
}

/// Resolves one producer socket against the snapshot it was taken from
#[derive(Debug, Clone)]
pub struct InputResolver {
    graph: Arc<Graph>,
    registry: Arc<NodeRegistry>,
    settings: EvaluationSettings,
    producer: NodeId,
    socket: String,
}

impl InputResolver {
    /// The producing socket
    pub fn socket(&self) -> &str {
        &self.socket
    }

    /// Resolve under the given globals
    pub fn resolve(&self, globals: &Globals) -> Result<Option<Output>, ResolveError> {
        Evaluation::with_settings(&self.graph, &self.registry, self.settings)
            .get_output(&self.producer, &self.socket, globals)
    }
}
