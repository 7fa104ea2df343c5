// SPDX-License-Identifier: MIT OR Apache-2.0
//! On-demand output resolution.
//!
//! Resolving a node's output socket dispatches to its type's
//! [`NodeHelper::get_output`](crate::node::NodeHelper::get_output), which
//! reads its own inputs through a [`NodeContext`]; each wired input
//! recursively resolves the upstream producer. One [`Evaluation`] is one
//! pass: results are cached per `(node, socket, globals)` for the lifetime
//! of the pass, and the chain of in-flight resolutions is tracked so that
//! a cyclic graph fails with [`ResolveError::Cycle`] instead of overflowing
//! the stack.

use crate::graph::Graph;
use crate::node::{Node, NodeId, NodeRegistry};
use crate::output::Output;
use crate::settings::EvaluationSettings;
use crate::value::{Key, ValueKind};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// One level of an enclosing repeat
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Iteration {
    /// The repeating node
    pub node: NodeId,
    /// Zero-based clone index
    pub index: usize,
    /// Total clones
    pub count: usize,
}

/// Ambient context threaded through resolution but never persisted.
///
/// Globals are immutable; nesting produces a new value so the same subgraph
/// can be resolved under many contexts without aliasing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Globals {
    iterations: Vec<Iteration>,
}

impl Globals {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for one clone of a repeating node, nested inside this one
    pub fn with_iteration(&self, node: NodeId, index: usize, count: usize) -> Self {
        let mut iterations = self.iterations.clone();
        iterations.push(Iteration { node, index, count });
        Self { iterations }
    }

    /// Innermost enclosing iteration
    pub fn innermost(&self) -> Option<&Iteration> {
        self.iterations.last()
    }

    /// Iteration of a specific repeating node, if it encloses this context
    pub fn iteration_of(&self, node: &NodeId) -> Option<&Iteration> {
        self.iterations.iter().rev().find(|i| i.node == *node)
    }

    /// All enclosing iterations, outermost first
    pub fn iterations(&self) -> &[Iteration] {
        &self.iterations
    }

    /// Nesting depth
    pub fn depth(&self) -> usize {
        self.iterations.len()
    }
}

/// Error during output resolution
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// A socket depends on itself through its inputs
    #[error("Cycle detected while resolving {node}.{socket}")]
    Cycle {
        /// Node that was re-entered
        node: NodeId,
        /// Socket that was re-entered
        socket: String,
    },

    /// Resolution nested deeper than the configured bound
    #[error("Resolution exceeded {0} nested levels")]
    DepthExceeded(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    node: NodeId,
    socket: String,
    globals: Globals,
}

/// A single resolution pass over one graph snapshot
pub struct Evaluation<'g> {
    graph: &'g Graph,
    registry: &'g NodeRegistry,
    settings: EvaluationSettings,
    cache: RefCell<HashMap<CacheKey, Option<Output>>>,
    active: RefCell<Vec<(NodeId, String)>>,
    resolutions: Cell<usize>,
}

impl<'g> Evaluation<'g> {
    /// Start a pass with default settings
    pub fn new(graph: &'g Graph, registry: &'g NodeRegistry) -> Self {
        Self::with_settings(graph, registry, EvaluationSettings::default())
    }

    /// Start a pass with explicit settings
    pub fn with_settings(
        graph: &'g Graph,
        registry: &'g NodeRegistry,
        settings: EvaluationSettings,
    ) -> Self {
        Self {
            graph,
            registry,
            settings,
            cache: RefCell::new(HashMap::new()),
            active: RefCell::new(Vec::new()),
            resolutions: Cell::new(0),
        }
    }

    /// The snapshot being resolved
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Registry used for dispatch
    pub fn registry(&self) -> &'g NodeRegistry {
        self.registry
    }

    /// Number of times a node type's resolver actually ran in this pass
    pub fn resolution_count(&self) -> usize {
        self.resolutions.get()
    }

    /// Resolve `node_id`'s output `socket` under `globals`.
    ///
    /// A missing node or unregistered type yields `Ok(None)`.
    pub fn get_output(
        &self,
        node_id: &NodeId,
        socket: &str,
        globals: &Globals,
    ) -> Result<Option<Output>, ResolveError> {
        let Some(node) = self.graph.node(node_id) else {
            tracing::debug!("Resolving missing node {}", node_id);
            return Ok(None);
        };
        let Some(helper) = self.registry.get(&node.node_type) else {
            tracing::warn!("No descriptor for node type {} ({})", node.node_type, node_id);
            return Ok(None);
        };

        let key = CacheKey {
            node: node_id.clone(),
            socket: socket.to_string(),
            globals: globals.clone(),
        };
        if self.settings.memoize {
            if let Some(hit) = self.cache.borrow().get(&key) {
                return Ok(hit.clone());
            }
        }

        {
            let mut active = self.active.borrow_mut();
            if active.iter().any(|(n, s)| n == node_id && s == socket) {
                tracing::warn!("Cycle through {}.{}", node_id, socket);
                return Err(ResolveError::Cycle {
                    node: node_id.clone(),
                    socket: socket.to_string(),
                });
            }
            if active.len() >= self.settings.max_depth {
                return Err(ResolveError::DepthExceeded(self.settings.max_depth));
            }
            active.push((node_id.clone(), socket.to_string()));
        }

        let context = NodeContext {
            evaluation: self,
            node_id,
            globals,
        };
        let result = helper.get_output(&context, socket);
        self.active.borrow_mut().pop();
        self.resolutions.set(self.resolutions.get() + 1);

        let output = result?;
        if self.settings.memoize {
            self.cache.borrow_mut().insert(key, output.clone());
        }
        Ok(output)
    }
}

/// Read access to one node during resolution.
///
/// This is what a node type's `get_output` sees: its own stored values, and
/// its inputs resolved under the current globals.
pub struct NodeContext<'a> {
    evaluation: &'a Evaluation<'a>,
    node_id: &'a NodeId,
    globals: &'a Globals,
}

impl<'a> NodeContext<'a> {
    /// The node being resolved
    pub fn id(&self) -> &'a NodeId {
        self.node_id
    }

    /// Ambient context of this resolution
    pub fn globals(&self) -> &'a Globals {
        self.globals
    }

    /// The snapshot being resolved
    pub fn graph(&self) -> &'a Graph {
        self.evaluation.graph
    }

    /// The node record
    pub fn node(&self) -> Option<&'a Node> {
        self.evaluation.graph.node(self.node_id)
    }

    /// Stored value of a field
    pub fn value<T: ValueKind>(&self, key: Key<T>) -> Option<T> {
        self.node().and_then(|n| key.get(&n.values))
    }

    /// Whether an input socket is wired
    pub fn has_link(&self, socket: &str) -> bool {
        self.evaluation.graph.input_link(self.node_id, socket).is_some()
    }

    /// Resolve whatever feeds an input socket; `None` when unwired
    pub fn input(&self, socket: &str) -> Result<Option<Output>, ResolveError> {
        self.input_with(socket, self.globals)
    }

    /// Resolve an input socket under different globals
    pub fn input_with(&self, socket: &str, globals: &Globals) -> Result<Option<Output>, ResolveError> {
        match self.evaluation.graph.input_link(self.node_id, socket) {
            Some(link) => self
                .evaluation
                .get_output(&link.from_node, &link.from_socket, globals),
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

    /// [`coalesce`](Self::coalesce), falling back to the type's default
    pub fn coalesce_or_default<T: ValueKind>(&self, socket: &str, key: Key<T>) -> Result<T, ResolveError> {
        Ok(self.coalesce(socket, key)?.unwrap_or_default())
    }

    /// The producer wired into an input socket, for consumers that resolve
    /// it themselves (repeatedly, or under altered globals)
    pub fn input_node(&self, socket: &str) -> Option<InputNode<'a>> {
        let link = self.evaluation.graph.input_link(self.node_id, socket)?;
        if !self.evaluation.graph.contains_node(&link.from_node) {
            return None;
        }
        Some(InputNode {
            evaluation: self.evaluation,
            producer: &link.from_node,
            socket: &link.from_socket,
        })
    }
}

/// Handle on an upstream producer socket
pub struct InputNode<'a> {
    evaluation: &'a Evaluation<'a>,
    producer: &'a NodeId,
    socket: &'a str,
}

impl<'a> InputNode<'a> {
    /// The producing node
    pub fn producer(&self) -> &'a NodeId {
        self.producer
    }

    /// The producing socket
    pub fn socket(&self) -> &'a str {
        self.socket
    }

    /// Resolve the producer under the given globals
    pub fn resolve(&self, globals: &Globals) -> Result<Option<Output>, ResolveError> {
        self.evaluation.get_output(self.producer, self.socket, globals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers;
    use crate::link::Link;
    use crate::socket::SocketType;
    use crate::test_support::{graph_of, registry, ConstNode, PassNode, RepeatNode, SumNode};

    fn wire(g: &Graph, from: &str, from_socket: &str, to: &str, to_socket: &str) -> Graph {
        helpers::connect(
            g,
            Link::new(from.into(), from_socket, to.into(), to_socket, SocketType::NUMBER),
        )
    }

    #[test]
    fn test_unwired_coalesce_uses_stored_value() {
        let g = graph_of(&[("p", PassNode::TYPE)]);
        let registry = registry();
        let eval = Evaluation::new(&g, &registry);

        let out = eval.get_output(&"p".into(), "output", &Globals::new()).unwrap();
        assert_eq!(out, Some(Output::Number(PassNode::DEFAULT_FALLBACK)));
    }

    #[test]
    fn test_wired_coalesce_uses_producer() {
        let g = graph_of(&[("c", ConstNode::TYPE), ("p", PassNode::TYPE)]);
        let g = wire(&g, "c", "value", "p", "input");
        let registry = registry();
        let eval = Evaluation::new(&g, &registry);

        let out = eval.get_output(&"p".into(), "output", &Globals::new()).unwrap();
        assert_eq!(out, Some(Output::Number(ConstNode::DEFAULT_VALUE)));
    }

    #[test]
    fn test_missing_node_and_type_resolve_to_none() {
        let g = graph_of(&[("x", "UNREGISTERED")]);
        let registry = registry();
        let eval = Evaluation::new(&g, &registry);

        assert_eq!(eval.get_output(&"ghost".into(), "value", &Globals::new()), Ok(None));
        assert_eq!(eval.get_output(&"x".into(), "value", &Globals::new()), Ok(None));
    }

    #[test]
    fn test_vanished_producer_falls_back() {
        let g = graph_of(&[("c", ConstNode::TYPE), ("p", PassNode::TYPE)]);
        let g = wire(&g, "c", "value", "p", "input");
        // Break the invariant on purpose: drop the producer without its links
        let mut broken = g.clone();
        broken.nodes.shift_remove(&NodeId::from("c"));

        let registry = registry();
        let eval = Evaluation::new(&broken, &registry);
        let out = eval.get_output(&"p".into(), "output", &Globals::new()).unwrap();
        assert_eq!(out, Some(Output::Number(PassNode::DEFAULT_FALLBACK)));
    }

    #[test]
    fn test_diamond_is_memoized() {
        // c feeds p1 and p2, both feed s
        let g = graph_of(&[
            ("c", ConstNode::TYPE),
            ("p1", PassNode::TYPE),
            ("p2", PassNode::TYPE),
            ("s", SumNode::TYPE),
        ]);
        let g = wire(&g, "c", "value", "p1", "input");
        let g = wire(&g, "c", "value", "p2", "input");
        let g = wire(&g, "p1", "output", "s", "a");
        let g = wire(&g, "p2", "output", "s", "b");
        let registry = registry();

        let eval = Evaluation::new(&g, &registry);
        let out = eval.get_output(&"s".into(), "sum", &Globals::new()).unwrap();
        assert_eq!(out, Some(Output::Number(2.0 * ConstNode::DEFAULT_VALUE)));
        assert_eq!(eval.resolution_count(), 4);

        let settings = EvaluationSettings {
            memoize: false,
            ..EvaluationSettings::default()
        };
        let eval = Evaluation::with_settings(&g, &registry, settings);
        eval.get_output(&"s".into(), "sum", &Globals::new()).unwrap();
        assert_eq!(eval.resolution_count(), 5);
    }

    #[test]
    fn test_cycle_is_an_error() {
        let g = graph_of(&[("a", PassNode::TYPE), ("b", PassNode::TYPE)]);
        let g = wire(&g, "a", "output", "b", "input");
        let g = wire(&g, "b", "output", "a", "input");
        let registry = registry();
        let eval = Evaluation::new(&g, &registry);

        let err = eval.get_output(&"a".into(), "output", &Globals::new()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::Cycle {
                node: "a".into(),
                socket: "output".into()
            }
        );
    }

    #[test]
    fn test_depth_bound() {
        let ids: Vec<String> = (0..6).map(|i| format!("p{i}")).collect();
        let specs: Vec<(&str, &str)> = ids.iter().map(|id| (id.as_str(), PassNode::TYPE)).collect();
        let mut g = graph_of(&specs);
        for pair in ids.windows(2) {
            g = wire(&g, &pair[0], "output", &pair[1], "input");
        }
        let registry = registry();
        let settings = EvaluationSettings {
            max_depth: 3,
            ..EvaluationSettings::default()
        };
        let eval = Evaluation::with_settings(&g, &registry, settings);

        assert_eq!(
            eval.get_output(&"p5".into(), "output", &Globals::new()),
            Err(ResolveError::DepthExceeded(3))
        );
    }

    #[test]
    fn test_globals_thread_through_repeat() {
        let g = graph_of(&[("r", RepeatNode::TYPE), ("i", crate::test_support::IndexNode::TYPE)]);
        let g = wire(&g, "i", "index", "r", "input");
        let registry = registry();
        let eval = Evaluation::new(&g, &registry);

        let out = eval.get_output(&"r".into(), "output", &Globals::new()).unwrap().unwrap();
        let shape = out.as_shape().unwrap();
        let indices: Vec<f64> = shape
            .children
            .iter()
            .filter_map(|c| match c.attribute("value") {
                Some(crate::value::Value::Number(n)) => Some(*n),
                _ => None,
            })
            .collect();
        assert_eq!(indices, [0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_globals_nesting() {
        let outer = Globals::new().with_iteration("a".into(), 2, 4);
        let inner = outer.with_iteration("b".into(), 1, 3);

        assert_eq!(outer.depth(), 1);
        assert_eq!(inner.innermost().unwrap().node, NodeId::from("b"));
        assert_eq!(inner.iteration_of(&"a".into()).unwrap().index, 2);
        assert!(outer.iteration_of(&"b".into()).is_none());
    }
}
