// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node catalogue for Arcanigen.
//!
//! Provides the concrete node types that generate artwork, plus the example
//! documents bundled with the editor:
//! - `ROOT`: the terminal output node
//! - Value sources: numbers, colours, arithmetic
//! - Shapes: circles
//! - Repetition: radial arrays and the iteration they expose

pub mod examples;
pub mod nodes;

use arcanigen_graph::NodeRegistry;

pub use nodes::{
    ArrayNode, CircleNode, ColorValueNode, IterationNode, MathNode, MathOp, NumberValueNode, RootNode,
};

/// Create the node registry with every available node type
pub fn create_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    // Output
    registry.register(RootNode);

    // Values
    registry.register(NumberValueNode);
    registry.register(ColorValueNode);
    registry.register(MathNode);

    // Shapes
    registry.register(CircleNode);

    // Repetition
    registry.register(ArrayNode);
    registry.register(IterationNode);

    tracing::debug!("Registered {} node types", registry.len());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcanigen_graph::{ConnectionError, Flavour, GraphStore, NodeId, NodeTypeId, Position, SocketType};
    use std::sync::Arc;

    #[test]
    fn test_registry_has_all_types() {
        let registry = create_registry();
        assert_eq!(registry.len(), 7);
        for ty in ["ROOT", "VALUE_NUMBER", "VALUE_COLOR", "MATH", "CIRCLE", "ARRAY", "ITERATION"] {
            assert!(registry.contains(&NodeTypeId::from(ty)), "missing {ty}");
        }
    }

    #[test]
    fn test_every_type_initializes() {
        let registry = create_registry();
        for helper in registry.helpers() {
            let values = helper.initialize();
            for spec in helper.inputs().iter().chain(helper.outputs()) {
                assert!(!spec.socket_type.is_empty(), "{} has an untyped socket", spec.id);
            }
            // Fresh values are plain data that survive JSON
            let json = serde_json::to_string(&values).unwrap();
            assert_eq!(serde_json::from_str::<arcanigen_graph::Values>(&json).unwrap(), values);
        }
    }

    #[test]
    fn test_number_into_output_node() {
        let store = GraphStore::new(Arc::new(create_registry()));
        let n1 = store
            .add_node(&NumberValueNode::TYPE.into(), Position::new(0.0, 0.0))
            .unwrap();
        assert_eq!(store.hooks(&n1).value(NumberValueNode::VALUE), Some(0.0));

        // The editor refuses NUMBER into SHAPE
        let root = NodeId::root();
        assert_eq!(
            store.validate_connection(&n1, "value", &root, "input"),
            Err(ConnectionError::IncompatibleSockets {
                from: SocketType::NUMBER,
                to: SocketType::SHAPE
            })
        );
        assert_eq!(store.get_graph().link_count(), 0);

        // The engine itself does not check
        let link = store
            .connect(&n1, "value", &root, "input", SocketType::NUMBER | SocketType::SHAPE)
            .unwrap();
        let graph = store.get_graph();
        assert_eq!(graph.node(&root).unwrap().input_link("input"), Some(&link));
        assert_eq!(graph.node(&n1).unwrap().output_links("value"), [link]);
    }

    #[test]
    fn test_remove_shared_producer() {
        let store = GraphStore::new(Arc::new(create_registry()));
        let a = store.add_node(&NumberValueNode::TYPE.into(), Position::default()).unwrap();
        let b = store.add_node(&MathNode::TYPE.into(), Position::default()).unwrap();
        let c = store.add_node(&MathNode::TYPE.into(), Position::default()).unwrap();
        store.try_connect(&a, "value", &b, "a").unwrap();
        store.try_connect(&a, "value", &c, "b").unwrap();
        assert_eq!(store.get_graph().link_count(), 2);

        store.remove_node(&a);
        let graph = store.get_graph();
        assert!(!graph.contains_node(&a));
        assert_eq!(graph.link_count(), 0);
        assert_eq!(graph.node(&b).unwrap().input_link("a"), None);
        assert_eq!(graph.node(&c).unwrap().input_link("b"), None);
    }

    #[test]
    fn test_flavours() {
        let registry = create_registry();
        assert_eq!(registry.helpers_in_flavour(Flavour::Emphasis).count(), 1);
        assert_eq!(registry.helpers_in_flavour(Flavour::Accent).count(), 2);
    }
}
