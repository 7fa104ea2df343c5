// SPDX-License-Identifier: MIT OR Apache-2.0
//! Primitive shape nodes.

use super::{color_control, number_control};
use arcanigen_graph::{
    Color, IconRef, Key, NodeContext, NodeHelper, NodeHooks, NodeTypeId, Output, ResolveError, Shape,
    SocketSpec, SocketType, Values,
};

/// A filled circle centred on the origin
pub struct CircleNode;

impl CircleNode {
    /// Type tag
    pub const TYPE: &'static str = "CIRCLE";
    /// Radius when unwired
    pub const RADIUS: Key<f64> = Key::new("radius");
    /// Fill when unwired
    pub const COLOR: Key<Color> = Key::new("color");
    /// Horizontal offset from the origin
    pub const OFFSET: Key<f64> = Key::new("offset");
}

impl NodeHelper for CircleNode {
    fn node_type(&self) -> NodeTypeId {
        Self::TYPE.into()
    }

    fn name(&self) -> &'static str {
        "Circle"
    }

    fn button_icon(&self) -> IconRef {
        IconRef("circle")
    }

    fn inputs(&self) -> &'static [SocketSpec] {
        const INPUTS: &[SocketSpec] = &[
            SocketSpec::new("radius", "Radius", SocketType::NUMBER),
            SocketSpec::new("color", "Color", SocketType::COLOR),
            SocketSpec::new("offset", "Offset", SocketType::NUMBER),
        ];
        INPUTS
    }

    fn outputs(&self) -> &'static [SocketSpec] {
        const OUTPUTS: &[SocketSpec] = &[SocketSpec::new("output", "Shape", SocketType::SHAPE)];
        OUTPUTS
    }

    fn initialize(&self) -> Values {
        Values::from_iter([
            Self::RADIUS.entry(50.0),
            Self::COLOR.entry(Color::BLACK),
            Self::OFFSET.entry(0.0),
        ])
    }

    fn get_output(&self, node: &NodeContext<'_>, _socket: &str) -> Result<Option<Output>, ResolveError> {
        let radius = node.coalesce_or_default("radius", Self::RADIUS)?.max(0.0);
        let color = node.coalesce_or_default("color", Self::COLOR)?;
        let offset = node.coalesce_or_default("offset", Self::OFFSET)?;

        let circle = Shape::new("circle")
            .with_attribute("cx", offset)
            .with_attribute("cy", 0.0)
            .with_attribute("r", radius)
            .with_attribute("fill", color.to_hex())
            .with_attribute("fill-opacity", f64::from(color.a));
        Ok(Some(circle.into()))
    }

    fn controls(&self, ui: &mut egui::Ui, hooks: &NodeHooks<'_>) {
        number_control(ui, hooks, "Radius", Some("radius"), Self::RADIUS);
        color_control(ui, hooks, "Color", Some("color"), Self::COLOR);
        number_control(ui, hooks, "Offset", Some("offset"), Self::OFFSET);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_registry;
    use crate::nodes::ColorValueNode;
    use arcanigen_graph::{Globals, GraphStore, Position, Value};
    use std::sync::Arc;

    #[test]
    fn test_circle_defaults_and_wired_color() {
        let store = GraphStore::new(Arc::new(create_registry()));
        let circle = store.add_node(&CircleNode::TYPE.into(), Position::default()).unwrap();

        let shape = |store: &GraphStore| match store.evaluate(&circle, "output", &Globals::new()) {
            Ok(Some(Output::Shape(shape))) => shape,
            other => panic!("unexpected output {other:?}"),
        };
        assert_eq!(shape(&store).attribute("r"), Some(&Value::Number(50.0)));
        assert_eq!(shape(&store).attribute("fill"), Some(&Value::from("#000000")));

        let color = store.add_node(&ColorValueNode::TYPE.into(), Position::default()).unwrap();
        store.set(&color, ColorValueNode::COLOR, Color::rgb(0.0, 0.0, 1.0));
        store.try_connect(&color, "color", &circle, "color").unwrap();
        assert_eq!(shape(&store).attribute("fill"), Some(&Value::from("#0000ff")));
    }

    #[test]
    fn test_negative_radius_clamps() {
        let store = GraphStore::new(Arc::new(create_registry()));
        let circle = store.add_node(&CircleNode::TYPE.into(), Position::default()).unwrap();
        store.set(&circle, CircleNode::RADIUS, -5.0);

        let output = store.evaluate(&circle, "output", &Globals::new()).unwrap().unwrap();
        assert_eq!(output.as_shape().unwrap().attribute("r"), Some(&Value::Number(0.0)));
    }
}
