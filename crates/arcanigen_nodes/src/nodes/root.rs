// SPDX-License-Identifier: MIT OR Apache-2.0
//! The terminal output node.

use super::{color_control, number_control};
use arcanigen_graph::{
    Color, Flavour, IconRef, Key, NodeContext, NodeHelper, NodeHooks, NodeTypeId, Output, ResolveError,
    Shape, SocketSpec, SocketType, Values,
};

/// Wraps whatever feeds it in an `svg` document centred on the origin
pub struct RootNode;

impl RootNode {
    /// Type tag
    pub const TYPE: &'static str = "ROOT";
    /// Document width
    pub const WIDTH: Key<f64> = Key::new("width");
    /// Document height
    pub const HEIGHT: Key<f64> = Key::new("height");
    /// Fill behind the artwork
    pub const BACKGROUND: Key<Color> = Key::new("background");
}

impl NodeHelper for RootNode {
    fn node_type(&self) -> NodeTypeId {
        Self::TYPE.into()
    }

    fn name(&self) -> &'static str {
        "Output"
    }

    fn button_icon(&self) -> IconRef {
        IconRef("image")
    }

    fn flavour(&self) -> Flavour {
        Flavour::Emphasis
    }

    fn inputs(&self) -> &'static [SocketSpec] {
        const INPUTS: &[SocketSpec] = &[SocketSpec::new("input", "Artwork", SocketType::SHAPE)];
        INPUTS
    }

    fn outputs(&self) -> &'static [SocketSpec] {
        const OUTPUTS: &[SocketSpec] = &[SocketSpec::new("output", "Document", SocketType::SHAPE)];
        OUTPUTS
    }

    fn initialize(&self) -> Values {
        Values::from_iter([
            Self::WIDTH.entry(400.0),
            Self::HEIGHT.entry(400.0),
            Self::BACKGROUND.entry(Color::WHITE),
        ])
    }

    fn get_output(&self, node: &NodeContext<'_>, _socket: &str) -> Result<Option<Output>, ResolveError> {
        let width = node.value(Self::WIDTH).unwrap_or_default();
        let height = node.value(Self::HEIGHT).unwrap_or_default();
        let background = node.value(Self::BACKGROUND).unwrap_or(Color::WHITE);

        let mut svg = Shape::new("svg")
            .with_attribute("width", width)
            .with_attribute("height", height)
            .with_attribute(
                "viewBox",
                format!("{} {} {} {}", -width / 2.0, -height / 2.0, width, height),
            )
            .with_child(
                Shape::new("rect")
                    .with_attribute("x", -width / 2.0)
                    .with_attribute("y", -height / 2.0)
                    .with_attribute("width", width)
                    .with_attribute("height", height)
                    .with_attribute("fill", background.to_hex()),
            );

        if let Some(Output::Shape(artwork)) = node.input("input")? {
            svg = svg.with_child(artwork);
        }
        Ok(Some(svg.into()))
    }

    fn controls(&self, ui: &mut egui::Ui, hooks: &NodeHooks<'_>) {
        number_control(ui, hooks, "Width", None, Self::WIDTH);
        number_control(ui, hooks, "Height", None, Self::HEIGHT);
        color_control(ui, hooks, "Background", None, Self::BACKGROUND);
    }
}
