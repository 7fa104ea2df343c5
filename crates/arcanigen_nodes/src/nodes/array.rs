// SPDX-License-Identifier: MIT OR Apache-2.0
//! Radial repetition.
//!
//! `ARRAY` resolves its input once per clone, each time under globals that
//! record which clone is being built. `ITERATION` reads those globals back,
//! so anything wired between the two can vary per clone.

use super::number_control;
use arcanigen_graph::{
    Flavour, IconRef, Key, NodeContext, NodeHelper, NodeHooks, NodeTypeId, Output, ResolveError, Shape,
    SocketSpec, SocketType, Values,
};

/// Upper bound on clones per array
pub const MAX_ARRAY_COUNT: usize = 256;

/// Repeats its input around the origin
pub struct ArrayNode;

impl ArrayNode {
    /// Type tag
    pub const TYPE: &'static str = "ARRAY";
    /// Clone count when unwired
    pub const COUNT: Key<f64> = Key::new("count");
}

impl NodeHelper for ArrayNode {
    fn node_type(&self) -> NodeTypeId {
        Self::TYPE.into()
    }

    fn name(&self) -> &'static str {
        "Radial Array"
    }

    fn button_icon(&self) -> IconRef {
        IconRef("rotate")
    }

    fn flavour(&self) -> Flavour {
        Flavour::Warning
    }

    fn inputs(&self) -> &'static [SocketSpec] {
        const INPUTS: &[SocketSpec] = &[
            SocketSpec::new("shape", "Shape", SocketType::SHAPE),
            SocketSpec::new("count", "Count", SocketType::NUMBER),
        ];
        INPUTS
    }

    fn outputs(&self) -> &'static [SocketSpec] {
        const OUTPUTS: &[SocketSpec] = &[SocketSpec::new("output", "Shape", SocketType::SHAPE)];
        OUTPUTS
    }

    fn initialize(&self) -> Values {
        Values::from_iter([Self::COUNT.entry(6.0)])
    }

    fn get_output(&self, node: &NodeContext<'_>, _socket: &str) -> Result<Option<Output>, ResolveError> {
        let Some(input) = node.input_node("shape") else {
            return Ok(None);
        };
        let count = clone_count(node.coalesce_or_default("count", Self::COUNT)?);

        let mut group = Shape::new("g");
        for index in 0..count {
            let globals = node.globals().with_iteration(node.id().clone(), index, count);
            let Some(Output::Shape(shape)) = input.resolve(&globals)? else {
                continue;
            };
            let angle = 360.0 * index as f64 / count as f64;
            group = group.with_child(
                Shape::new("g")
                    .with_attribute("transform", format!("rotate({angle})"))
                    .with_child(shape),
            );
        }
        Ok(Some(group.into()))
    }

    fn controls(&self, ui: &mut egui::Ui, hooks: &NodeHooks<'_>) {
        number_control(ui, hooks, "Count", Some("count"), Self::COUNT);
    }
}

/// Round a requested count into `0..=MAX_ARRAY_COUNT`
fn clone_count(requested: f64) -> usize {
    if requested.is_nan() || requested <= 0.0 {
        return 0;
    }
    let count = requested.round().min(MAX_ARRAY_COUNT as f64) as usize;
    if count as f64 != requested.round() {
        tracing::warn!("Array count {} clamped to {}", requested, count);
    }
    count
}

/// Exposes the innermost enclosing array iteration
pub struct IterationNode;

impl IterationNode {
    /// Type tag
    pub const TYPE: &'static str = "ITERATION";
}

impl NodeHelper for IterationNode {
    fn node_type(&self) -> NodeTypeId {
        Self::TYPE.into()
    }

    fn name(&self) -> &'static str {
        "Iteration"
    }

    fn button_icon(&self) -> IconRef {
        IconRef("list-ordered")
    }

    fn flavour(&self) -> Flavour {
        Flavour::Help
    }

    fn outputs(&self) -> &'static [SocketSpec] {
        const OUTPUTS: &[SocketSpec] = &[
            SocketSpec::new("index", "Index", SocketType::NUMBER),
            SocketSpec::new("count", "Count", SocketType::NUMBER),
        ];
        OUTPUTS
    }

    fn initialize(&self) -> Values {
        Values::new()
    }

    /// Outside any array this is the single clone: index 0 of 1
    fn get_output(&self, node: &NodeContext<'_>, socket: &str) -> Result<Option<Output>, ResolveError> {
        let (index, count) = node
            .globals()
            .innermost()
            .map_or((0, 1), |i| (i.index, i.count));
        Ok(match socket {
            "index" => Some(Output::Number(index as f64)),
            "count" => Some(Output::Number(count as f64)),
            _ => None,
        })
    }

    fn controls(&self, ui: &mut egui::Ui, _hooks: &NodeHooks<'_>) {
        ui.weak("Index and count of the enclosing array");
    }
}
