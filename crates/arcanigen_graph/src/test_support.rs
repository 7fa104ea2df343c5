// SPDX-License-Identifier: MIT OR Apache-2.0
//! Minimal node types for exercising the engine in unit tests.

use crate::evaluation::{NodeContext, ResolveError};
use crate::graph::Graph;
use crate::helpers;
use crate::hooks::NodeHooks;
use crate::node::{Flavour, IconRef, NodeHelper, NodeId, NodeRegistry, NodeTypeId};
use crate::output::{Output, Shape};
use crate::socket::{SocketSpec, SocketType};
use crate::value::{Key, Values};

/// Emits its stored number
pub struct ConstNode;

impl ConstNode {
    pub const TYPE: &'static str = "CONST";
    pub const VALUE: Key<f64> = Key::new("value");
    pub const DEFAULT_VALUE: f64 = 1.0;
}

impl NodeHelper for ConstNode {
    fn node_type(&self) -> NodeTypeId {
        Self::TYPE.into()
    }

    fn name(&self) -> &'static str {
        "Constant"
    }

    fn button_icon(&self) -> IconRef {
        IconRef("hash")
    }

    fn flavour(&self) -> Flavour {
        Flavour::Accent
    }

    fn outputs(&self) -> &'static [SocketSpec] {
        const OUTPUTS: &[SocketSpec] = &[SocketSpec::new("value", "Value", SocketType::NUMBER)];
        OUTPUTS
    }

    fn initialize(&self) -> Values {
        Values::from_iter([Self::VALUE.entry(Self::DEFAULT_VALUE)])
    }

    fn get_output(&self, node: &NodeContext<'_>, _socket: &str) -> Result<Option<Output>, ResolveError> {
        Ok(node.value(Self::VALUE).map(Output::Number))
    }

    fn controls(&self, ui: &mut egui::Ui, hooks: &NodeHooks<'_>) {
        let (value, setter) = hooks.value_state(Self::VALUE);
        let mut value = value.unwrap_or_default();
        if ui.add(egui::DragValue::new(&mut value)).changed() {
            setter.set(value);
        }
    }
}

/// Forwards its input, or a stored fallback when unwired
pub struct PassNode;

impl PassNode {
    pub const TYPE: &'static str = "PASS";
    pub const FALLBACK: Key<f64> = Key::new("fallback");
    pub const DEFAULT_FALLBACK: f64 = -1.0;
}

impl NodeHelper for PassNode {
    fn node_type(&self) -> NodeTypeId {
        Self::TYPE.into()
    }

    fn name(&self) -> &'static str {
        "Pass"
    }

    fn button_icon(&self) -> IconRef {
        IconRef("arrow-right")
    }

    fn inputs(&self) -> &'static [SocketSpec] {
        const INPUTS: &[SocketSpec] = &[SocketSpec::new("input", "Input", SocketType::NUMBER)];
        INPUTS
    }

    fn outputs(&self) -> &'static [SocketSpec] {
        const OUTPUTS: &[SocketSpec] = &[SocketSpec::new("output", "Output", SocketType::NUMBER)];
        OUTPUTS
    }

    fn initialize(&self) -> Values {
        Values::from_iter([Self::FALLBACK.entry(Self::DEFAULT_FALLBACK)])
    }

    fn get_output(&self, node: &NodeContext<'_>, _socket: &str) -> Result<Option<Output>, ResolveError> {
        Ok(node.coalesce("input", Self::FALLBACK)?.map(Output::Number))
    }
}

/// Adds two inputs
pub struct SumNode;

impl SumNode {
    pub const TYPE: &'static str = "SUM";
}

impl NodeHelper for SumNode {
    fn node_type(&self) -> NodeTypeId {
        Self::TYPE.into()
    }

    fn name(&self) -> &'static str {
        "Sum"
    }

    fn button_icon(&self) -> IconRef {
        IconRef("plus")
    }

    fn inputs(&self) -> &'static [SocketSpec] {
        const INPUTS: &[SocketSpec] = &[
            SocketSpec::new("a", "A", SocketType::NUMBER),
            SocketSpec::new("b", "B", SocketType::NUMBER),
        ];
        INPUTS
    }

    fn outputs(&self) -> &'static [SocketSpec] {
        const OUTPUTS: &[SocketSpec] = &[SocketSpec::new("sum", "Sum", SocketType::NUMBER)];
        OUTPUTS
    }

    fn initialize(&self) -> Values {
        Values::new()
    }

    fn get_output(&self, node: &NodeContext<'_>, _socket: &str) -> Result<Option<Output>, ResolveError> {
        let a = node.input("a")?.and_then(|o| o.as_number()).unwrap_or_default();
        let b = node.input("b")?.and_then(|o| o.as_number()).unwrap_or_default();
        Ok(Some(Output::Number(a + b)))
    }
}

/// Emits the innermost iteration index
pub struct IndexNode;

impl IndexNode {
    pub const TYPE: &'static str = "INDEX";
}

impl NodeHelper for IndexNode {
    fn node_type(&self) -> NodeTypeId {
        Self::TYPE.into()
    }

    fn name(&self) -> &'static str {
        "Index"
    }

    fn button_icon(&self) -> IconRef {
        IconRef("list")
    }

    fn outputs(&self) -> &'static [SocketSpec] {
        const OUTPUTS: &[SocketSpec] = &[SocketSpec::new("index", "Index", SocketType::NUMBER)];
        OUTPUTS
    }

    fn initialize(&self) -> Values {
        Values::new()
    }

    fn get_output(&self, node: &NodeContext<'_>, _socket: &str) -> Result<Option<Output>, ResolveError> {
        let index = node.globals().innermost().map_or(0, |i| i.index);
        Ok(Some(Output::Number(index as f64)))
    }
}

/// Resolves its input once per clone into a group of `item` elements
pub struct RepeatNode;

impl RepeatNode {
    pub const TYPE: &'static str = "REPEAT";
    pub const COUNT: usize = 3;
}

impl NodeHelper for RepeatNode {
    fn node_type(&self) -> NodeTypeId {
        Self::TYPE.into()
    }

    fn name(&self) -> &'static str {
        "Repeat"
    }

    fn button_icon(&self) -> IconRef {
        IconRef("copy")
    }

    fn inputs(&self) -> &'static [SocketSpec] {
        const INPUTS: &[SocketSpec] = &[SocketSpec::new("input", "Input", SocketType::ANY)];
        INPUTS
    }

    fn outputs(&self) -> &'static [SocketSpec] {
        const OUTPUTS: &[SocketSpec] = &[SocketSpec::new("output", "Output", SocketType::SHAPE)];
        OUTPUTS
    }

    fn initialize(&self) -> Values {
        Values::new()
    }

    fn get_output(&self, node: &NodeContext<'_>, _socket: &str) -> Result<Option<Output>, ResolveError> {
        let Some(input) = node.input_node("input") else {
            return Ok(None);
        };
        let mut group = Shape::new("g");
        for index in 0..Self::COUNT {
            let globals = node.globals().with_iteration(node.id().clone(), index, Self::COUNT);
            if let Some(value) = input.resolve(&globals)?.and_then(|o| o.as_number()) {
                group = group.with_child(Shape::new("item").with_attribute("value", value));
            }
        }
        Ok(Some(group.into()))
    }
}

/// Registry with every test node type
pub fn registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.register(ConstNode);
    registry.register(PassNode);
    registry.register(SumNode);
    registry.register(IndexNode);
    registry.register(RepeatNode);
    registry
}

/// Graph of unlinked nodes, `(id, type)` pairs, initialized from [`registry`]
pub fn graph_of(nodes: &[(&str, &str)]) -> Graph {
    let registry = registry();
    nodes.iter().fold(Graph::new(), |g, (id, ty)| {
        let ty = NodeTypeId::from(*ty);
        let values = registry.initialize(&ty).unwrap_or_default();
        helpers::append(&g, NodeId::from(*id), ty, values)
    })
}
