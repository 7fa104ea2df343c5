// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value source nodes: numbers, colours and arithmetic.

use super::{color_control, number_control};
use arcanigen_graph::{
    Color, Flavour, IconRef, Key, NodeContext, NodeHelper, NodeHooks, NodeTypeId, Output, ResolveError,
    SocketSpec, SocketType, Value, ValueKind, Values,
};

// ============================================================================
// Number
// ============================================================================

/// Emits a stored number
pub struct NumberValueNode;

impl NumberValueNode {
    /// Type tag
    pub const TYPE: &'static str = "VALUE_NUMBER";
    /// The emitted number
    pub const VALUE: Key<f64> = Key::new("value");
}

impl NodeHelper for NumberValueNode {
    fn node_type(&self) -> NodeTypeId {
        Self::TYPE.into()
    }

    fn name(&self) -> &'static str {
        "Number"
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
        Values::from_iter([Self::VALUE.entry(0.0)])
    }

    fn get_output(&self, node: &NodeContext<'_>, _socket: &str) -> Result<Option<Output>, ResolveError> {
        Ok(node.value(Self::VALUE).map(Output::Number))
    }

    fn controls(&self, ui: &mut egui::Ui, hooks: &NodeHooks<'_>) {
        number_control(ui, hooks, "Value", None, Self::VALUE);
    }
}

// ============================================================================
// Color
// ============================================================================

/// Emits a stored colour
pub struct ColorValueNode;

impl ColorValueNode {
    /// Type tag
    pub const TYPE: &'static str = "VALUE_COLOR";
    /// The emitted colour
    pub const COLOR: Key<Color> = Key::new("color");
}

impl NodeHelper for ColorValueNode {
    fn node_type(&self) -> NodeTypeId {
        Self::TYPE.into()
    }

    fn name(&self) -> &'static str {
        "Color"
    }

    fn button_icon(&self) -> IconRef {
        IconRef("palette")
    }

    fn flavour(&self) -> Flavour {
        Flavour::Accent
    }

    fn outputs(&self) -> &'static [SocketSpec] {
        const OUTPUTS: &[SocketSpec] = &[SocketSpec::new("color", "Color", SocketType::COLOR)];
        OUTPUTS
    }

    fn initialize(&self) -> Values {
        Values::from_iter([Self::COLOR.entry(Color::BLACK)])
    }

    fn get_output(&self, node: &NodeContext<'_>, _socket: &str) -> Result<Option<Output>, ResolveError> {
        Ok(node.value(Self::COLOR).map(Output::Color))
    }

    fn controls(&self, ui: &mut egui::Ui, hooks: &NodeHooks<'_>) {
        color_control(ui, hooks, "Color", None, Self::COLOR);
    }
}

// ============================================================================
// Math
// ============================================================================

/// Binary arithmetic operation, stored by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MathOp {
    /// a + b
    #[default]
    Add,
    /// a - b
    Subtract,
    /// a * b
    Multiply,
    /// a / b, zero when b is zero
    Divide,
    /// a modulo b, zero when b is zero
    Modulo,
    /// a raised to b
    Power,
    /// Smaller of a and b
    Min,
    /// Larger of a and b
    Max,
}

impl MathOp {
    /// All operations in menu order
    pub const ALL: [MathOp; 8] = [
        MathOp::Add,
        MathOp::Subtract,
        MathOp::Multiply,
        MathOp::Divide,
        MathOp::Modulo,
        MathOp::Power,
        MathOp::Min,
        MathOp::Max,
    ];

    /// Stored name
    pub fn name(self) -> &'static str {
        match self {
            MathOp::Add => "add",
            MathOp::Subtract => "subtract",
            MathOp::Multiply => "multiply",
            MathOp::Divide => "divide",
            MathOp::Modulo => "modulo",
            MathOp::Power => "power",
            MathOp::Min => "min",
            MathOp::Max => "max",
        }
    }

    /// Parse a stored name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Apply to two operands
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            MathOp::Add => a + b,
            MathOp::Subtract => a - b,
            MathOp::Multiply => a * b,
            MathOp::Divide if b == 0.0 => 0.0,
            MathOp::Divide => a / b,
            MathOp::Modulo if b == 0.0 => 0.0,
            MathOp::Modulo => a.rem_euclid(b),
            MathOp::Power => a.powf(b),
            MathOp::Min => a.min(b),
            MathOp::Max => a.max(b),
        }
    }
}

impl ValueKind for MathOp {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(name) => Self::from_name(name),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::from(self.name())
    }
}

/// Combines two numbers
pub struct MathNode;

impl MathNode {
    /// Type tag
    pub const TYPE: &'static str = "MATH";
    /// First operand when unwired
    pub const A: Key<f64> = Key::new("a");
    /// Second operand when unwired
    pub const B: Key<f64> = Key::new("b");
    /// Operation
    pub const OPERATION: Key<MathOp> = Key::new("operation");
}

impl NodeHelper for MathNode {
    fn node_type(&self) -> NodeTypeId {
        Self::TYPE.into()
    }

    fn name(&self) -> &'static str {
        "Math"
    }

    fn button_icon(&self) -> IconRef {
        IconRef("calculator")
    }

    fn inputs(&self) -> &'static [SocketSpec] {
        const INPUTS: &[SocketSpec] = &[
            SocketSpec::new("a", "A", SocketType::NUMBER),
            SocketSpec::new("b", "B", SocketType::NUMBER),
        ];
        INPUTS
    }

    fn outputs(&self) -> &'static [SocketSpec] {
        const OUTPUTS: &[SocketSpec] = &[SocketSpec::new("result", "Result", SocketType::NUMBER)];
        OUTPUTS
    }

    fn initialize(&self) -> Values {
        Values::from_iter([
            Self::A.entry(0.0),
            Self::B.entry(0.0),
            Self::OPERATION.entry(MathOp::Add),
        ])
    }

    fn get_output(&self, node: &NodeContext<'_>, _socket: &str) -> Result<Option<Output>, ResolveError> {
        let a = node.coalesce_or_default("a", Self::A)?;
        let b = node.coalesce_or_default("b", Self::B)?;
        let op = node.value(Self::OPERATION).unwrap_or_default();
        Ok(Some(Output::Number(op.apply(a, b))))
    }

    fn controls(&self, ui: &mut egui::Ui, hooks: &NodeHooks<'_>) {
        let (op, setter) = hooks.value_state(Self::OPERATION);
        let mut op = op.unwrap_or_default();
        let before = op;
        egui::ComboBox::from_id_salt(("math-op", hooks.node_id().as_str()))
            .selected_text(op.name())
            .show_ui(ui, |ui| {
                for candidate in MathOp::ALL {
                    ui.selectable_value(&mut op, candidate, candidate.name());
                }
            });
        if op != before {
            setter.set(op);
        }

        number_control(ui, hooks, "A", Some("a"), Self::A);
        number_control(ui, hooks, "B", Some("b"), Self::B);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_registry;
    use arcanigen_graph::{Globals, GraphStore, NodeId, Position};
    use std::sync::Arc;

    fn store() -> GraphStore {
        GraphStore::new(Arc::new(create_registry()))
    }

    fn add(store: &GraphStore, ty: &str) -> NodeId {
        store.add_node(&ty.into(), Position::default()).unwrap()
    }

    fn number(store: &GraphStore, node: &NodeId, socket: &str) -> Option<f64> {
        store
            .evaluate(node, socket, &Globals::new())
            .unwrap()
            .and_then(|o| o.as_number())
    }

    #[test]
    fn test_math_ops() {
        assert_eq!(MathOp::Add.apply(2.0, 3.0), 5.0);
        assert_eq!(MathOp::Power.apply(2.0, 3.0), 8.0);
        assert_eq!(MathOp::Divide.apply(1.0, 0.0), 0.0);
        assert_eq!(MathOp::Modulo.apply(-1.0, 3.0), 2.0);
        for op in MathOp::ALL {
            assert_eq!(MathOp::from_name(op.name()), Some(op));
        }
        assert_eq!(MathOp::from_name("nope"), None);
    }

    #[test]
    fn test_math_coalesces_operands() {
        let store = store();
        let math = add(&store, MathNode::TYPE);
        let value = add(&store, NumberValueNode::TYPE);
        store.set(&math, MathNode::A, 2.0);
        store.set(&math, MathNode::B, 10.0);
        store.set(&math, MathNode::OPERATION, MathOp::Multiply);
        assert_eq!(number(&store, &math, "result"), Some(20.0));

        store.set(&value, NumberValueNode::VALUE, 4.0);
        store.try_connect(&value, "value", &math, "b").unwrap();
        assert_eq!(number(&store, &math, "result"), Some(8.0));
        assert_eq!(store.hooks(&math).value(MathNode::B), Some(10.0));
    }

    #[test]
    fn test_number_change_propagates() {
        // VALUE_NUMBER → MATH.a, MATH.b fixed at 1
        let store = store();
        let value = add(&store, NumberValueNode::TYPE);
        let math = add(&store, MathNode::TYPE);
        store.set(&math, MathNode::B, 1.0);
        store.try_connect(&value, "value", &math, "a").unwrap();

        assert_eq!(number(&store, &math, "result"), Some(1.0));
        store.set(&value, NumberValueNode::VALUE, 41.0);
        assert_eq!(number(&store, &math, "result"), Some(42.0));
    }

    #[test]
    fn test_color_value() {
        let store = store();
        let color = add(&store, ColorValueNode::TYPE);
        let red = Color::rgb(1.0, 0.0, 0.0);
        store.set(&color, ColorValueNode::COLOR, red);
        assert_eq!(
            store.evaluate(&color, "color", &Globals::new()),
            Ok(Some(Output::Color(red)))
        );
    }
}
