// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node type implementations.

mod array;
mod root;
mod shapes;
mod values;

pub use array::{ArrayNode, IterationNode, MAX_ARRAY_COUNT};
pub use root::RootNode;
pub use shapes::CircleNode;
pub use values::{ColorValueNode, MathNode, MathOp, NumberValueNode};

use arcanigen_graph::{Color, Key, NodeHooks};

/// Editable number field, greyed out while `socket` is wired
pub(crate) fn number_control(ui: &mut egui::Ui, hooks: &NodeHooks<'_>, label: &str, socket: Option<&str>, key: Key<f64>) {
    let linked = socket.is_some_and(|s| hooks.has_link(s));
    let (value, setter) = hooks.value_state(key);
    let mut value = value.unwrap_or_default();

    ui.horizontal(|ui| {
        ui.label(label);
        let response = ui.add_enabled(!linked, egui::DragValue::new(&mut value).speed(0.1));
        if response.changed() {
            setter.set(value);
        }
    });
}

/// Editable colour swatch, greyed out while `socket` is wired
pub(crate) fn color_control(ui: &mut egui::Ui, hooks: &NodeHooks<'_>, label: &str, socket: Option<&str>, key: Key<Color>) {
    let linked = socket.is_some_and(|s| hooks.has_link(s));
    let (value, setter) = hooks.value_state(key);
    let mut rgba = value.unwrap_or_default().to_array();

    ui.horizontal(|ui| {
        ui.label(label);
        ui.add_enabled_ui(!linked, |ui| {
            if ui.color_edit_button_rgba_unmultiplied(&mut rgba).changed() {
                setter.set(Color::from_array(rgba));
            }
        });
    });
}
