// SPDX-License-Identifier: MIT OR Apache-2.0
//! egui glue for editing a [`GraphStore`].
//!
//! Features:
//! - Collapsible node panels hosting each type's controls
//! - Add-node menu grouped by flavour
//! - Canvas with panning, node dragging and drag-to-connect

use crate::node::{Flavour, NodeId};
use crate::socket::SocketDirection;
use crate::store::{GraphStore, Position, NODE_PANEL, ROOT_TYPE};
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};
use std::collections::HashMap;

/// Node visual dimensions
const NODE_WIDTH: f32 = 200.0;
const NODE_HEADER_HEIGHT: f32 = 28.0;
const SOCKET_SPACING: f32 = 22.0;
const SOCKET_RADIUS: f32 = 6.0;

/// Link visual parameters
const BEZIER_CURVATURE: f32 = 50.0;
const LINK_THICKNESS: f32 = 2.5;

/// Grid parameters
const GRID_SPACING: f32 = 20.0;

fn rgb([r, g, b]: [u8; 3]) -> Color32 {
    Color32::from_rgb(r, g, b)
}

/// What [`node_panel`] reports back
#[derive(Debug)]
pub struct NodePanelResponse {
    /// The panel header, usable as a drag handle
    pub header: egui::Response,
    /// The node was removed this frame
    pub removed: bool,
}

/// Collapsible panel for one node.
///
/// The open state is the node's `"node"` toggle. The body is the type's
/// `controls`, followed by a remove button for every node except `ROOT`.
/// Returns `None` if the node no longer exists or its type is unknown.
pub fn node_panel(ui: &mut egui::Ui, store: &GraphStore, node_id: &NodeId) -> Option<NodePanelResponse> {
    let graph = store.get_graph();
    let node = graph.node(node_id)?;
    let Some(helper) = store.registry().get(&node.node_type) else {
        ui.colored_label(Color32::RED, format!("Unknown node type {}", node.node_type));
        return None;
    };

    let title = egui::RichText::new(helper.name())
        .strong()
        .color(rgb(helper.flavour().color()));
    let mut removed = false;
    let collapsing = egui::CollapsingHeader::new(title)
        .id_salt(("arcanigen-node-panel", node_id.as_str()))
        .open(Some(store.is_open(node_id, NODE_PANEL)))
        .show(ui, |ui| {
            helper.controls(ui, &store.hooks(node_id));
            if !node_id.is_root() {
                ui.separator();
                if ui.button("Remove").clicked() {
                    removed = true;
                }
            }
        });

    if collapsing.header_response.clicked() {
        store.toggle(node_id, NODE_PANEL);
    }
    if removed {
        store.remove_node(node_id);
    }

    Some(NodePanelResponse {
        header: collapsing.header_response,
        removed,
    })
}

/// Menu of every registered node type, one submenu per flavour.
///
/// Choosing an entry adds the node at `position` and returns its id.
pub fn add_node_menu(ui: &mut egui::Ui, store: &GraphStore, position: Position) -> Option<NodeId> {
    let mut added = None;
    for &flavour in Flavour::all() {
        if store.registry().helpers_in_flavour(flavour).next().is_none() {
            continue;
        }
        ui.menu_button(format!("{flavour:?}"), |ui| {
            for helper in store.registry().helpers_in_flavour(flavour) {
                if helper.node_type().as_str() == ROOT_TYPE {
                    continue;
                }
                if ui.button(helper.name()).clicked() {
                    match store.add_node(&helper.node_type(), position) {
                        Ok(id) => added = Some(id),
                        Err(e) => tracing::warn!("Failed to add node: {}", e),
                    }
                    ui.close_menu();
                }
            }
        });
    }
    added
}

/// A socket under the pointer
#[derive(Debug, Clone, PartialEq)]
struct SocketHit {
    node: NodeId,
    socket: &'static str,
    direction: SocketDirection,
}

/// Canvas interaction mode
#[derive(Debug, Clone, Default)]
enum InteractionMode {
    /// Selecting, panning, dragging nodes
    #[default]
    Normal,
    /// Dragging a new link out of an output socket
    CreatingLink {
        from_node: NodeId,
        from_socket: &'static str,
    },
}

/// Node canvas state
#[derive(Debug, Default)]
pub struct NodeCanvas {
    /// Screen offset of the canvas origin
    pub pan: Vec2,
    /// Selected node
    pub selected: Option<NodeId>,
    /// Show grid
    pub show_grid: bool,
    mode: InteractionMode,
    node_rects: HashMap<NodeId, Rect>,
}

impl NodeCanvas {
    /// Create a canvas with the grid shown
    pub fn new() -> Self {
        Self {
            show_grid: true,
            ..Self::default()
        }
    }

    /// Convert canvas coordinates to screen coordinates
    pub fn to_screen(&self, origin: Pos2, position: Position) -> Pos2 {
        origin + self.pan + Vec2::new(position.x as f32, position.y as f32)
    }

    /// Convert screen coordinates to canvas coordinates
    pub fn to_canvas(&self, origin: Pos2, screen: Pos2) -> Position {
        let v = screen - origin - self.pan;
        Position::new(f64::from(v.x), f64::from(v.y))
    }

    /// Render the canvas filling the available space
    pub fn show(&mut self, ui: &mut egui::Ui, store: &GraphStore) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        if response.dragged_by(egui::PointerButton::Middle)
            || (response.dragged_by(egui::PointerButton::Primary)
                && matches!(self.mode, InteractionMode::Normal))
        {
            self.pan += response.drag_delta();
        }
        if response.clicked() {
            self.selected = None;
        }

        let pointer = ui.input(|i| i.pointer.hover_pos());
        let origin = rect.min;
        response.context_menu(|ui| {
            let at = pointer.map_or_else(Position::default, |p| self.to_canvas(origin, p));
            add_node_menu(ui, store, at);
        });

        if self.show_grid {
            self.draw_grid(&painter, rect);
        }

        self.draw_nodes(ui, store, origin);
        let hovered = self.draw_links_and_sockets(ui, &painter, store, pointer);
        self.handle_input(ui, &painter, store, hovered, pointer);

        let graph = store.get_graph();
        painter.text(
            Pos2::new(rect.left() + 5.0, rect.bottom() - 10.0),
            egui::Align2::LEFT_CENTER,
            format!("Nodes: {} | Links: {}", graph.node_count(), graph.link_count()),
            egui::FontId::proportional(11.0),
            Color32::from_gray(150),
        );
    }

    fn draw_grid(&self, painter: &egui::Painter, rect: Rect) {
        let color = Color32::from_rgba_unmultiplied(60, 60, 60, 100);
        let offset = Vec2::new(
            self.pan.x.rem_euclid(GRID_SPACING),
            self.pan.y.rem_euclid(GRID_SPACING),
        );

        let mut x = rect.left() + offset.x;
        while x < rect.right() {
            painter.line_segment(
                [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                Stroke::new(1.0, color),
            );
            x += GRID_SPACING;
        }
        let mut y = rect.top() + offset.y;
        while y < rect.bottom() {
            painter.line_segment(
                [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
                Stroke::new(1.0, color),
            );
            y += GRID_SPACING;
        }
    }

    fn draw_nodes(&mut self, ui: &egui::Ui, store: &GraphStore, origin: Pos2) {
        let graph = store.get_graph();
        let positions = store.get_positions();
        self.node_rects.clear();

        for node_id in graph.node_ids() {
            let position = positions.get(node_id).copied().unwrap_or_default();
            let is_selected = self.selected.as_ref() == Some(node_id);

            let area = egui::Area::new(egui::Id::new(("arcanigen-node", node_id.as_str())))
                .current_pos(self.to_screen(origin, position))
                .movable(false)
                .constrain(false)
                .show(ui.ctx(), |ui| {
                    let mut frame = egui::Frame::window(ui.style());
                    if is_selected {
                        frame = frame.stroke(Stroke::new(2.0, Color32::from_rgb(100, 150, 255)));
                    }
                    frame
                        .show(ui, |ui| {
                            ui.set_width(NODE_WIDTH);
                            node_panel(ui, store, node_id)
                        })
                        .inner
                });

            let Some(panel) = area.inner else {
                continue;
            };
            if panel.removed {
                if is_selected {
                    self.selected = None;
                }
                continue;
            }
            self.node_rects.insert(node_id.clone(), area.response.rect);

            let handle = panel.header.interact(Sense::drag());
            if handle.drag_started() || panel.header.clicked() {
                self.selected = Some(node_id.clone());
            }
            if handle.dragged() {
                let delta = handle.drag_delta();
                store.set_position(
                    node_id,
                    Position::new(
                        position.x + f64::from(delta.x),
                        position.y + f64::from(delta.y),
                    ),
                );
            }
        }
    }

    /// Screen position of a socket on a drawn node
    fn socket_anchor(
        &self,
        store: &GraphStore,
        node_id: &NodeId,
        socket: &str,
        direction: SocketDirection,
    ) -> Option<Pos2> {
        let rect = self.node_rects.get(node_id)?;
        let graph = store.get_graph();
        let helper = store.registry().get(&graph.node(node_id)?.node_type)?;
        let specs = match direction {
            SocketDirection::Input => helper.inputs(),
            SocketDirection::Output => helper.outputs(),
        };
        let index = specs.iter().position(|s| s.id == socket)?;
        Some(socket_pos(*rect, index, direction))
    }

    fn draw_links_and_sockets(
        &self,
        ui: &egui::Ui,
        painter: &egui::Painter,
        store: &GraphStore,
        pointer: Option<Pos2>,
    ) -> Option<SocketHit> {
        let graph = store.get_graph();

        for link in graph.links() {
            let from = self.socket_anchor(store, &link.from_node, &link.from_socket, SocketDirection::Output);
            let to = self.socket_anchor(store, &link.to_node, &link.to_socket, SocketDirection::Input);
            if let (Some(from), Some(to)) = (from, to) {
                draw_bezier(painter, from, to, rgb(link.socket_type.color()));
            }
        }

        // Sockets sit on the node edges, above the node areas
        let sockets = ui.ctx().layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("arcanigen-sockets"),
        ));
        let mut hovered = None;
        for node in graph.nodes() {
            let Some(rect) = self.node_rects.get(&node.id) else {
                continue;
            };
            let Some(helper) = store.registry().get(&node.node_type) else {
                continue;
            };
            let sides = [
                (helper.inputs(), SocketDirection::Input),
                (helper.outputs(), SocketDirection::Output),
            ];
            for (specs, direction) in sides {
                for (index, spec) in specs.iter().enumerate() {
                    let pos = socket_pos(*rect, index, direction);
                    let is_hovered = pointer.is_some_and(|p| p.distance(pos) < SOCKET_RADIUS * 1.5);
                    let radius = if is_hovered { SOCKET_RADIUS * 1.3 } else { SOCKET_RADIUS };
                    sockets.circle_filled(pos, radius, rgb(spec.socket_type.color()));
                    sockets.circle_stroke(pos, radius, Stroke::new(1.0, Color32::from_gray(30)));
                    if is_hovered {
                        hovered = Some(SocketHit {
                            node: node.id.clone(),
                            socket: spec.id,
                            direction,
                        });
                    }
                }
            }
        }
        hovered
    }

    fn handle_input(
        &mut self,
        ui: &egui::Ui,
        painter: &egui::Painter,
        store: &GraphStore,
        hovered: Option<SocketHit>,
        pointer: Option<Pos2>,
    ) {
        let (pressed, released) = ui.input(|i| (i.pointer.primary_pressed(), i.pointer.primary_released()));

        match std::mem::take(&mut self.mode) {
            InteractionMode::Normal => {
                if let (true, Some(hit)) = (pressed, hovered) {
                    match hit.direction {
                        SocketDirection::Output => {
                            self.mode = InteractionMode::CreatingLink {
                                from_node: hit.node,
                                from_socket: hit.socket,
                            };
                        }
                        // Grabbing a wired input detaches it
                        SocketDirection::Input => {
                            let link_id = store
                                .get_graph()
                                .input_link(&hit.node, hit.socket)
                                .map(|l| l.id.clone());
                            if let Some(link_id) = link_id {
                                store.disconnect(&link_id);
                            }
                        }
                    }
                }
            }
            InteractionMode::CreatingLink { from_node, from_socket } => {
                if let (Some(from), Some(to)) = (
                    self.socket_anchor(store, &from_node, from_socket, SocketDirection::Output),
                    pointer,
                ) {
                    draw_bezier(painter, from, to, Color32::LIGHT_GRAY);
                }

                if released {
                    if let Some(hit) = hovered.filter(|h| h.direction == SocketDirection::Input) {
                        if let Err(e) = store.try_connect(&from_node, from_socket, &hit.node, hit.socket) {
                            tracing::debug!("Connection refused: {}", e);
                        }
                    }
                } else {
                    self.mode = InteractionMode::CreatingLink { from_node, from_socket };
                }
            }
        }

        let delete = ui.input(|i| i.key_pressed(egui::Key::Delete))
            && ui.ctx().memory(|m| m.focused().is_none());
        if delete {
            if let Some(node_id) = self.selected.take() {
                if node_id.is_root() {
                    self.selected = Some(node_id);
                } else {
                    store.remove_node(&node_id);
                }
            }
        }
    }
}

fn socket_pos(rect: Rect, index: usize, direction: SocketDirection) -> Pos2 {
    let y = rect.top() + NODE_HEADER_HEIGHT + (index as f32 + 0.5) * SOCKET_SPACING;
    match direction {
        SocketDirection::Input => Pos2::new(rect.left(), y),
        SocketDirection::Output => Pos2::new(rect.right(), y),
    }
}

fn draw_bezier(painter: &egui::Painter, from: Pos2, to: Pos2, color: Color32) {
    let curvature = BEZIER_CURVATURE.min((to.x - from.x).abs() * 0.5);
    let points = bezier_points(
        from,
        Pos2::new(from.x + curvature, from.y),
        Pos2::new(to.x - curvature, to.y),
        to,
        32,
    );
    for pair in points.windows(2) {
        painter.line_segment([pair[0], pair[1]], Stroke::new(LINK_THICKNESS, color));
    }
}

/// Generate points along a cubic bezier curve
fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    (0..=segments)
        .map(|i| {
            let t = i as f32 / segments as f32;
            let mt = 1.0 - t;
            let a = mt * mt * mt;
            let b = 3.0 * mt * mt * t;
            let c = 3.0 * mt * t * t;
            let d = t * t * t;
            Pos2::new(
                a * p0.x + b * p1.x + c * p2.x + d * p3.x,
                a * p0.y + b * p1.y + c * p2.y + d * p3.y,
            )
        })
        .collect()
}
