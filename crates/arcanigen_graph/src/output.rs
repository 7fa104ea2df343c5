// SPDX-License-Identifier: MIT OR Apache-2.0
//! Values produced by resolving an output socket.

use crate::value::{Color, Value};
use indexmap::IndexMap;

/// Result of resolving a node's output socket
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Number
    Number(f64),
    /// Boolean
    Bool(bool),
    /// Colour
    Color(Color),
    /// Text
    Text(String),
    /// Renderable element tree
    Shape(Shape),
}

impl Output {
    /// Borrow as a shape, if this is one
    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            Self::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    /// Read as a number, if this is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<Shape> for Output {
    fn from(shape: Shape) -> Self {
        Self::Shape(shape)
    }
}

/// A renderable element: a tag, its attributes and child elements.
///
/// Consumers walk the tree to draw; the engine treats it as opaque data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    /// Element tag, e.g. `circle` or `g`
    pub element: String,
    /// Attributes in declaration order
    pub attributes: IndexMap<String, Value>,
    /// Child elements in paint order
    pub children: Vec<Shape>,
}

impl Shape {
    /// Create an element with no attributes or children
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append a child element
    pub fn with_child(mut self, child: Shape) -> Self {
        self.children.push(child);
        self
    }

    /// Look up an attribute
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Count this element and all descendants
    pub fn element_count(&self) -> usize {
        1 + self.children.iter().map(Shape::element_count).sum::<usize>()
    }

    /// Serialize as XML markup, e.g. an SVG document
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.element);
        for (name, value) in &self.attributes {
            let text = match value {
                Value::Null | Value::Map(_) => continue,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Text(s) => escape(s),
                Value::Color(c) => c.to_hex(),
                Value::List(items) => items
                    .iter()
                    .filter_map(|v| match v {
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
            };
            out.push_str(&format!(" {name}=\"{text}\""));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.write_markup(out);
        }
        out.push_str(&format!("</{}>", self.element));
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_builder() {
        let group = Shape::new("g")
            .with_child(Shape::new("circle").with_attribute("r", 4.0))
            .with_child(Shape::new("circle").with_attribute("r", 8.0));

        assert_eq!(group.element_count(), 3);
        assert_eq!(
            group.children[1].attribute("r"),
            Some(&Value::Number(8.0))
        );
        assert_eq!(Output::from(group.clone()).as_shape(), Some(&group));
    }

    #[test]
    fn test_markup() {
        let shape = Shape::new("g")
            .with_attribute("transform", "rotate(90)")
            .with_child(
                Shape::new("circle")
                    .with_attribute("r", 4.5)
                    .with_attribute("fill", Color::rgb(1.0, 0.0, 0.0)),
            )
            .with_child(Shape::new("text").with_attribute("label", "a<b"));

        assert_eq!(
            shape.to_markup(),
            r##"<g transform="rotate(90)"><circle r="4.5" fill="#ff0000"/><text label="a&lt;b"/></g>"##
        );
    }
}
