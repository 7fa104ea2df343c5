// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persisted node values and typed keys into the values bag.

use crate::output::Output;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Type-specific persisted fields of a node, by field name
pub type Values = IndexMap<String, Value>;

/// RGBA colour with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Color {
    /// Opaque black
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque white
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    /// Create an opaque colour
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a colour with alpha
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Components as an array, for colour pickers
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Build from an array of components
    pub fn from_array([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }

    /// CSS hex notation, alpha ignored
    pub fn to_hex(self) -> String {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// A persisted scalar or struct field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicitly empty field
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// Text, also used for enumerations
    Text(String),
    /// Colour
    Color(Color),
    /// List of values
    List(Vec<Value>),
    /// Any other struct, e.g. a length with a unit
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Whether every number inside is finite; JSON has no spelling for
    /// NaN or infinity
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Null | Self::Bool(_) | Self::Text(_) => true,
            Self::Number(n) => n.is_finite(),
            Self::Color(c) => c.to_array().iter().all(|v| v.is_finite()),
            Self::List(items) => items.iter().all(Value::is_finite),
            Self::Map(fields) => fields.values().all(Value::is_finite),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Color> for Value {
    fn from(v: Color) -> Self {
        Self::Color(v)
    }
}

/// A Rust type that can live in a node's values bag.
///
/// `from_output` lets the same type be read from a linked producer, which is
/// what makes "prefer the wire, fall back to the stored value" typed.
pub trait ValueKind: Sized + Clone + Default {
    /// Read from a stored value
    fn from_value(value: &Value) -> Option<Self>;

    /// Convert into a stored value
    fn into_value(self) -> Value;

    /// Read from a resolved producer output
    fn from_output(_output: &Output) -> Option<Self> {
        None
    }
}

impl ValueKind for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Number(self)
    }

    fn from_output(output: &Output) -> Option<Self> {
        match output {
            Output::Number(n) => Some(*n),
            Output::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

impl ValueKind for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_output(output: &Output) -> Option<Self> {
        match output {
            Output::Bool(b) => Some(*b),
            Output::Number(n) => Some(*n != 0.0),
            _ => None,
        }
    }
}

impl ValueKind for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_output(output: &Output) -> Option<Self> {
        match output {
            Output::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl ValueKind for Color {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Color(c) => Some(*c),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Color(self)
    }

    fn from_output(output: &Output) -> Option<Self> {
        match output {
            Output::Color(c) => Some(*c),
            _ => None,
        }
    }
}

/// Typed name of a field in a node's values bag.
///
/// Node types declare their fields as constants, e.g.
/// `const RADIUS: Key<f64> = Key::new("radius");`
pub struct Key<T> {
    name: &'static str,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    /// Declare a key
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _kind: PhantomData,
        }
    }

    /// Field name in the values bag
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl<T: ValueKind> Key<T> {
    /// Read this field from a values bag
    pub fn get(&self, values: &Values) -> Option<T> {
        values.get(self.name).and_then(T::from_value)
    }

    /// Write this field into a values bag
    pub fn put(&self, values: &mut Values, value: T) {
        values.insert(self.name.to_string(), value.into_value());
    }

    /// Build a `(name, value)` entry for initializers
    pub fn entry(&self, value: T) -> (String, Value) {
        (self.name.to_string(), value.into_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RADIUS: Key<f64> = Key::new("radius");
    const FILL: Key<Color> = Key::new("fill");

    #[test]
    fn test_untagged_json_shapes() {
        let values: Values = serde_json::from_str(
            r#"{"n": 0, "flag": true, "label": "add", "c": {"r": 1, "g": 0.5, "b": 0}, "l": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(values["n"], Value::Number(0.0));
        assert_eq!(values["flag"], Value::Bool(true));
        assert_eq!(values["label"], Value::Text("add".into()));
        assert_eq!(values["c"], Value::Color(Color::rgba(1.0, 0.5, 0.0, 1.0)));
        assert_eq!(
            values["l"],
            Value::List(vec![Value::Number(1.0), Value::Number(2.0)])
        );
    }

    #[test]
    fn test_struct_and_null_fields() {
        let values: Values = serde_json::from_str(
            r#"{"thickness": {"value": 2, "unit": "px"}, "tint": {"r": 1, "g": 1, "b": 1, "unit": "px"}, "none": null}"#,
        )
        .unwrap();
        assert_eq!(
            values["thickness"],
            Value::Map(IndexMap::from_iter([
                ("value".to_string(), Value::Number(2.0)),
                ("unit".to_string(), Value::Text("px".into())),
            ]))
        );
        // Extra fields keep a colour-shaped struct from collapsing to a Color
        assert!(matches!(&values["tint"], Value::Map(fields) if fields.len() == 4));
        assert_eq!(values["none"], Value::Null);

        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(serde_json::from_str::<Values>(&json).unwrap(), values);
    }

    #[test]
    fn test_is_finite() {
        assert!(Value::Number(1.0).is_finite());
        assert!(!Value::Number(f64::NAN).is_finite());
        assert!(!Value::List(vec![Value::Null, Value::Number(f64::INFINITY)]).is_finite());
        assert!(!Value::Color(Color::rgba(0.0, 0.0, 0.0, f32::NAN)).is_finite());
        let nested = Value::Map(IndexMap::from_iter([("v".to_string(), Value::Number(f64::NEG_INFINITY))]));
        assert!(!nested.is_finite());
    }

    #[test]
    fn test_typed_key_access() {
        let mut values = Values::new();
        assert_eq!(RADIUS.get(&values), None);

        RADIUS.put(&mut values, 12.5);
        FILL.put(&mut values, Color::WHITE);
        assert_eq!(RADIUS.get(&values), Some(12.5));
        assert_eq!(FILL.get(&values), Some(Color::WHITE));

        // Wrong kind reads as absent
        let wrong: Key<bool> = Key::new("radius");
        assert_eq!(wrong.get(&values), None);
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::rgb(1.0, 0.0, 0.5).to_hex(), "#ff0080");
        assert_eq!(Color::rgb(2.0, -1.0, 0.0).to_hex(), "#ff0000");
    }
}
