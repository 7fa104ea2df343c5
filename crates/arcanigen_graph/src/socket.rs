// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket definitions for node inputs/outputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Bitmask of the value categories a socket accepts or produces.
///
/// A socket may carry several bits at once; e.g. a renderer input that also
/// takes plain numbers is `SHAPE | NUMBER`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SocketType(pub u32);

impl SocketType {
    /// No category; never compatible with anything
    pub const NONE: Self = Self(0);
    /// Scalar number
    pub const NUMBER: Self = Self(1 << 0);
    /// RGBA colour
    pub const COLOR: Self = Self(1 << 1);
    /// Renderable shape tree
    pub const SHAPE: Self = Self(1 << 2);
    /// Boolean flag
    pub const BOOLEAN: Self = Self(1 << 3);
    /// Text
    pub const TEXT: Self = Self(1 << 4);
    /// Every category
    pub const ANY: Self = Self(u32::MAX);

    /// Raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether no bit is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `other` is also set here
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Get the colour for this socket type (for UI)
    pub fn color(self) -> [u8; 3] {
        if self == Self::ANY {
            return [150, 150, 150];
        }
        if self.contains(Self::SHAPE) {
            [200, 100, 200]
        } else if self.contains(Self::COLOR) {
            [255, 200, 100]
        } else if self.contains(Self::NUMBER) {
            [80, 200, 80]
        } else if self.contains(Self::BOOLEAN) {
            [200, 80, 80]
        } else if self.contains(Self::TEXT) {
            [200, 180, 150]
        } else {
            [128, 128, 128]
        }
    }
}

impl BitOr for SocketType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for SocketType {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ANY {
            return f.write_str("SocketType(ANY)");
        }
        let names: Vec<&str> = [
            (Self::NUMBER, "NUMBER"),
            (Self::COLOR, "COLOR"),
            (Self::SHAPE, "SHAPE"),
            (Self::BOOLEAN, "BOOLEAN"),
            (Self::TEXT, "TEXT"),
        ]
        .into_iter()
        .filter(|(bit, _)| self.contains(*bit))
        .map(|(_, name)| name)
        .collect();
        write!(f, "SocketType({})", names.join(" | "))
    }
}

/// Check whether a producer socket type can feed a consumer socket type.
///
/// Two types are compatible iff they share at least one category bit.
pub fn are_sockets_compatible(a: SocketType, b: SocketType) -> bool {
    (a & b).bits() > 0
}

/// Socket direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketDirection {
    /// Input socket, holds at most one link
    Input,
    /// Output socket, may fan out to many links
    Output,
}

/// Static declaration of a socket on a node type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketSpec {
    /// Socket key used in the node's `in`/`out` maps
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Accepted or produced categories
    pub socket_type: SocketType,
}

impl SocketSpec {
    /// Declare a socket
    pub const fn new(id: &'static str, name: &'static str, socket_type: SocketType) -> Self {
        Self {
            id,
            name,
            socket_type,
        }
    }
}

/// Find a socket declaration by id
pub fn find_socket<'a>(specs: &'a [SocketSpec], id: &str) -> Option<&'a SocketSpec> {
    specs.iter().find(|s| s.id == id)
}
