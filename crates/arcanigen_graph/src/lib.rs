// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reactive node-graph engine for Arcanigen.
//!
//! Nodes hold typed values and named input/output sockets; links wire one
//! node's output into another's input. Output is computed on demand by
//! resolving a socket, which recursively resolves whatever feeds it.
//!
//! ## Architecture
//!
//! - [`helpers`]: pure structural edits returning new [`Graph`] snapshots
//! - [`node`]: node type descriptors and the [`NodeRegistry`]
//! - [`store`]: the mutable [`GraphStore`] with graph and position channels
//! - [`evaluation`] and [`hooks`]: typed accessors and output resolution
//! - [`persistence`]: `.trh` JSON documents
//! - [`ui`]: egui panels and canvas

pub mod evaluation;
pub mod graph;
pub mod helpers;
pub mod hooks;
pub mod link;
pub mod node;
pub mod output;
pub mod persistence;
pub mod settings;
pub mod socket;
pub mod store;
pub mod ui;
pub mod value;

#[cfg(test)]
mod test_support;

pub use evaluation::{Evaluation, Globals, InputNode, Iteration, NodeContext, ResolveError};
pub use graph::{ConnectionError, Graph};
pub use hooks::{InputResolver, NodeHooks, ValueSetter};
pub use link::{Link, LinkId};
pub use node::{Flavour, IconRef, Node, NodeHelper, NodeId, NodeRegistry, NodeTypeId};
pub use output::{Output, Shape};
pub use persistence::{Document, PersistError};
pub use settings::{EngineSettings, EvaluationSettings};
pub use socket::{are_sockets_compatible, SocketDirection, SocketSpec, SocketType};
pub use store::{
    GraphStore, Position, Positions, Setter, StoreError, Subscription, Toggles, NODE_PANEL, ROOT_OUTPUT, ROOT_TYPE,
};
pub use value::{Color, Key, Value, ValueKind, Values};
