// SPDX-License-Identifier: MIT OR Apache-2.0
//! Example documents compiled into the binary.

use arcanigen_graph::{GraphStore, PersistError};

/// A bundled `.trh` document
#[derive(Debug, Clone, Copy)]
pub struct Example {
    /// Lookup name
    pub name: &'static str,
    /// Menu title
    pub title: &'static str,
    source: &'static str,
}

impl Example {
    /// Raw JSON
    pub fn source(&self) -> &'static str {
        self.source
    }
}

/// Every bundled example
pub const EXAMPLES: &[Example] = &[Example {
    name: "rings",
    title: "Rings",
    source: include_str!("../assets/rings.trh"),
}];

/// Error loading a bundled example
#[derive(Debug, thiserror::Error)]
pub enum ExampleError {
    /// No example has this name
    #[error("Example not found: {0}")]
    NotFound(String),

    /// The bundled document failed to load
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Find an example by name
pub fn find_example(name: &str) -> Option<&'static Example> {
    EXAMPLES.iter().find(|e| e.name == name)
}

/// Replace the store's contents with a bundled example
pub fn load_example(store: &GraphStore, name: &str) -> Result<(), ExampleError> {
    let example = find_example(name).ok_or_else(|| ExampleError::NotFound(name.to_string()))?;
    store.load_json(example.source)?;
    tracing::info!("Loaded example {}", example.name);
    Ok(())
}
