// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Default bound on nested output resolution
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// How output resolution behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSettings {
    /// Reuse results within one evaluation pass, keyed by node, socket and
    /// globals
    pub memoize: bool,
    /// Deepest chain of nested resolutions before giving up
    pub max_depth: usize,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            memoize: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Top-level engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Output resolution
    pub evaluation: EvaluationSettings,
    /// Whether node panels without a stored toggle start open
    pub default_panel_open: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            evaluation: EvaluationSettings::default(),
            default_panel_open: true,
        }
    }
}

impl EngineSettings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize settings to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
