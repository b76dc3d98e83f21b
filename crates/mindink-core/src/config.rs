//! Editor configuration.

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::snap::SMART_GUIDE_THRESHOLD;
use kurbo::{Size, Vec2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Pointer travel (screen pixels) before a press turns into a drag.
pub const DRAG_THRESHOLD: f64 = 4.0;

/// Footprint of a node without an explicit size.
pub const DEFAULT_NODE_SIZE: Size = Size::new(150.0, 50.0);

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables for the editing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub default_node_size: Size,
    pub snap_enabled: bool,
    /// Snap tolerance in screen pixels.
    pub snap_threshold: f64,
    /// Drag start distance in screen pixels.
    pub drag_threshold: f64,
    /// Maximum history entries, `None` for unbounded.
    pub history_limit: Option<usize>,
    /// Offset of a new child from its parent.
    pub child_offset: Vec2,
    /// Extra vertical distance per existing sibling for a new child.
    pub child_spacing: f64,
    /// Offset of a pasted subtree from where it was copied.
    pub paste_offset: Vec2,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_node_size: DEFAULT_NODE_SIZE,
            snap_enabled: true,
            snap_threshold: SMART_GUIDE_THRESHOLD,
            drag_threshold: DRAG_THRESHOLD,
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
            child_offset: Vec2::new(200.0, 0.0),
            child_spacing: 70.0,
            paste_offset: Vec2::new(30.0, 30.0),
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
