//! Persisted editor session.

use crate::selection::{Clipboard, Selection};
use crate::tree::{Document, TreeError};
use crate::view::ViewState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while restoring a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed session: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("history entry {index} is not a valid tree: {source}")]
    InvalidDocument {
        index: usize,
        #[source]
        source: TreeError,
    },
}

/// Everything needed to restore an editor: the history log and cursor,
/// selection, clipboard and viewport. Gesture state is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub history: Vec<Document>,
    pub current_index: usize,
    #[serde(default, rename = "selectedNodeIds")]
    pub selection: Selection,
    #[serde(default)]
    pub clipboard: Clipboard,
    #[serde(default)]
    pub view_state: ViewState,
}

impl SessionState {
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string(self)?)
    }

    /// The document the cursor points at, if the cursor is in range.
    pub fn current(&self) -> Option<&Document> {
        self.history.get(self.current_index)
    }
}
