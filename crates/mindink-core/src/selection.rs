//! Node selection and the single-slot clipboard.

use crate::node::{Node, NodeId, ROOT_ID};
use crate::tree::{self, deep_copy_with_new_ids};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Ordered set of selected node ids. Insertion order is kept, so the first
/// selected node is well defined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: Vec<NodeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection, dropping repeated ids.
    pub fn from_ids(ids: impl IntoIterator<Item = NodeId>) -> Self {
        let mut selection = Self::new();
        selection.set(ids);
        selection
    }

    /// Replace the selection.
    pub fn set(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    /// Select a single node.
    pub fn select(&mut self, id: NodeId) {
        self.ids.clear();
        self.ids.push(id);
    }

    /// Add `id` if absent, remove it if present.
    pub fn toggle(&mut self, id: NodeId) {
        if let Some(index) = self.ids.iter().position(|selected| *selected == id) {
            self.ids.remove(index);
        } else {
            self.ids.push(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    pub fn first(&self) -> Option<NodeId> {
        self.ids.first().copied()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids that may be removed (everything but the root).
    pub fn removable(&self) -> Vec<NodeId> {
        self.ids.iter().copied().filter(|id| *id != ROOT_ID).collect()
    }

    /// Drop ids that no longer resolve in `tree`.
    pub fn retain_existing(&mut self, tree: &Node) {
        self.ids.retain(|id| tree::find_node(tree, *id).is_some());
    }
}

/// Holds at most one copied subtree.
///
/// Nodes are immutable once built, so holding the subtree behind an `Arc`
/// gives a copy that later edits of the document cannot reach.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Clipboard {
    content: Option<Arc<Node>>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a copy of `subtree`, replacing any previous content.
    pub fn store(&mut self, subtree: Arc<Node>) {
        self.content = Some(subtree);
    }

    pub fn content(&self) -> Option<&Node> {
        self.content.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }

    pub fn clear(&mut self) {
        self.content = None;
    }

    /// A fresh-identity copy of the content, ready to be attached.
    pub fn paste_copy(&self) -> Option<Node> {
        self.content.as_deref().map(deep_copy_with_new_ids)
    }
}
