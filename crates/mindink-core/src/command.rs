//! Typed editing commands.

use crate::node::{EdgeKind, EdgeStyle, Node, NodeId, NodeSize, SerializableColor};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// A change to one property of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "property", content = "value", rename_all = "snake_case")]
pub enum NodePatch {
    Text(String),
    Position(Point),
    BackgroundColor(Option<SerializableColor>),
    TextColor(Option<SerializableColor>),
    FontSize(Option<f64>),
    Size(Option<NodeSize>),
    /// Set the width, keeping the current (or default) height.
    Width(f64),
    /// Empty notes are stored as none.
    Notes(String),
    Icon(Option<String>),
    /// Set the icon, or clear it when it is already this one.
    ToggleIcon(String),
    /// Ignored on the root, which has no incoming edge.
    EdgeLabel(Option<String>),
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

impl NodePatch {
    /// The patched node, or `None` when the patch changes nothing.
    pub fn apply(&self, node: &Node, default_size: Size) -> Option<Node> {
        let mut next = node.clone();
        let changed = match self {
            NodePatch::Text(text) => replace(&mut next.text, text.clone()),
            NodePatch::Position(position) => replace(&mut next.position, *position),
            NodePatch::BackgroundColor(color) => replace(&mut next.style.background_color, *color),
            NodePatch::TextColor(color) => replace(&mut next.style.color, *color),
            NodePatch::FontSize(size) => replace(&mut next.style.font_size, *size),
            NodePatch::Size(size) => replace(&mut next.size, *size),
            NodePatch::Width(width) => {
                let height = node.effective_size(default_size).height;
                replace(&mut next.size, Some(Size::new(*width, height)))
            }
            NodePatch::Notes(notes) => {
                let notes = (!notes.is_empty()).then(|| notes.clone());
                replace(&mut next.notes, notes)
            }
            NodePatch::Icon(icon) => replace(&mut next.icon, icon.clone()),
            NodePatch::ToggleIcon(icon) => {
                let toggled = if node.icon.as_deref() == Some(icon.as_str()) {
                    None
                } else {
                    Some(icon.clone())
                };
                replace(&mut next.icon, toggled)
            }
            NodePatch::EdgeLabel(label) => {
                !node.is_root() && replace(&mut next.edge_label, label.clone())
            }
        };
        changed.then_some(next)
    }
}

/// A change to the style of a node's incoming edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "property", content = "value", rename_all = "snake_case")]
pub enum EdgeStylePatch {
    Kind(EdgeKind),
    Dashed(bool),
    ToggleDashed,
}

impl EdgeStylePatch {
    pub fn apply(self, style: EdgeStyle) -> EdgeStyle {
        match self {
            EdgeStylePatch::Kind(kind) => EdgeStyle { kind, ..style },
            EdgeStylePatch::Dashed(dashed) => EdgeStyle { dashed, ..style },
            EdgeStylePatch::ToggleDashed => EdgeStyle {
                dashed: !style.dashed,
                ..style
            },
        }
    }
}

/// Everything a user can ask the editor to do outside of pointer gestures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Undo,
    Redo,
    DeleteSelection,
    Copy,
    Cut,
    Paste,
    ToggleCollapse { id: NodeId },
    SetSelection { ids: Vec<NodeId> },
    ToggleSelection { id: NodeId },
    AddChild { parent: NodeId },
    SetEdgeStyle { id: NodeId, patch: EdgeStylePatch },
    Patch { id: NodeId, patch: NodePatch },
    ToggleNotes { id: NodeId },
    TogglePreview,
}
