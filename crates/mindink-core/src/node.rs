//! Node definitions for the mind-map document.

use kurbo::{Point, Rect, Size};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for nodes.
pub type NodeId = Uuid;

/// Explicit node footprint, serialized as `{ width, height }`.
pub type NodeSize = Size;

/// Reserved identifier of the root node.
pub const ROOT_ID: NodeId = Uuid::nil();

/// Label given to the root of a fresh document.
pub const ROOT_TEXT: &str = "Central Topic";

/// Label given to nodes created with "add child".
pub const NEW_NODE_TEXT: &str = "New Node";

/// Where the root of a fresh document is placed.
pub const ROOT_POSITION: Point = Point::new(400.0, 300.0);

/// Font size used when a node has no explicit one.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Returns `None` for anything else.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        match hex.len() {
            3 => {
                // #rgb -> #rrggbb
                let r = channel(0..1)? * 17;
                let g = channel(1..2)? * 17;
                let b = channel(2..3)? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
            8 => Some(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Background used when a node has no explicit one.
pub const DEFAULT_BACKGROUND: SerializableColor = SerializableColor::new(0xe0, 0xe0, 0xe0, 255);

/// Visual style of a node box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<SerializableColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SerializableColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

impl NodeStyle {
    /// Background color with the default applied.
    pub fn background(&self) -> Color {
        self.background_color.unwrap_or(DEFAULT_BACKGROUND).into()
    }

    /// Text color with the default applied.
    pub fn text_color(&self) -> Color {
        self.color.unwrap_or(SerializableColor::black()).into()
    }

    /// Font size with the default applied.
    pub fn font_size(&self) -> f64 {
        self.font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Shape of the connector drawn from a parent to this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    #[default]
    Curved,
    Straight,
}

/// Style of the incoming edge. Belongs to the child, not the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgeStyle {
    #[serde(default, rename = "type")]
    pub kind: EdgeKind,
    #[serde(default)]
    pub dashed: bool,
}

impl EdgeStyle {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A node in the mind-map tree.
///
/// Children are held behind `Arc` so that snapshots share every subtree that
/// an edit did not touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub text: String,
    /// Top-left corner in document space.
    pub position: Point,
    #[serde(default)]
    pub children: Vec<Arc<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    /// Hides the descendants (not the node itself).
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "NodeStyle::is_default")]
    pub style: NodeStyle,
    #[serde(default, skip_serializing_if = "EdgeStyle::is_default")]
    pub edge_style: EdgeStyle,
    /// Explicit footprint overriding the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<NodeSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_label: Option<String>,
}

impl Node {
    /// Create a detached node with a freshly minted id.
    pub fn new(text: impl Into<String>, position: Point) -> Self {
        Self::with_id(Uuid::new_v4(), text, position)
    }

    /// Create a detached node with a specific id.
    pub fn with_id(id: NodeId, text: impl Into<String>, position: Point) -> Self {
        Self {
            id,
            text: text.into(),
            position,
            children: Vec::new(),
            parent_id: None,
            is_collapsed: false,
            icon: None,
            style: NodeStyle::default(),
            edge_style: EdgeStyle::default(),
            size: None,
            notes: None,
            edge_label: None,
        }
    }

    /// The root of a fresh document.
    pub fn root() -> Self {
        Self::with_id(ROOT_ID, ROOT_TEXT, ROOT_POSITION)
    }

    /// Builder-style child append, rewriting the child's parent link.
    pub fn with_child(mut self, mut child: Node) -> Self {
        child.parent_id = Some(self.id);
        self.children.push(Arc::new(child));
        self
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Footprint size, falling back to `default_size`.
    pub fn effective_size(&self, default_size: Size) -> Size {
        self.size.unwrap_or(default_size)
    }

    /// Bounding box in document space.
    pub fn footprint(&self, default_size: Size) -> Rect {
        Rect::from_origin_size(self.position, self.effective_size(default_size))
    }

    /// Ids of the direct children, in order.
    pub fn child_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().map(|child| child.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_node() {
        let root = Node::root();
        assert!(root.is_root());
        assert_eq!(root.parent_id, None);
        assert_eq!(root.text, ROOT_TEXT);
    }

    #[test]
    fn test_with_child_sets_parent() {
        let root = Node::root().with_child(Node::new("a", Point::new(10.0, 10.0)));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].parent_id, Some(ROOT_ID));
    }

    #[test]
    fn test_footprint_uses_default_size() {
        let mut node = Node::new("a", Point::new(10.0, 20.0));
        let default_size = Size::new(150.0, 50.0);
        assert_eq!(node.footprint(default_size), Rect::new(10.0, 20.0, 160.0, 70.0));

        node.size = Some(Size::new(40.0, 30.0));
        assert_eq!(node.footprint(default_size), Rect::new(10.0, 20.0, 50.0, 50.0));
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(SerializableColor::from_hex("#fff"), Some(SerializableColor::white()));
        assert_eq!(
            SerializableColor::from_hex("#e0e0e0"),
            Some(DEFAULT_BACKGROUND)
        );
        assert_eq!(
            SerializableColor::from_hex("#11223380"),
            Some(SerializableColor::new(0x11, 0x22, 0x33, 0x80))
        );
        assert_eq!(SerializableColor::from_hex("e0e0e0"), None);
        assert_eq!(SerializableColor::from_hex("#12345"), None);
        assert_eq!(DEFAULT_BACKGROUND.to_hex(), "#e0e0e0");
        assert_eq!(SerializableColor::new(1, 2, 3, 4).to_hex(), "#01020304");
    }

    #[test]
    fn test_style_defaults() {
        let style = NodeStyle::default();
        assert_eq!(style.font_size(), DEFAULT_FONT_SIZE);
        assert_eq!(SerializableColor::from(style.text_color()), SerializableColor::black());
        assert_eq!(SerializableColor::from(style.background()), DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_node_json_shape() {
        let node = Node::root().with_child(Node::new("child", Point::new(600.0, 300.0)));
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("parentId").is_none());
        assert_eq!(json["children"][0]["parentId"], serde_json::json!(ROOT_ID));
        // Optional fields stay out of the encoding until set.
        assert!(json["children"][0].get("edgeStyle").is_none());

        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_edge_style_encoding() {
        let style = EdgeStyle {
            kind: EdgeKind::Straight,
            dashed: true,
        };
        let json = serde_json::to_string(&style).unwrap();
        assert_eq!(json, r#"{"type":"straight","dashed":true}"#);
    }
}
