//! MindInk Core Library
//!
//! Platform-agnostic document model, history and interaction logic for the
//! MindInk mind-map editor.

pub mod command;
pub mod config;
pub mod editor;
pub mod history;
pub mod input;
pub mod interaction;
pub mod node;
pub mod selection;
pub mod session;
pub mod snap;
pub mod storage;
pub mod tree;
pub mod view;

pub use command::{Command, EdgeStylePatch, NodePatch};
pub use config::{ConfigError, EditorConfig};
pub use editor::Editor;
pub use history::History;
pub use input::{Modifiers, PointerEvent};
pub use interaction::{DragState, InteractionCoordinator};
pub use node::{EdgeKind, EdgeStyle, Node, NodeId, NodeStyle, ROOT_ID, SerializableColor};
pub use selection::{Clipboard, Selection};
pub use session::{SessionError, SessionState};
pub use snap::{GuideAxis, SmartGuide, SmartGuideResult, detect_smart_guides};
pub use tree::{Document, TreeError};
pub use view::ViewState;
