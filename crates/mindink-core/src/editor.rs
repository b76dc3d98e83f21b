//! The editing engine: history, selection, clipboard and gesture state.

use crate::command::{Command, EdgeStylePatch, NodePatch};
use crate::config::EditorConfig;
use crate::history::History;
use crate::input::{Modifiers, PointerEvent};
use crate::interaction::{DragState, InteractionCoordinator};
use crate::node::{NEW_NODE_TEXT, Node, NodeId};
use crate::selection::{Clipboard, Selection};
use crate::session::{SessionError, SessionState};
use crate::snap::SmartGuide;
use crate::tree::{self, Document};
use crate::view::ViewState;
use kurbo::{Point, Rect, Size, Vec2};
use std::sync::Arc;

/// A mind-map editor instance.
///
/// The committed document lives in the history log; everything else here is
/// state the view layer reads after each change.
#[derive(Debug, Clone)]
pub struct Editor {
    history: History,
    selection: Selection,
    clipboard: Clipboard,
    view: ViewState,
    config: EditorConfig,
    interaction: InteractionCoordinator,
    active_notes: Option<NodeId>,
    preview_mode: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// An editor holding a fresh document with only the root.
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self::with_document(tree::empty_document(), config)
    }

    pub fn with_document(document: Document, config: EditorConfig) -> Self {
        Self {
            history: History::with_limit(document, config.history_limit),
            selection: Selection::new(),
            clipboard: Clipboard::new(),
            view: ViewState::default(),
            config,
            interaction: InteractionCoordinator::new(),
            active_notes: None,
            preview_mode: false,
        }
    }

    /// The committed document.
    pub fn document(&self) -> &Document {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn drag_state(&self) -> DragState {
        self.interaction.state()
    }

    pub fn drop_target(&self) -> Option<NodeId> {
        self.interaction.drop_target()
    }

    pub fn guides(&self) -> &[SmartGuide] {
        self.interaction.guides()
    }

    /// Node whose notes panel is open. Resolves to `None` once the node is gone.
    pub fn active_notes(&self) -> Option<&Node> {
        self.active_notes
            .and_then(|id| tree::find_node(self.document(), id))
    }

    pub fn is_preview(&self) -> bool {
        self.preview_mode
    }

    /// Nodes a view should draw, pre-order.
    pub fn visible_nodes(&self) -> Vec<&Node> {
        tree::flatten_visible(self.document())
    }

    /// Visible nodes whose footprint contains `point`, topmost first.
    pub fn nodes_at(&self, point: Point) -> Vec<NodeId> {
        let size = self.config.default_node_size;
        let mut hits: Vec<NodeId> = self
            .visible_nodes()
            .into_iter()
            .filter(|node| node.footprint(size).contains(point))
            .map(|node| node.id)
            .collect();
        // Later nodes are drawn on top.
        hits.reverse();
        hits
    }

    /// Topmost visible node under `point`.
    pub fn node_at(&self, point: Point) -> Option<NodeId> {
        self.nodes_at(point).into_iter().next()
    }

    /// Bounding box of the visible content.
    pub fn content_bounds(&self) -> Option<Rect> {
        tree::content_bounds(self.document(), self.config.default_node_size)
    }

    /// Pan and zoom so the visible content fills a `viewport` sized screen.
    pub fn zoom_to_fit(&mut self, viewport: Size, padding: f64) -> bool {
        let Some(bounds) = self.content_bounds() else {
            return false;
        };
        let before = self.view;
        self.view.fit_to_bounds(bounds, viewport, padding);
        self.view != before
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn can_copy(&self) -> bool {
        self.selection
            .first()
            .is_some_and(|id| tree::find_node(self.document(), id).is_some())
    }

    pub fn can_cut(&self) -> bool {
        !self.selection.removable().is_empty()
    }

    pub fn can_delete(&self) -> bool {
        self.can_cut()
    }

    pub fn can_paste(&self) -> bool {
        !self.clipboard.is_empty() && !self.selection.is_empty()
    }

    /// Run a command. Returns whether anything changed.
    pub fn execute(&mut self, command: Command) -> bool {
        log::debug!("Executing {:?}", command);
        match command {
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
            Command::DeleteSelection => self.delete_selection(),
            Command::Copy => self.copy(),
            Command::Cut => self.cut(),
            Command::Paste => self.paste().is_some(),
            Command::ToggleCollapse { id } => self.toggle_collapse(id),
            Command::SetSelection { ids } => self.set_selection(ids),
            Command::ToggleSelection { id } => {
                self.selection.toggle(id);
                true
            }
            Command::AddChild { parent } => self.add_child(parent).is_some(),
            Command::SetEdgeStyle { id, patch } => self.set_edge_style(id, patch),
            Command::Patch { id, patch } => self.patch_node(id, &patch),
            Command::ToggleNotes { id } => self.toggle_notes(id),
            Command::TogglePreview => self.toggle_preview(),
        }
    }

    /// Step back in history. A drag in progress is closed first, so it is
    /// the step being undone.
    pub fn undo(&mut self) -> bool {
        self.settle_gesture();
        let moved = self.history.undo();
        if moved {
            self.selection.clear();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        self.settle_gesture();
        let moved = self.history.redo();
        if moved {
            self.selection.clear();
        }
        moved
    }

    /// Remove the selected nodes (never the root) in one step.
    pub fn delete_selection(&mut self) -> bool {
        self.settle_gesture();
        let ids = self.selection.removable();
        if ids.is_empty() {
            return false;
        }
        let updated = tree::remove_nodes(self.document(), &ids);
        let changed = self.commit(updated);
        self.selection.clear();
        changed
    }

    /// Copy the first selected node's subtree to the clipboard.
    pub fn copy(&mut self) -> bool {
        let Some(id) = self.selection.first() else {
            return false;
        };
        self.copy_node(id)
    }

    /// Copy the first selected non-root node, then delete the selection.
    pub fn cut(&mut self) -> bool {
        let Some(id) = self.selection.removable().first().copied() else {
            return false;
        };
        if !self.copy_node(id) {
            return false;
        }
        self.delete_selection()
    }

    fn copy_node(&mut self, id: NodeId) -> bool {
        let Some(node) = tree::find_node(self.document(), id) else {
            log::debug!("Copy source {} not found", id);
            return false;
        };
        self.clipboard.store(Arc::new(node.clone()));
        true
    }

    /// Paste the clipboard under the first selected node.
    ///
    /// The pasted subtree gets fresh ids and becomes the selection. Returns
    /// the id of its root.
    pub fn paste(&mut self) -> Option<NodeId> {
        self.settle_gesture();
        let parent = self.selection.first()?;
        if tree::find_node(self.document(), parent).is_none() {
            log::debug!("Paste target {} not found", parent);
            return None;
        }
        let mut copy = self.clipboard.paste_copy()?;
        copy.position += self.config.paste_offset;
        let id = copy.id;

        let updated = tree::attach(self.document(), parent, Arc::new(copy));
        if !self.commit(updated) {
            return None;
        }
        self.selection.select(id);
        Some(id)
    }

    /// Add a "New Node" child under `parent` and select it.
    ///
    /// The child is placed right of the parent, one row below the last
    /// existing child. A collapsed parent is expanded.
    pub fn add_child(&mut self, parent: NodeId) -> Option<NodeId> {
        self.settle_gesture();
        let parent_node = tree::find_node(self.document(), parent)?;
        let row = parent_node.children.len() as f64;
        let position = parent_node.position
            + self.config.child_offset
            + Vec2::new(0.0, self.config.child_spacing * row);

        let mut child = Node::new(NEW_NODE_TEXT, position);
        child.parent_id = Some(parent);
        let id = child.id;

        let updated = tree::update_node(self.document(), parent, move |node| {
            let mut node = node.clone();
            node.is_collapsed = false;
            node.children.push(Arc::new(child));
            node
        });
        self.commit(updated);
        self.selection.select(id);
        Some(id)
    }

    pub fn toggle_collapse(&mut self, id: NodeId) -> bool {
        self.settle_gesture();
        let updated = tree::update_node(self.document(), id, |node| Node {
            is_collapsed: !node.is_collapsed,
            ..node.clone()
        });
        self.commit(updated)
    }

    /// Replace the selection. Ids not in the document are dropped.
    pub fn set_selection(&mut self, ids: Vec<NodeId>) -> bool {
        let mut next = Selection::from_ids(ids);
        next.retain_existing(self.document());
        if next == self.selection {
            return false;
        }
        self.selection = next;
        true
    }

    /// Change the incoming edge of a node. The root has none.
    pub fn set_edge_style(&mut self, id: NodeId, patch: EdgeStylePatch) -> bool {
        self.settle_gesture();
        let Some(node) = tree::find_node(self.document(), id) else {
            return false;
        };
        if node.is_root() {
            log::debug!("Ignoring edge style change on the root");
            return false;
        }
        let edge_style = patch.apply(node.edge_style);
        if edge_style == node.edge_style {
            return false;
        }
        let updated = tree::update_node(self.document(), id, |node| Node {
            edge_style,
            ..node.clone()
        });
        self.commit(updated)
    }

    /// Apply a property patch. Patches that change nothing leave no entry.
    pub fn patch_node(&mut self, id: NodeId, patch: &NodePatch) -> bool {
        self.settle_gesture();
        let Some(node) = tree::find_node(self.document(), id) else {
            return false;
        };
        let Some(patched) = patch.apply(node, self.config.default_node_size) else {
            return false;
        };
        let updated = tree::update_node(self.document(), id, move |_| patched);
        self.commit(updated)
    }

    /// Open the notes of `id`, or close them if they are already open.
    pub fn toggle_notes(&mut self, id: NodeId) -> bool {
        if self.active_notes == Some(id) {
            self.active_notes = None;
            return true;
        }
        if tree::find_node(self.document(), id).is_none() {
            return false;
        }
        self.active_notes = Some(id);
        true
    }

    /// Switch preview mode. Entering it clears the selection.
    pub fn toggle_preview(&mut self) -> bool {
        self.settle_gesture();
        self.preview_mode = !self.preview_mode;
        if self.preview_mode {
            self.selection.clear();
        }
        true
    }

    /// Feed a pointer event. Returns whether the document changed.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down {
                position,
                target,
                modifiers,
            } => {
                self.pointer_down(position, target, modifiers);
                false
            }
            PointerEvent::Move { position, target } => self.pointer_move(position, target),
            PointerEvent::Up { .. } => self.pointer_up(),
            PointerEvent::Cancel => self.cancel_gesture(),
        }
    }

    /// Press at `position`. Pointer input is ignored in preview mode.
    pub fn pointer_down(&mut self, position: Point, target: Option<NodeId>, modifiers: Modifiers) {
        if self.preview_mode {
            return;
        }
        let target = target.or_else(|| self.node_at(position));
        let document = Arc::clone(self.document());
        self.interaction
            .press(&document, &mut self.selection, target, position, modifiers);
    }

    pub fn pointer_move(&mut self, position: Point, target: Option<NodeId>) -> bool {
        if self.interaction.is_idle() {
            return false;
        }
        let hits = match target {
            Some(id) => vec![id],
            None => self.nodes_at(position),
        };
        self.interaction
            .drag(&mut self.history, &self.config, &self.view, position, &hits)
    }

    /// Release the pointer. Returns true when a drag was completed.
    pub fn pointer_up(&mut self) -> bool {
        self.interaction.release(&mut self.history)
    }

    /// Abandon the current gesture. Returns true when a drag was rolled back.
    pub fn cancel_gesture(&mut self) -> bool {
        self.interaction.cancel(&mut self.history)
    }

    /// Snapshot everything worth persisting.
    pub fn to_session(&self) -> SessionState {
        SessionState {
            history: self.history.entries().to_vec(),
            current_index: self.history.current_index(),
            selection: self.selection.clone(),
            clipboard: self.clipboard.clone(),
            view_state: self.view,
        }
    }

    /// Restore an editor from a persisted session.
    ///
    /// History, cursor and clipboard are kept; the cursor is clamped into
    /// range. Selection and all gesture state start out empty.
    pub fn from_session(state: SessionState, config: EditorConfig) -> Result<Self, SessionError> {
        for (index, document) in state.history.iter().enumerate() {
            tree::validate(document)
                .map_err(|source| SessionError::InvalidDocument { index, source })?;
        }
        let history = History::from_parts(
            state.history,
            state.current_index,
            config.history_limit,
            tree::empty_document(),
        );
        Ok(Self {
            history,
            selection: Selection::new(),
            clipboard: state.clipboard,
            view: state.view_state.sanitized(),
            config,
            interaction: InteractionCoordinator::new(),
            active_notes: None,
            preview_mode: false,
        })
    }

    /// Restore from session JSON, falling back to a fresh editor.
    pub fn load_or_default(json: &str, config: EditorConfig) -> Self {
        match SessionState::from_json(json).and_then(|state| Self::from_session(state, config.clone())) {
            Ok(editor) => editor,
            Err(e) => {
                log::warn!("Failed to restore session, starting fresh: {}", e);
                Self::with_config(config)
            }
        }
    }

    /// Commit `document` unless it is the current one.
    fn commit(&mut self, document: Document) -> bool {
        if Arc::ptr_eq(self.document(), &document) {
            return false;
        }
        self.history.apply_operation(document);
        true
    }

    /// Commands issued mid-drag close the gesture first.
    fn settle_gesture(&mut self) {
        self.interaction.settle(&mut self.history);
    }
}
