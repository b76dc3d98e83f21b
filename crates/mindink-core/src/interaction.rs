//! Drag-and-reparent gesture handling.
//!
//! A press on a node arms a pending drag. Once the pointer travels past the
//! drag threshold the gesture opens a coalesced history entry, and every move
//! overwrites that entry with the node at its new (snapped) position. On
//! release the node is reparented onto the drop target, if any, in the same
//! entry, so the whole gesture undoes in one step.

use crate::config::EditorConfig;
use crate::history::History;
use crate::input::Modifiers;
use crate::node::{Node, NodeId};
use crate::selection::Selection;
use crate::snap::{self, SmartGuide};
use crate::tree::{self, find_node, is_descendant};
use crate::view::ViewState;
use kurbo::{Point, Rect, Vec2};
use std::sync::Arc;

/// Where the gesture state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Pointer is down on a node but has not moved far enough yet.
    PendingDrag {
        node_id: NodeId,
        press_point: Point,
        /// Pointer position minus node position at press time.
        grab_offset: Vec2,
    },
    Dragging {
        node_id: NodeId,
        grab_offset: Vec2,
    },
}

/// Turns pointer events into history writes.
///
/// This is the only code in the crate that opens or closes a coalesced
/// history entry.
#[derive(Debug, Clone, Default)]
pub struct InteractionCoordinator {
    state: DragState,
    drop_target: Option<NodeId>,
    guides: Vec<SmartGuide>,
}

impl InteractionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn is_idle(&self) -> bool {
        self.state == DragState::Idle
    }

    /// The node being pressed or dragged.
    pub fn active_node(&self) -> Option<NodeId> {
        match self.state {
            DragState::Idle => None,
            DragState::PendingDrag { node_id, .. } | DragState::Dragging { node_id, .. } => {
                Some(node_id)
            }
        }
    }

    pub fn drop_target(&self) -> Option<NodeId> {
        self.drop_target
    }

    pub fn guides(&self) -> &[SmartGuide] {
        &self.guides
    }

    /// Pointer down. Updates the selection and arms a drag when a node was hit.
    pub fn press(
        &mut self,
        document: &Node,
        selection: &mut Selection,
        target: Option<NodeId>,
        point: Point,
        modifiers: Modifiers,
    ) {
        if !self.is_idle() {
            log::warn!("Pointer down during an active gesture, resetting");
            self.reset();
        }

        let Some(node) = target.and_then(|id| find_node(document, id)) else {
            if !modifiers.shift {
                selection.clear();
            }
            return;
        };

        if modifiers.shift {
            selection.toggle(node.id);
        } else if !selection.contains(node.id) {
            selection.select(node.id);
        }

        self.state = DragState::PendingDrag {
            node_id: node.id,
            press_point: point,
            grab_offset: point - node.position,
        };
        log::trace!("Pending drag on {}", node.id);
    }

    /// Pointer move. `hits` lists the nodes under the pointer, topmost first.
    ///
    /// Returns true when the document was written.
    pub fn drag(
        &mut self,
        history: &mut History,
        config: &EditorConfig,
        view: &ViewState,
        point: Point,
        hits: &[NodeId],
    ) -> bool {
        let (node_id, grab_offset) = match self.state {
            DragState::Idle => return false,
            DragState::PendingDrag {
                node_id,
                press_point,
                grab_offset,
            } => {
                // Threshold is in screen pixels.
                let travelled = (point - press_point).hypot() * view.scale;
                if travelled < config.drag_threshold {
                    return false;
                }
                history.begin_coalescing();
                self.state = DragState::Dragging {
                    node_id,
                    grab_offset,
                };
                log::debug!("Drag started on {}", node_id);
                (node_id, grab_offset)
            }
            DragState::Dragging {
                node_id,
                grab_offset,
            } => (node_id, grab_offset),
        };

        let document = Arc::clone(history.current());
        let Some(node) = find_node(&document, node_id) else {
            log::warn!("Dragged node {} disappeared, cancelling gesture", node_id);
            self.cancel(history);
            return false;
        };

        let proposed = point - grab_offset;
        let position = if config.snap_enabled {
            let others = snap_candidates(&document, node, config);
            let result = snap::snap_node_position(
                proposed,
                node.effective_size(config.default_node_size),
                &others,
                config.snap_threshold,
                view.scale,
            );
            self.guides = result.guides;
            result.point
        } else {
            self.guides.clear();
            proposed
        };

        self.drop_target = hits
            .iter()
            .copied()
            .find(|id| *id != node_id && !is_descendant(*id, node) && find_node(&document, *id).is_some());

        if position == node.position {
            return false;
        }
        let updated = tree::update_node(&document, node_id, |node| Node {
            position,
            ..node.clone()
        });
        history.apply_operation(updated);
        true
    }

    /// Pointer up. Reparents onto the drop target and closes the gesture.
    ///
    /// Returns true when a drag (not a plain click) was completed.
    pub fn release(&mut self, history: &mut History) -> bool {
        let DragState::Dragging { node_id, .. } = self.state else {
            self.reset();
            return false;
        };

        if let Some(target) = self.drop_target {
            let document = history.current();
            let moved = tree::reparent(document, node_id, target);
            if Arc::ptr_eq(document, &moved) {
                log::debug!("Drop of {} onto {} left the tree unchanged", node_id, target);
            } else {
                log::debug!("Reparented {} under {}", node_id, target);
                history.apply_operation(moved);
            }
        }
        history.end_coalescing();
        self.reset();
        true
    }

    /// Abandon the gesture, discarding anything it wrote.
    ///
    /// Returns true when a drag in progress was rolled back.
    pub fn cancel(&mut self, history: &mut History) -> bool {
        let was_dragging = self.is_dragging();
        if was_dragging {
            history.cancel_coalescing();
            log::debug!("Drag cancelled");
        }
        self.reset();
        was_dragging
    }

    /// Close the gesture in place, keeping what it wrote but skipping the drop.
    pub fn settle(&mut self, history: &mut History) {
        if self.is_dragging() {
            history.end_coalescing();
        }
        self.reset();
    }

    /// Back to idle with no transient state.
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
        self.drop_target = None;
        self.guides.clear();
    }
}

/// Footprints of the visible nodes a dragged node may align with.
fn snap_candidates(document: &Node, dragged: &Node, config: &EditorConfig) -> Vec<Rect> {
    tree::flatten_visible(document)
        .into_iter()
        .filter(|other| other.id != dragged.id)
        .map(|other| other.footprint(config.default_node_size))
        .collect()
}
