//! End-to-end editing scenarios through the public API.

use kurbo::Point;
use mindink_core::tree::{self, collect_ids, find_node, validate};
use mindink_core::{
    Command, Editor, EditorConfig, Modifiers, Node, NodeId, NodePatch, PointerEvent, ROOT_ID,
    SerializableColor,
};
use std::collections::HashSet;
use std::sync::Arc;

fn all_ids_unique(editor: &Editor) -> bool {
    let ids = collect_ids(editor.document());
    let unique: HashSet<_> = ids.iter().collect();
    unique.len() == ids.len()
}

fn parent(editor: &Editor, id: NodeId) -> Option<NodeId> {
    find_node(editor.document(), id).and_then(|node| node.parent_id)
}

#[test]
fn test_add_child_then_undo() {
    let mut editor = Editor::new();
    let before = Arc::clone(editor.document());

    assert!(editor.execute(Command::AddChild { parent: ROOT_ID }));
    let child = editor.selection().first().unwrap();
    assert_eq!(parent(&editor, child), Some(ROOT_ID));

    assert!(editor.execute(Command::Undo));
    assert_eq!(editor.document(), &before);
    assert!(editor.selection().is_empty());
}

#[test]
fn test_drag_onto_root_is_one_undo_step() {
    let mut editor = Editor::new();
    let a = editor.add_child(ROOT_ID).unwrap();
    let b = editor.add_child(a).unwrap();
    let before = Arc::clone(editor.document());
    let entries_before = editor.history().len();

    editor.handle_pointer(PointerEvent::Down {
        position: Point::new(805.0, 305.0),
        target: Some(b),
        modifiers: Modifiers::NONE,
    });
    for step in 1..=5 {
        let x = 805.0 - 70.0 * step as f64;
        editor.handle_pointer(PointerEvent::Move {
            position: Point::new(x, 305.0),
            target: None,
        });
    }
    editor.handle_pointer(PointerEvent::Move {
        position: Point::new(420.0, 310.0),
        target: Some(ROOT_ID),
    });
    assert_eq!(editor.drop_target(), Some(ROOT_ID));
    editor.handle_pointer(PointerEvent::Up {
        position: Point::new(420.0, 310.0),
    });

    assert_eq!(parent(&editor, b), Some(ROOT_ID));
    assert_eq!(editor.history().len(), entries_before + 1);
    assert!(validate(editor.document()).is_ok());

    assert!(editor.execute(Command::Undo));
    assert_eq!(editor.document(), &before);
    assert_eq!(parent(&editor, b), Some(a));
}

#[test]
fn test_delete_two_siblings_and_undo_restores_order() {
    let mut editor = Editor::new();
    let a = editor.add_child(ROOT_ID).unwrap();
    let b = editor.add_child(ROOT_ID).unwrap();
    let c = editor.add_child(ROOT_ID).unwrap();

    editor.execute(Command::SetSelection { ids: vec![a, c] });
    assert!(editor.execute(Command::DeleteSelection));
    let remaining: Vec<_> = editor.document().child_ids().collect();
    assert_eq!(remaining, vec![b]);

    editor.execute(Command::Undo);
    let restored: Vec<_> = editor.document().child_ids().collect();
    assert_eq!(restored, vec![a, b, c]);
}

#[test]
fn test_copy_paste_mints_fresh_identities() {
    let mut editor = Editor::new();
    let a = editor.add_child(ROOT_ID).unwrap();
    editor.add_child(a);
    let red = SerializableColor::new(255, 0, 0, 255);
    editor.execute(Command::Patch {
        id: a,
        patch: NodePatch::BackgroundColor(Some(red)),
    });
    editor.execute(Command::Patch {
        id: a,
        patch: NodePatch::Text("Idea".into()),
    });

    editor.execute(Command::SetSelection { ids: vec![a] });
    assert!(editor.execute(Command::Copy));
    editor.execute(Command::SetSelection { ids: vec![ROOT_ID] });
    assert!(editor.execute(Command::Paste));

    let pasted_id = editor.selection().first().unwrap();
    let original = find_node(editor.document(), a).unwrap();
    let pasted = find_node(editor.document(), pasted_id).unwrap();
    assert_eq!(pasted.text, "Idea");
    assert_eq!(pasted.style, original.style);
    assert_eq!(pasted.parent_id, Some(ROOT_ID));

    let original_ids: HashSet<_> = collect_ids(original).into_iter().collect();
    let pasted_ids = collect_ids(pasted);
    assert_eq!(pasted_ids.len(), 2);
    assert!(pasted_ids.iter().all(|id| !original_ids.contains(id)));
    assert!(all_ids_unique(&editor));

    // Pasting twice gives two more distinct copies.
    editor.execute(Command::SetSelection { ids: vec![ROOT_ID] });
    editor.execute(Command::Paste);
    assert!(all_ids_unique(&editor));
    assert_eq!(tree::node_count(editor.document()), 7);
}

#[test]
fn test_cannot_drop_node_into_its_own_subtree() {
    let mut editor = Editor::with_config(EditorConfig {
        snap_enabled: false,
        ..EditorConfig::default()
    });
    let a = editor.add_child(ROOT_ID).unwrap();
    let b = editor.add_child(a).unwrap();

    editor.pointer_down(Point::new(605.0, 305.0), Some(a), Modifiers::NONE);
    editor.pointer_move(Point::new(805.0, 305.0), Some(b));
    assert_eq!(editor.drop_target(), None);
    editor.pointer_up();

    assert_eq!(parent(&editor, a), Some(ROOT_ID));
    assert_eq!(parent(&editor, b), Some(a));
    assert!(validate(editor.document()).is_ok());
}

#[test]
fn test_redo_branch_is_lost_after_new_edit() {
    let mut editor = Editor::new();
    editor.add_child(ROOT_ID);
    editor.add_child(ROOT_ID);
    editor.execute(Command::Undo);
    assert!(editor.can_redo());

    editor.add_child(ROOT_ID);
    assert!(!editor.can_redo());
    assert!(!editor.execute(Command::Redo));
}

#[test]
fn test_undo_redo_round_trip() {
    let mut editor = Editor::new();
    let a = editor.add_child(ROOT_ID).unwrap();
    editor.patch_node(a, &NodePatch::Text("renamed".into()));
    let edited = Arc::clone(editor.document());

    assert!(editor.undo());
    assert!(editor.redo());
    assert_eq!(editor.document(), &edited);
}

#[test]
fn test_escape_during_drag_leaves_no_trace() {
    let mut editor = Editor::new();
    let a = editor.add_child(ROOT_ID).unwrap();
    let before = Arc::clone(editor.document());
    let entries_before = editor.history().len();

    editor.pointer_down(Point::new(605.0, 305.0), Some(a), Modifiers::NONE);
    editor.pointer_move(Point::new(900.0, 700.0), None);
    assert!(editor.handle_pointer(PointerEvent::Cancel));

    assert_eq!(editor.document(), &before);
    assert_eq!(editor.history().len(), entries_before);
    assert!(!editor.history().is_coalescing());
}

#[test]
fn test_untouched_subtrees_are_shared_between_snapshots() {
    let mut editor = Editor::new();
    let a = editor.add_child(ROOT_ID).unwrap();
    editor.add_child(a);
    let b = editor.add_child(ROOT_ID).unwrap();
    let before = Arc::clone(editor.document());

    editor.patch_node(b, &NodePatch::Text("only b".into()));
    let after = editor.document();
    assert!(Arc::ptr_eq(&before.children[0], &after.children[0]));
    assert!(!Arc::ptr_eq(&before.children[1], &after.children[1]));
}

#[test]
fn test_session_survives_json_round_trip() {
    let mut editor = Editor::new();
    let a = editor.add_child(ROOT_ID).unwrap();
    editor.execute(Command::ToggleNotes { id: a });
    editor.execute(Command::Patch {
        id: a,
        patch: NodePatch::Notes("remember".into()),
    });

    let json = editor.to_session().to_json().unwrap();
    let restored = Editor::load_or_default(&json, EditorConfig::default());
    assert_eq!(restored.document(), editor.document());
    assert!(restored.active_notes().is_none());
    assert!(restored.selection().is_empty());
    let node: &Node = find_node(restored.document(), a).unwrap();
    assert_eq!(node.notes.as_deref(), Some("remember"));
}

#[test]
fn test_undo_during_drag_reverts_only_the_drag() {
    let mut editor = Editor::new();
    let a = editor.add_child(ROOT_ID).unwrap();
    let before_drag = Arc::clone(editor.document());

    editor.pointer_down(Point::new(605.0, 305.0), Some(a), Modifiers::NONE);
    editor.pointer_move(Point::new(695.0, 305.0), None);
    assert!(editor.history().is_coalescing());

    assert!(editor.execute(Command::Undo));
    assert_eq!(editor.document(), &before_drag);
    assert_eq!(parent(&editor, a), Some(ROOT_ID));
    assert!(editor.can_redo());
    assert!(editor.execute(Command::Redo));
    assert_ne!(editor.document(), &before_drag);
}
