//! Persistent tree operations.
//!
//! Every function here is pure. Edits rebuild the path from the changed node
//! up to the root and share every other subtree with the input, so a
//! [`Document`] can be kept in the history log without copying.

use crate::node::{Node, NodeId, ROOT_ID};
use kurbo::{Rect, Size};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// An immutable snapshot of the whole tree, addressed by its root.
pub type Document = Arc<Node>;

/// Structural problems found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("root id is {0}, expected the reserved root id")]
    RootMismatch(NodeId),
    #[error("root has a parent link ({0})")]
    RootHasParent(NodeId),
    #[error("duplicate node id {0}")]
    DuplicateId(NodeId),
    #[error("node {node} links to parent {found:?} but is a child of {expected}")]
    ParentMismatch {
        node: NodeId,
        expected: NodeId,
        found: Option<NodeId>,
    },
}

/// Wrap a root node as a document.
pub fn document(root: Node) -> Document {
    Arc::new(root)
}

/// A document holding only the default root.
pub fn empty_document() -> Document {
    document(Node::root())
}

/// Depth-first search, first match wins.
pub fn find_node(tree: &Node, id: NodeId) -> Option<&Node> {
    if tree.id == id {
        return Some(tree);
    }
    tree.children.iter().find_map(|child| find_node(child, id))
}

/// The node whose `children` contains `id`.
pub fn parent_of(tree: &Node, id: NodeId) -> Option<&Node> {
    if tree.children.iter().any(|child| child.id == id) {
        return Some(tree);
    }
    tree.children.iter().find_map(|child| parent_of(child, id))
}

/// Rebuild the tree with `transform` applied to the node `id`.
///
/// Returns the input document untouched when `id` is absent.
pub fn update_node<F>(tree: &Document, id: NodeId, transform: F) -> Document
where
    F: FnOnce(&Node) -> Node,
{
    let mut transform = Some(transform);
    update_in(tree, id, &mut transform).unwrap_or_else(|| Arc::clone(tree))
}

fn update_in<F>(node: &Arc<Node>, id: NodeId, transform: &mut Option<F>) -> Option<Arc<Node>>
where
    F: FnOnce(&Node) -> Node,
{
    if node.id == id {
        let transform = transform.take()?;
        return Some(Arc::new(transform(node)));
    }
    for (index, child) in node.children.iter().enumerate() {
        if let Some(updated) = update_in(child, id, transform) {
            let mut copy = Node::clone(node);
            copy.children[index] = updated;
            return Some(Arc::new(copy));
        }
    }
    None
}

/// Remove every node in `ids` together with its subtree.
///
/// The root is never removed. Returns the input document when nothing matched.
pub fn remove_nodes(tree: &Document, ids: &[NodeId]) -> Document {
    let ids: HashSet<NodeId> = ids.iter().copied().filter(|id| *id != tree.id).collect();
    if ids.is_empty() {
        return Arc::clone(tree);
    }
    remove_in(tree, &ids).unwrap_or_else(|| Arc::clone(tree))
}

fn remove_in(node: &Arc<Node>, ids: &HashSet<NodeId>) -> Option<Arc<Node>> {
    let mut changed = false;
    let mut children = Vec::with_capacity(node.children.len());
    for child in &node.children {
        if ids.contains(&child.id) {
            changed = true;
            continue;
        }
        match remove_in(child, ids) {
            Some(updated) => {
                changed = true;
                children.push(updated);
            }
            None => children.push(Arc::clone(child)),
        }
    }
    if !changed {
        return None;
    }
    let mut copy = Node::clone(node);
    copy.children = children;
    Some(Arc::new(copy))
}

/// Remove exactly one node and hand it back with its subtree.
///
/// The root and absent ids give back the input and `None`.
pub fn detach(tree: &Document, id: NodeId) -> (Document, Option<Arc<Node>>) {
    if tree.id == id {
        return (Arc::clone(tree), None);
    }
    match detach_in(tree, id) {
        Some((updated, removed)) => (updated, Some(removed)),
        None => (Arc::clone(tree), None),
    }
}

fn detach_in(node: &Arc<Node>, id: NodeId) -> Option<(Arc<Node>, Arc<Node>)> {
    if let Some(index) = node.children.iter().position(|child| child.id == id) {
        let mut copy = Node::clone(node);
        let removed = copy.children.remove(index);
        return Some((Arc::new(copy), removed));
    }
    for (index, child) in node.children.iter().enumerate() {
        if let Some((updated, removed)) = detach_in(child, id) {
            let mut copy = Node::clone(node);
            copy.children[index] = updated;
            return Some((Arc::new(copy), removed));
        }
    }
    None
}

/// Append `subtree` to the children of `parent_id`, rewriting its parent link.
pub fn attach(tree: &Document, parent_id: NodeId, subtree: Arc<Node>) -> Document {
    update_node(tree, parent_id, move |parent| {
        let mut child = Node::clone(&subtree);
        child.parent_id = Some(parent.id);
        let mut parent = parent.clone();
        parent.children.push(Arc::new(child));
        parent
    })
}

/// Move `node_id` under `new_parent_id`, keeping its identity and subtree.
///
/// Returns the input document when the move is not allowed (root, unknown
/// ids, cycles) or when the node already sits under `new_parent_id`.
pub fn reparent(tree: &Document, node_id: NodeId, new_parent_id: NodeId) -> Document {
    if node_id == tree.id {
        log::debug!("Refusing to reparent the root");
        return Arc::clone(tree);
    }
    let Some(node) = find_node(tree, node_id) else {
        log::debug!("Reparent source {} not found", node_id);
        return Arc::clone(tree);
    };
    if node_id == new_parent_id || is_descendant(new_parent_id, node) {
        log::debug!("Refusing to reparent {} into its own subtree", node_id);
        return Arc::clone(tree);
    }
    if node.parent_id == Some(new_parent_id) {
        return Arc::clone(tree);
    }
    if find_node(tree, new_parent_id).is_none() {
        log::debug!("Reparent target {} not found", new_parent_id);
        return Arc::clone(tree);
    }

    let (without, detached) = detach(tree, node_id);
    match detached {
        Some(subtree) => attach(&without, new_parent_id, subtree),
        None => Arc::clone(tree),
    }
}

/// Whether `candidate` is somewhere below `of`. `of` itself does not count.
pub fn is_descendant(candidate: NodeId, of: &Node) -> bool {
    of.children
        .iter()
        .any(|child| child.id == candidate || is_descendant(candidate, child))
}

/// Copy a subtree, minting a fresh id for every node.
///
/// The copy's root keeps its old `parent_id` until it is attached somewhere.
pub fn deep_copy_with_new_ids(subtree: &Node) -> Node {
    copy_with_new_id(subtree, subtree.parent_id)
}

fn copy_with_new_id(node: &Node, parent_id: Option<NodeId>) -> Node {
    let id = Uuid::new_v4();
    let children = node
        .children
        .iter()
        .map(|child| Arc::new(copy_with_new_id(child, Some(id))))
        .collect();
    Node {
        id,
        parent_id,
        children,
        ..node.clone()
    }
}

/// Pre-order list of the nodes a view shows: collapsed nodes are included,
/// their descendants are not.
pub fn flatten_visible(tree: &Node) -> Vec<&Node> {
    let mut nodes = Vec::new();
    collect(tree, true, &mut nodes);
    nodes
}

/// Pre-order list of every node, ignoring collapse.
pub fn flatten_all(tree: &Node) -> Vec<&Node> {
    let mut nodes = Vec::new();
    collect(tree, false, &mut nodes);
    nodes
}

fn collect<'a>(node: &'a Node, respect_collapse: bool, out: &mut Vec<&'a Node>) {
    out.push(node);
    if respect_collapse && node.is_collapsed {
        return;
    }
    for child in &node.children {
        collect(child, respect_collapse, out);
    }
}

pub fn node_count(tree: &Node) -> usize {
    1 + tree.children.iter().map(|child| node_count(child)).sum::<usize>()
}

/// Every id in a subtree, pre-order.
pub fn collect_ids(subtree: &Node) -> Vec<NodeId> {
    flatten_all(subtree).into_iter().map(|node| node.id).collect()
}

/// Check the structural invariants of a whole document.
pub fn validate(tree: &Node) -> Result<(), TreeError> {
    if tree.id != ROOT_ID {
        return Err(TreeError::RootMismatch(tree.id));
    }
    if let Some(parent) = tree.parent_id {
        return Err(TreeError::RootHasParent(parent));
    }
    let mut seen = HashSet::new();
    seen.insert(tree.id);
    validate_children(tree, &mut seen)
}

fn validate_children(node: &Node, seen: &mut HashSet<NodeId>) -> Result<(), TreeError> {
    for child in &node.children {
        if !seen.insert(child.id) {
            return Err(TreeError::DuplicateId(child.id));
        }
        if child.parent_id != Some(node.id) {
            return Err(TreeError::ParentMismatch {
                node: child.id,
                expected: node.id,
                found: child.parent_id,
            });
        }
        validate_children(child, seen)?;
    }
    Ok(())
}

/// Bounding box of all visible node footprints.
pub fn content_bounds(tree: &Node, default_size: Size) -> Option<Rect> {
    flatten_visible(tree)
        .into_iter()
        .map(|node| node.footprint(default_size))
        .reduce(|acc, rect| acc.union(rect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    /// root -> [a -> [a1, a2], b]
    fn sample() -> (Document, NodeId, NodeId, NodeId, NodeId) {
        let a1 = Node::new("a1", Point::new(800.0, 200.0));
        let a2 = Node::new("a2", Point::new(800.0, 300.0));
        let a = Node::new("a", Point::new(600.0, 250.0))
            .with_child(a1.clone())
            .with_child(a2.clone());
        let b = Node::new("b", Point::new(600.0, 400.0));
        let (a_id, b_id) = (a.id, b.id);
        let root = Node::root().with_child(a).with_child(b);
        (document(root), a_id, a1.id, a2.id, b_id)
    }

    #[test]
    fn test_find_node() {
        let (doc, a, a1, _, b) = sample();
        assert_eq!(find_node(&doc, a1).map(|n| n.text.as_str()), Some("a1"));
        assert_eq!(find_node(&doc, ROOT_ID).map(|n| n.id), Some(ROOT_ID));
        assert!(find_node(&doc, Uuid::new_v4()).is_none());
        assert_eq!(parent_of(&doc, a1).map(|n| n.id), Some(a));
        assert_eq!(parent_of(&doc, b).map(|n| n.id), Some(ROOT_ID));
        assert!(parent_of(&doc, ROOT_ID).is_none());
    }

    #[test]
    fn test_update_node_shares_untouched_subtrees() {
        let (doc, _, a1, _, _) = sample();
        let updated = update_node(&doc, a1, |node| Node {
            text: "renamed".into(),
            ..node.clone()
        });

        assert_eq!(find_node(&updated, a1).map(|n| n.text.as_str()), Some("renamed"));
        assert_eq!(find_node(&doc, a1).map(|n| n.text.as_str()), Some("a1"));
        // Path to the edit is copied, the sibling branch is shared.
        assert!(!Arc::ptr_eq(&doc.children[0], &updated.children[0]));
        assert!(Arc::ptr_eq(&doc.children[1], &updated.children[1]));
        assert!(Arc::ptr_eq(&doc.children[0].children[1], &updated.children[0].children[1]));
    }

    #[test]
    fn test_update_missing_node_is_identity() {
        let (doc, ..) = sample();
        let updated = update_node(&doc, Uuid::new_v4(), |node| node.clone());
        assert!(Arc::ptr_eq(&doc, &updated));
    }

    #[test]
    fn test_remove_nodes() {
        let (doc, a, a1, _, b) = sample();
        let removed = remove_nodes(&doc, &[a1, b]);
        assert_eq!(node_count(&removed), 3);
        assert!(find_node(&removed, a1).is_none());
        assert!(find_node(&removed, b).is_none());
        assert!(find_node(&removed, a).is_some());

        // Whole subtree goes with its root.
        let removed = remove_nodes(&doc, &[a]);
        assert_eq!(collect_ids(&removed), vec![ROOT_ID, b]);
    }

    #[test]
    fn test_remove_ignores_root_and_unknown() {
        let (doc, ..) = sample();
        let removed = remove_nodes(&doc, &[ROOT_ID, Uuid::new_v4()]);
        assert!(Arc::ptr_eq(&doc, &removed));
        assert!(Arc::ptr_eq(&doc, &remove_nodes(&doc, &[])));
    }

    #[test]
    fn test_detach_and_attach() {
        let (doc, a, a1, _, b) = sample();
        let (without, detached) = detach(&doc, a);
        let detached = detached.unwrap();
        assert_eq!(detached.id, a);
        assert_eq!(node_count(&without), 2);

        let moved = attach(&without, b, detached);
        let a_node = find_node(&moved, a).unwrap();
        assert_eq!(a_node.parent_id, Some(b));
        assert_eq!(find_node(&moved, a1).unwrap().parent_id, Some(a));
        assert!(validate(&moved).is_ok());
    }

    #[test]
    fn test_detach_root_is_refused() {
        let (doc, ..) = sample();
        let (same, detached) = detach(&doc, ROOT_ID);
        assert!(detached.is_none());
        assert!(Arc::ptr_eq(&doc, &same));
    }

    #[test]
    fn test_reparent() {
        let (doc, a, _, _, b) = sample();
        let moved = reparent(&doc, b, a);
        assert_eq!(find_node(&moved, b).unwrap().parent_id, Some(a));
        assert_eq!(parent_of(&moved, b).map(|n| n.id), Some(a));
        // Appended after the existing children.
        assert_eq!(find_node(&moved, a).unwrap().children.last().map(|n| n.id), Some(b));
        assert!(validate(&moved).is_ok());
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let (doc, a, a1, _, _) = sample();
        assert!(Arc::ptr_eq(&doc, &reparent(&doc, a, a)));
        assert!(Arc::ptr_eq(&doc, &reparent(&doc, a, a1)));
        assert!(Arc::ptr_eq(&doc, &reparent(&doc, ROOT_ID, a)));
        assert!(Arc::ptr_eq(&doc, &reparent(&doc, a, Uuid::new_v4())));
    }

    #[test]
    fn test_reparent_onto_current_parent_is_noop() {
        let (doc, a, a1, _, _) = sample();
        assert!(Arc::ptr_eq(&doc, &reparent(&doc, a1, a)));
    }

    #[test]
    fn test_is_descendant() {
        let (doc, a, a1, _, b) = sample();
        let a_node = find_node(&doc, a).unwrap();
        assert!(is_descendant(a1, a_node));
        assert!(!is_descendant(a, a_node));
        assert!(!is_descendant(b, a_node));
        assert!(is_descendant(a1, &doc));
    }

    #[test]
    fn test_deep_copy_with_new_ids() {
        let (doc, a, ..) = sample();
        let original = find_node(&doc, a).unwrap();
        let copy = deep_copy_with_new_ids(original);

        let original_ids: HashSet<_> = collect_ids(original).into_iter().collect();
        let copy_ids: Vec<_> = collect_ids(&copy);
        assert_eq!(copy_ids.len(), original_ids.len());
        assert!(copy_ids.iter().all(|id| !original_ids.contains(id)));

        assert_eq!(copy.parent_id, original.parent_id);
        assert_eq!(copy.text, original.text);
        for child in &copy.children {
            assert_eq!(child.parent_id, Some(copy.id));
        }
    }

    #[test]
    fn test_flatten_visible_respects_collapse() {
        let (doc, a, ..) = sample();
        assert_eq!(flatten_visible(&doc).len(), 5);

        let collapsed = update_node(&doc, a, |node| Node {
            is_collapsed: true,
            ..node.clone()
        });
        let visible: Vec<_> = flatten_visible(&collapsed).iter().map(|n| n.text.clone()).collect();
        assert_eq!(visible, vec!["Central Topic", "a", "b"]);
        assert_eq!(flatten_all(&collapsed).len(), 5);
    }

    #[test]
    fn test_validate() {
        let (doc, a, a1, ..) = sample();
        assert!(validate(&doc).is_ok());

        let broken = update_node(&doc, a1, |node| Node {
            parent_id: Some(ROOT_ID),
            ..node.clone()
        });
        assert_eq!(
            validate(&broken),
            Err(TreeError::ParentMismatch {
                node: a1,
                expected: a,
                found: Some(ROOT_ID),
            })
        );

        let duplicate = Node::root()
            .with_child(Node::with_id(a, "x", Point::ZERO))
            .with_child(Node::with_id(a, "y", Point::ZERO));
        assert_eq!(validate(&duplicate), Err(TreeError::DuplicateId(a)));

        let stray_root = Node::new("not root", Point::ZERO);
        assert!(matches!(validate(&stray_root), Err(TreeError::RootMismatch(_))));
    }

    #[test]
    fn test_content_bounds() {
        let root = Node::root().with_child(Node::new("a", Point::new(600.0, 400.0)));
        let bounds = content_bounds(&root, Size::new(150.0, 50.0)).unwrap();
        assert_eq!(bounds, Rect::new(400.0, 300.0, 750.0, 450.0));
    }
}
