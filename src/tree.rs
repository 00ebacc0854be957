//! Traversal of widget trees.
//!
//! Every walk is pre-order: a node is visited before its children and
//! children are visited in display order. Positions count from the root,
//! which is position 0. Two trees with the same shape therefore assign the
//! same position to corresponding nodes, whatever their identities are.

use crate::widget::Widget;

/// Visits every node of `root` in pre-order with its position.
pub fn walk(root: &dyn Widget, f: &mut dyn FnMut(usize, &dyn Widget)) {
    fn step(node: &dyn Widget, next: &mut usize, f: &mut dyn FnMut(usize, &dyn Widget)) {
        f(*next, node);
        *next += 1;
        for child in node.children() {
            step(child, next, f);
        }
    }

    let mut next = 0;
    step(root, &mut next, f);
}

/// Mutable counterpart of [`walk`].
pub fn walk_mut(root: &mut dyn Widget, f: &mut dyn FnMut(usize, &mut dyn Widget)) {
    fn step(node: &mut dyn Widget, next: &mut usize, f: &mut dyn FnMut(usize, &mut dyn Widget)) {
        f(*next, &mut *node);
        *next += 1;
        node.visit_children_mut(&mut |child| step(child, next, f));
    }

    let mut next = 0;
    step(root, &mut next, f);
}

/// Number of nodes in the tree, root included.
pub fn node_count(root: &dyn Widget) -> usize {
    let mut count = 0;
    walk(root, &mut |_, _| count += 1);
    count
}

/// Kinds of every node in pre-order. Two trees correspond when these match.
pub fn shape(root: &dyn Widget) -> Vec<&'static str> {
    let mut kinds = Vec::new();
    walk(root, &mut |_, node| kinds.push(node.kind()));
    kinds
}

/// Position of the first node with identity `id`.
pub fn position_of(root: &dyn Widget, id: &str) -> Option<usize> {
    let mut found = None;
    walk(root, &mut |position, node| {
        if found.is_none() && node.id() == Some(id) {
            found = Some(position);
        }
    });
    found
}

/// The node with identity `id`, searching `root` and its descendants.
pub fn find<'w>(root: &'w dyn Widget, id: &str) -> Option<&'w dyn Widget> {
    if root.id() == Some(id) {
        return Some(root);
    }
    root.children().into_iter().find_map(|child| find(child, id))
}

/// The node at `position`, if the tree has one.
pub fn node_at(root: &dyn Widget, position: usize) -> Option<&dyn Widget> {
    if position == 0 {
        return Some(root);
    }
    let mut remaining = position - 1;
    for child in root.children() {
        let size = node_count(child);
        if remaining < size {
            return node_at(child, remaining);
        }
        remaining -= size;
    }
    None
}

/// Runs `f` on the node at `position`. Returns `None` if there is no such node.
pub fn with_node_mut<R>(
    root: &mut dyn Widget,
    position: usize,
    f: impl FnOnce(&mut dyn Widget) -> R,
) -> Option<R> {
    let mut f = Some(f);
    let mut result = None;
    walk_mut(root, &mut |index, node| {
        if index == position
            && let Some(f) = f.take()
        {
            result = Some(f(node));
        }
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{Checkbox, Container, Entry, Label};

    fn sample() -> Container {
        Container::with_id("row")
            .child(Label::new("a"))
            .child(Container::new().child(Entry::new("b")))
            .child(Checkbox::new("c"))
    }

    #[test]
    fn test_walk_is_pre_order() {
        let tree = sample();
        let mut seen = Vec::new();
        walk(&tree, &mut |position, node| seen.push((position, node.id().map(str::to_string))));
        assert_eq!(
            seen,
            vec![
                (0, Some("row".to_string())),
                (1, Some("a".to_string())),
                (2, None),
                (3, Some("b".to_string())),
                (4, Some("c".to_string())),
            ]
        );
    }

    #[test]
    fn test_node_at_matches_walk() {
        let tree = sample();
        assert_eq!(node_count(&tree), 5);
        assert_eq!(node_at(&tree, 3).and_then(|n| n.id()), Some("b"));
        assert_eq!(node_at(&tree, 2).map(|n| n.kind()), Some("container"));
        assert!(node_at(&tree, 5).is_none());
    }

    #[test]
    fn test_position_and_find() {
        let tree = sample();
        assert_eq!(position_of(&tree, "c"), Some(4));
        assert_eq!(position_of(&tree, "missing"), None);
        assert_eq!(find(&tree, "b").map(|n| n.kind()), Some("entry"));
    }

    #[test]
    fn test_with_node_mut() {
        let mut tree = sample();
        let renamed = with_node_mut(&mut tree, 1, |node| node.set_id(Some("renamed".to_string())));
        assert!(renamed.is_some());
        assert_eq!(position_of(&tree, "renamed"), Some(1));
        assert!(with_node_mut(&mut tree, 9, |_| ()).is_none());
    }

    #[test]
    fn test_shape() {
        let tree = sample();
        assert_eq!(shape(&tree), vec!["container", "label", "container", "entry", "checkbox"]);
    }
}
