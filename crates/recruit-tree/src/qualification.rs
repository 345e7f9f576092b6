//! Qualification counts
//!
//! Every expanded node carries `qualified_children_count`: the number of its
//! direct children with a non-blank name. Leaves carry 0. The count is
//! derived, never assigned by an edit, and must be recomputed after every
//! mutation before the tree is treated as canonical.
//!
//! [`recompute`] is a single bottom-up pass. [`settle`] drives it to a fixed
//! point and reports whether anything changed, so callers can skip a state
//! transition when the recomputed tree equals the one they already hold.

use crate::tree::{is_blank, Tree};

/// Upper bound on passes in [`settle`]. One pass always reaches the fixed
/// point; the second only confirms it.
pub const MAX_SETTLE_PASSES: usize = 8;

/// Result of driving [`recompute`] to a fixed point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    /// The settled tree
    pub tree: Tree,
    /// Whether any pass changed the input
    pub changed: bool,
    /// Passes run, including the confirming one
    pub passes: usize,
    /// False only if [`MAX_SETTLE_PASSES`] ran out before a pass was a no-op
    pub converged: bool,
}

/// One bottom-up pass over the whole tree
#[must_use]
pub fn recompute(tree: &Tree) -> Tree {
    let mut next = tree.clone();
    for id in tree.postorder() {
        let children = tree.children_of(id.as_str());
        let count = children
            .iter()
            .filter_map(|child| tree.get(child.as_str()))
            .filter(|child| !is_blank(child.name()))
            .count();
        let count = u8::try_from(count).unwrap_or(u8::MAX);
        next.set_qualified_count(&id, count);
    }
    next
}

/// Recompute until a pass leaves the tree unchanged (by value)
#[must_use]
pub fn settle(tree: Tree) -> Settled {
    let mut current = tree;
    let mut changed = false;

    for pass in 1..=MAX_SETTLE_PASSES {
        let next = recompute(&current);
        if next == current {
            return Settled {
                tree: current,
                changed,
                passes: pass,
                converged: true,
            };
        }
        changed = true;
        current = next;
    }

    Settled {
        tree: current,
        changed,
        passes: MAX_SETTLE_PASSES,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ROOT_ID;
    use crate::tree::create_blank_tree;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_tree_is_already_settled() {
        let settled = settle(create_blank_tree());
        assert!(!settled.changed);
        assert!(settled.converged);
        assert_eq!(settled.passes, 1);
        assert_eq!(settled.tree.root().qualified_children_count(), 0);
    }

    #[test]
    fn counts_direct_named_children() {
        let tree = create_blank_tree();
        let kids = tree.root().children().to_vec();
        let tree = tree
            .set_name(kids[0].as_str(), "Alice")
            .set_name(kids[2].as_str(), "Carol");

        let settled = settle(tree);
        assert!(settled.changed);
        assert_eq!(settled.passes, 2);
        assert_eq!(settled.tree.root().qualified_children_count(), 2);

        let alice = settled.tree.get(kids[0].as_str()).unwrap();
        assert_eq!(alice.qualified_children_count(), 0);
    }

    #[test]
    fn nested_counts_are_independent() {
        let tree = create_blank_tree();
        let a = tree.root().children()[0].clone();
        let tree = tree.set_name(a.as_str(), "Alice");
        let grandkids = tree.children_of(a.as_str()).to_vec();
        let tree = grandkids
            .iter()
            .fold(tree, |t, id| t.set_name(id.as_str(), "Recruit"));

        let tree = settle(tree).tree;
        assert_eq!(tree.get(a.as_str()).unwrap().qualified_children_count(), 3);
        assert_eq!(tree.root().qualified_children_count(), 1);
        assert!(tree.is_qualified(a.as_str()));
        assert!(!tree.is_qualified(ROOT_ID));
    }

    #[test]
    fn whitespace_names_do_not_count() {
        let tree = create_blank_tree();
        let a = tree.root().children()[1].clone();
        let tree = settle(tree.set_name(a.as_str(), "   ")).tree;
        assert_eq!(tree.root().qualified_children_count(), 0);
    }

    #[test]
    fn recompute_is_idempotent() {
        let tree = create_blank_tree();
        let a = tree.root().children()[0].clone();
        let tree = tree.set_name(a.as_str(), "Alice");
        let once = recompute(&tree);
        assert_eq!(recompute(&once), once);
    }

    #[test]
    fn stale_counter_is_corrected() {
        let mut node = create_blank_tree().to_node();
        node.qualified_children_count = 3;
        let tree = Tree::from_node(node).unwrap();
        let settled = settle(tree);
        assert!(settled.changed);
        assert_eq!(settled.tree.root().qualified_children_count(), 0);
    }
}
