//! Property tests for the tree model
//!
//! Random edit sequences are applied to a blank tree and every intermediate
//! tree is checked against the structural and qualification invariants.

use proptest::prelude::*;
use recruit_tree::{
    create_blank_tree, is_blank, recompute, settle, NodeId, Tree, FAN_OUT, ROOT_ID,
};
use std::collections::HashSet;

#[derive(Debug, Clone)]
struct Edit {
    target: usize,
    name: &'static str,
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    (
        any::<usize>(),
        prop_oneof![
            Just(""),
            Just("   "),
            Just("Alice"),
            Just("Bob"),
            Just(" Carol "),
        ],
    )
        .prop_map(|(target, name)| Edit { target, name })
}

fn apply(tree: &Tree, edit: &Edit) -> Tree {
    let order = tree.preorder();
    let (_, id) = &order[edit.target % order.len()];
    settle(tree.set_name(id.as_str(), edit.name)).tree
}

fn assert_structure(tree: &Tree) {
    let root = tree.root();
    assert_eq!(root.children().len(), FAN_OUT);

    let mut seen = HashSet::new();
    for (_, id) in tree.preorder() {
        assert!(seen.insert(id.clone()), "duplicate id {id}");
        let record = tree.get(id.as_str()).unwrap();
        let count = record.children().len();
        assert!(count == 0 || count == FAN_OUT);
        if id.as_str() != ROOT_ID {
            assert_eq!(count == FAN_OUT, !is_blank(record.name()));
        }
    }
    // Nothing unreachable left in the arena
    assert_eq!(seen.len(), tree.len());
}

fn assert_counts(tree: &Tree) {
    for (_, id) in tree.preorder() {
        let record = tree.get(id.as_str()).unwrap();
        let expected = record
            .children()
            .iter()
            .filter(|c| !tree.get(c.as_str()).unwrap().is_blank())
            .count();
        assert_eq!(usize::from(record.qualified_children_count()), expected);
    }
}

proptest! {
    #[test]
    fn prop_edits_preserve_structure(edits in prop::collection::vec(edit_strategy(), 0..40)) {
        let mut tree = create_blank_tree();
        for edit in &edits {
            tree = apply(&tree, edit);
            assert_structure(&tree);
            assert_counts(&tree);
        }
    }

    #[test]
    fn prop_recompute_is_idempotent(edits in prop::collection::vec(edit_strategy(), 0..40)) {
        let mut tree = create_blank_tree();
        for edit in &edits {
            let order = tree.preorder();
            let (_, id) = &order[edit.target % order.len()];
            // Deliberately skip settling so counts are stale
            tree = tree.set_name(id.as_str(), edit.name);
        }
        let once = recompute(&tree);
        prop_assert_eq!(recompute(&once), once.clone());
        prop_assert_eq!(settle(tree).tree, once);
    }

    #[test]
    fn prop_wire_round_trip(edits in prop::collection::vec(edit_strategy(), 0..30)) {
        let tree = edits.iter().fold(create_blank_tree(), |t, e| apply(&t, e));
        let back = Tree::from_node(tree.to_node()).unwrap();
        prop_assert_eq!(back, tree);
    }
}

#[test]
fn collapse_discards_subtree_and_regrowth_is_fresh() {
    let tree = create_blank_tree();
    let a = tree.root().children()[0].clone();
    let mut tree = settle(tree.set_name(a.as_str(), "Alice")).tree;
    let old_children: Vec<NodeId> = tree.children_of(a.as_str()).to_vec();
    for (i, child) in old_children.iter().enumerate() {
        tree = settle(tree.set_name(child.as_str(), &format!("Recruit {i}"))).tree;
    }
    assert_eq!(tree.get(a.as_str()).unwrap().qualified_children_count(), 3);

    let cleared = settle(tree.set_name(a.as_str(), "")).tree;
    assert!(cleared.children_of(a.as_str()).is_empty());

    let refilled = settle(cleared.set_name(a.as_str(), "Alice")).tree;
    let new_children = refilled.children_of(a.as_str());
    assert_eq!(new_children.len(), 3);
    for child in new_children {
        assert!(!old_children.contains(child));
        assert!(refilled.get(child.as_str()).unwrap().is_blank());
    }
    assert_eq!(refilled.get(a.as_str()).unwrap().qualified_children_count(), 0);
}
