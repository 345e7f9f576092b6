//! Plain-text rendering of a tree

use recruit_tree::{NodeId, Tree};
use std::fmt::Write;

const EMPTY_SLOT: &str = "(empty)";

/// One line per node, children indented under their parent
///
/// Filled nodes are marked `✓` when qualified and `○` otherwise; empty slots
/// are marked `·`. Expanded nodes show their recruit count.
#[must_use]
pub fn render_tree(tree: &Tree) -> String {
    let mut out = String::new();
    for (depth, id) in tree.preorder() {
        // Writing to a String cannot fail
        let _ = writeln!(out, "{}{}", "  ".repeat(depth), line_for(tree, &id));
    }
    out
}

fn line_for(tree: &Tree, id: &NodeId) -> String {
    let Some(record) = tree.get(id.as_str()) else {
        return String::new();
    };

    let marker = if record.is_blank() {
        "·"
    } else if tree.is_qualified(id.as_str()) {
        "✓"
    } else {
        "○"
    };
    let name = if record.is_blank() {
        EMPTY_SLOT
    } else {
        record.name()
    };
    let label = match tree.path_of(id.as_str()) {
        Some(path) if !path.is_root() => format!("[{path}] "),
        _ => String::new(),
    };

    let mut line = format!("{label}{marker} {name}");
    if record.is_expanded() {
        let _ = write!(line, "  Recruits: {}/3", record.qualified_children_count());
    }
    line
}

/// One-line summary for status output
#[must_use]
pub fn summary(tree: &Tree) -> String {
    format!(
        "{} of {} slots filled, {}/3 direct recruits qualified",
        tree.filled_count(),
        tree.len().saturating_sub(1),
        tree.root().qualified_children_count()
    )
}
