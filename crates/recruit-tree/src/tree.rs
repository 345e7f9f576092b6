//! Recruitment tree arena
//!
//! A [`Tree`] is a persistent map from [`NodeId`] to [`NodeRecord`]. Each
//! record lists its children by id; parent links are never stored. Because the
//! map is structurally shared (`im::HashMap`), cloning a tree is cheap and
//! every mutation returns a new tree while the old one stays valid for
//! comparison.
//!
//! # Invariants
//! - The root (`"you"`) is always present with exactly three children
//! - Every other node has zero or three children, three exactly when its
//!   name is non-blank
//! - Ids are unique and every id reachable from the root is in the arena;
//!   nothing unreachable is

use crate::color::{Color, BRANCH_COLORS, ROOT_COLOR};
use crate::error::TreeError;
use crate::id::{NodeId, ROOT_ID};
use crate::node::Node;
use crate::path::NodePath;
use im::HashMap;

/// Children per expanded node
pub const FAN_OUT: usize = 3;

/// Display name of the root in a blank tree
pub const ROOT_NAME: &str = "You";

/// Deepest level a node may sit at below the root
///
/// Leaves at this depth cannot be named. The nested document form must stay
/// well inside the JSON decoder's recursion limit.
pub const MAX_DEPTH: usize = 48;

/// Name is empty or whitespace only
#[inline]
#[must_use]
pub fn is_blank(name: &str) -> bool {
    name.trim().is_empty()
}

/// One node's data inside the arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    name: String,
    color: Color,
    children: Vec<NodeId>,
    qualified_children_count: u8,
}

impl NodeRecord {
    fn leaf(color: Color) -> Self {
        Self {
            name: String::new(),
            color,
            children: Vec::new(),
            qualified_children_count: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn color(&self) -> &Color {
        &self.color
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn qualified_children_count(&self) -> u8 {
        self.qualified_children_count
    }

    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        is_blank(&self.name)
    }

    /// Has its three children
    #[inline]
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }
}

/// The recruitment tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    nodes: HashMap<NodeId, NodeRecord>,
}

/// Build the canonical blank tree: root plus three empty, differently colored
/// children. Every call mints fresh ids.
#[must_use]
pub fn create_blank_tree() -> Tree {
    let mut nodes = HashMap::new();
    let children: Vec<NodeId> = BRANCH_COLORS
        .iter()
        .map(|color| {
            let id = NodeId::fresh();
            nodes.insert(id.clone(), NodeRecord::leaf(Color::from(*color)));
            id
        })
        .collect();

    nodes.insert(
        NodeId::root(),
        NodeRecord {
            name: ROOT_NAME.to_string(),
            color: Color::from(ROOT_COLOR),
            children,
            qualified_children_count: 0,
        },
    );

    Tree { nodes }
}

impl Tree {
    /// Set a node's name, growing or pruning its children as needed
    ///
    /// Returns a new tree; `self` is left untouched. A non-root node whose
    /// name goes from blank to non-blank gets three fresh empty children one
    /// shade lighter than itself. A non-root node whose name becomes blank
    /// loses its entire subtree. The root only ever has its name replaced.
    /// An unknown `node_id` yields a tree equal to `self`, and so does naming
    /// a blank leaf at [`MAX_DEPTH`].
    ///
    /// Qualification counts are not touched; run
    /// [`settle`](crate::qualification::settle) afterwards.
    #[must_use]
    pub fn set_name(&self, node_id: &str, new_name: &str) -> Tree {
        let Some(current) = self.nodes.get(node_id) else {
            return self.clone();
        };

        let id = NodeId::from_raw(node_id);
        let grows = !id.is_root() && current.is_blank() && !is_blank(new_name);
        if grows && self.depth_of(node_id).is_some_and(|depth| depth >= MAX_DEPTH) {
            return self.clone();
        }

        let mut next = self.clone();
        let mut updated = current.clone();
        updated.name = new_name.to_string();

        if !id.is_root() {
            if is_blank(new_name) {
                for child in std::mem::take(&mut updated.children) {
                    next.remove_subtree(&child);
                }
            } else if current.is_blank() && updated.children.is_empty() {
                let shade = updated.color.lighten();
                updated.children = (0..FAN_OUT)
                    .map(|_| {
                        let child = NodeId::fresh();
                        next.nodes.insert(child.clone(), NodeRecord::leaf(shade.clone()));
                        child
                    })
                    .collect();
            }
        }

        next.nodes.insert(id, updated);
        next
    }

    fn remove_subtree(&mut self, id: &NodeId) {
        let mut stack = vec![id.clone()];
        while let Some(next) = stack.pop() {
            if let Some(record) = self.nodes.remove(&next) {
                stack.extend(record.children);
            }
        }
    }

    /// Overwrite a node's qualification counter. Returns whether it changed.
    pub(crate) fn set_qualified_count(&mut self, id: &NodeId, count: u8) -> bool {
        match self.nodes.get_mut(id) {
            Some(record) if record.qualified_children_count != count => {
                record.qualified_children_count = count;
                true
            }
            _ => false,
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &NodeRecord {
        &self.nodes[ROOT_ID]
    }

    /// Children of `id`, empty for leaves and unknown ids
    #[must_use]
    pub fn children_of(&self, id: &str) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], NodeRecord::children)
    }

    /// Number of nodes, root included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree has at least its root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Non-root nodes with a non-blank name
    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|(id, record)| !id.is_root() && !record.is_blank())
            .count()
    }

    /// Display qualification: named, and either a leaf or with all three
    /// children filled
    #[must_use]
    pub fn is_qualified(&self, id: &str) -> bool {
        match self.nodes.get(id) {
            None => false,
            Some(record) if record.is_blank() => false,
            Some(record) if record.is_expanded() => {
                usize::from(record.qualified_children_count) == FAN_OUT
            }
            Some(_) => true,
        }
    }

    /// Ids with their depth, parents before children, siblings in order
    #[must_use]
    pub fn preorder(&self) -> Vec<(usize, NodeId)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(0, NodeId::root())];
        while let Some((depth, id)) = stack.pop() {
            for child in self.children_of(id.as_str()).iter().rev() {
                stack.push((depth + 1, child.clone()));
            }
            out.push((depth, id));
        }
        out
    }

    /// Ids with children before parents
    #[must_use]
    pub fn postorder(&self) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self.preorder().into_iter().map(|(_, id)| id).collect();
        // Reversed pre-order visits every child before its parent.
        out.reverse();
        out
    }

    /// Depth of a node below the root
    #[must_use]
    pub fn depth_of(&self, id: &str) -> Option<usize> {
        self.path_of(id).map(|path| path.len())
    }

    /// Resolve an index path to a node id
    #[must_use]
    pub fn node_at_path(&self, path: &NodePath) -> Option<NodeId> {
        let mut current = NodeId::root();
        for index in path.iter() {
            current = self.children_of(current.as_str()).get(index)?.clone();
        }
        Some(current)
    }

    /// Index path of a node, found by traversal
    #[must_use]
    pub fn path_of(&self, id: &str) -> Option<NodePath> {
        if !self.nodes.contains_key(id) {
            return None;
        }
        let mut stack = vec![(NodeId::root(), NodePath::root())];
        while let Some((current, path)) = stack.pop() {
            if current.as_str() == id {
                return Some(path);
            }
            for (index, child) in self.children_of(current.as_str()).iter().enumerate() {
                stack.push((child.clone(), path.child(index)));
            }
        }
        None
    }

    /// Nested wire representation
    #[must_use]
    pub fn to_node(&self) -> Node {
        self.node_for(&NodeId::root())
    }

    fn node_for(&self, id: &NodeId) -> Node {
        let record = &self.nodes[id];
        Node {
            id: id.clone(),
            name: record.name.clone(),
            color: record.color.clone(),
            children: record.children.iter().map(|c| self.node_for(c)).collect(),
            qualified_children_count: record.qualified_children_count,
        }
    }

    /// Build a tree from its nested representation, checking every invariant
    ///
    /// # Errors
    /// Returns the first structural problem found (see [`TreeError`]).
    pub fn from_node(root: Node) -> Result<Self, TreeError> {
        if !root.id.is_root() {
            return Err(TreeError::InvalidRootId(root.id.to_string()));
        }
        if root.children.len() != FAN_OUT {
            return Err(TreeError::RootNotExpanded(root.children.len()));
        }

        let mut nodes = HashMap::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if depth > MAX_DEPTH {
                return Err(TreeError::TooDeep {
                    id: node.id.to_string(),
                    depth,
                });
            }
            if node.id.as_str().is_empty() {
                return Err(TreeError::EmptyId);
            }
            if nodes.contains_key(&node.id) {
                return Err(TreeError::DuplicateId(node.id.to_string()));
            }

            let count = node.children.len();
            if count != 0 && count != FAN_OUT {
                return Err(TreeError::InvalidChildCount {
                    id: node.id.to_string(),
                    count,
                });
            }
            let named = !node.is_blank();
            if !node.id.is_root() && named != (count == FAN_OUT) {
                return Err(TreeError::shape_mismatch(node.id.as_str(), named, count));
            }

            let children = node.children.iter().map(|c| c.id.clone()).collect();
            nodes.insert(
                node.id,
                NodeRecord {
                    name: node.name,
                    color: node.color,
                    children,
                    qualified_children_count: node.qualified_children_count,
                },
            );
            stack.extend(node.children.into_iter().map(|child| (child, depth + 1)));
        }

        Ok(Self { nodes })
    }
}

impl Default for Tree {
    fn default() -> Self {
        create_blank_tree()
    }
}

impl TryFrom<Node> for Tree {
    type Error = TreeError;

    fn try_from(node: Node) -> Result<Self, Self::Error> {
        Self::from_node(node)
    }
}

impl From<&Tree> for Node {
    fn from(tree: &Tree) -> Self {
        tree.to_node()
    }
}
