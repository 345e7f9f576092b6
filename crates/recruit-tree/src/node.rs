//! Wire shape of a tree
//!
//! [`Node`] is the recursive structure persisted in the remote store, with the
//! field names `id`, `name`, `color`, `children` and `qualifiedChildrenCount`.
//! [`Document`] wraps it as `{ "treeData": ... }`.

use crate::color::Color;
use crate::id::NodeId;
use serde::{Deserialize, Serialize};

/// One node of the nested tree representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub color: Color,
    #[serde(default)]
    pub children: Vec<Node>,
    /// Older documents omit the counter entirely
    #[serde(default)]
    pub qualified_children_count: u8,
}

impl Node {
    /// Name is empty or whitespace only
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// Stored document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "treeData")]
    pub tree_data: Node,
}

impl Document {
    #[inline]
    #[must_use]
    pub fn new(tree_data: Node) -> Self {
        Self { tree_data }
    }
}
