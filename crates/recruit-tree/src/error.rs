//! Error types for tree conversion
//!
//! Tree mutation itself never fails. Errors only arise when a nested [`Node`]
//! read from outside (a stored document) does not describe a valid tree, or
//! when a textual [`NodePath`] cannot be parsed.
//!
//! [`Node`]: crate::Node
//! [`NodePath`]: crate::NodePath

/// Structural problems found while building a tree from a nested node
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Root does not carry the root id
    #[error("root id must be \"you\", got {0:?}")]
    InvalidRootId(String),

    /// Root must always have three children
    #[error("root must have 3 children, got {0}")]
    RootNotExpanded(usize),

    /// A node has a child count other than 0 or 3
    #[error("node {id} has {count} children (expected 0 or 3)")]
    InvalidChildCount { id: String, count: usize },

    /// Same id used twice
    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    /// Empty id
    #[error("node with empty id")]
    EmptyId,

    /// Node nested below the maximum depth
    #[error("node {id} sits at depth {depth}, below the maximum")]
    TooDeep { id: String, depth: usize },

    /// Named non-root node without children, or unnamed one with children
    #[error("node {id} is {state} but has {count} children")]
    ShapeMismatch {
        id: String,
        state: &'static str,
        count: usize,
    },
}

impl TreeError {
    pub(crate) fn shape_mismatch(id: &str, named: bool, count: usize) -> Self {
        Self::ShapeMismatch {
            id: id.to_string(),
            state: if named { "named" } else { "unnamed" },
            count,
        }
    }
}

/// Errors parsing a node path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment (e.g. `0..1`)
    #[error("empty path segment")]
    EmptySegment,

    /// Segment is not a child index
    #[error("invalid path segment: {0:?}")]
    InvalidSegment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_error_display() {
        let err = TreeError::InvalidChildCount {
            id: "n1".to_string(),
            count: 2,
        };
        assert_eq!(err.to_string(), "node n1 has 2 children (expected 0 or 3)");
    }

    #[test]
    fn shape_mismatch_display() {
        let err = TreeError::shape_mismatch("n2", true, 0);
        assert!(err.to_string().contains("named"));
    }
}
