//! Recruit Tree Model
//!
//! Pure data structure and mutation operations for a ternary recruitment
//! tree, plus the bottom-up qualification pass. No I/O, no async, no errors
//! on the mutation path.
//!
//! # Core Concepts
//!
//! - [`Tree`]: arena of [`NodeRecord`]s keyed by [`NodeId`]
//! - [`Tree::set_name`]: the only edit; grows or prunes children
//! - [`create_blank_tree`]: root plus three empty slots, fresh ids
//! - [`qualification::settle`]: recompute derived counts to a fixed point
//! - [`Node`] / [`Document`]: nested wire shape for persistence
//!
//! # Example
//!
//! ```rust
//! use recruit_tree::{create_blank_tree, settle};
//!
//! let tree = create_blank_tree();
//! let first = tree.root().children()[0].clone();
//!
//! let settled = settle(tree.set_name(first.as_str(), "Alice"));
//! assert!(settled.changed);
//! assert_eq!(settled.tree.root().qualified_children_count(), 1);
//! assert_eq!(settled.tree.children_of(first.as_str()).len(), 3);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod color;
mod error;
mod id;
mod node;
mod path;
mod tree;

pub mod qualification;

// Re-exports
pub use color::{Color, BRANCH_COLORS, ROOT_COLOR};
pub use error::{PathError, TreeError};
pub use id::{NodeId, ROOT_ID};
pub use node::{Document, Node};
pub use path::NodePath;
pub use qualification::{recompute, settle, Settled};
pub use tree::{create_blank_tree, is_blank, NodeRecord, Tree, FAN_OUT, MAX_DEPTH, ROOT_NAME};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
