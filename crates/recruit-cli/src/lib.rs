//! Recruit CLI - command-line editor for a recruit tree
//!
//! Trees are persisted as JSON under a data directory, one file per identity,
//! through the same [`recruit_sync::SyncController`] an interactive client
//! would use.

#![allow(missing_docs)]

pub mod commands;
pub mod identity;
pub mod render;

pub use commands::{execute, parse_path, CommandError, TreeCommand};
pub use identity::{LocalIdentityProvider, ANONYMOUS_ID_FILE};
pub use render::{render_tree, summary};
