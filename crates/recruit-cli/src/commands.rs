//! Tree editing commands

use clap::Subcommand;
use recruit_sync::{SyncController, SyncError};
use recruit_tree::{NodeId, NodePath, PathError, Tree};
use std::str::FromStr;

/// Command failure
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("no node at path {0}")]
    UnknownPath(NodePath),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum TreeCommand {
    /// Print the tree
    Show,
    /// Name the node at PATH (e.g. `0.1`; `you` is the root)
    Set { path: String, name: String },
    /// Empty the node at PATH, dropping its recruits
    Clear { path: String },
    /// Start over with a blank tree
    Reset,
}

impl TreeCommand {
    /// Whether the command changes the tree
    #[must_use]
    pub fn is_edit(&self) -> bool {
        !matches!(self, Self::Show)
    }
}

/// Parse a dotted path, accepting `you` for the root
///
/// # Errors
/// Returns [`CommandError::InvalidPath`] for malformed paths
pub fn parse_path(raw: &str) -> Result<NodePath, CommandError> {
    if raw.trim().eq_ignore_ascii_case("you") {
        return Ok(NodePath::root());
    }
    Ok(NodePath::from_str(raw)?)
}

fn resolve(tree: &Tree, raw: &str) -> Result<NodeId, CommandError> {
    let path = parse_path(raw)?;
    tree.node_at_path(&path)
        .ok_or(CommandError::UnknownPath(path))
}

/// Run one command and return the resulting tree
///
/// Edits are flushed before returning so a short-lived process does not exit
/// with a push still waiting on its debounce timer.
///
/// # Errors
/// Returns error if the path does not name a node or the controller refuses
/// the edit.
pub async fn execute(sync: &SyncController, command: &TreeCommand) -> Result<Tree, CommandError> {
    let tree = match command {
        TreeCommand::Show => return Ok(sync.tree()),
        TreeCommand::Set { path, name } => {
            let id = resolve(&sync.tree(), path)?;
            sync.set_name(id.as_str(), name)?
        }
        TreeCommand::Clear { path } => {
            let id = resolve(&sync.tree(), path)?;
            sync.set_name(id.as_str(), "")?
        }
        TreeCommand::Reset => sync.reset().await?,
    };
    sync.flush().await;
    Ok(tree)
}
