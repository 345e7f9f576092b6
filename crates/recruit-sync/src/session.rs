//! Session state machine and context
//!
//! ```text
//! Unauthenticated -> Authenticating -> Loading -> Ready
//!                          |              |
//!                          +--> Degraded <+
//! ```
//!
//! `Ready` is the only phase in which edits are both accepted and persisted.
//! `Degraded` (identity or subscription could not be established) and
//! `Unauthenticated` accept edits locally but never write them anywhere.

use crate::error::SyncError;
use crate::identity::Identity;
use crate::store::DocumentKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of the controller's current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No identity
    Unauthenticated,
    /// Waiting on the identity provider
    Authenticating,
    /// Subscribed, waiting for the first snapshot
    Loading,
    /// Subscribed and hydrated
    Ready,
    /// Gave up on persistence; local-only editing
    Degraded,
}

impl SessionPhase {
    /// Edits are applied to the canonical tree
    #[inline]
    #[must_use]
    pub fn accepts_edits(self) -> bool {
        !matches!(self, Self::Authenticating | Self::Loading)
    }

    /// Accepted edits are pushed to the store
    #[inline]
    #[must_use]
    pub fn persists(self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Degraded => "degraded",
        };
        f.write_str(name)
    }
}

/// Phases reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: SessionPhase) -> Vec<SessionPhase> {
    use SessionPhase::*;
    match from {
        Unauthenticated => vec![Authenticating, Loading],
        Authenticating => vec![Loading, Degraded, Unauthenticated],
        Loading => vec![Loading, Ready, Degraded, Unauthenticated],
        Ready => vec![Authenticating, Loading, Unauthenticated],
        Degraded => vec![Authenticating, Loading, Unauthenticated],
    }
}

/// Validates a phase transition
///
/// # Errors
/// Returns [`SyncError::IllegalTransition`] if `to` is not reachable from
/// `from`.
pub fn validate_transition(from: SessionPhase, to: SessionPhase) -> Result<(), SyncError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(SyncError::IllegalTransition { from, to })
    }
}

/// Everything tied to one signed-in identity
///
/// Replaced wholesale on identity change. The epoch increases with every new
/// session so background work started for an older session can recognise
/// itself as stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub identity: Identity,
    pub key: DocumentKey,
    pub epoch: u64,
}

impl SessionContext {
    #[inline]
    #[must_use]
    pub fn new(identity: Identity, key: DocumentKey, epoch: u64) -> Self {
        Self {
            identity,
            key,
            epoch,
        }
    }
}
