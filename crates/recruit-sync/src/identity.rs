//! Identity provisioning port
//!
//! The controller treats an [`Identity`] as an opaque stable string; it never
//! validates or interprets it beyond deriving the document key from it.

use crate::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

/// Opaque, stable user identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    #[inline]
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Supplies the session identity
///
/// Sign-in is two-tiered: [`authenticate`](Self::authenticate) tries the
/// primary credential, and the controller falls back to
/// [`authenticate_anonymously`](Self::authenticate_anonymously) if that
/// fails. Later sign-in/sign-out events arrive on
/// [`identity_changes`](Self::identity_changes).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with the primary credential
    async fn authenticate(&self) -> Result<Identity, AuthError>;

    /// Sign in without a credential
    async fn authenticate_anonymously(&self) -> Result<Identity, AuthError>;

    /// Current identity, updated on every sign-in and sign-out
    fn identity_changes(&self) -> watch::Receiver<Option<Identity>>;
}
