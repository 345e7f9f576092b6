//! Error types for synchronization
//!
//! Provides error handling for:
//! - Identity provisioning failures
//! - Remote store read/write/subscribe failures
//! - Edits refused while a session is still loading
//! - Configuration loading
//!
//! None of these ever reach the tree model: every remote-facing failure is
//! absorbed by the controller, logged, and local editing carries on.

use crate::session::SessionPhase;

/// Identity provisioning failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No credential available for this sign-in method
    #[error("no credential available")]
    NoCredential,

    /// Provider could not be reached
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Remote store failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Write failed
    #[error("write failed for {key}: {message}")]
    Write { key: String, message: String },

    /// Subscription could not be established
    #[error("subscribe failed for {key}: {message}")]
    Subscribe { key: String, message: String },

    /// Stored document could not be decoded
    #[error("malformed document at {key}: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO error in a file-backed store
    #[error("io error at {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Create write error for key
    pub fn write(key: impl ToString, message: impl Into<String>) -> Self {
        Self::Write {
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// Create subscribe error for key
    pub fn subscribe(key: impl ToString, message: impl Into<String>) -> Self {
        Self::Subscribe {
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// Create IO error for key
    pub fn io(key: impl ToString, source: std::io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// Main synchronization error type
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Edit refused because the session is not accepting edits yet
    #[error("edits not accepted while {0}")]
    NotReady(SessionPhase),

    /// Illegal session phase transition
    #[error("illegal session transition: {from} -> {to}")]
    IllegalTransition { from: SessionPhase, to: SessionPhase },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_error_display() {
        let err = SyncError::NotReady(SessionPhase::Loading);
        assert_eq!(err.to_string(), "edits not accepted while loading");
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::write("artifacts/a/users/u/managerTrees/myTree", "offline");
        assert!(err.to_string().contains("write failed"));
        assert!(err.to_string().contains("offline"));
    }
}
