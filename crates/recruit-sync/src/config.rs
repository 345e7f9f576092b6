//! Synchronization configuration

use crate::error::SyncError;
use crate::identity::Identity;
use crate::store::{DocumentKey, DEFAULT_DOCUMENT_NAME};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Application namespace in the document path
    pub namespace: String,
    /// Document name under the user's tree collection
    pub document_name: String,
    /// Quiet period after the last edit before a push
    pub debounce_ms: u64,
    /// Pushed states remembered while waiting for their echo
    pub max_tracked_echoes: usize,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With namespace
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// With document name
    #[inline]
    #[must_use]
    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = name.into();
        self
    }

    /// With debounce window
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With echo tracking depth
    #[inline]
    #[must_use]
    pub fn with_max_tracked_echoes(mut self, depth: usize) -> Self {
        self.max_tracked_echoes = depth;
        self
    }

    /// Debounce window as a duration
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Storage key for an identity
    #[must_use]
    pub fn key_for(&self, identity: &Identity) -> DocumentKey {
        DocumentKey::new(self.namespace.clone(), identity.clone())
            .with_name(self.document_name.clone())
    }

    /// Parse a TOML document
    ///
    /// # Errors
    /// Returns [`SyncError::Config`] on invalid TOML or values
    pub fn from_toml_str(raw: &str) -> Result<Self, SyncError> {
        let config: Self = toml::from_str(raw).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    ///
    /// # Errors
    /// Returns [`SyncError::Config`] if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Check values are usable
    ///
    /// # Errors
    /// Returns [`SyncError::Config`] naming the offending field
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.namespace.trim().is_empty() {
            return Err(SyncError::Config("namespace must not be empty".into()));
        }
        if self.document_name.trim().is_empty() {
            return Err(SyncError::Config("document_name must not be empty".into()));
        }
        if self.max_tracked_echoes == 0 {
            return Err(SyncError::Config("max_tracked_echoes must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            namespace: "default-app-id".to_string(),
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
            debounce_ms: 500,
            max_tracked_echoes: 8,
        }
    }
}
