//! JSON file store
//!
//! Persists each document as pretty-printed JSON at
//! `<root>/<key path>.json`. Writes go to a temporary sibling first and are
//! renamed into place, so a reader never sees half a document. Subscriptions
//! only observe writes made through the same `JsonFileStore` value.

use crate::error::StoreError;
use crate::fanout::Fanout;
use crate::store::{DocumentKey, RemoteStore, Snapshot, Subscription};
use async_trait::async_trait;
use recruit_tree::Document;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File-backed [`RemoteStore`]
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
    fanout: Fanout,
}

impl JsonFileStore {
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fanout: Fanout::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `key` lives on disk
    #[must_use]
    pub fn file_for(&self, key: &DocumentKey) -> PathBuf {
        let mut path = self.root.clone();
        for segment in key.path().split('/') {
            path.push(segment);
        }
        path.set_extension("json");
        path
    }

    async fn read(&self, key: &DocumentKey) -> Result<Snapshot, StoreError> {
        let path = self.file_for(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(key, e)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                key: key.to_string(),
                source,
            })
    }
}

#[async_trait]
impl RemoteStore for JsonFileStore {
    async fn get(&self, key: &DocumentKey) -> Result<Snapshot, StoreError> {
        self.read(key).await
    }

    async fn put(&self, key: &DocumentKey, document: &Document) -> Result<(), StoreError> {
        let path = self.file_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(key, e))?;
        }

        let raw = serde_json::to_string_pretty(document).map_err(|source| {
            StoreError::Malformed {
                key: key.to_string(),
                source,
            }
        })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw.as_bytes())
            .await
            .map_err(|e| StoreError::io(key, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io(key, e))?;

        tracing::debug!(key = %key, path = %path.display(), "document written");
        self.fanout.publish(key, &Some(document.clone()));
        Ok(())
    }

    async fn subscribe(&self, key: &DocumentKey) -> Result<Subscription, StoreError> {
        let current = self.read(key).await?;
        Ok(self.fanout.subscribe(key, current))
    }
}
