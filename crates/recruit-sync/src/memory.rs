//! In-memory remote store
//!
//! Keeps every document as serialized JSON so that what a subscriber gets back
//! has made the same round trip it would through a real document store.
//! Also records every write, which tests use to count pushes.

use crate::error::StoreError;
use crate::fanout::Fanout;
use crate::store::{DocumentKey, RemoteStore, Snapshot, Subscription};
use async_trait::async_trait;
use dashmap::DashMap;
use recruit_tree::Document;
use std::sync::atomic::{AtomicUsize, Ordering};

/// `DashMap`-backed [`RemoteStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<DocumentKey, String>,
    history: DashMap<DocumentKey, Vec<Document>>,
    fanout: Fanout,
    write_count: AtomicUsize,
}

impl MemoryStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document without counting it as a write or notifying anyone
    ///
    /// # Errors
    /// Returns error if the document cannot be serialized
    pub fn seed(&self, key: &DocumentKey, document: &Document) -> Result<(), StoreError> {
        let raw = encode(key, document)?;
        self.documents.insert(key.clone(), raw);
        Ok(())
    }

    /// Total writes across all keys
    #[inline]
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Every document written to `key`, oldest first
    #[must_use]
    pub fn writes(&self, key: &DocumentKey) -> Vec<Document> {
        self.history
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Last document written to `key`
    #[must_use]
    pub fn last_write(&self, key: &DocumentKey) -> Option<Document> {
        self.history.get(key).and_then(|entry| entry.last().cloned())
    }

    /// Live subscriptions on `key`
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self, key: &DocumentKey) -> usize {
        self.fanout.count(key)
    }

    fn read(&self, key: &DocumentKey) -> Result<Snapshot, StoreError> {
        match self.documents.get(key) {
            Some(raw) => decode(key, raw.value()).map(Some),
            None => Ok(None),
        }
    }
}

fn encode(key: &DocumentKey, document: &Document) -> Result<String, StoreError> {
    serde_json::to_string(document).map_err(|source| StoreError::Malformed {
        key: key.to_string(),
        source,
    })
}

fn decode(key: &DocumentKey, raw: &str) -> Result<Document, StoreError> {
    serde_json::from_str(raw).map_err(|source| StoreError::Malformed {
        key: key.to_string(),
        source,
    })
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, key: &DocumentKey) -> Result<Snapshot, StoreError> {
        self.read(key)
    }

    async fn put(&self, key: &DocumentKey, document: &Document) -> Result<(), StoreError> {
        let raw = encode(key, document)?;
        let stored = decode(key, &raw)?;
        self.documents.insert(key.clone(), raw);
        self.history
            .entry(key.clone())
            .or_default()
            .push(stored.clone());
        self.write_count.fetch_add(1, Ordering::SeqCst);
        self.fanout.publish(key, &Some(stored));
        Ok(())
    }

    async fn subscribe(&self, key: &DocumentKey) -> Result<Subscription, StoreError> {
        let current = self.read(key)?;
        Ok(self.fanout.subscribe(key, current))
    }
}
