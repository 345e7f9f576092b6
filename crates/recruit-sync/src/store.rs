//! Remote document store port
//!
//! Documents are addressed by `(namespace, identity, name)`. A store must
//! deliver the current snapshot as soon as a subscription is opened, and
//! again after every write, including writes made through the same
//! controller. Those self-inflicted notifications are echoes; telling them
//! apart from genuine remote edits is the controller's job, not the store's.

use crate::error::StoreError;
use crate::identity::Identity;
use async_trait::async_trait;
use futures::Stream;
use recruit_tree::Document;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Default document name under a user's tree collection
pub const DEFAULT_DOCUMENT_NAME: &str = "myTree";

/// What a subscription delivers: the document, or `None` if it does not exist
pub type Snapshot = Option<Document>;

/// Storage key for one user's tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub namespace: String,
    pub identity: Identity,
    pub name: String,
}

impl DocumentKey {
    #[inline]
    #[must_use]
    pub fn new(namespace: impl Into<String>, identity: Identity) -> Self {
        Self {
            namespace: namespace.into(),
            identity,
            name: DEFAULT_DOCUMENT_NAME.to_string(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Slash-separated document path
    #[must_use]
    pub fn path(&self) -> String {
        format!(
            "artifacts/{}/users/{}/managerTrees/{}",
            self.namespace, self.identity, self.name
        )
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Live feed of snapshots for one key
///
/// Dropping the subscription unsubscribes; stores prune closed senders on
/// their next write.
#[derive(Debug)]
pub struct Subscription {
    key: DocumentKey,
    rx: mpsc::UnboundedReceiver<Snapshot>,
}

impl Subscription {
    #[inline]
    #[must_use]
    pub fn new(key: DocumentKey, rx: mpsc::UnboundedReceiver<Snapshot>) -> Self {
        Self { key, rx }
    }

    /// Key this subscription watches
    #[inline]
    #[must_use]
    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// Wait for the next snapshot; `None` once the store hangs up
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }
}

impl Stream for Subscription {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Durable key-value document store with change subscription
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read a document
    async fn get(&self, key: &DocumentKey) -> Result<Snapshot, StoreError>;

    /// Replace a document
    async fn put(&self, key: &DocumentKey, document: &Document) -> Result<(), StoreError>;

    /// Watch a document; the current snapshot is delivered first
    async fn subscribe(&self, key: &DocumentKey) -> Result<Subscription, StoreError>;
}
