//! Testing utilities for the recruit-tree workspace
//!
//! Shared test helpers, fixtures, and fakes.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use recruit_sync::{
    AuthError, DocumentKey, Identity, IdentityProvider, MemoryStore, RemoteStore, SessionPhase,
    StoreError, Subscription, SyncConfig, SyncController,
};
use recruit_tree::{
    create_blank_tree, settle, Document, NodePath, Tree, BRANCH_COLORS, ROOT_COLOR, ROOT_NAME,
};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};

/// Debounce window used by [`test_config`]
pub const TEST_DEBOUNCE: Duration = Duration::from_millis(500);

pub fn test_config() -> SyncConfig {
    SyncConfig::new()
        .with_namespace("test-app")
        .with_debounce(TEST_DEBOUNCE)
}

pub fn key_for(identity: &str) -> DocumentKey {
    test_config().key_for(&Identity::from(identity))
}

/// Id of the node at a dotted path such as `"0.2"`
///
/// # Panics
/// Panics if the path is malformed or names no node.
pub fn id_at(tree: &Tree, path: &str) -> String {
    let path = NodePath::from_str(path).unwrap();
    tree.node_at_path(&path).unwrap().as_str().to_string()
}

/// Name of the node at a dotted path
///
/// # Panics
/// Panics if the path is malformed or names no node.
pub fn name_at(tree: &Tree, path: &str) -> String {
    let id = id_at(tree, path);
    tree.get(&id).unwrap().name().to_string()
}

/// Apply `(path, name)` edits in order, settling after each
pub fn named_tree(edits: &[(&str, &str)]) -> Tree {
    edits.iter().fold(create_blank_tree(), |tree, (path, name)| {
        let id = id_at(&tree, path);
        settle(tree.set_name(&id, name)).tree
    })
}

pub fn document_of(tree: &Tree) -> Document {
    Document::new(tree.to_node())
}

/// A document whose first branch is fully recruited but whose stored
/// counters all read zero
pub fn stale_count_document() -> Document {
    let tree = named_tree(&[("0", "A"), ("0.0", "B"), ("0.1", "C"), ("0.2", "D")]);
    let mut root = tree.to_node();
    zero_counts(&mut root);
    Document::new(root)
}

fn zero_counts(node: &mut recruit_tree::Node) {
    node.qualified_children_count = 0;
    for child in &mut node.children {
        zero_counts(child);
    }
}

/// Assert `tree` has the blank shape: named root, three blank unexpanded
/// children in branch colors, no qualification
///
/// # Panics
/// Panics on the first difference.
pub fn assert_blank_shape(tree: &Tree) {
    assert_eq!(tree.len(), 4, "blank tree has root plus three children");
    let root = tree.root();
    assert_eq!(root.name(), ROOT_NAME);
    assert_eq!(root.color().as_str(), ROOT_COLOR);
    assert_eq!(root.qualified_children_count(), 0);
    assert_eq!(root.children().len(), BRANCH_COLORS.len());
    for (id, color) in root.children().iter().zip(BRANCH_COLORS) {
        let child = tree.get(id.as_str()).unwrap();
        assert!(child.is_blank(), "child {id} is named {:?}", child.name());
        assert!(!child.is_expanded(), "child {id} has children");
        assert_eq!(child.color().as_str(), color);
        assert_eq!(child.qualified_children_count(), 0);
    }
}

/// Decode the last document written to `key`
///
/// # Panics
/// Panics if nothing was written or the document is invalid.
pub fn last_tree(store: &MemoryStore, key: &DocumentKey) -> Tree {
    let document = store.last_write(key).unwrap();
    Tree::from_node(document.tree_data).unwrap()
}

/// Controller over `store` using [`test_config`]
pub fn controller(store: Arc<dyn RemoteStore>) -> SyncController {
    SyncController::new(test_config(), store)
}

/// Controller with a hydrated session for `identity`
///
/// # Panics
/// Panics if the session does not reach `Ready`.
pub async fn ready_controller(store: Arc<dyn RemoteStore>, identity: &str) -> SyncController {
    let sync = controller(store);
    sync.start_session(Identity::from(identity)).await;
    assert_eq!(sync.wait_until_settled().await, SessionPhase::Ready);
    settle_tasks().await;
    sync
}

/// Let spawned tasks run without moving the clock past any debounce window
pub async fn settle_tasks() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Identity provider driven by the test
#[derive(Debug)]
pub struct ScriptedIdentityProvider {
    primary: Mutex<Result<Identity, AuthError>>,
    anonymous: Mutex<Result<Identity, AuthError>>,
    changes: watch::Sender<Option<Identity>>,
    primary_attempts: AtomicUsize,
    anonymous_attempts: AtomicUsize,
}

impl ScriptedIdentityProvider {
    pub fn new(
        primary: Result<Identity, AuthError>,
        anonymous: Result<Identity, AuthError>,
    ) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            primary: Mutex::new(primary),
            anonymous: Mutex::new(anonymous),
            changes,
            primary_attempts: AtomicUsize::new(0),
            anonymous_attempts: AtomicUsize::new(0),
        }
    }

    /// Primary sign-in succeeds as `identity`
    pub fn signed_in(identity: &str) -> Self {
        Self::new(
            Ok(Identity::from(identity)),
            Err(AuthError::Unavailable("not scripted".into())),
        )
    }

    /// Every sign-in fails
    pub fn unavailable() -> Self {
        Self::new(
            Err(AuthError::Unavailable("offline".into())),
            Err(AuthError::Unavailable("offline".into())),
        )
    }

    /// Announce a sign-in
    pub fn sign_in(&self, identity: &str) {
        self.changes.send_replace(Some(Identity::from(identity)));
    }

    /// Announce a sign-out
    pub fn sign_out(&self) {
        self.changes.send_replace(None);
    }

    pub fn primary_attempts(&self) -> usize {
        self.primary_attempts.load(Ordering::SeqCst)
    }

    pub fn anonymous_attempts(&self) -> usize {
        self.anonymous_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentityProvider {
    async fn authenticate(&self) -> Result<Identity, AuthError> {
        self.primary_attempts.fetch_add(1, Ordering::SeqCst);
        let result = self.primary.lock().clone();
        if let Ok(identity) = &result {
            self.changes.send_replace(Some(identity.clone()));
        }
        result
    }

    async fn authenticate_anonymously(&self) -> Result<Identity, AuthError> {
        self.anonymous_attempts.fetch_add(1, Ordering::SeqCst);
        let result = self.anonymous.lock().clone();
        if let Ok(identity) = &result {
            self.changes.send_replace(Some(identity.clone()));
        }
        result
    }

    fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.changes.subscribe()
    }
}

/// [`MemoryStore`] wrapper whose writes and subscriptions can be made to fail
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    fail_puts: AtomicBool,
    fail_subscribe: AtomicBool,
    put_attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &Arc<MemoryStore> {
        &self.inner
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Writes attempted, including failed ones
    pub fn put_attempts(&self) -> usize {
        self.put_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for FlakyStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>, StoreError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &DocumentKey, document: &Document) -> Result<(), StoreError> {
        self.put_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::write(key, "injected failure"));
        }
        self.inner.put(key, document).await
    }

    async fn subscribe(&self, key: &DocumentKey) -> Result<Subscription, StoreError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(StoreError::subscribe(key, "injected failure"));
        }
        self.inner.subscribe(key).await
    }
}

/// [`MemoryStore`] wrapper that can hold writes until the test releases them
#[derive(Debug, Default)]
pub struct GatedStore {
    inner: Arc<MemoryStore>,
    holding: AtomicBool,
    gate: Notify,
    held: AtomicUsize,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &Arc<MemoryStore> {
        &self.inner
    }

    /// Make writes started from now on wait for [`GatedStore::release`]
    pub fn hold_puts(&self, hold: bool) {
        self.holding.store(hold, Ordering::SeqCst);
    }

    /// Let one held write through
    pub fn release(&self) {
        self.gate.notify_one();
    }

    /// Writes currently waiting at the gate
    pub fn held(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for GatedStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>, StoreError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &DocumentKey, document: &Document) -> Result<(), StoreError> {
        if self.holding.load(Ordering::SeqCst) {
            self.held.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.held.fetch_sub(1, Ordering::SeqCst);
        }
        self.inner.put(key, document).await
    }

    async fn subscribe(&self, key: &DocumentKey) -> Result<Subscription, StoreError> {
        self.inner.subscribe(key).await
    }
}
