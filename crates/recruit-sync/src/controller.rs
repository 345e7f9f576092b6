//! Sync controller
//!
//! Owns the canonical tree for the signed-in identity and keeps it in step
//! with the remote store:
//!
//! - local edits are applied immediately, then pushed after a quiet period
//! - inbound snapshots are settled and adopted unless they are echoes of our
//!   own pushes or would clobber edits not yet pushed
//! - identity changes tear the old session down before the new one starts
//!
//! All state sits behind one `parking_lot` mutex that is never held across an
//! await. Pushes are serialized by a separate async lock, and every push
//! sends whatever the canonical tree is when it gets the lock, so the store
//! always ends on the latest local state.

use crate::config::SyncConfig;
use crate::echo::EchoTracker;
use crate::error::SyncError;
use crate::identity::{Identity, IdentityProvider};
use crate::session::{validate_transition, SessionContext, SessionPhase};
use crate::store::{DocumentKey, RemoteStore, Snapshot, Subscription};
use futures::StreamExt;
use parking_lot::Mutex;
use recruit_tree::{create_blank_tree, settle, Document, Tree};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Counters for what the controller has done since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Edits that changed the canonical tree
    pub local_edits: u64,
    /// Successful writes
    pub pushes: u64,
    /// Failed writes (never retried)
    pub push_failures: u64,
    /// Debounce timers restarted by a newer edit
    pub debounce_restarts: u64,
    /// Inbound snapshots recognised as our own writes
    pub echoes_suppressed: u64,
    /// Inbound snapshots adopted as the canonical tree
    pub remote_applied: u64,
    /// Inbound snapshots dropped (malformed, or unpushed local edits)
    pub remote_ignored: u64,
}

#[derive(Debug)]
struct State {
    canonical: Tree,
    phase: SessionPhase,
    session: Option<SessionContext>,
    last_epoch: u64,
    /// Bumped on every change to `canonical` that the store has not seen
    generation: u64,
    /// Generation most recently handed to a push
    pushed_generation: u64,
    echoes: EchoTracker,
    debounce: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
    stats: SyncStats,
}

impl State {
    fn has_unpushed_edits(&self) -> bool {
        self.generation > self.pushed_generation
    }

    fn epoch(&self) -> Option<u64> {
        self.session.as_ref().map(|session| session.epoch)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch() == Some(epoch)
    }

    fn cancel_debounce(&mut self) {
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
    }

    /// Stop all background work for the current session
    fn teardown(&mut self) {
        self.cancel_debounce();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.echoes.clear();
    }
}

struct Shared {
    config: SyncConfig,
    store: Arc<dyn RemoteStore>,
    state: Mutex<State>,
    push_lock: tokio::sync::Mutex<()>,
    phase_tx: watch::Sender<SessionPhase>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.state.get_mut().teardown();
    }
}

impl Shared {
    fn transition(&self, state: &mut State, to: SessionPhase) {
        if let Err(e) = validate_transition(state.phase, to) {
            tracing::warn!(error = %e, "phase transition refused");
            return;
        }
        tracing::debug!(from = %state.phase, to = %to, epoch = ?state.epoch(), "phase transition");
        state.phase = to;
        self.phase_tx.send_replace(to);
    }

    /// (Re)start the debounce timer for the current session
    fn schedule_push(self: &Arc<Self>, state: &mut State) {
        let Some(epoch) = state.epoch() else {
            return;
        };
        if let Some(timer) = state.debounce.take() {
            if !timer.is_finished() {
                state.stats.debounce_restarts += 1;
            }
            timer.abort();
        }

        let shared = Arc::downgrade(self);
        let window = self.config.debounce();
        state.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Detach the push so a later restart of this timer cannot cancel
            // a write already in flight
            tokio::spawn(async move {
                if let Some(shared) = shared.upgrade() {
                    shared.push_latest(epoch).await;
                }
            });
        }));
    }

    /// Push the canonical tree if the store has not seen it yet
    ///
    /// Returns whether a write succeeded.
    async fn push_latest(self: &Arc<Self>, epoch: u64) -> bool {
        let _in_flight = self.push_lock.lock().await;

        let (key, tree, generation, previous) = {
            let mut state = self.state.lock();
            if !state.is_current(epoch) {
                tracing::debug!(epoch, "dropping push for a finished session");
                return false;
            }
            if !state.phase.persists() || !state.has_unpushed_edits() {
                return false;
            }
            let Some(key) = state.session.as_ref().map(|session| session.key.clone()) else {
                return false;
            };
            let tree = state.canonical.clone();
            let previous = state.pushed_generation;
            state.pushed_generation = state.generation;
            // Recorded before the write: the echo may arrive before put returns
            state.echoes.record(tree.clone());
            (key, tree, state.generation, previous)
        };

        let document = Document::new(tree.to_node());
        match self.store.put(&key, &document).await {
            Ok(()) => {
                self.state.lock().stats.pushes += 1;
                tracing::debug!(key = %key, epoch, generation, "tree pushed");
                true
            }
            Err(e) => {
                let mut state = self.state.lock();
                state.stats.push_failures += 1;
                state.echoes.forget(&tree);
                // Release the claim so the edit stays unpushed for flush and
                // for the local-wins rule against inbound snapshots
                if state.is_current(epoch) && state.pushed_generation == generation {
                    state.pushed_generation = previous;
                }
                tracing::warn!(
                    key = %key,
                    epoch,
                    generation,
                    error = %e,
                    "push failed; local tree kept, will be sent with the next edit"
                );
                false
            }
        }
    }

    async fn apply_remote(self: &Arc<Self>, epoch: u64, snapshot: Snapshot) {
        let push_now = {
            let mut state = self.state.lock();
            if !state.is_current(epoch) {
                tracing::debug!(epoch, "dropping snapshot for a finished session");
                return;
            }
            if !matches!(state.phase, SessionPhase::Loading | SessionPhase::Ready) {
                return;
            }
            self.absorb(&mut state, snapshot)
        };

        if push_now {
            self.push_latest(epoch).await;
        }
    }

    /// Fold one inbound snapshot into the state
    ///
    /// Returns true when the result must be written back without waiting for
    /// the debounce window.
    fn absorb(self: &Arc<Self>, state: &mut State, snapshot: Snapshot) -> bool {
        let hydrating = state.phase == SessionPhase::Loading;

        let Some(document) = snapshot else {
            tracing::info!(epoch = ?state.epoch(), "no stored tree; writing a blank one");
            state.cancel_debounce();
            state.canonical = settle(create_blank_tree()).tree;
            state.generation += 1;
            if hydrating {
                self.transition(state, SessionPhase::Ready);
            }
            return true;
        };

        let incoming = match Tree::from_node(document.tree_data) {
            Ok(tree) => settle(tree),
            Err(e) => {
                tracing::warn!(epoch = ?state.epoch(), error = %e, "ignoring malformed snapshot");
                state.stats.remote_ignored += 1;
                if hydrating {
                    self.transition(state, SessionPhase::Ready);
                }
                return false;
            }
        };
        if !incoming.converged {
            tracing::warn!(passes = incoming.passes, "inbound tree did not settle");
        }

        if hydrating {
            self.transition(state, SessionPhase::Ready);
        } else {
            if state.echoes.observe(&incoming.tree) {
                state.stats.echoes_suppressed += 1;
                tracing::trace!(epoch = ?state.epoch(), "echo suppressed");
                return false;
            }
            if state.has_unpushed_edits() {
                state.stats.remote_ignored += 1;
                tracing::debug!(
                    epoch = ?state.epoch(),
                    "snapshot ignored; local edits pending"
                );
                return false;
            }
        }

        if incoming.tree != state.canonical {
            state.canonical = incoming.tree;
            state.stats.remote_applied += 1;
        }
        if incoming.changed {
            // Stored counts were stale; write the corrected tree back
            state.generation += 1;
            tracing::debug!(epoch = ?state.epoch(), "stored counts corrected");
            self.schedule_push(state);
        } else {
            state.cancel_debounce();
            state.pushed_generation = state.generation;
        }
        false
    }
}

async fn pump(shared: Weak<Shared>, epoch: u64, mut subscription: Subscription) {
    while let Some(snapshot) = subscription.next().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.apply_remote(epoch, snapshot).await;
    }
    tracing::debug!(epoch, key = %subscription.key(), "subscription closed");
}

/// Handle to the canonical tree and its persistence
///
/// Cheap to clone; all clones drive the same state. Must be used inside a
/// tokio runtime, since edits start background timers.
#[derive(Clone)]
pub struct SyncController {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for SyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("SyncController")
            .field("phase", &state.phase)
            .field("session", &state.session)
            .field("generation", &state.generation)
            .field("stats", &state.stats)
            .finish_non_exhaustive()
    }
}

impl SyncController {
    /// Create a controller in `Unauthenticated` holding a settled blank tree
    #[must_use]
    pub fn new(config: SyncConfig, store: Arc<dyn RemoteStore>) -> Self {
        let (phase_tx, _) = watch::channel(SessionPhase::Unauthenticated);
        let state = State {
            canonical: settle(create_blank_tree()).tree,
            phase: SessionPhase::Unauthenticated,
            session: None,
            last_epoch: 0,
            generation: 0,
            pushed_generation: 0,
            echoes: EchoTracker::new(config.max_tracked_echoes),
            debounce: None,
            pump: None,
            stats: SyncStats::default(),
        };
        Self {
            shared: Arc::new(Shared {
                config,
                store,
                state: Mutex::new(state),
                push_lock: tokio::sync::Mutex::new(()),
                phase_tx,
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.shared.config
    }

    /// Current canonical tree
    #[must_use]
    pub fn tree(&self) -> Tree {
        self.shared.state.lock().canonical.clone()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.shared.state.lock().phase
    }

    /// Watch phase changes
    #[must_use]
    pub fn phase_changes(&self) -> watch::Receiver<SessionPhase> {
        self.shared.phase_tx.subscribe()
    }

    /// Identity of the current session, if any
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.shared
            .state
            .lock()
            .session
            .as_ref()
            .map(|session| session.identity.clone())
    }

    /// Storage key of the current session, if any
    #[must_use]
    pub fn session_key(&self) -> Option<DocumentKey> {
        self.shared
            .state
            .lock()
            .session
            .as_ref()
            .map(|session| session.key.clone())
    }

    #[must_use]
    pub fn stats(&self) -> SyncStats {
        self.shared.state.lock().stats
    }

    /// Local changes exist that no push has picked up yet
    #[must_use]
    pub fn has_unpushed_edits(&self) -> bool {
        self.shared.state.lock().has_unpushed_edits()
    }

    /// Wait until the phase accepts edits (hydrated, degraded or signed out)
    pub async fn wait_until_settled(&self) -> SessionPhase {
        let mut phases = self.phase_changes();
        let settled = match phases.wait_for(|phase| phase.accepts_edits()).await {
            Ok(phase) => *phase,
            Err(_) => self.phase(),
        };
        settled
    }

    /// Rename a node and recompute qualification
    ///
    /// Unknown ids and unchanged names are no-ops. In `Ready` the result is
    /// pushed once edits have been quiet for the debounce window.
    ///
    /// # Errors
    /// Returns [`SyncError::NotReady`] while authenticating or loading.
    pub fn set_name(&self, node_id: &str, name: &str) -> Result<Tree, SyncError> {
        let mut state = self.shared.state.lock();
        if !state.phase.accepts_edits() {
            return Err(SyncError::NotReady(state.phase));
        }

        let settled = settle(state.canonical.set_name(node_id, name));
        if settled.tree == state.canonical {
            tracing::trace!(node = node_id, "edit changed nothing");
            return Ok(settled.tree);
        }

        state.canonical = settled.tree.clone();
        state.generation += 1;
        state.stats.local_edits += 1;
        tracing::debug!(
            node = node_id,
            generation = state.generation,
            filled = settled.tree.filled_count(),
            "tree edited"
        );
        if state.phase.persists() {
            self.shared.schedule_push(&mut state);
        }
        Ok(settled.tree)
    }

    /// Replace the tree with a blank one and push it immediately
    ///
    /// A pending debounced push is cancelled; the blank tree supersedes it.
    ///
    /// # Errors
    /// Returns [`SyncError::NotReady`] while authenticating or loading.
    pub async fn reset(&self) -> Result<Tree, SyncError> {
        let (tree, epoch) = {
            let mut state = self.shared.state.lock();
            if !state.phase.accepts_edits() {
                return Err(SyncError::NotReady(state.phase));
            }
            state.cancel_debounce();
            let blank = settle(create_blank_tree()).tree;
            state.canonical = blank.clone();
            state.generation += 1;
            state.stats.local_edits += 1;
            tracing::info!(epoch = ?state.epoch(), "tree reset");
            let epoch = state.phase.persists().then(|| state.epoch()).flatten();
            (blank, epoch)
        };

        if let Some(epoch) = epoch {
            self.shared.push_latest(epoch).await;
        }
        Ok(tree)
    }

    /// Push pending edits now instead of waiting for the debounce window
    ///
    /// Also waits for any push already in flight. Returns whether this call
    /// wrote anything.
    pub async fn flush(&self) -> bool {
        let epoch = {
            let mut state = self.shared.state.lock();
            if state.has_unpushed_edits() {
                state.cancel_debounce();
            }
            state.epoch()
        };
        match epoch {
            Some(epoch) => self.shared.push_latest(epoch).await,
            None => false,
        }
    }

    /// Feed an inbound snapshot for the current session
    ///
    /// The subscription opened by [`start_session`](Self::start_session)
    /// does this automatically.
    pub async fn apply_remote(&self, snapshot: Snapshot) {
        let epoch = self.shared.state.lock().epoch();
        if let Some(epoch) = epoch {
            self.shared.apply_remote(epoch, snapshot).await;
        }
    }

    /// Sign in, preferring the primary credential over an anonymous one
    ///
    /// Starts a session on success. If both sign-in methods fail the
    /// controller goes `Degraded` and keeps editing locally.
    pub async fn connect(&self, provider: &dyn IdentityProvider) -> Option<Identity> {
        {
            let mut state = self.shared.state.lock();
            state.teardown();
            state.session = None;
            self.shared.transition(&mut state, SessionPhase::Authenticating);
        }

        let identity = match provider.authenticate().await {
            Ok(identity) => Some(identity),
            Err(primary) => {
                tracing::warn!(error = %primary, "sign-in failed; trying anonymous sign-in");
                match provider.authenticate_anonymously().await {
                    Ok(identity) => Some(identity),
                    Err(e) => {
                        tracing::error!(error = %e, "anonymous sign-in failed; persistence disabled");
                        None
                    }
                }
            }
        };

        match identity {
            Some(identity) => {
                self.start_session(identity.clone()).await;
                Some(identity)
            }
            None => {
                let mut state = self.shared.state.lock();
                self.shared.transition(&mut state, SessionPhase::Degraded);
                None
            }
        }
    }

    /// Begin a session for `identity`, replacing any current one
    ///
    /// The old session's timer and subscription are torn down first, so no
    /// write for the old key is issued after this returns. The controller is
    /// `Loading` until the first snapshot arrives, or `Degraded` if the
    /// subscription cannot be opened.
    pub async fn start_session(&self, identity: Identity) {
        let key = self.shared.config.key_for(&identity);
        let epoch = {
            let mut state = self.shared.state.lock();
            state.teardown();
            state.last_epoch += 1;
            let epoch = state.last_epoch;
            state.session = Some(SessionContext::new(identity.clone(), key.clone(), epoch));
            // Hydration replaces the tree; nothing is owed to the new key
            state.pushed_generation = state.generation;
            self.shared.transition(&mut state, SessionPhase::Loading);
            epoch
        };
        tracing::info!(identity = %identity, key = %key, epoch, "session started");

        match self.shared.store.subscribe(&key).await {
            Ok(subscription) => {
                let task = tokio::spawn(pump(Arc::downgrade(&self.shared), epoch, subscription));
                let mut state = self.shared.state.lock();
                if state.is_current(epoch) {
                    state.pump = Some(task);
                } else {
                    task.abort();
                }
            }
            Err(e) => {
                tracing::warn!(key = %key, epoch, error = %e, "subscribe failed; continuing locally");
                let mut state = self.shared.state.lock();
                if state.is_current(epoch) {
                    self.shared.transition(&mut state, SessionPhase::Degraded);
                }
            }
        }
    }

    /// Drop the current session and return to `Unauthenticated`
    ///
    /// The canonical tree is kept for local editing.
    pub fn end_session(&self) {
        let mut state = self.shared.state.lock();
        state.teardown();
        if let Some(session) = state.session.take() {
            tracing::info!(identity = %session.identity, epoch = session.epoch, "session ended");
        }
        if state.phase != SessionPhase::Unauthenticated {
            self.shared.transition(&mut state, SessionPhase::Unauthenticated);
        }
    }

    /// Connect, then follow the provider's identity changes until it closes
    pub async fn run(&self, provider: &dyn IdentityProvider) {
        let mut changes = provider.identity_changes();
        changes.borrow_and_update();
        self.connect(provider).await;

        while changes.changed().await.is_ok() {
            let next = changes.borrow_and_update().clone();
            match next {
                Some(identity) if self.identity().as_ref() != Some(&identity) => {
                    self.start_session(identity).await;
                }
                Some(_) => {}
                None => self.end_session(),
            }
        }
        tracing::debug!("identity provider closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn controller(store: &Arc<MemoryStore>) -> SyncController {
        let config = SyncConfig::new().with_debounce(Duration::from_millis(100));
        SyncController::new(config, store.clone())
    }

    fn first_child(tree: &Tree) -> String {
        tree.root().children()[0].as_str().to_string()
    }

    #[tokio::test(start_paused = true)]
    async fn starts_unauthenticated_with_blank_tree() {
        let store = Arc::new(MemoryStore::new());
        let sync = controller(&store);
        assert_eq!(sync.phase(), SessionPhase::Unauthenticated);
        assert_eq!(sync.identity(), None);

        // Fresh ids every time, so compare shape
        let tree = sync.tree();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.root().name(), recruit_tree::ROOT_NAME);
        assert_eq!(tree.root().qualified_children_count(), 0);
        for id in tree.root().children() {
            let child = tree.get(id.as_str()).unwrap();
            assert!(child.is_blank());
            assert!(!child.is_expanded());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unauthenticated_edits_stay_local() {
        let store = Arc::new(MemoryStore::new());
        let sync = controller(&store);
        let id = first_child(&sync.tree());
        sync.set_name(&id, "Alice").unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.write_count(), 0);
        assert!(sync.tree().get(&id).unwrap().name() == "Alice");
    }

    #[tokio::test(start_paused = true)]
    async fn noop_edit_does_not_bump_generation() {
        let store = Arc::new(MemoryStore::new());
        let sync = controller(&store);
        sync.set_name("missing", "x").unwrap();
        assert_eq!(sync.stats().local_edits, 0);
        assert!(!sync.has_unpushed_edits());
    }

    #[tokio::test(start_paused = true)]
    async fn session_hydrates_and_writes_blank() {
        let store = Arc::new(MemoryStore::new());
        let sync = controller(&store);
        sync.start_session(Identity::from("u1")).await;
        assert_eq!(sync.wait_until_settled().await, SessionPhase::Ready);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let key = sync.session_key().unwrap();
        assert_eq!(store.write_count(), 1);
        let stored = Tree::from_node(store.last_write(&key).unwrap().tree_data).unwrap();
        assert_eq!(stored, sync.tree());
    }

    #[tokio::test(start_paused = true)]
    async fn edit_refused_while_loading() {
        let store = Arc::new(MemoryStore::new());
        let sync = controller(&store);
        {
            let mut state = sync.shared.state.lock();
            sync.shared.transition(&mut state, SessionPhase::Loading);
        }
        let err = sync.set_name("you", "x").unwrap_err();
        assert!(matches!(err, SyncError::NotReady(SessionPhase::Loading)));
        assert!(matches!(sync.reset().await, Err(SyncError::NotReady(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn end_session_returns_to_unauthenticated() {
        let store = Arc::new(MemoryStore::new());
        let sync = controller(&store);
        sync.start_session(Identity::from("u1")).await;
        sync.wait_until_settled().await;
        sync.end_session();
        assert_eq!(sync.phase(), SessionPhase::Unauthenticated);
        assert_eq!(sync.identity(), None);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.subscriber_count(&SyncConfig::new().key_for(&Identity::from("u1"))), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_pushes_pending_edit() {
        let store = Arc::new(MemoryStore::new());
        let sync = controller(&store);
        sync.start_session(Identity::from("u1")).await;
        sync.wait_until_settled().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        let before = store.write_count();

        let id = first_child(&sync.tree());
        sync.set_name(&id, "Bob").unwrap();
        assert!(sync.has_unpushed_edits());
        assert!(sync.flush().await);
        assert_eq!(store.write_count(), before + 1);
        assert!(!sync.flush().await);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.write_count(), before + 1);
    }
}
