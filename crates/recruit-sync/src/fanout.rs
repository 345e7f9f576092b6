//! Per-key subscriber lists shared by the bundled stores

use crate::store::{DocumentKey, Snapshot, Subscription};
use dashmap::DashMap;
use tokio::sync::mpsc;

#[derive(Debug, Default)]
pub(crate) struct Fanout {
    subscribers: DashMap<DocumentKey, Vec<mpsc::UnboundedSender<Snapshot>>>,
}

impl Fanout {
    /// Register a subscriber and hand it `current` before anything else.
    ///
    /// The entry stays locked while `current` is sent, so a concurrent
    /// [`publish`](Self::publish) is delivered after it, never before.
    pub(crate) fn subscribe(&self, key: &DocumentKey, current: Snapshot) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut entry = self.subscribers.entry(key.clone()).or_default();
        // Receiver is alive, send cannot fail
        let _ = tx.send(current);
        entry.push(tx);
        Subscription::new(key.clone(), rx)
    }

    /// Deliver a snapshot to every live subscriber of `key`
    pub(crate) fn publish(&self, key: &DocumentKey, snapshot: &Snapshot) {
        if let Some(mut senders) = self.subscribers.get_mut(key) {
            senders.retain(|tx| tx.send(snapshot.clone()).is_ok());
        }
    }

    /// Live subscribers of `key`
    pub(crate) fn count(&self, key: &DocumentKey) -> usize {
        self.subscribers.get(key).map_or(0, |senders| {
            senders.iter().filter(|tx| !tx.is_closed()).count()
        })
    }
}
