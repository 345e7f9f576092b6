//! Echo tracking
//!
//! Every push is observed again through the controller's own subscription.
//! The tracker remembers pushed trees until their echo comes back so those
//! notifications can be told apart from edits made elsewhere. Comparison is by
//! value after the snapshot has been settled, never by reference.

use recruit_tree::Tree;
use std::collections::VecDeque;

/// Bounded FIFO of pushed trees awaiting their echo
#[derive(Debug, Clone)]
pub struct EchoTracker {
    pending: VecDeque<Tree>,
    capacity: usize,
}

impl EchoTracker {
    /// Create a tracker remembering at most `capacity` pushes
    #[inline]
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pending: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a tree about to be pushed
    ///
    /// Must be called before the write is issued: a store may notify
    /// subscribers before the write call returns.
    pub fn record(&mut self, tree: Tree) {
        if self.pending.len() == self.capacity {
            self.pending.pop_front();
        }
        self.pending.push_back(tree);
    }

    /// Check an inbound tree against pending pushes
    ///
    /// On a match, that entry and every older one are dropped (the store
    /// delivers in write order, so older echoes will not arrive any more).
    pub fn observe(&mut self, tree: &Tree) -> bool {
        match self.pending.iter().position(|pushed| pushed == tree) {
            Some(pos) => {
                self.pending.drain(..=pos);
                true
            }
            None => false,
        }
    }

    /// Drop the newest entry equal to `tree` (its write failed)
    pub fn forget(&mut self, tree: &Tree) {
        if let Some(pos) = self.pending.iter().rposition(|pushed| pushed == tree) {
            self.pending.remove(pos);
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recruit_tree::{create_blank_tree, settle};

    fn edited(tree: &Tree, name: &str) -> Tree {
        let first = tree.root().children()[0].clone();
        settle(tree.set_name(first.as_str(), name)).tree
    }

    #[test]
    fn matching_echo_is_consumed() {
        let base = create_blank_tree();
        let mut tracker = EchoTracker::new(4);
        tracker.record(base.clone());
        assert!(tracker.observe(&base));
        assert!(tracker.is_empty());
        assert!(!tracker.observe(&base));
    }

    #[test]
    fn compares_by_value() {
        let base = create_blank_tree();
        let mut tracker = EchoTracker::new(4);
        tracker.record(base.clone());
        let round_tripped = Tree::from_node(base.to_node()).unwrap();
        assert!(tracker.observe(&round_tripped));
    }

    #[test]
    fn later_echo_drops_older_entries() {
        let base = create_blank_tree();
        let a = edited(&base, "A");
        let b = edited(&base, "B");
        let mut tracker = EchoTracker::new(4);
        tracker.record(a.clone());
        tracker.record(b.clone());
        assert!(tracker.observe(&b));
        assert!(!tracker.observe(&a));
    }

    #[test]
    fn older_echo_keeps_newer_entries() {
        let base = create_blank_tree();
        let a = edited(&base, "A");
        let b = edited(&base, "B");
        let mut tracker = EchoTracker::new(4);
        tracker.record(a.clone());
        tracker.record(b.clone());
        assert!(tracker.observe(&a));
        assert_eq!(tracker.len(), 1);
        assert!(tracker.observe(&b));
    }

    #[test]
    fn capacity_evicts_oldest() {
        let base = create_blank_tree();
        let a = edited(&base, "A");
        let b = edited(&base, "B");
        let mut tracker = EchoTracker::new(1);
        tracker.record(a.clone());
        tracker.record(b.clone());
        assert!(!tracker.observe(&a));
        assert!(tracker.observe(&b));
    }

    #[test]
    fn forget_removes_failed_push() {
        let base = create_blank_tree();
        let mut tracker = EchoTracker::new(2);
        tracker.record(base.clone());
        tracker.forget(&base);
        assert!(!tracker.observe(&base));
    }
}
