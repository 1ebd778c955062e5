//! # Per-owner auto-detach set.
//!
//! Some code wants subscriptions tied to the disposal of an arbitrary object
//! (a view model, a connection) rather than to a [`LifecycleOwner`](crate::LifecycleOwner).
//! That object holds an [`AutoDetachSet`] and the set detaches everything it
//! holds when cleared or dropped.
//!
//! ## Rules
//! - The set is owned by the object; there is no global owner → set map.
//! - Entries are keyed by [`Detach::id`]; adding the same id twice is a no-op.
//! - `clear_all` detaches in the order entries were added.
//! - `clear_all` removes entries first, then detaches them with no lock held,
//!   so a detach that re-enters the set cannot deadlock.
//! - Dropping the set runs `clear_all`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

/// Something that can be detached from the live data it observes.
pub trait Detach: Send + Sync + 'static {
    /// Process-unique identity of this subscription.
    fn id(&self) -> u64;

    /// Detaches the subscription. Must be idempotent.
    fn detach(&self);
}

#[derive(Default)]
struct Entries {
    next_seq: u64,
    by_seq: BTreeMap<u64, Arc<dyn Detach>>,
    seq_of: HashMap<u64, u64>,
}

/// Explicit collection of subscriptions owned by one object.
#[derive(Default)]
pub struct AutoDetachSet {
    entries: Mutex<Entries>,
}

impl AutoDetachSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscription. Returns `false` if it was already present.
    pub fn add(&self, subscription: Arc<dyn Detach>) -> bool {
        let mut entries = self.entries.lock();
        let id = subscription.id();
        if entries.seq_of.contains_key(&id) {
            return false;
        }
        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.seq_of.insert(id, seq);
        entries.by_seq.insert(seq, subscription);
        true
    }

    /// Removes a subscription **without** detaching it.
    pub fn remove(&self, subscription: &dyn Detach) -> bool {
        let mut entries = self.entries.lock();
        match entries.seq_of.remove(&subscription.id()) {
            Some(seq) => entries.by_seq.remove(&seq).is_some(),
            None => false,
        }
    }

    /// Returns true if the subscription is held by this set.
    pub fn contains(&self, subscription: &dyn Detach) -> bool {
        self.entries.lock().seq_of.contains_key(&subscription.id())
    }

    /// Number of held subscriptions.
    pub fn len(&self) -> usize {
        self.entries.lock().by_seq.len()
    }

    /// Returns true if the set holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().by_seq.is_empty()
    }

    /// Removes and detaches every held subscription, in insertion order.
    ///
    /// Returns how many were detached.
    pub fn clear_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.entries.lock()).by_seq;
        let count = drained.len();
        for subscription in drained.into_values() {
            subscription.detach();
        }
        count
    }
}

impl Drop for AutoDetachSet {
    fn drop(&mut self) {
        self.clear_all();
    }
}

impl std::fmt::Debug for AutoDetachSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoDetachSet")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counted {
        id: u64,
        detached: Arc<AtomicUsize>,
        order: Option<Arc<Mutex<Vec<u64>>>>,
    }

    impl Detach for Counted {
        fn id(&self) -> u64 {
            self.id
        }
        fn detach(&self) {
            self.detached.fetch_add(1, Ordering::SeqCst);
            if let Some(order) = &self.order {
                order.lock().push(self.id);
            }
        }
    }

    fn counted(id: u64, counter: &Arc<AtomicUsize>) -> Arc<Counted> {
        Arc::new(Counted {
            id,
            detached: Arc::clone(counter),
            order: None,
        })
    }

    #[test]
    fn test_add_contains_remove() {
        let set = AutoDetachSet::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let p = counted(1, &counter);

        assert!(set.add(p.clone()));
        assert!(!set.add(p.clone()));
        assert!(set.contains(&*p));
        assert_eq!(set.len(), 1);

        assert!(set.remove(&*p));
        assert!(!set.contains(&*p));
        assert!(set.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 0, "remove must not detach");
    }

    #[test]
    fn test_clear_all_detaches_everything() {
        let set = AutoDetachSet::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for id in 0..3 {
            set.add(counted(id, &counter));
        }
        assert_eq!(set.clear_all(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(set.is_empty());
        assert_eq!(set.clear_all(), 0);
    }

    #[test]
    fn test_drop_detaches() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let set = AutoDetachSet::new();
            set.add(counted(7, &counter));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_all_follows_insertion_order() {
        let set = AutoDetachSet::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));
        for id in [5, 1, 3] {
            set.add(Arc::new(Counted {
                id,
                detached: Arc::clone(&counter),
                order: Some(Arc::clone(&order)),
            }));
        }
        assert_eq!(set.clear_all(), 3);
        assert_eq!(*order.lock(), vec![5, 1, 3]);
    }
}
