//! # Subscriber registry - insertion-ordered, mutation-tolerant map.
//!
//! Maps observer identity to its [`SubscriberWrapper`], preserving attach
//! order for deterministic fan-out.
//!
//! ## Architecture
//! ```text
//! by_key:  observer identity ──► seq
//! by_seq:  seq (monotonic)   ──► Arc<SubscriberWrapper>      (BTreeMap = attach order)
//!
//! iter_with_additions():  cursor = last yielded seq
//!     next() ─► lock ─► first entry with seq > cursor ─► unlock ─► yield
//! ```
//!
//! ## Rules
//! - Keys are unique; a conflicting re-attach is rejected, a compatible one is a no-op.
//! - The lock is held per step only, so observers may attach/detach while a
//!   sweep is running.
//! - A sweep yields entries present at its start **and** entries appended
//!   after it started; entries removed before the cursor reaches them are
//!   skipped. It is single-pass and finite.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::Mutex;

use super::wrapper::SubscriberWrapper;
use crate::error::LiveDataError;

/// Outcome of [`SubscriberRegistry::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Attachment {
    /// The wrapper was inserted.
    New,
    /// A compatible wrapper for the same observer already existed.
    Existing,
}

struct Entries<T> {
    by_seq: BTreeMap<u64, Arc<SubscriberWrapper<T>>>,
    by_key: HashMap<usize, u64>,
    next_seq: u64,
}

/// Insertion-ordered registry of attached subscribers.
pub(crate) struct SubscriberRegistry<T> {
    entries: Mutex<Entries<T>>,
}

impl<T: 'static> SubscriberRegistry<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(Entries {
                by_seq: BTreeMap::new(),
                by_key: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Inserts `wrapper` unless its observer is already attached.
    ///
    /// ### Errors
    /// [`LiveDataError::ConflictingAttachment`] when the existing entry was
    /// attached with a different owner or kind.
    pub(crate) fn attach(
        &self,
        wrapper: Arc<SubscriberWrapper<T>>,
    ) -> Result<Attachment, LiveDataError> {
        let mut entries = self.entries.lock();
        if let Some(seq) = entries.by_key.get(&wrapper.key()).copied() {
            let compatible = entries
                .by_seq
                .get(&seq)
                .is_some_and(|existing| existing.is_compatible_with(&wrapper));
            return if compatible {
                Ok(Attachment::Existing)
            } else {
                Err(LiveDataError::ConflictingAttachment {
                    observer: wrapper.name(),
                })
            };
        }
        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.by_key.insert(wrapper.key(), seq);
        entries.by_seq.insert(seq, wrapper);
        Ok(Attachment::New)
    }

    /// Removes the entry for `key`.
    pub(crate) fn detach(&self, key: usize) -> Option<Arc<SubscriberWrapper<T>>> {
        let mut entries = self.entries.lock();
        let seq = entries.by_key.remove(&key)?;
        entries.by_seq.remove(&seq)
    }

    /// Removes every entry bound to the owner identified by `owner_key`.
    pub(crate) fn detach_all_for(&self, owner_key: usize) -> Vec<Arc<SubscriberWrapper<T>>> {
        let mut entries = self.entries.lock();
        let doomed: Vec<u64> = entries
            .by_seq
            .iter()
            .filter(|(_, w)| w.is_attached_to(owner_key))
            .map(|(seq, _)| *seq)
            .collect();
        let mut removed = Vec::with_capacity(doomed.len());
        for seq in doomed {
            if let Some(wrapper) = entries.by_seq.remove(&seq) {
                entries.by_key.remove(&wrapper.key());
                removed.push(wrapper);
            }
        }
        removed
    }

    /// Returns true if exactly this wrapper (not just its observer) is attached.
    pub(crate) fn contains(&self, wrapper: &Arc<SubscriberWrapper<T>>) -> bool {
        let entries = self.entries.lock();
        entries
            .by_key
            .get(&wrapper.key())
            .and_then(|seq| entries.by_seq.get(seq))
            .is_some_and(|w| Arc::ptr_eq(w, wrapper))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().by_seq.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Weakly consistent sweep that also observes later appends.
    pub(crate) fn iter_with_additions(&self) -> SweepIter<'_, T> {
        SweepIter {
            registry: self,
            cursor: None,
        }
    }
}

/// Single-pass cursor over a [`SubscriberRegistry`].
pub(crate) struct SweepIter<'a, T> {
    registry: &'a SubscriberRegistry<T>,
    cursor: Option<u64>,
}

impl<T> Iterator for SweepIter<'_, T> {
    type Item = Arc<SubscriberWrapper<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let entries = self.registry.entries.lock();
        let lower = match self.cursor {
            None => Bound::Unbounded,
            Some(seq) => Bound::Excluded(seq),
        };
        let (seq, wrapper) = entries.by_seq.range((lower, Bound::Unbounded)).next()?;
        self.cursor = Some(*seq);
        Some(Arc::clone(wrapper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{LifecycleRegistry, LifecycleState};
    use crate::observers::{Observer, ObserverFn};

    fn obs(name: &'static str) -> Arc<dyn Observer<i32>> {
        ObserverFn::arc(name, |_: &i32| {})
    }

    fn forever(o: &Arc<dyn Observer<i32>>) -> Arc<SubscriberWrapper<i32>> {
        Arc::new(SubscriberWrapper::always_active(Arc::clone(o)))
    }

    #[test]
    fn test_attach_is_unique_per_observer() {
        let reg = SubscriberRegistry::new();
        let o = obs("a");
        assert_eq!(reg.attach(forever(&o)).unwrap(), Attachment::New);
        assert_eq!(reg.attach(forever(&o)).unwrap(), Attachment::Existing);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_conflicting_owner_is_rejected() {
        let reg = SubscriberRegistry::new();
        let o = obs("dup");
        let owner = LifecycleRegistry::new(LifecycleState::Started).as_owner();
        reg.attach(forever(&o)).unwrap();
        let bound = Arc::new(SubscriberWrapper::lifecycle_bound(Arc::clone(&o), &owner));
        let err = reg.attach(bound).unwrap_err();
        assert!(matches!(
            err,
            LiveDataError::ConflictingAttachment { observer: "dup" }
        ));
    }

    #[test]
    fn test_sweep_preserves_attach_order() {
        let reg = SubscriberRegistry::new();
        let names = ["a", "b", "c", "d"];
        for n in names {
            reg.attach(forever(&obs(n))).unwrap();
        }
        let seen: Vec<&str> = reg.iter_with_additions().map(|w| w.name()).collect();
        assert_eq!(seen, names);
    }

    #[test]
    fn test_sweep_sees_appends_and_skips_removals() {
        let reg = SubscriberRegistry::new();
        let a = obs("a");
        let b = obs("b");
        reg.attach(forever(&a)).unwrap();
        reg.attach(forever(&b)).unwrap();

        let mut iter = reg.iter_with_additions();
        assert_eq!(iter.next().unwrap().name(), "a");
        reg.detach(crate::observers::observer_key(&b));
        reg.attach(forever(&obs("late"))).unwrap();
        let rest: Vec<&str> = iter.map(|w| w.name()).collect();
        assert_eq!(rest, vec!["late"]);
    }

    #[test]
    fn test_detach_all_for_owner() {
        let reg = SubscriberRegistry::new();
        let owner = LifecycleRegistry::new(LifecycleState::Started).as_owner();
        let other = LifecycleRegistry::new(LifecycleState::Started).as_owner();
        for (o, who) in [(obs("1"), &owner), (obs("2"), &other), (obs("3"), &owner)] {
            reg.attach(Arc::new(SubscriberWrapper::lifecycle_bound(o, who)))
                .unwrap();
        }
        reg.attach(forever(&obs("f"))).unwrap();

        let removed = reg.detach_all_for(crate::lifecycle::owner_key(&owner));
        let names: Vec<&str> = removed.iter().map(|w| w.name()).collect();
        assert_eq!(names, vec!["1", "3"]);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_contains_checks_wrapper_identity() {
        let reg = SubscriberRegistry::new();
        let o = obs("x");
        let w = forever(&o);
        reg.attach(Arc::clone(&w)).unwrap();
        assert!(reg.contains(&w));
        assert!(!reg.contains(&forever(&o)));
        assert!(reg.detach(w.key()).is_some());
        assert!(reg.is_empty());
        assert!(reg.detach(w.key()).is_none());
    }
}
