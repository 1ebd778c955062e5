//! # Detachable subscription handle.
//!
//! Returned by [`EventLiveData::subscribe_forever`](crate::EventLiveData::subscribe_forever)
//! and stored in an [`AutoDetachSet`](crate::AutoDetachSet) by
//! [`observe_in`](crate::EventLiveData::observe_in).
//!
//! Holds the live data weakly: a subscription never keeps its live data alive.
//!
//! A subscription only detaches an attachment it created. If its observer
//! was already attached when the subscription's attach ran, the handle stays
//! inert and detaching it leaves the existing attachment alone.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::live_data::Inner;
use crate::observers::{Detach, Observer};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Handle that detaches one always-active observer.
pub struct Subscription<T> {
    id: u64,
    live: Weak<Inner<T>>,
    observer: Arc<dyn Observer<T>>,
    owns: Arc<AtomicBool>,
    detached: AtomicBool,
}

impl<T: 'static> Subscription<T> {
    pub(crate) fn new(live: &Arc<Inner<T>>, observer: Arc<dyn Observer<T>>) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            live: Arc::downgrade(live),
            observer,
            owns: Arc::new(AtomicBool::new(false)),
            detached: AtomicBool::new(false),
        }
    }

    pub(crate) fn observer(&self) -> &Arc<dyn Observer<T>> {
        &self.observer
    }

    pub(crate) fn ownership(&self) -> &Arc<AtomicBool> {
        &self.owns
    }

    /// Whether this handle's attach created the attachment it would detach.
    ///
    /// `false` until the attach has run on the delivery thread, and `false`
    /// for good when the observer was already attached.
    pub fn owns_attachment(&self) -> bool {
        self.owns.load(Ordering::Acquire)
    }

    /// Whether [`Detach::detach`] already ran.
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }
}

impl<T: Send + Sync + 'static> Detach for Subscription<T> {
    fn id(&self) -> u64 {
        self.id
    }

    fn detach(&self) {
        if self.detached.swap(true, Ordering::AcqRel) {
            return;
        }
        let Some(live) = self.live.upgrade() else {
            return;
        };
        let observer = Arc::clone(&self.observer);
        if let Err(err) = live.release_subscription(observer, Arc::clone(&self.owns)) {
            tracing::warn!(
                observer = self.observer.name(),
                error = %err,
                "subscription detach failed"
            );
        }
    }
}

impl<T: 'static> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("observer", &self.observer.name())
            .field("owns", &self.owns_attachment())
            .field("detached", &self.is_detached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::delivery::ManualScheduler;
    use crate::observers::{AutoDetachSet, Detach, ObserverFn};
    use crate::{Attach, EventLiveData};

    #[test]
    fn test_detach_is_idempotent() {
        let data: EventLiveData<u8> = EventLiveData::new(ManualScheduler::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let sub = data
            .subscribe_forever(ObserverFn::arc("count", move |_: &u8| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        data.set(1).unwrap();
        sub.detach();
        sub.detach();
        data.set(2).unwrap();

        assert!(sub.is_detached());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!data.has_observers());
    }

    #[test]
    fn test_ids_are_unique() {
        let data: EventLiveData<u8> = EventLiveData::new(ManualScheduler::new());
        let a = data.subscribe_forever(ObserverFn::arc("a", |_: &u8| {})).unwrap();
        let b = data.subscribe_forever(ObserverFn::arc("b", |_: &u8| {})).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_clear_all_detaches_and_outlives_data() {
        let set = AutoDetachSet::new();
        {
            let data: EventLiveData<u8> = EventLiveData::new(ManualScheduler::new());
            data.observe_in(&set, ObserverFn::arc("a", |_: &u8| {})).unwrap();
        }
        // Live data is gone; detaching through a dead weak handle is a no-op.
        set.clear_all();
        assert!(set.is_empty());
    }

    #[test]
    fn test_duplicate_subscription_leaves_existing_attachment() {
        let data: EventLiveData<u8> = EventLiveData::new(ManualScheduler::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let obs = ObserverFn::arc("count", move |_: &u8| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(data.observe_forever(obs.clone()).unwrap(), Attach::Attached);
        let sub = data.subscribe_forever(obs).unwrap();
        assert!(!sub.owns_attachment());

        sub.detach();
        assert!(sub.is_detached());
        assert!(data.has_observers(), "the earlier attachment survives");
        data.set(1).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deferred_subscription_owns_after_pump() {
        let sched = ManualScheduler::new();
        let data: EventLiveData<u8> = EventLiveData::new(sched.clone());
        let sub = {
            let data = data.clone();
            std::thread::spawn(move || data.subscribe_forever(ObserverFn::arc("r", |_: &u8| {})))
                .join()
                .unwrap()
                .unwrap()
        };
        assert!(!sub.owns_attachment());
        sched.run_pending();
        assert!(sub.owns_attachment());

        sub.detach();
        assert!(!data.has_observers());
    }
}
