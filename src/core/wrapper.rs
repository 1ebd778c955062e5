//! # Per-subscriber record.
//!
//! A [`SubscriberWrapper`] pairs an observer with everything the dispatch
//! engine tracks about it: the cached active flag, the last delivered version,
//! and how activation is decided ([`Binding`]).
//!
//! ## Rules
//! - The cached `active` flag is the entrance gate for deliveries; the
//!   authoritative lifecycle check comes second (see `consider_notify`).
//! - `last_version` starts at [`START_VERSION`] and only grows.
//! - A lifecycle-bound wrapper holds a `Weak` to its owner: it never keeps the
//!   owner alive, and a dropped owner reads as destroyed.
//! - All fields are touched on the delivery thread only; atomics are used so
//!   the record can live behind `Arc` in a `Sync` container.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use parking_lot::Mutex;

use super::cell::START_VERSION;
use crate::delivery::panic_message;
use crate::lifecycle::{
    LifecycleObserver, LifecycleOwner, LifecycleState, OwnerRef, should_be_active,
};
use crate::observers::{Observer, observer_key};

/// How a subscriber's activation is decided.
pub(crate) enum Binding {
    /// Attached with `observe_forever`: always active until removed.
    AlwaysActive,
    /// Attached with `observe(owner, ..)`: follows the owner's lifecycle.
    LifecycleBound {
        owner: OwnerRef,
        listener: Mutex<Option<Arc<dyn LifecycleObserver>>>,
    },
}

/// Delivery-side record of one attached observer.
pub(crate) struct SubscriberWrapper<T> {
    key: usize,
    observer: Arc<dyn Observer<T>>,
    binding: Binding,
    active: AtomicBool,
    last_version: AtomicI64,
}

impl<T: 'static> SubscriberWrapper<T> {
    pub(crate) fn always_active(observer: Arc<dyn Observer<T>>) -> Self {
        Self::with_binding(observer, Binding::AlwaysActive)
    }

    pub(crate) fn lifecycle_bound(
        observer: Arc<dyn Observer<T>>,
        owner: &Arc<dyn LifecycleOwner>,
    ) -> Self {
        Self::with_binding(
            observer,
            Binding::LifecycleBound {
                owner: OwnerRef::new(owner),
                listener: Mutex::new(None),
            },
        )
    }

    fn with_binding(observer: Arc<dyn Observer<T>>, binding: Binding) -> Self {
        Self {
            key: observer_key(&observer),
            observer,
            binding,
            active: AtomicBool::new(false),
            last_version: AtomicI64::new(START_VERSION),
        }
    }

    /// Identity of the wrapped observer.
    #[inline]
    pub(crate) fn key(&self) -> usize {
        self.key
    }

    pub(crate) fn name(&self) -> &'static str {
        self.observer.name()
    }

    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Stores the flag; returns `true` if it changed.
    pub(crate) fn swap_active(&self, active: bool) -> bool {
        self.active.swap(active, Ordering::Relaxed) != active
    }

    #[inline]
    pub(crate) fn last_version(&self) -> i64 {
        self.last_version.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_delivered(&self, version: i64) {
        self.last_version.store(version, Ordering::Relaxed);
    }

    /// State of the owner; always-active wrappers have none.
    pub(crate) fn owner_state(&self) -> Option<LifecycleState> {
        match &self.binding {
            Binding::AlwaysActive => None,
            Binding::LifecycleBound { owner, .. } => Some(owner.state()),
        }
    }

    /// Authoritative activation check against the live owner state.
    pub(crate) fn should_be_active(&self, active_forever: bool) -> bool {
        self.owner_state()
            .is_none_or(|state| should_be_active(state, active_forever))
    }

    pub(crate) fn is_attached_to(&self, owner_key: usize) -> bool {
        match &self.binding {
            Binding::AlwaysActive => false,
            Binding::LifecycleBound { owner, .. } => owner.key() == owner_key,
        }
    }

    /// Whether `other` describes the same attachment (same kind, same owner).
    pub(crate) fn is_compatible_with(&self, other: &SubscriberWrapper<T>) -> bool {
        match (&self.binding, &other.binding) {
            (Binding::AlwaysActive, Binding::AlwaysActive) => true,
            (Binding::LifecycleBound { owner: a, .. }, Binding::LifecycleBound { owner: b, .. }) => {
                a.same_as(b)
            }
            _ => false,
        }
    }

    /// Registers `listener` with the owner and remembers it for detaching.
    pub(crate) fn bind_listener(&self, listener: Arc<dyn LifecycleObserver>) {
        if let Binding::LifecycleBound { owner, listener: slot } = &self.binding {
            *slot.lock() = Some(Arc::clone(&listener));
            if let Some(owner) = owner.upgrade() {
                owner.add_observer(listener);
            }
        }
    }

    /// Unregisters the lifecycle listener, if any. Idempotent.
    pub(crate) fn unbind_listener(&self) {
        if let Binding::LifecycleBound { owner, listener } = &self.binding {
            let taken = listener.lock().take();
            if let (Some(listener), Some(owner)) = (taken, owner.upgrade()) {
                owner.remove_observer(&listener);
            }
        }
    }

    /// Invokes the observer, isolating panics.
    pub(crate) fn deliver(&self, value: &T) {
        let result = catch_unwind(AssertUnwindSafe(|| self.observer.on_changed(value)));
        if let Err(panic) = result {
            tracing::error!(
                observer = self.name(),
                panic = %panic_message(&*panic),
                "observer panicked during delivery"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleRegistry;
    use crate::observers::ObserverFn;

    fn observer() -> Arc<dyn Observer<u32>> {
        ObserverFn::arc("w", |_: &u32| {})
    }

    #[test]
    fn test_fresh_wrapper_is_inactive_before_start() {
        let w = SubscriberWrapper::always_active(observer());
        assert!(!w.is_active());
        assert_eq!(w.last_version(), START_VERSION);
        assert!(w.should_be_active(false));
        assert!(w.swap_active(true));
        assert!(!w.swap_active(true));
    }

    #[test]
    fn test_lifecycle_bound_follows_owner() {
        let reg = LifecycleRegistry::new(LifecycleState::Created);
        let owner = reg.as_owner();
        let w = SubscriberWrapper::lifecycle_bound(observer(), &owner);

        assert!(!w.should_be_active(false));
        assert!(w.should_be_active(true));
        reg.set_state(LifecycleState::Started);
        assert!(w.should_be_active(false));
        reg.mark_destroyed();
        assert!(!w.should_be_active(true));
    }

    #[test]
    fn test_dropped_owner_reads_destroyed() {
        let owner = LifecycleRegistry::new(LifecycleState::Resumed).as_owner();
        let w = SubscriberWrapper::lifecycle_bound(observer(), &owner);
        drop(owner);
        assert_eq!(w.owner_state(), Some(LifecycleState::Destroyed));
        assert!(!w.should_be_active(true));
    }

    #[test]
    fn test_compatibility_matrix() {
        let obs = observer();
        let a = LifecycleRegistry::new(LifecycleState::Started).as_owner();
        let b = LifecycleRegistry::new(LifecycleState::Started).as_owner();

        let forever = SubscriberWrapper::always_active(Arc::clone(&obs));
        let on_a = SubscriberWrapper::lifecycle_bound(Arc::clone(&obs), &a);
        let on_a2 = SubscriberWrapper::lifecycle_bound(Arc::clone(&obs), &a);
        let on_b = SubscriberWrapper::lifecycle_bound(Arc::clone(&obs), &b);

        assert!(forever.is_compatible_with(&SubscriberWrapper::always_active(Arc::clone(&obs))));
        assert!(on_a.is_compatible_with(&on_a2));
        assert!(!on_a.is_compatible_with(&on_b));
        assert!(!on_a.is_compatible_with(&forever));
        assert!(!forever.is_compatible_with(&on_a));
    }

    #[test]
    fn test_panicking_observer_is_isolated() {
        let obs: Arc<dyn Observer<u32>> = ObserverFn::arc("bad", |_: &u32| panic!("nope"));
        let w = SubscriberWrapper::always_active(obs);
        w.deliver(&1);
    }
}
