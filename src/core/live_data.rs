//! # EventLiveData - observable value with sticky replay.
//!
//! [`EventLiveData`] is a cheap, cloneable handle to one observable value.
//! All state changes happen on the delivery thread of its
//! [`DeliveryScheduler`]; calls made elsewhere are rescheduled there.
//!
//! ## Architecture
//! ```text
//! any thread                         delivery thread
//! ──────────                         ───────────────
//! observe / observe_forever ──job──► attach: registry + credit + listener
//!                                      └─► set_active ─► dispatch(initiator)
//! remove_observer(s)        ──job──► detach: registry - listener - set_active(false)
//! set / set_async / post    ──job──► write ─► dispatch(all)
//! owner state change        ──job──► binding: set_active | auto-detach on Destroyed
//! value()  ◄── lock-free read (may be stale)
//! ```
//!
//! ## Rules
//! - Attach/detach off the delivery thread is fire-and-forget
//!   ([`Attach::Scheduled`], [`Removal::Scheduled`]); failures of the deferred
//!   work are logged, not returned.
//! - An observer (by `Arc` identity) is attached at most once. Re-attaching
//!   with the same owner is a no-op; with a different owner or kind it is a
//!   [`LiveDataError::ConflictingAttachment`].
//! - Attaching under a destroyed owner is dropped silently.
//! - Owners reaching `Destroyed` detach their observers automatically. An
//!   owner dropped without that notification is detected by the next sweep.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use event_live_data::{EventLiveData, ManualScheduler, ObserverFn, StickyMode};
//! use parking_lot::Mutex;
//!
//! let sched = ManualScheduler::new();
//! let data: EventLiveData<i32> = EventLiveData::builder(sched.clone())
//!     .sticky(StickyMode::StickyForever)
//!     .build();
//!
//! data.set(1).unwrap();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! data.observe_forever(ObserverFn::arc("late", move |v: &i32| sink.lock().push(*v)))
//!     .unwrap();
//!
//! assert_eq!(*seen.lock(), vec![1]);
//! ```

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::builder::EventLiveDataBuilder;
use super::cell::VersionedCell;
use super::dispatch::DispatchState;
use super::registry::{Attachment, SubscriberRegistry};
use super::subscription::Subscription;
use super::wrapper::SubscriberWrapper;
use crate::config::LiveDataConfig;
use crate::delivery::{DeliveryScheduler, panic_message};
use crate::error::LiveDataError;
use crate::lifecycle::{LifecycleObserver, LifecycleOwner, LifecycleState, owner_key};
use crate::observers::{AutoDetachSet, Observer, observer_key};

/// Outcome of an attach call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attach {
    /// The observer was attached (and possibly already received a replay).
    Attached,
    /// The observer was already attached with the same owner.
    AlreadyAttached,
    /// Called off the delivery thread; the attach will run there later.
    Scheduled,
    /// The owner was already destroyed; nothing was attached.
    OwnerDestroyed,
}

/// Outcome of a detach call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// At least one observer was detached.
    Removed,
    /// Nothing matched.
    NotFound,
    /// Called off the delivery thread; the detach will run there later.
    Scheduled,
}

pub(crate) type Hook = Arc<dyn Fn() + Send + Sync + 'static>;

/// Extension hooks fired when the active-subscriber count leaves or reaches zero.
#[derive(Default, Clone)]
pub(crate) struct Hooks {
    pub(crate) on_active: Option<Hook>,
    pub(crate) on_inactive: Option<Hook>,
}

impl Hooks {
    pub(crate) fn fire_active(&self) {
        Self::fire(self.on_active.as_ref(), "on_active");
    }

    pub(crate) fn fire_inactive(&self) {
        Self::fire(self.on_inactive.as_ref(), "on_inactive");
    }

    fn fire(hook: Option<&Hook>, label: &'static str) {
        let Some(hook) = hook else {
            return;
        };
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| hook())) {
            tracing::error!(
                hook = label,
                panic = %panic_message(&*panic),
                "activation hook panicked"
            );
        }
    }
}

/// Shared state behind every clone of one [`EventLiveData`].
pub(crate) struct Inner<T> {
    pub(crate) config: LiveDataConfig,
    pub(crate) scheduler: Arc<dyn DeliveryScheduler>,
    pub(crate) cell: VersionedCell<T>,
    pub(crate) registry: SubscriberRegistry<T>,
    pub(crate) engine: DispatchState,
    pub(crate) pending: Mutex<Option<T>>,
    pub(crate) active_count: AtomicUsize,
    pub(crate) hooks: Hooks,
}

impl<T: 'static> Inner<T> {
    pub(crate) fn new(
        scheduler: Arc<dyn DeliveryScheduler>,
        config: LiveDataConfig,
        hooks: Hooks,
    ) -> Self {
        Self {
            cell: VersionedCell::new(config.sticky),
            config,
            scheduler,
            registry: SubscriberRegistry::new(),
            engine: DispatchState::default(),
            pending: Mutex::new(None),
            active_count: AtomicUsize::new(0),
            hooks,
        }
    }
}

impl<T: Send + Sync + 'static> Inner<T> {
    /// Runs `job` on the delivery thread; on failure logs with `what`.
    fn defer(&self, what: &'static str, job: impl FnOnce() + Send + 'static) -> Result<(), LiveDataError> {
        self.scheduler.schedule(Box::new(job)).inspect_err(|err| {
            tracing::warn!(op = what, error = %err, "could not reschedule onto delivery thread");
        })
    }

    pub(crate) fn observe(
        self: &Arc<Self>,
        owner: &Arc<dyn LifecycleOwner>,
        observer: Arc<dyn Observer<T>>,
    ) -> Result<Attach, LiveDataError> {
        if !self.scheduler.is_delivery_thread() {
            let live = Arc::clone(self);
            let owner = Arc::downgrade(owner);
            self.defer("observe", move || {
                let Some(owner) = owner.upgrade() else {
                    tracing::debug!("owner dropped before deferred attach");
                    return;
                };
                if let Err(err) = live.observe(&owner, observer) {
                    tracing::warn!(error = %err, "deferred attach failed");
                }
            })?;
            return Ok(Attach::Scheduled);
        }

        if owner.current_state() == LifecycleState::Destroyed {
            tracing::debug!(observer = observer.name(), "owner destroyed, attach dropped");
            return Ok(Attach::OwnerDestroyed);
        }
        let wrapper = Arc::new(SubscriberWrapper::lifecycle_bound(observer, owner));
        if self.registry.attach(Arc::clone(&wrapper))? == Attachment::Existing {
            return Ok(Attach::AlreadyAttached);
        }
        self.cell.consume_attach_credit();

        let listener: Arc<dyn LifecycleObserver> = Arc::new(LifecycleBinding {
            live: Arc::downgrade(self),
            wrapper: Arc::downgrade(&wrapper),
        });
        wrapper.bind_listener(listener);

        tracing::debug!(observer = wrapper.name(), "observer attached to owner");
        let active = wrapper.should_be_active(self.config.active_forever);
        self.set_active(&wrapper, active);
        Ok(Attach::Attached)
    }

    pub(crate) fn observe_forever(
        self: &Arc<Self>,
        observer: Arc<dyn Observer<T>>,
    ) -> Result<Attach, LiveDataError> {
        if !self.scheduler.is_delivery_thread() {
            let live = Arc::clone(self);
            self.defer("observe_forever", move || {
                if let Err(err) = live.observe_forever(observer) {
                    tracing::warn!(error = %err, "deferred attach failed");
                }
            })?;
            return Ok(Attach::Scheduled);
        }

        let wrapper = Arc::new(SubscriberWrapper::always_active(observer));
        if self.registry.attach(Arc::clone(&wrapper))? == Attachment::Existing {
            return Ok(Attach::AlreadyAttached);
        }
        self.cell.consume_attach_credit();

        tracing::debug!(observer = wrapper.name(), "observer attached forever");
        self.set_active(&wrapper, true);
        Ok(Attach::Attached)
    }

    /// Attaches a subscription's observer forever and records whether this
    /// call created the attachment.
    pub(crate) fn attach_subscription(
        self: &Arc<Self>,
        subscription: &Arc<Subscription<T>>,
    ) -> Result<Attach, LiveDataError> {
        if !self.scheduler.is_delivery_thread() {
            let live = Arc::clone(self);
            let subscription = Arc::clone(subscription);
            self.defer("subscribe_forever", move || {
                if let Err(err) = live.attach_subscription(&subscription) {
                    tracing::warn!(error = %err, "deferred subscription attach failed");
                }
            })?;
            return Ok(Attach::Scheduled);
        }

        let outcome = self.observe_forever(Arc::clone(subscription.observer()))?;
        if outcome == Attach::Attached {
            subscription.ownership().store(true, Ordering::Release);
        } else {
            tracing::debug!(
                observer = subscription.observer().name(),
                ?outcome,
                "subscription does not own its attachment"
            );
        }
        Ok(outcome)
    }

    /// Detaches a subscription's observer if the subscription owns the attachment.
    pub(crate) fn release_subscription(
        self: &Arc<Self>,
        observer: Arc<dyn Observer<T>>,
        owns: Arc<AtomicBool>,
    ) -> Result<Removal, LiveDataError> {
        if !self.scheduler.is_delivery_thread() {
            let live = Arc::clone(self);
            self.defer("subscription_detach", move || {
                let _ = live.release_subscription(observer, owns);
            })?;
            return Ok(Removal::Scheduled);
        }
        if !owns.swap(false, Ordering::AcqRel) {
            return Ok(Removal::NotFound);
        }
        self.remove_observer(&observer)
    }

    pub(crate) fn remove_observer(
        self: &Arc<Self>,
        observer: &Arc<dyn Observer<T>>,
    ) -> Result<Removal, LiveDataError> {
        if !self.scheduler.is_delivery_thread() {
            let live = Arc::clone(self);
            let observer = Arc::clone(observer);
            self.defer("remove_observer", move || {
                let _ = live.remove_observer(&observer);
            })?;
            return Ok(Removal::Scheduled);
        }

        match self.registry.detach(observer_key(observer)) {
            Some(wrapper) => {
                self.retire(&wrapper);
                Ok(Removal::Removed)
            }
            None => Ok(Removal::NotFound),
        }
    }

    pub(crate) fn remove_observers(
        self: &Arc<Self>,
        owner: &Arc<dyn LifecycleOwner>,
    ) -> Result<Removal, LiveDataError> {
        self.remove_observers_by_key(owner_key(owner))
    }

    fn remove_observers_by_key(self: &Arc<Self>, key: usize) -> Result<Removal, LiveDataError> {
        if !self.scheduler.is_delivery_thread() {
            let live = Arc::clone(self);
            self.defer("remove_observers", move || {
                let _ = live.remove_observers_by_key(key);
            })?;
            return Ok(Removal::Scheduled);
        }

        let removed = self.registry.detach_all_for(key);
        if removed.is_empty() {
            return Ok(Removal::NotFound);
        }
        for wrapper in &removed {
            self.retire(wrapper);
        }
        Ok(Removal::Removed)
    }

    /// Side effects of a detach: stop listening to the owner, then deactivate.
    fn retire(&self, wrapper: &Arc<SubscriberWrapper<T>>) {
        wrapper.unbind_listener();
        self.set_active(wrapper, false);
        tracing::debug!(observer = wrapper.name(), "observer detached");
    }

    /// Detaches a wrapper whose owner is destroyed or dropped.
    pub(crate) fn detach_destroyed(&self, wrapper: &Arc<SubscriberWrapper<T>>) {
        if !self.registry.contains(wrapper) {
            return;
        }
        if let Some(wrapper) = self.registry.detach(wrapper.key()) {
            tracing::debug!(observer = wrapper.name(), "owner gone, detaching");
            self.retire(&wrapper);
        }
    }

    /// Reacts to an owner state change; delivery thread only.
    fn apply_owner_state(&self, wrapper: &Arc<SubscriberWrapper<T>>) {
        if !self.registry.contains(wrapper) {
            return;
        }
        if wrapper.owner_state() == Some(LifecycleState::Destroyed) {
            self.detach_destroyed(wrapper);
            return;
        }
        let active = wrapper.should_be_active(self.config.active_forever);
        self.set_active(wrapper, active);
    }
}

/// Lifecycle listener registered with the owner of one lifecycle-bound wrapper.
struct LifecycleBinding<T> {
    live: Weak<Inner<T>>,
    wrapper: Weak<SubscriberWrapper<T>>,
}

impl<T: Send + Sync + 'static> LifecycleBinding<T> {
    fn apply(live: &Weak<Inner<T>>, wrapper: &Weak<SubscriberWrapper<T>>) {
        if let (Some(live), Some(wrapper)) = (live.upgrade(), wrapper.upgrade()) {
            live.apply_owner_state(&wrapper);
        }
    }
}

impl<T: Send + Sync + 'static> LifecycleObserver for LifecycleBinding<T> {
    fn on_state_changed(&self, state: LifecycleState) {
        let Some(live) = self.live.upgrade() else {
            return;
        };
        if live.scheduler.is_delivery_thread() {
            Self::apply(&self.live, &self.wrapper);
            return;
        }
        tracing::trace!(%state, "owner state change rescheduled");
        let (weak_live, weak_wrapper) = (self.live.clone(), self.wrapper.clone());
        let _ = live.defer("owner_state", move || Self::apply(&weak_live, &weak_wrapper));
    }
}

/// Observable value with versioned, sticky, single-thread delivery.
///
/// Cloning is cheap; all clones share the same value and subscribers.
pub struct EventLiveData<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for EventLiveData<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> fmt::Debug for EventLiveData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLiveData")
            .field("config", &self.inner.config)
            .field("version", &self.inner.cell.version())
            .field("observers", &self.inner.registry.len())
            .finish()
    }
}

impl<T: Send + Sync + 'static> EventLiveData<T> {
    /// Starts a builder delivering on `scheduler`.
    pub fn builder(scheduler: Arc<dyn DeliveryScheduler>) -> EventLiveDataBuilder<T> {
        EventLiveDataBuilder::new(scheduler)
    }

    /// Creates a live data with [`LiveDataConfig::default`].
    pub fn new(scheduler: Arc<dyn DeliveryScheduler>) -> Self {
        Self::with_config(scheduler, LiveDataConfig::default())
    }

    /// Creates a live data with an explicit configuration.
    pub fn with_config(scheduler: Arc<dyn DeliveryScheduler>, config: LiveDataConfig) -> Self {
        Self::builder(scheduler).config(config).build()
    }

    pub(crate) fn from_inner(inner: Arc<Inner<T>>) -> Self {
        Self { inner }
    }

    /// Attaches `observer`, active while `owner`'s lifecycle allows.
    ///
    /// ### Errors
    /// - [`LiveDataError::ConflictingAttachment`] when `observer` is already
    ///   attached with another owner or forever (delivery thread only).
    /// - [`LiveDataError::SchedulerClosed`] when the attach cannot be queued.
    pub fn observe(
        &self,
        owner: &Arc<dyn LifecycleOwner>,
        observer: Arc<dyn Observer<T>>,
    ) -> Result<Attach, LiveDataError> {
        self.inner.observe(owner, observer)
    }

    /// Attaches `observer`, active until removed.
    ///
    /// ### Errors
    /// Same as [`EventLiveData::observe`].
    pub fn observe_forever(&self, observer: Arc<dyn Observer<T>>) -> Result<Attach, LiveDataError> {
        self.inner.observe_forever(observer)
    }

    /// Attaches `observer` forever and returns a handle that detaches it.
    ///
    /// If `observer` turns out to be attached already, the handle does not
    /// own that attachment and detaching it is a no-op; see
    /// [`Subscription::owns_attachment`].
    ///
    /// ### Errors
    /// Same as [`EventLiveData::observe`].
    pub fn subscribe_forever(
        &self,
        observer: Arc<dyn Observer<T>>,
    ) -> Result<Arc<Subscription<T>>, LiveDataError> {
        let subscription = Arc::new(Subscription::new(&self.inner, observer));
        self.inner.attach_subscription(&subscription)?;
        Ok(subscription)
    }

    /// Attaches `observer` forever and hands the subscription to `set`.
    ///
    /// The observer is detached when `set` is cleared or dropped.
    pub fn observe_in(
        &self,
        set: &AutoDetachSet,
        observer: Arc<dyn Observer<T>>,
    ) -> Result<Arc<Subscription<T>>, LiveDataError> {
        let subscription = self.subscribe_forever(observer)?;
        set.add(subscription.clone());
        Ok(subscription)
    }

    /// Detaches `observer`.
    pub fn remove_observer(&self, observer: &Arc<dyn Observer<T>>) -> Result<Removal, LiveDataError> {
        self.inner.remove_observer(observer)
    }

    /// Detaches every observer bound to `owner`.
    pub fn remove_observers(&self, owner: &Arc<dyn LifecycleOwner>) -> Result<Removal, LiveDataError> {
        self.inner.remove_observers(owner)
    }

    /// Writes `value` and waits until every active subscriber has seen it.
    ///
    /// ### Errors
    /// - [`LiveDataError::BlockingInAsyncContext`] inside an async runtime
    ///   (off the delivery thread); use [`EventLiveData::set_async`].
    /// - [`LiveDataError::SchedulerClosed`] / [`LiveDataError::DeliveryAborted`]
    ///   when the delivery thread is gone.
    ///
    /// ### Notes
    /// No timeout: blocks for as long as the delivery thread is busy.
    pub fn set(&self, value: T) -> Result<(), LiveDataError> {
        self.inner.set_blocking(value)
    }

    /// Writes `value` and awaits the fan-out.
    pub async fn set_async(&self, value: T) -> Result<(), LiveDataError> {
        self.inner.set_async(value).await
    }

    /// Queues `value` without waiting. Bursts collapse to the latest value.
    pub fn post(&self, value: T) -> Result<(), LiveDataError> {
        self.inner.post(value)
    }

    /// Current value, if any. May be stale off the delivery thread.
    pub fn value(&self) -> Option<Arc<T>> {
        self.inner.cell.read()
    }

    /// Number of accepted writes minus one (`-1` before the first write).
    pub fn version(&self) -> i64 {
        self.inner.cell.version()
    }

    /// Whether any observer is attached.
    pub fn has_observers(&self) -> bool {
        !self.inner.registry.is_empty()
    }

    /// Whether any attached observer is currently active.
    pub fn has_active_observers(&self) -> bool {
        self.inner.active_count.load(Ordering::Relaxed) > 0
    }

    /// Configuration fixed at construction.
    pub fn config(&self) -> LiveDataConfig {
        self.inner.config
    }
}
