//! # Dispatch engine - reentrancy-safe fan-out.
//!
//! Decides per subscriber whether to deliver, and walks the registry without
//! recursion when writes or activations arrive mid-sweep.
//!
//! ## Loop
//! ```text
//! dispatch(initiator)
//!   ├─ dispatching? ──► invalidated = true; return        (coalesce, no recursion)
//!   └─ dispatching = true
//!      do {
//!        invalidated = false
//!        initiator given? ──► consider_notify(initiator); initiator = None
//!        else ──► for w in registry.iter_with_additions():
//!                    consider_notify(w)
//!                    if invalidated: break                 (restart the sweep)
//!      } while invalidated
//!      dispatching = false
//!      cell.finish_writes()                                (post-write clearing)
//! ```
//!
//! ## consider_notify(w)
//! ```text
//! 0. owner destroyed or dropped             → detach w; skip
//! 1. !w.active                              → skip (cached gate)
//! 2. !w.should_be_active()                  → set_active(w, false); skip
//! 3. w.last_version >= version || no value  → skip
//! 4. w.last_version = version; deliver; cell.after_delivery()
//! ```
//! Step 0 runs before the cached gate so inactive wrappers of a dropped
//! owner are pruned too.
//! Step 2 may hold back one event for a subscriber whose become-inactive
//! notification has not been processed yet; ordering stays predictable.
//!
//! ## Rules
//! - Delivery-thread only; the flags are atomics purely so the container is `Sync`.
//! - Restarting is safe because `consider_notify` is idempotent per version.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::live_data::Inner;
use super::wrapper::SubscriberWrapper;
use crate::lifecycle::LifecycleState;

/// Dispatch flags of one live data.
#[derive(Default)]
pub(crate) struct DispatchState {
    dispatching: AtomicBool,
    invalidated: AtomicBool,
}

impl DispatchState {
    #[inline]
    fn is_dispatching(&self) -> bool {
        self.dispatching.load(Ordering::Relaxed)
    }

    #[inline]
    fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Relaxed)
    }
}

impl<T: Send + Sync + 'static> Inner<T> {
    /// Applies a write on the delivery thread and fans it out.
    pub(crate) fn write(&self, value: T) {
        let version = self.cell.begin_write(value);
        tracing::trace!(version, "value written");
        self.dispatch(None);
    }

    /// Fans the current value out to `initiator`, or to every subscriber.
    pub(crate) fn dispatch(&self, initiator: Option<Arc<SubscriberWrapper<T>>>) {
        let flags = &self.engine;
        if flags.is_dispatching() {
            flags.invalidated.store(true, Ordering::Relaxed);
            return;
        }
        flags.dispatching.store(true, Ordering::Relaxed);

        let mut initiator = initiator;
        loop {
            flags.invalidated.store(false, Ordering::Relaxed);
            if let Some(wrapper) = initiator.take() {
                self.consider_notify(&wrapper);
            } else {
                for wrapper in self.registry.iter_with_additions() {
                    self.consider_notify(&wrapper);
                    if flags.is_invalidated() {
                        break;
                    }
                }
            }
            if !flags.is_invalidated() {
                break;
            }
            tracing::trace!("dispatch invalidated, restarting sweep");
        }

        flags.dispatching.store(false, Ordering::Relaxed);
        self.cell.finish_writes();
    }

    fn consider_notify(&self, wrapper: &Arc<SubscriberWrapper<T>>) {
        if wrapper.owner_state() == Some(LifecycleState::Destroyed) {
            self.detach_destroyed(wrapper);
            return;
        }
        if !wrapper.is_active() {
            return;
        }
        if !wrapper.should_be_active(self.config.active_forever) {
            self.set_active(wrapper, false);
            return;
        }
        let Some((version, value)) = self.cell.current() else {
            return;
        };
        if wrapper.last_version() >= version {
            return;
        }
        wrapper.mark_delivered(version);
        wrapper.deliver(&value);
        self.cell.after_delivery();
    }

    /// Flips a wrapper's cached activation and runs the side effects.
    ///
    /// Becoming active replays the current value to that wrapper right away.
    pub(crate) fn set_active(&self, wrapper: &Arc<SubscriberWrapper<T>>, active: bool) {
        if !wrapper.swap_active(active) {
            return;
        }
        tracing::debug!(observer = wrapper.name(), active, "activation changed");

        let before = if active {
            self.active_count.fetch_add(1, Ordering::Relaxed)
        } else {
            self.active_count.fetch_sub(1, Ordering::Relaxed)
        };
        if active && before == 0 {
            self.hooks.fire_active();
        }
        if !active && before == 1 {
            self.hooks.fire_inactive();
        }
        if active {
            self.dispatch(Some(Arc::clone(wrapper)));
        }
    }
}
