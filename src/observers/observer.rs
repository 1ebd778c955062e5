//! # Core observer trait
//!
//! `Observer` is the extension point for receiving values from a live data.
//! Every call happens on the delivery thread, one at a time.
//!
//! ## Contract
//! - `on_changed` must not block for long: it holds up every other observer
//!   and every queued write.
//! - Re-entering the live data from `on_changed` (set, post, attach, detach)
//!   is allowed.
//! - A panic is caught and logged; the value still counts as delivered.
//! - Identity is the `Arc` allocation: the same `Arc` attached twice is one
//!   subscriber, two `Arc`s of equal values are two.

use std::sync::Arc;

/// Contract for value observers.
pub trait Observer<T>: Send + Sync + 'static {
    /// Handle a newly delivered value.
    fn on_changed(&self, value: &T);

    /// Human-readable name (for logs/errors).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Identity of an observer allocation.
#[inline]
pub(crate) fn observer_key<T>(observer: &Arc<dyn Observer<T>>) -> usize {
    Arc::as_ptr(observer) as *const () as usize
}
