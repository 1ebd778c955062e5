//! # Function-backed observer (`ObserverFn`)
//!
//! [`ObserverFn`] wraps a closure `F: Fn(&T)`. Shared state inside the closure
//! has to be `Send + Sync` (use atomics or `Arc<Mutex<..>>` explicitly).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use event_live_data::{Observer, ObserverFn};
//!
//! let obs: Arc<dyn Observer<String>> = ObserverFn::arc("printer", |v: &String| {
//!     println!("got {v}");
//! });
//! assert_eq!(obs.name(), "printer");
//! ```

use std::sync::Arc;

use super::observer::Observer;

/// Closure-backed observer.
pub struct ObserverFn<F> {
    name: &'static str,
    f: F,
}

impl<F> ObserverFn<F> {
    /// Creates a new function-backed observer.
    ///
    /// Prefer [`ObserverFn::arc`] when you immediately attach it.
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }

    /// Creates the observer as a shared handle, ready to attach.
    pub fn arc(name: &'static str, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<T, F> Observer<T> for ObserverFn<F>
where
    T: 'static,
    F: Fn(&T) + Send + Sync + 'static,
{
    fn on_changed(&self, value: &T) {
        (self.f)(value)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl<F> std::fmt::Debug for ObserverFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverFn").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[test]
    fn test_closure_is_invoked_with_value() {
        let sum = Arc::new(AtomicI64::new(0));
        let s = Arc::clone(&sum);
        let obs: Arc<dyn Observer<i64>> = ObserverFn::arc("sum", move |v: &i64| {
            s.fetch_add(*v, Ordering::SeqCst);
        });
        obs.on_changed(&3);
        obs.on_changed(&4);
        assert_eq!(sum.load(Ordering::SeqCst), 7);
        assert_eq!(obs.name(), "sum");
    }

    #[test]
    fn test_identity_is_per_allocation() {
        let a: Arc<dyn Observer<u8>> = ObserverFn::arc("a", |_: &u8| {});
        let b: Arc<dyn Observer<u8>> = ObserverFn::arc("a", |_: &u8| {});
        assert_eq!(
            super::super::observer_key(&a),
            super::super::observer_key(&Arc::clone(&a))
        );
        assert_ne!(super::super::observer_key(&a), super::super::observer_key(&b));
    }
}
