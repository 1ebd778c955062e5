//! # Explicitly driven lifecycle owner.
//!
//! [`LifecycleRegistry`] is the stock [`LifecycleOwner`]: something (a screen,
//! a session, a test) moves it between states with
//! [`set_state`](LifecycleRegistry::set_state) and it tells its observers.
//!
//! ## Rules
//! - Observers are notified synchronously on the calling thread, in
//!   registration order, with no internal lock held.
//! - Setting the current state again is a no-op.
//! - `Destroyed` is terminal: later moves are ignored.
//! - Adding an observer does not replay the current state.

use std::sync::Arc;

use parking_lot::Mutex;

use super::owner::{LifecycleObserver, LifecycleOwner};
use super::state::LifecycleState;

/// Lifecycle owner whose state is moved explicitly.
pub struct LifecycleRegistry {
    state: Mutex<LifecycleState>,
    observers: Mutex<Vec<Arc<dyn LifecycleObserver>>>,
}

impl LifecycleRegistry {
    /// Creates an owner in `initial` state.
    pub fn new(initial: LifecycleState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(initial),
            observers: Mutex::new(Vec::new()),
        })
    }

    /// Moves to `state` and notifies observers if it changed.
    ///
    /// Returns `false` when nothing changed (same state, or already destroyed).
    pub fn set_state(&self, state: LifecycleState) -> bool {
        {
            let mut current = self.state.lock();
            if *current == state || *current == LifecycleState::Destroyed {
                return false;
            }
            *current = state;
        }
        let observers: Vec<Arc<dyn LifecycleObserver>> = self.observers.lock().clone();
        for observer in observers {
            observer.on_state_changed(state);
        }
        true
    }

    /// Shorthand for `set_state(LifecycleState::Destroyed)`.
    pub fn mark_destroyed(&self) -> bool {
        self.set_state(LifecycleState::Destroyed)
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Returns this registry as a trait-object owner handle.
    pub fn as_owner(self: &Arc<Self>) -> Arc<dyn LifecycleOwner> {
        Arc::clone(self) as Arc<dyn LifecycleOwner>
    }
}

impl LifecycleOwner for LifecycleRegistry {
    fn current_state(&self) -> LifecycleState {
        *self.state.lock()
    }

    fn add_observer(&self, observer: Arc<dyn LifecycleObserver>) {
        let mut observers = self.observers.lock();
        if !observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            observers.push(observer);
        }
    }

    fn remove_observer(&self, observer: &Arc<dyn LifecycleObserver>) {
        self.observers.lock().retain(|o| !Arc::ptr_eq(o, observer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Mutex<Vec<LifecycleState>>);

    impl LifecycleObserver for Recorder {
        fn on_state_changed(&self, state: LifecycleState) {
            self.0.lock().push(state);
        }
    }

    #[test]
    fn test_notifies_on_change_only() {
        let reg = LifecycleRegistry::new(LifecycleState::Created);
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));
        reg.add_observer(rec.clone());

        assert!(reg.set_state(LifecycleState::Started));
        assert!(!reg.set_state(LifecycleState::Started));
        assert!(reg.set_state(LifecycleState::Resumed));
        assert_eq!(
            *rec.0.lock(),
            vec![LifecycleState::Started, LifecycleState::Resumed]
        );
    }

    #[test]
    fn test_destroyed_is_terminal() {
        let reg = LifecycleRegistry::new(LifecycleState::Started);
        assert!(reg.mark_destroyed());
        assert!(!reg.set_state(LifecycleState::Resumed));
        assert_eq!(reg.current_state(), LifecycleState::Destroyed);
    }

    #[test]
    fn test_add_is_idempotent_and_remove_by_identity() {
        let reg = LifecycleRegistry::new(LifecycleState::Created);
        let rec: Arc<dyn LifecycleObserver> = Arc::new(Recorder(Mutex::new(Vec::new())));
        reg.add_observer(Arc::clone(&rec));
        reg.add_observer(Arc::clone(&rec));
        assert_eq!(reg.observer_count(), 1);
        reg.remove_observer(&rec);
        assert_eq!(reg.observer_count(), 0);
    }
}
