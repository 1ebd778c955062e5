//! # Owner and observer traits.

use std::sync::{Arc, Weak};

use super::state::LifecycleState;

/// Receives state changes of a [`LifecycleOwner`].
///
/// Called on whatever thread moved the owner; implementations in this crate
/// hop to the delivery thread themselves.
pub trait LifecycleObserver: Send + Sync + 'static {
    /// The owner moved to `state`.
    fn on_state_changed(&self, state: LifecycleState);
}

/// An owning context (screen, session, component) with a lifecycle.
pub trait LifecycleOwner: Send + Sync + 'static {
    /// Current state of the owner.
    fn current_state(&self) -> LifecycleState;

    /// Starts notifying `observer` of future state changes.
    fn add_observer(&self, observer: Arc<dyn LifecycleObserver>);

    /// Stops notifying `observer` (matched by pointer identity).
    fn remove_observer(&self, observer: &Arc<dyn LifecycleObserver>);
}

/// Identity of an owner allocation.
#[inline]
pub(crate) fn owner_key(owner: &Arc<dyn LifecycleOwner>) -> usize {
    Arc::as_ptr(owner) as *const () as usize
}

/// Non-owning back-reference to an owner, compared by identity.
#[derive(Clone)]
pub(crate) struct OwnerRef {
    key: usize,
    owner: Weak<dyn LifecycleOwner>,
}

impl OwnerRef {
    pub(crate) fn new(owner: &Arc<dyn LifecycleOwner>) -> Self {
        Self {
            key: owner_key(owner),
            owner: Arc::downgrade(owner),
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> usize {
        self.key
    }

    pub(crate) fn same_as(&self, other: &OwnerRef) -> bool {
        self.key == other.key
    }

    pub(crate) fn upgrade(&self) -> Option<Arc<dyn LifecycleOwner>> {
        self.owner.upgrade()
    }

    /// State of the owner; a dropped owner reads as destroyed.
    pub(crate) fn state(&self) -> LifecycleState {
        self.upgrade()
            .map_or(LifecycleState::Destroyed, |o| o.current_state())
    }
}
