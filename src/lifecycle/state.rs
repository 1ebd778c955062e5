//! # Lifecycle states.

use std::fmt;

/// State of an owning context. Ordering follows declaration order, so
/// `state >= LifecycleState::Started` reads as "at least started".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    /// Terminal state; subscribers bound to it are detached.
    Destroyed,
    /// Constructed but not yet created.
    Initialized,
    /// Created, not visible.
    Created,
    /// Visible (the threshold for ordinary activation).
    Started,
    /// In the foreground.
    Resumed,
}

impl LifecycleState {
    /// Returns true if `self` is at or above `other`.
    #[inline]
    pub fn is_at_least(self, other: LifecycleState) -> bool {
        self >= other
    }

    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleState::Destroyed => "destroyed",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Created => "created",
            LifecycleState::Started => "started",
            LifecycleState::Resumed => "resumed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Whether a subscriber bound to an owner in `state` should receive events.
///
/// # Example
/// ```
/// use event_live_data::{LifecycleState, should_be_active};
///
/// assert!(should_be_active(LifecycleState::Created, true));
/// assert!(!should_be_active(LifecycleState::Created, false));
/// assert!(should_be_active(LifecycleState::Resumed, false));
/// assert!(!should_be_active(LifecycleState::Destroyed, true));
/// ```
#[inline]
pub fn should_be_active(state: LifecycleState, active_forever: bool) -> bool {
    (active_forever && state != LifecycleState::Destroyed)
        || state.is_at_least(LifecycleState::Started)
}
