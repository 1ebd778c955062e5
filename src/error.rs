//! Error types used by the live data core and its delivery loops.
//!
//! Everything fallible in this crate returns [`LiveDataError`]. The enum
//! provides helper methods (`as_label`, `as_message`) for logs/metrics, the
//! same way across all variants.
//!
//! ## Where errors surface
//! - **Synchronously**: attach conflicts on the delivery thread, closed
//!   schedulers, aborted blocking writes.
//! - **Logged only**: failures inside work that was rescheduled onto the
//!   delivery thread (the caller already returned).

use thiserror::Error;

/// # Errors produced by live data operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LiveDataError {
    /// The observer is already attached under a different owner (or a
    /// different attachment kind).
    #[error("observer {observer} is already attached with a different lifecycle")]
    ConflictingAttachment {
        /// Name of the offending observer.
        observer: &'static str,
    },

    /// The delivery scheduler no longer accepts jobs.
    #[error("delivery scheduler is closed")]
    SchedulerClosed,

    /// The delivery thread dropped a queued write before running it.
    #[error("delivery thread went away before the write completed")]
    DeliveryAborted,

    /// A blocking call was made from inside an async runtime.
    #[error("blocking set called from an async context; use set_async instead")]
    BlockingInAsyncContext,

    /// Raw sticky encoding outside the accepted range.
    #[error("invalid sticky count {raw} (expected -2, -1, 0 or a positive count)")]
    InvalidStickyCount {
        /// The rejected raw value.
        raw: i32,
    },

    /// The delivery thread (or its runtime) could not be started.
    #[error("failed to start delivery thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl LiveDataError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use event_live_data::LiveDataError;
    ///
    /// let err = LiveDataError::SchedulerClosed;
    /// assert_eq!(err.as_label(), "scheduler_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LiveDataError::ConflictingAttachment { .. } => "conflicting_attachment",
            LiveDataError::SchedulerClosed => "scheduler_closed",
            LiveDataError::DeliveryAborted => "delivery_aborted",
            LiveDataError::BlockingInAsyncContext => "blocking_in_async_context",
            LiveDataError::InvalidStickyCount { .. } => "invalid_sticky_count",
            LiveDataError::Spawn(_) => "spawn_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LiveDataError::ConflictingAttachment { observer } => {
                format!("conflicting attachment: observer={observer}")
            }
            LiveDataError::SchedulerClosed => "scheduler closed".to_string(),
            LiveDataError::DeliveryAborted => "delivery aborted".to_string(),
            LiveDataError::BlockingInAsyncContext => "blocking in async context".to_string(),
            LiveDataError::InvalidStickyCount { raw } => format!("invalid sticky count: {raw}"),
            LiveDataError::Spawn(e) => format!("spawn failed: {e}"),
        }
    }

    /// Indicates whether the failed operation may have taken effect anyway.
    ///
    /// Only [`LiveDataError::DeliveryAborted`] is ambiguous from the caller's
    /// side; every other variant means nothing was applied.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, LiveDataError::DeliveryAborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(
            LiveDataError::ConflictingAttachment { observer: "x" }.as_label(),
            "conflicting_attachment"
        );
        assert_eq!(LiveDataError::DeliveryAborted.as_label(), "delivery_aborted");
        assert_eq!(
            LiveDataError::InvalidStickyCount { raw: -7 }.as_label(),
            "invalid_sticky_count"
        );
    }

    #[test]
    fn test_message_carries_details() {
        let err = LiveDataError::ConflictingAttachment { observer: "audit" };
        assert!(err.as_message().contains("audit"));
        assert!(err.to_string().contains("audit"));
    }

    #[test]
    fn test_only_aborted_is_ambiguous() {
        assert!(LiveDataError::DeliveryAborted.is_ambiguous());
        assert!(!LiveDataError::SchedulerClosed.is_ambiguous());
    }
}
