//! # Cross-thread gateway - write entry points.
//!
//! Every write ends up as [`Inner::write`] on the delivery thread. The three
//! entry points differ only in how the caller waits:
//!
//! ```text
//! set(v)        on delivery thread ──► write(v) inline
//!               elsewhere          ──► job + oneshot, caller parks until fan-out is done
//! set_async(v)  same, but the caller awaits the oneshot
//! post(v)       slot = Some(v); first pending value schedules one job
//!               job: v = slot.take(); write(v)        (later posts overwrite earlier ones)
//! ```
//!
//! ## Rules
//! - `post` coalesces: only the latest value pending at job time is written.
//! - A `post` job dropped unrun clears the slot; the value is lost.
//! - A `post` still pending when a `set` runs may land after it.
//! - Nothing here holds a lock while a write runs.

use std::sync::Arc;

use super::live_data::Inner;
use crate::delivery::{run_async, run_blocking};
use crate::error::LiveDataError;

impl<T: Send + Sync + 'static> Inner<T> {
    /// Writes `value` and returns once every active subscriber saw it.
    pub(crate) fn set_blocking(self: &Arc<Self>, value: T) -> Result<(), LiveDataError> {
        if self.scheduler.is_delivery_thread() {
            self.write(value);
            return Ok(());
        }
        let live = Arc::clone(self);
        run_blocking(&*self.scheduler, move || live.write(value))
    }

    /// Async flavour of [`Inner::set_blocking`].
    pub(crate) async fn set_async(self: &Arc<Self>, value: T) -> Result<(), LiveDataError> {
        let live = Arc::clone(self);
        run_async(&*self.scheduler, move || live.write(value)).await
    }

    /// Stores `value` in the coalescing slot; never blocks on delivery.
    pub(crate) fn post(self: &Arc<Self>, value: T) -> Result<(), LiveDataError> {
        let first = {
            let mut slot = self.pending.lock();
            let first = slot.is_none();
            *slot = Some(value);
            first
        };
        if !first {
            tracing::trace!("post coalesced into pending value");
            return Ok(());
        }

        let drain = PendingDrain {
            live: Some(Arc::clone(self)),
        };
        if let Err(err) = self.scheduler.schedule(Box::new(move || drain.run())) {
            tracing::warn!(error = %err, "post dropped");
            return Err(err);
        }
        Ok(())
    }
}

/// Job body of one `post` burst.
///
/// Dropped without running (scheduler closed, queue discarded), it empties
/// the slot so the next `post` schedules again instead of coalescing into a
/// job that will never run.
struct PendingDrain<T: Send + Sync + 'static> {
    live: Option<Arc<Inner<T>>>,
}

impl<T: Send + Sync + 'static> PendingDrain<T> {
    fn run(mut self) {
        let Some(live) = self.live.take() else {
            return;
        };
        let value = live.pending.lock().take();
        if let Some(value) = value {
            live.write(value);
        }
    }
}

impl<T: Send + Sync + 'static> Drop for PendingDrain<T> {
    fn drop(&mut self) {
        if let Some(live) = self.live.take() {
            if live.pending.lock().take().is_some() {
                tracing::warn!("pending post discarded with its job");
            }
        }
    }
}
