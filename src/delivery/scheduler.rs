//! # Delivery scheduler contract
//!
//! [`DeliveryScheduler`] is the seam between the live data core and whatever
//! owns the delivery thread. The core only needs two things from it: a way to
//! enqueue work onto that thread, and a way to ask whether the caller is
//! already on it.
//!
//! ## Contract
//! - Jobs run **one at a time**, in **FIFO** order, on a single thread.
//! - `is_delivery_thread()` is `true` exactly on that thread.
//! - Once closed, `schedule` fails with [`LiveDataError::SchedulerClosed`];
//!   jobs still queued at close time are dropped, never run.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::sync::oneshot;

use crate::error::LiveDataError;

/// Unit of work executed on the delivery thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Single-threaded FIFO executor the core delivers on.
pub trait DeliveryScheduler: Send + Sync + 'static {
    /// Enqueues `job` to run on the delivery thread.
    fn schedule(&self, job: Job) -> Result<(), LiveDataError>;

    /// Returns `true` when called from the delivery thread.
    fn is_delivery_thread(&self) -> bool;
}

/// Runs `f` on the delivery thread and blocks until it returns.
///
/// Runs inline when already on the delivery thread. Because the queue is FIFO,
/// this also works as a barrier: every job scheduled before it has finished
/// once it returns.
///
/// ### Errors
/// - [`LiveDataError::BlockingInAsyncContext`] when called inside an async
///   runtime (use [`run_async`] there).
/// - [`LiveDataError::SchedulerClosed`] when the job could not be queued.
/// - [`LiveDataError::DeliveryAborted`] when the job was dropped or panicked.
///
/// ### Notes
/// There is no timeout: if the delivery thread is stuck, so is the caller.
pub fn run_blocking<R, F>(scheduler: &dyn DeliveryScheduler, f: F) -> Result<R, LiveDataError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if scheduler.is_delivery_thread() {
        return Ok(f());
    }
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(LiveDataError::BlockingInAsyncContext);
    }
    let (tx, rx) = oneshot::channel();
    scheduler.schedule(Box::new(move || {
        let _ = tx.send(f());
    }))?;
    rx.blocking_recv().map_err(|_| LiveDataError::DeliveryAborted)
}

/// Async counterpart of [`run_blocking`]: awaits instead of parking the thread.
pub async fn run_async<R, F>(scheduler: &dyn DeliveryScheduler, f: F) -> Result<R, LiveDataError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if scheduler.is_delivery_thread() {
        return Ok(f());
    }
    let (tx, rx) = oneshot::channel();
    scheduler.schedule(Box::new(move || {
        let _ = tx.send(f());
    }))?;
    rx.await.map_err(|_| LiveDataError::DeliveryAborted)
}

/// Runs a job, isolating panics so the delivery thread keeps going.
pub(crate) fn run_job(job: Job) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
        tracing::error!(panic = %panic_message(&*panic), "delivery job panicked");
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
