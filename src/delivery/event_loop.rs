//! # Dedicated delivery thread.
//!
//! [`DeliveryLoop`] owns one OS thread running a single-threaded tokio runtime
//! that drains an unbounded FIFO job queue.
//!
//! ## Architecture
//! ```text
//! schedule(job) ──► mpsc::UnboundedSender ──► [queue] ──► drain() on "live-data-delivery"
//!                                                           │
//!                                                           ├─► run_job(job)   (panic isolated)
//!                                                           └─► token.cancelled() → exit
//! ```
//!
//! ## Rules
//! - **FIFO**: jobs run in the order they were scheduled, one at a time.
//! - **Non-blocking schedule**: `schedule()` never waits (unbounded queue).
//! - **Shutdown**: `shutdown()` cancels the loop; jobs still queued are dropped,
//!   so anybody blocked in a write on this loop gets
//!   [`LiveDataError::DeliveryAborted`](crate::LiveDataError::DeliveryAborted).
//! - **Blocking from jobs**: jobs run inside a tokio runtime, so they must not
//!   block on *another* loop; use `post` there.

use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::scheduler::{DeliveryScheduler, Job, run_job};
use crate::config::DeliveryConfig;
use crate::error::LiveDataError;

/// A named OS thread acting as the delivery thread.
///
/// ### Properties
/// - **Shared**: hand out `Arc<DeliveryLoop>` to every live data using it.
/// - **Cooperative stop**: dropping the last handle cancels the loop but does
///   not join; call [`shutdown`](DeliveryLoop::shutdown) to join.
pub struct DeliveryLoop {
    tx: mpsc::UnboundedSender<Job>,
    token: CancellationToken,
    thread_id: ThreadId,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl DeliveryLoop {
    /// Starts a loop with [`DeliveryConfig::default`].
    pub fn spawn() -> Result<Arc<Self>, LiveDataError> {
        Self::with_config(DeliveryConfig::default())
    }

    /// Starts a loop on a new thread named `cfg.thread_name`.
    ///
    /// ### Errors
    /// [`LiveDataError::Spawn`] if the runtime or the thread cannot be created.
    pub fn with_config(cfg: DeliveryConfig) -> Result<Arc<Self>, LiveDataError> {
        let runtime = tokio::runtime::Builder::new_current_thread().build()?;
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let token = CancellationToken::new();
        let loop_token = token.clone();

        let join = std::thread::Builder::new()
            .name(cfg.thread_name.clone())
            .spawn(move || runtime.block_on(drain(rx, loop_token)))?;
        let thread_id = join.thread().id();
        tracing::debug!(thread = %cfg.thread_name, "delivery loop started");

        Ok(Arc::new(Self {
            tx,
            token,
            thread_id,
            join: Mutex::new(Some(join)),
        }))
    }

    /// Returns true once the loop stopped accepting jobs.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.tx.is_closed()
    }

    /// Stops the loop and waits for the thread to exit.
    ///
    /// The job currently running finishes; queued jobs are dropped.
    /// Called from the delivery thread itself, only cancels (no self-join).
    pub fn shutdown(&self) {
        self.token.cancel();
        if self.is_delivery_thread() {
            return;
        }
        let handle = self.join.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("delivery thread terminated by panic");
            }
        }
    }
}

impl DeliveryScheduler for DeliveryLoop {
    fn schedule(&self, job: Job) -> Result<(), LiveDataError> {
        if self.token.is_cancelled() {
            return Err(LiveDataError::SchedulerClosed);
        }
        self.tx.send(job).map_err(|_| LiveDataError::SchedulerClosed)
    }

    fn is_delivery_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }
}

impl Drop for DeliveryLoop {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Drains the queue until cancelled or every sender is gone.
async fn drain(mut rx: mpsc::UnboundedReceiver<Job>, token: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            job = rx.recv() => match job {
                Some(job) => run_job(job),
                None => break,
            }
        }
    }
    rx.close();
    tracing::debug!("delivery loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::run_blocking;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_jobs_run_in_fifo_order_on_loop_thread() {
        let lp = DeliveryLoop::spawn().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..50 {
            let seen = Arc::clone(&seen);
            lp.schedule(Box::new(move || seen.lock().push(i))).unwrap();
        }
        let handle = Arc::clone(&lp);
        let on_loop = run_blocking(&*lp, move || handle.is_delivery_thread()).unwrap();
        assert!(on_loop);
        assert!(!lp.is_delivery_thread());
        assert_eq!(*seen.lock(), (0..50).collect::<Vec<_>>());
        lp.shutdown();
    }

    #[test]
    fn test_thread_is_named_from_config() {
        let lp = DeliveryLoop::with_config(DeliveryConfig {
            thread_name: "custom-delivery".into(),
        })
        .unwrap();
        let name = run_blocking(&*lp, || std::thread::current().name().map(str::to_owned)).unwrap();
        assert_eq!(name.as_deref(), Some("custom-delivery"));
        lp.shutdown();
    }

    #[test]
    fn test_panicking_job_does_not_stop_loop() {
        let lp = DeliveryLoop::spawn().unwrap();
        lp.schedule(Box::new(|| panic!("job failure"))).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        run_blocking(&*lp, move || c.fetch_add(1, Ordering::SeqCst)).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        lp.shutdown();
    }

    #[test]
    fn test_schedule_after_shutdown_fails() {
        let lp = DeliveryLoop::spawn().unwrap();
        lp.shutdown();
        assert!(lp.is_closed());
        let err = lp.schedule(Box::new(|| {})).unwrap_err();
        assert!(matches!(err, LiveDataError::SchedulerClosed));
        let err = run_blocking(&*lp, || ()).unwrap_err();
        assert!(matches!(err, LiveDataError::SchedulerClosed));
    }

    #[test]
    fn test_panicking_blocking_job_reports_aborted() {
        let lp = DeliveryLoop::spawn().unwrap();
        let err = run_blocking(&*lp, || -> u8 { panic!("inside") }).unwrap_err();
        assert!(matches!(err, LiveDataError::DeliveryAborted));
        lp.shutdown();
    }

    #[tokio::test]
    async fn test_blocking_refused_inside_runtime() {
        let lp = DeliveryLoop::spawn().unwrap();
        let err = run_blocking(&*lp, || ()).unwrap_err();
        assert!(matches!(err, LiveDataError::BlockingInAsyncContext));
        let v = crate::delivery::run_async(&*lp, || 7).await.unwrap();
        assert_eq!(v, 7);
        lp.shutdown();
    }
}
