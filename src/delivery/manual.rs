//! # Caller-pumped scheduler.
//!
//! [`ManualScheduler`] treats the thread that created it as the delivery
//! thread. Jobs scheduled from anywhere are queued until that thread calls
//! [`run_pending`](ManualScheduler::run_pending). Use it to embed live data in
//! an existing event loop, or to drive delivery deterministically in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::ThreadId;

use parking_lot::Mutex;

use super::scheduler::{DeliveryScheduler, Job, run_job};
use crate::error::LiveDataError;

/// Scheduler whose queue is drained explicitly by its owning thread.
pub struct ManualScheduler {
    owner: ThreadId,
    queue: Mutex<VecDeque<Job>>,
    closed: AtomicBool,
}

impl ManualScheduler {
    /// Creates a scheduler owned by the calling thread.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            owner: std::thread::current().id(),
            queue: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Runs queued jobs (including jobs they enqueue) until the queue is empty.
    ///
    /// Returns the number of jobs executed. Does nothing off the owning thread.
    pub fn run_pending(&self) -> usize {
        if !self.is_delivery_thread() {
            tracing::warn!("run_pending called off the owning thread; ignored");
            return 0;
        }
        let mut ran = 0;
        loop {
            let next = self.queue.lock().pop_front();
            let Some(job) = next else { break };
            run_job(job);
            ran += 1;
        }
        ran
    }

    /// Number of jobs waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Rejects further jobs and drops the queued ones.
    pub fn close(&self) {
        let dropped: Vec<Job> = {
            let mut queue = self.queue.lock();
            self.closed.store(true, Ordering::Release);
            queue.drain(..).collect()
        };
        // Jobs may own values with their own drop logic; run it unlocked.
        drop(dropped);
    }
}

impl DeliveryScheduler for ManualScheduler {
    fn schedule(&self, job: Job) -> Result<(), LiveDataError> {
        let mut queue = self.queue.lock();
        // Checked under the queue lock so nothing lands after `close` drained it.
        if self.closed.load(Ordering::Acquire) {
            drop(queue);
            drop(job);
            return Err(LiveDataError::SchedulerClosed);
        }
        queue.push_back(job);
        Ok(())
    }

    fn is_delivery_thread(&self) -> bool {
        std::thread::current().id() == self.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::run_blocking;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_jobs_wait_for_pump() {
        let sched = ManualScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        sched.schedule(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(sched.pending(), 1);
        assert_eq!(sched.run_pending(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_nested_jobs_run_in_same_pump() {
        let sched = ManualScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let (s, h) = (Arc::clone(&sched), Arc::clone(&hits));
        sched
            .schedule(Box::new(move || {
                let h2 = Arc::clone(&h);
                s.schedule(Box::new(move || {
                    h2.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
            }))
            .unwrap();
        assert_eq!(sched.run_pending(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_foreign_thread_blocks_until_pumped() {
        let sched = ManualScheduler::new();
        let remote = Arc::clone(&sched);
        let worker = std::thread::spawn(move || {
            assert!(!remote.is_delivery_thread());
            assert_eq!(remote.run_pending(), 0);
            run_blocking(&*remote, || 11).unwrap()
        });
        while sched.pending() == 0 {
            std::thread::yield_now();
        }
        sched.run_pending();
        assert_eq!(worker.join().unwrap(), 11);
    }

    #[test]
    fn test_close_drops_queue_and_aborts_waiter() {
        let sched = ManualScheduler::new();
        let remote = Arc::clone(&sched);
        let worker = std::thread::spawn(move || run_blocking(&*remote, || ()));
        while sched.pending() == 0 {
            std::thread::yield_now();
        }
        sched.close();
        let err = worker.join().unwrap().unwrap_err();
        assert!(matches!(err, LiveDataError::DeliveryAborted));
        assert!(sched.schedule(Box::new(|| {})).is_err());
    }

    #[test]
    fn test_close_races_with_schedulers() {
        let sched = ManualScheduler::new();
        let accepted = Arc::new(AtomicUsize::new(0));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let sched = Arc::clone(&sched);
                let accepted = Arc::clone(&accepted);
                std::thread::spawn(move || {
                    while sched.schedule(Box::new(|| {})).is_ok() {
                        accepted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        while accepted.load(Ordering::SeqCst) < 100 {
            std::thread::yield_now();
        }
        sched.close();
        for w in workers {
            w.join().unwrap();
        }

        assert_eq!(sched.pending(), 0, "no job may be queued after close");
        assert_eq!(sched.run_pending(), 0);
        assert!(sched.schedule(Box::new(|| {})).is_err());
    }
}
