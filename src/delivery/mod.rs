//! Delivery thread: the single place where writes, fan-out and attach/detach
//! mutations run.
//!
//! This module groups the **scheduler contract** the core consumes and two
//! ready-made implementations of it.
//!
//! ## Contents
//! - [`DeliveryScheduler`] the collaborator trait (`schedule`, `is_delivery_thread`)
//! - [`DeliveryLoop`] dedicated OS thread draining a FIFO job queue
//! - [`ManualScheduler`] jobs run when the owning thread pumps them
//! - [`run_blocking`] / [`run_async`] run a closure on the delivery thread and wait
//!
//! ## Quick reference
//! ```text
//! foreign thread ── schedule(job) ──► [FIFO queue] ──► delivery thread ──► job()
//!                                                         │
//!                                                         └─ panics are caught and logged
//! ```

mod event_loop;
mod manual;
mod scheduler;

pub use event_loop::DeliveryLoop;
pub use manual::ManualScheduler;
pub use scheduler::{DeliveryScheduler, Job, run_async, run_blocking};

pub(crate) use scheduler::panic_message;
