//! # Subscribers of an [`EventLiveData`](crate::EventLiveData).
//!
//! This module provides the [`Observer`] trait, a closure-backed
//! implementation, and the per-owner [`AutoDetachSet`] helper.
//!
//! ## Architecture
//! ```text
//! write(v) ──► dispatch ──► consider_notify(wrapper) ──► Observer::on_changed(&v)
//!                                                            │
//!                                              ┌─────────────┼─────────────┐
//!                                              ▼             ▼             ▼
//!                                          ObserverFn     LogWriter      Custom
//! ```
//!
//! ## Implementing custom observers
//! ```
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use event_live_data::Observer;
//!
//! struct Counter(AtomicU64);
//!
//! impl Observer<u32> for Counter {
//!     fn on_changed(&self, value: &u32) {
//!         self.0.fetch_add(u64::from(*value), Ordering::Relaxed);
//!     }
//!     fn name(&self) -> &'static str { "counter" }
//! }
//! ```

mod auto_detach;
mod observer;
mod observer_fn;

#[cfg(feature = "logging")]
mod log;

pub use auto_detach::{AutoDetachSet, Detach};
pub use observer::Observer;
pub use observer_fn::ObserverFn;

#[cfg(feature = "logging")]
pub use log::LogWriter;

pub(crate) use observer::observer_key;
