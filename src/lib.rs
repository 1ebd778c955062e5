//! # event-live-data
//!
//! **event-live-data** is an observable value for Rust with versioned,
//! single-thread delivery and configurable replay ("sticky") semantics.
//!
//! Writers on any thread publish values; observers receive them on one
//! delivery thread, in version order, without duplicates. Observers can be
//! bound to a lifecycle owner (delivered to only while the owner is active,
//! detached when it is destroyed) or attached forever.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   writer thread A      writer thread B        lifecycle owner
//!   set(v) / post(v)     set_async(v)           set_state(..)
//!         │                   │                       │
//!         ▼                   ▼                       ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  DeliveryScheduler (DeliveryLoop thread | ManualScheduler)        │
//! │  FIFO job queue, one job at a time                                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventLiveData (delivery thread only mutates)                     │
//! │  - VersionedCell   (value, version, sticky state)                 │
//! │  - SubscriberRegistry (insertion ordered, grows mid-sweep)        │
//! │  - Dispatch engine (dispatching / invalidated retry loop)         │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   wrapper #1         wrapper #2         wrapper #3
//!   (forever)          (owner bound)      (owner bound, inactive)
//!        │                  │                  ✗ suppressed
//!        ▼                  ▼
//!   obs.on_changed()   obs.on_changed()
//! ```
//!
//! ### Write
//! ```text
//! set(v) ──► delivery thread ──► version += 1, value = v
//!   └─► for wrapper in registry (in attach order):
//!         ├─ inactive                     ─► skip
//!         ├─ owner says inactive now      ─► deactivate, skip
//!         ├─ already has this version     ─► skip
//!         └─ deliver; sticky bookkeeping
//!       nested write during the sweep     ─► sweep restarts
//!   └─► NoSticky / spent SendOnce         ─► value cleared
//! ```
//!
//! ## Features
//! | Area               | Description                                                  | Key types / traits                              |
//! |--------------------|--------------------------------------------------------------|-------------------------------------------------|
//! | **Live data**      | Observable value, attach/detach, writes from any thread.     | [`EventLiveData`], [`Attach`], [`Removal`]      |
//! | **Replay**         | Sticky modes for late subscribers.                           | [`StickyMode`], [`LiveDataConfig`]              |
//! | **Delivery**       | Single delivery thread, or a manually pumped one.            | [`DeliveryLoop`], [`ManualScheduler`]           |
//! | **Lifecycle**      | Owner states gating activation.                              | [`LifecycleOwner`], [`LifecycleRegistry`]       |
//! | **Observers**      | Closure observers and scoped auto-detach.                    | [`Observer`], [`ObserverFn`], [`AutoDetachSet`] |
//! | **Errors**         | One typed error for every fallible call.                     | [`LiveDataError`]                               |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] observer _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use event_live_data::{
//!     DeliveryLoop, EventLiveData, LifecycleRegistry, LifecycleState, LiveDataConfig,
//!     ObserverFn, StickyMode,
//! };
//! use parking_lot::Mutex;
//!
//! fn main() -> Result<(), event_live_data::LiveDataError> {
//!     let delivery = DeliveryLoop::spawn()?;
//!     let data: EventLiveData<String> = EventLiveData::with_config(
//!         delivery.clone(),
//!         LiveDataConfig::new(StickyMode::StickyForever, false),
//!     );
//!
//!     let screen = LifecycleRegistry::new(LifecycleState::Created);
//!     let seen = Arc::new(Mutex::new(Vec::new()));
//!     let sink = Arc::clone(&seen);
//!     data.observe(
//!         &screen.as_owner(),
//!         ObserverFn::arc("screen", move |v: &String| sink.lock().push(v.clone())),
//!     )?;
//!
//!     data.set("hello".to_string())?;   // owner not started: held back
//!     screen.set_state(LifecycleState::Started);
//!     data.set("world".to_string())?;   // also a barrier for the activation above
//!
//!     assert_eq!(*seen.lock(), vec!["hello".to_string(), "world".to_string()]);
//!     delivery.shutdown();
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod delivery;
mod error;
mod lifecycle;
mod observers;

// ---- Public re-exports ----

pub use config::{DeliveryConfig, LiveDataConfig, StickyMode};
pub use self::core::{Attach, EventLiveData, EventLiveDataBuilder, Removal, Subscription};
pub use delivery::{DeliveryLoop, DeliveryScheduler, Job, ManualScheduler, run_async, run_blocking};
pub use error::LiveDataError;
pub use lifecycle::{
    LifecycleObserver, LifecycleOwner, LifecycleRegistry, LifecycleState, should_be_active,
};
pub use observers::{AutoDetachSet, Detach, Observer, ObserverFn};

// Optional: expose a simple built-in logging observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;
