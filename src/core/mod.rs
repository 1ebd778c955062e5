//! Live data core: value cell, subscriber bookkeeping and dispatch.
//!
//! The only public API from this module is [`EventLiveData`] (with its
//! builder, attach/detach outcomes and [`Subscription`]).
//!
//! Internal modules:
//! - [`cell`]: versioned value with sticky replay state;
//! - [`wrapper`]: per-observer activation and delivered version;
//! - [`registry`]: insertion-ordered subscribers, safe to grow mid-sweep;
//! - [`dispatch`]: reentrancy-safe fan-out and activation bookkeeping;
//! - [`gateway`]: `set` / `set_async` / `post` from any thread;
//! - [`live_data`]: attach/detach protocol and the public handle.

mod builder;
mod cell;
mod dispatch;
mod gateway;
mod live_data;
mod registry;
mod subscription;
mod wrapper;

pub use builder::EventLiveDataBuilder;
pub use live_data::{Attach, EventLiveData, Removal};
pub use subscription::Subscription;
