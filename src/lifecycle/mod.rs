//! Lifecycle collaborator: owning contexts that gate delivery.
//!
//! The core never drives lifecycles itself. It asks an owner for its
//! [`LifecycleState`], registers a [`LifecycleObserver`] to hear about
//! changes, and derives activation with [`should_be_active`].
//!
//! ## Contents
//! - [`LifecycleState`] ordered states, `Destroyed` lowest
//! - [`LifecycleOwner`] / [`LifecycleObserver`] the collaborator traits
//! - [`LifecycleRegistry`] a ready-made owner driven by explicit state moves
//!
//! ## Activation rule
//! ```text
//! active = (active_forever && state != Destroyed) || state >= Started
//! ```

mod owner;
mod registry;
mod state;

pub use owner::{LifecycleObserver, LifecycleOwner};
pub use registry::LifecycleRegistry;
pub use state::{LifecycleState, should_be_active};

pub(crate) use owner::{OwnerRef, owner_key};
