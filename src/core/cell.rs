//! # Versioned value cell with sticky replay state.
//!
//! Holds the current value (or nothing), a version counter bumped once per
//! accepted write, and the bookkeeping of the configured [`StickyMode`].
//! It knows nothing about subscribers: the dispatch engine tells it when a
//! delivery happened and when the outermost dispatch of a write is over.
//!
//! ## Write protocol
//! ```text
//! begin_write(v)     version += 1, value = v, arm sticky state, open_writes += 1
//!   └─► dispatch     (engine fans out; after_delivery() per delivery)
//! finish_writes()    at the end of the outermost dispatch:
//!                      NoSticky            → clear
//!                      SendOnce, disarmed  → clear
//! ```
//!
//! ## Rules
//! - `version` starts at [`START_VERSION`] and only grows.
//! - StickyCount credits are consumed by attaches
//!   ([`consume_attach_credit`](VersionedCell::consume_attach_credit)); a
//!   delivery clears the value once no credit is left.
//! - SendOnce: a delivery during an open write only disarms; a delivery
//!   outside any write disarms and clears.
//! - StickyForever never clears.
//! - [`read`](VersionedCell::read) is a lock-free atomic load; it may be stale
//!   when called off the delivery thread.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::config::StickyMode;

/// Version of a cell (and of a subscriber) that has seen no write yet.
pub(crate) const START_VERSION: i64 = -1;

struct CellMeta {
    version: i64,
    mode: StickyMode,
    remaining: i64,
    send_once_armed: bool,
    open_writes: u32,
}

/// Current value, version and sticky state of one live data.
pub(crate) struct VersionedCell<T> {
    value: ArcSwapOption<T>,
    meta: Mutex<CellMeta>,
}

impl<T> VersionedCell<T> {
    pub(crate) fn new(mode: StickyMode) -> Self {
        Self {
            value: ArcSwapOption::empty(),
            meta: Mutex::new(CellMeta {
                version: START_VERSION,
                mode,
                remaining: 0,
                send_once_armed: false,
                open_writes: 0,
            }),
        }
    }

    /// Stores `value`, bumps the version and arms the sticky state.
    ///
    /// Must be followed by a dispatch whose end calls
    /// [`finish_writes`](Self::finish_writes).
    pub(crate) fn begin_write(&self, value: T) -> i64 {
        let mut meta = self.meta.lock();
        meta.version += 1;
        self.value.store(Some(Arc::new(value)));
        meta.open_writes += 1;
        match meta.mode {
            StickyMode::StickyCount(n) => meta.remaining = i64::from(n.get()),
            StickyMode::SendOnce => meta.send_once_armed = true,
            StickyMode::NoSticky | StickyMode::StickyForever => {}
        }
        meta.version
    }

    /// Applies post-write clearing for every write whose dispatch just ended.
    pub(crate) fn finish_writes(&self) {
        let mut meta = self.meta.lock();
        if meta.open_writes == 0 {
            return;
        }
        meta.open_writes = 0;
        match meta.mode {
            StickyMode::NoSticky => self.value.store(None),
            StickyMode::SendOnce if !meta.send_once_armed => self.value.store(None),
            _ => {}
        }
    }

    /// Bookkeeping after one successful delivery to any subscriber.
    pub(crate) fn after_delivery(&self) {
        let mut meta = self.meta.lock();
        match meta.mode {
            StickyMode::StickyCount(_) if meta.remaining < 1 => self.value.store(None),
            StickyMode::SendOnce if meta.send_once_armed => {
                meta.send_once_armed = false;
                if meta.open_writes == 0 {
                    self.value.store(None);
                }
            }
            _ => {}
        }
    }

    /// A first-time attach takes one replay credit, delivered or not.
    pub(crate) fn consume_attach_credit(&self) {
        let mut meta = self.meta.lock();
        if let StickyMode::StickyCount(_) = meta.mode {
            meta.remaining -= 1;
        }
    }

    /// Version and value, if a value is present.
    pub(crate) fn current(&self) -> Option<(i64, Arc<T>)> {
        let meta = self.meta.lock();
        self.value.load_full().map(|v| (meta.version, v))
    }

    /// Best-effort, lock-free read of the value.
    pub(crate) fn read(&self) -> Option<Arc<T>> {
        self.value.load_full()
    }

    pub(crate) fn version(&self) -> i64 {
        self.meta.lock().version
    }

    #[cfg(test)]
    pub(crate) fn mode(&self) -> StickyMode {
        self.meta.lock().mode
    }

    #[cfg(test)]
    pub(crate) fn remaining_credits(&self) -> i64 {
        self.meta.lock().remaining
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.meta.lock().send_once_armed
    }
}
