//! # Construction-time configuration.
//!
//! Provides [`LiveDataConfig`] (per live data instance) and [`DeliveryConfig`]
//! (per [`DeliveryLoop`](crate::DeliveryLoop)). Both are fixed at creation and
//! never change afterwards.
//!
//! ## Sticky modes
//! ```text
//! NoSticky        value is dropped right after the write is dispatched
//! StickyForever   value stays until overwritten; every new subscriber gets it once
//! SendOnce        value is consumed by the first delivery round, then dropped
//! StickyCount(n)  the first n attaches after a write may still receive it
//! ```
//!
//! The classic integer encoding (`-2`, `-1`, `0`, `n > 0`) is accepted by
//! [`StickyMode::from_raw`].

use std::num::NonZeroU32;

use crate::error::LiveDataError;

/// Replay policy for values written before a subscriber attaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StickyMode {
    /// Only subscribers active at write time see the value.
    NoSticky,
    /// The value is kept until overwritten (default).
    StickyForever,
    /// The value is delivered to one delivery round, then cleared.
    SendOnce,
    /// The first `n` attaches after a write may receive the value.
    StickyCount(NonZeroU32),
}

impl StickyMode {
    /// Raw encoding of [`StickyMode::SendOnce`].
    pub const RAW_SEND_ONCE: i32 = -2;
    /// Raw encoding of [`StickyMode::StickyForever`].
    pub const RAW_STICKY_FOREVER: i32 = -1;
    /// Raw encoding of [`StickyMode::NoSticky`].
    pub const RAW_NO_STICKY: i32 = 0;

    /// Decodes the classic integer encoding.
    ///
    /// # Example
    /// ```
    /// use event_live_data::StickyMode;
    ///
    /// assert_eq!(StickyMode::from_raw(-1).unwrap(), StickyMode::StickyForever);
    /// assert!(matches!(StickyMode::from_raw(3).unwrap(), StickyMode::StickyCount(n) if n.get() == 3));
    /// assert!(StickyMode::from_raw(-5).is_err());
    /// ```
    pub fn from_raw(raw: i32) -> Result<Self, LiveDataError> {
        match raw {
            Self::RAW_SEND_ONCE => Ok(StickyMode::SendOnce),
            Self::RAW_STICKY_FOREVER => Ok(StickyMode::StickyForever),
            Self::RAW_NO_STICKY => Ok(StickyMode::NoSticky),
            n if n > 0 => NonZeroU32::new(n.unsigned_abs())
                .map(StickyMode::StickyCount)
                .ok_or(LiveDataError::InvalidStickyCount { raw }),
            _ => Err(LiveDataError::InvalidStickyCount { raw }),
        }
    }

    /// Returns the classic integer encoding of this mode.
    pub fn as_raw(&self) -> i32 {
        match self {
            StickyMode::SendOnce => Self::RAW_SEND_ONCE,
            StickyMode::StickyForever => Self::RAW_STICKY_FOREVER,
            StickyMode::NoSticky => Self::RAW_NO_STICKY,
            StickyMode::StickyCount(n) => i32::try_from(n.get()).unwrap_or(i32::MAX),
        }
    }

    /// Convenience constructor; `0` maps to [`StickyMode::NoSticky`].
    pub fn count(n: u32) -> Self {
        NonZeroU32::new(n).map_or(StickyMode::NoSticky, StickyMode::StickyCount)
    }
}

impl Default for StickyMode {
    /// Returns [`StickyMode::StickyForever`].
    fn default() -> Self {
        StickyMode::StickyForever
    }
}

/// Per-instance configuration of an [`EventLiveData`](crate::EventLiveData).
///
/// ## Field semantics
/// - `sticky`: replay policy for late subscribers
/// - `active_forever`: lifecycle-bound subscribers count as active in every
///   state except destroyed (`true`), or only from started on (`false`)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveDataConfig {
    /// Replay policy.
    pub sticky: StickyMode,
    /// Whether lifecycle-bound subscribers stay active below `Started`.
    pub active_forever: bool,
}

impl LiveDataConfig {
    /// Creates a config from a sticky mode and the active-forever flag.
    pub fn new(sticky: StickyMode, active_forever: bool) -> Self {
        Self {
            sticky,
            active_forever,
        }
    }

    /// Same as [`LiveDataConfig::new`], from the classic integer encoding.
    pub fn from_raw(raw_sticky: i32, active_forever: bool) -> Result<Self, LiveDataError> {
        Ok(Self::new(StickyMode::from_raw(raw_sticky)?, active_forever))
    }
}

impl Default for LiveDataConfig {
    /// Default configuration:
    ///
    /// - `sticky = StickyMode::StickyForever`
    /// - `active_forever = true`
    fn default() -> Self {
        Self {
            sticky: StickyMode::default(),
            active_forever: true,
        }
    }
}

/// Configuration of a [`DeliveryLoop`](crate::DeliveryLoop) thread.
#[derive(Clone, Debug)]
pub struct DeliveryConfig {
    /// OS thread name of the delivery thread.
    pub thread_name: String,
}

impl Default for DeliveryConfig {
    /// `thread_name = "live-data-delivery"`.
    fn default() -> Self {
        Self {
            thread_name: "live-data-delivery".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_round_trip_for_named_modes() {
        for mode in [
            StickyMode::NoSticky,
            StickyMode::StickyForever,
            StickyMode::SendOnce,
            StickyMode::count(4),
        ] {
            assert_eq!(StickyMode::from_raw(mode.as_raw()).unwrap(), mode);
        }
    }

    #[test]
    fn test_invalid_raw_is_rejected() {
        let err = StickyMode::from_raw(-3).unwrap_err();
        assert!(matches!(err, LiveDataError::InvalidStickyCount { raw: -3 }));
    }

    #[test]
    fn test_count_zero_is_no_sticky() {
        assert_eq!(StickyMode::count(0), StickyMode::NoSticky);
    }

    #[test]
    fn test_defaults_match_classic_behavior() {
        let cfg = LiveDataConfig::default();
        assert_eq!(cfg.sticky, StickyMode::StickyForever);
        assert!(cfg.active_forever);
        assert_eq!(DeliveryConfig::default().thread_name, "live-data-delivery");
    }
}
