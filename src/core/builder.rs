use std::sync::Arc;

use super::live_data::{EventLiveData, Hooks, Inner};
use crate::config::{LiveDataConfig, StickyMode};
use crate::delivery::DeliveryScheduler;

/// Builder for an [`EventLiveData`] with optional hooks.
pub struct EventLiveDataBuilder<T> {
    scheduler: Arc<dyn DeliveryScheduler>,
    cfg: LiveDataConfig,
    hooks: Hooks,
    _value: std::marker::PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> EventLiveDataBuilder<T> {
    /// Creates a builder with [`LiveDataConfig::default`].
    pub fn new(scheduler: Arc<dyn DeliveryScheduler>) -> Self {
        Self {
            scheduler,
            cfg: LiveDataConfig::default(),
            hooks: Hooks::default(),
            _value: std::marker::PhantomData,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, cfg: LiveDataConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the replay policy.
    pub fn sticky(mut self, sticky: StickyMode) -> Self {
        self.cfg.sticky = sticky;
        self
    }

    /// Sets whether lifecycle-bound observers stay active below `Started`.
    pub fn active_forever(mut self, active_forever: bool) -> Self {
        self.cfg.active_forever = active_forever;
        self
    }

    /// Called on the delivery thread when the first observer becomes active.
    pub fn on_active(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks.on_active = Some(Arc::new(hook));
        self
    }

    /// Called on the delivery thread when the last active observer goes inactive.
    ///
    /// Hook panics are caught and logged.
    pub fn on_inactive(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks.on_inactive = Some(Arc::new(hook));
        self
    }

    /// Builds the live data. No value is set and no thread is started.
    pub fn build(self) -> EventLiveData<T> {
        tracing::debug!(
            sticky = self.cfg.sticky.as_raw(),
            active_forever = self.cfg.active_forever,
            "live data created"
        );
        EventLiveData::from_inner(Arc::new(Inner::new(self.scheduler, self.cfg, self.hooks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::ManualScheduler;

    #[test]
    fn test_builder_overrides_defaults() {
        let data: EventLiveData<u8> = EventLiveDataBuilder::new(ManualScheduler::new())
            .sticky(StickyMode::SendOnce)
            .active_forever(false)
            .build();
        assert_eq!(data.config(), LiveDataConfig::new(StickyMode::SendOnce, false));
    }

    #[test]
    fn test_panicking_hook_is_contained() {
        let data: EventLiveData<u8> = EventLiveData::builder(ManualScheduler::new())
            .on_active(|| panic!("hook"))
            .build();
        data.observe_forever(crate::ObserverFn::arc("x", |_: &u8| {}))
            .unwrap();
        assert!(data.has_active_observers());
    }
}
