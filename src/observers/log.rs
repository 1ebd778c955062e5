//! # LogWriter - delivered-value logger
//!
//! A minimal observer that logs every delivered value through `tracing`.
//! Use it for tests and demos.
//!
//! ## Example output
//! ```text
//! INFO event_live_data: [changed] observer="LogWriter" value=42
//! ```

use std::fmt::Debug;

use crate::observers::Observer;

/// Value logging observer.
#[derive(Debug, Clone, Copy)]
pub struct LogWriter {
    label: &'static str,
}

impl LogWriter {
    /// Construct a new [`LogWriter`] with the default label.
    #[must_use]
    pub fn new() -> Self {
        Self { label: "LogWriter" }
    }

    /// Construct a [`LogWriter`] whose log lines carry `label`.
    #[must_use]
    pub fn labeled(label: &'static str) -> Self {
        Self { label }
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug + 'static> Observer<T> for LogWriter {
    fn on_changed(&self, value: &T) {
        tracing::info!(observer = self.label, value = ?value, "[changed]");
    }

    fn name(&self) -> &'static str {
        self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_is_observer_name() {
        let default = LogWriter::default();
        let labeled = LogWriter::labeled("audit");
        assert_eq!(Observer::<u8>::name(&default), "LogWriter");
        assert_eq!(Observer::<u8>::name(&labeled), "audit");
        Observer::<Vec<u8>>::on_changed(&labeled, &vec![1, 2]);
    }
}
