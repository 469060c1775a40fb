//! Callbacks run for each expired key.

use async_trait::async_trait;
use tracing::info;

use checkout_core::events::ExpiryEvent;
use checkout_core::result::AppResult;

/// Reaction to a key expiration.
///
/// Hooks run on the notifier task one at a time, in registration order. A
/// failing hook is logged and does not stop the loop or later hooks.
#[async_trait]
pub trait ExpiryHook: Send + Sync + std::fmt::Debug {
    /// Handle one expired key.
    async fn on_expired(&self, event: &ExpiryEvent) -> AppResult<()>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Default hook: logs each expiration.
#[derive(Debug, Clone)]
pub struct LoggingHook {
    namespace: String,
}

impl LoggingHook {
    /// Creates a hook that reports resource ids of keys in `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Namespace whose keys are reported as reservations.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[async_trait]
impl ExpiryHook for LoggingHook {
    async fn on_expired(&self, event: &ExpiryEvent) -> AppResult<()> {
        match event.resource_id(&self.namespace) {
            Some(resource_id) => info!(
                channel = %event.channel,
                key = %event.key,
                resource_id,
                "Reservation expired"
            ),
            None => info!(channel = %event.channel, key = %event.key, "Key expired"),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "logging"
    }
}
