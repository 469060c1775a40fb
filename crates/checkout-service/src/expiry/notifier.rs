//! Background receiver for key expiration events.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use checkout_core::config::notifier::NotifierConfig;
use checkout_core::error::{AppError, ErrorKind};
use checkout_core::events::{ExpiryEvent, ExpiryStream};
use checkout_core::keys;
use checkout_core::result::AppResult;
use checkout_core::traits::store::ReservationStore;

use super::hook::{ExpiryHook, LoggingHook};

/// Why the receive loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// Cancelled through its handle.
    Cancelled,
    /// The subscription failed or closed. Not reconnected.
    SubscriptionFailed(String),
    /// The task panicked or was aborted.
    Aborted(String),
}

/// Subscribes to the store's expired-key channel and forwards every event
/// to the registered hooks.
#[derive(Debug)]
pub struct ExpiryNotifier {
    store: Arc<dyn ReservationStore>,
    database: i64,
    /// Reservation namespace, used by the fallback logging hook.
    namespace: String,
    config: NotifierConfig,
    hooks: Vec<Arc<dyn ExpiryHook>>,
}

impl ExpiryNotifier {
    /// Creates a notifier for `database` of `store`.
    pub fn new(
        store: Arc<dyn ReservationStore>,
        database: i64,
        namespace: impl Into<String>,
        config: &NotifierConfig,
    ) -> Self {
        Self {
            store,
            database,
            namespace: namespace.into(),
            config: config.clone(),
            hooks: Vec::new(),
        }
    }

    /// Register a hook. Without any, expirations are only logged.
    pub fn with_hook(mut self, hook: Arc<dyn ExpiryHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Hook used when none is registered.
    fn fallback_hook(&self) -> LoggingHook {
        LoggingHook::new(self.namespace.clone())
    }

    /// Enable keyspace events, subscribe, and spawn the receive loop.
    ///
    /// Returns once the subscription is established. Errors here mean no
    /// loop was started.
    pub async fn start(self) -> AppResult<NotifierHandle> {
        let flags = self.config.keyspace_events.as_str();
        if let Err(e) = self.store.enable_expiry_events(flags).await {
            error!(flags, error = %e, "Unable to set keyspace events");
            return Err(AppError::with_source(
                ErrorKind::Configuration,
                format!("Unable to set keyspace events: {}", e.message),
                e,
            ));
        }

        let pattern = keys::expired_event_pattern(self.database);
        let events = self.store.psubscribe(&pattern).await.map_err(|e| {
            error!(pattern = %pattern, error = %e, "Expiry subscription failed");
            e
        })?;

        let hooks = if self.hooks.is_empty() {
            vec![Arc::new(self.fallback_hook()) as Arc<dyn ExpiryHook>]
        } else {
            self.hooks
        };

        info!(
            pattern = %pattern,
            hooks = hooks.len(),
            "Expiry notifier started"
        );

        let cancel = CancellationToken::new();
        let task = tokio::spawn(receive_loop(events, hooks, cancel.clone()));
        Ok(NotifierHandle { cancel, task })
    }
}

async fn receive_loop(
    mut events: ExpiryStream,
    hooks: Vec<Arc<dyn ExpiryHook>>,
    cancel: CancellationToken,
) -> LoopExit {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Expiry notifier cancelled");
                return LoopExit::Cancelled;
            }
            next = events.next() => next,
        };

        match next {
            Some(Ok(event)) => dispatch(&hooks, &event).await,
            Some(Err(e)) => {
                error!(error = %e, "Expiry subscription read failed");
                return LoopExit::SubscriptionFailed(e.message);
            }
            None => {
                error!("Expiry subscription closed");
                return LoopExit::SubscriptionFailed("subscription closed".to_string());
            }
        }
    }
}

async fn dispatch(hooks: &[Arc<dyn ExpiryHook>], event: &ExpiryEvent) {
    debug!(key = %event.key, channel = %event.channel, "Expiry event received");
    for hook in hooks {
        if let Err(e) = hook.on_expired(event).await {
            warn!(hook = hook.name(), key = %event.key, error = %e, "Expiry hook failed");
        }
    }
}

/// Handle to a running receive loop.
#[derive(Debug)]
pub struct NotifierHandle {
    cancel: CancellationToken,
    task: JoinHandle<LoopExit>,
}

impl NotifierHandle {
    /// Whether the loop is still receiving.
    pub fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }

    /// Ask the loop to stop. Does not wait.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that stops the loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the loop to stop on its own or through [`cancel`](Self::cancel).
    pub async fn wait(self) -> LoopExit {
        match self.task.await {
            Ok(exit) => exit,
            Err(e) => LoopExit::Aborted(e.to_string()),
        }
    }

    /// Cancel and wait.
    pub async fn shutdown(self) -> LoopExit {
        self.cancel();
        self.wait().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::testing::ScriptedStore;
    use checkout_cache::memory::MemoryReservationStore;

    #[derive(Debug, Default)]
    struct RecordingHook {
        seen: Mutex<Vec<String>>,
    }

    impl RecordingHook {
        fn keys(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExpiryHook for RecordingHook {
        async fn on_expired(&self, event: &ExpiryEvent) -> AppResult<()> {
            self.seen.lock().unwrap().push(event.key.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[derive(Debug)]
    struct FailingHook;

    #[async_trait]
    impl ExpiryHook for FailingHook {
        async fn on_expired(&self, _event: &ExpiryEvent) -> AppResult<()> {
            Err(AppError::internal("hook exploded"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn memory_notifier(store: &MemoryReservationStore) -> ExpiryNotifier {
        ExpiryNotifier::new(Arc::new(store.clone()), 0, "checkout", &NotifierConfig::default())
    }

    /// Let timers fire and spawned tasks drain.
    async fn settle() {
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_reservation_reaches_hook_once() {
        let store = MemoryReservationStore::new();
        let hook = Arc::new(RecordingHook::default());
        let handle = memory_notifier(&store)
            .with_hook(hook.clone())
            .start()
            .await
            .unwrap();

        store
            .set_nx_ex("checkout:order-42", "order-42", Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;

        assert_eq!(hook.keys(), vec!["checkout:order-42".to_string()]);
        assert!(handle.is_alive());
        assert_eq!(handle.shutdown().await, LoopExit::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enabling_twice_does_not_duplicate() {
        let store = MemoryReservationStore::new();
        store.enable_expiry_events("KEA").await.unwrap();

        let hook = Arc::new(RecordingHook::default());
        let handle = memory_notifier(&store)
            .with_hook(hook.clone())
            .start()
            .await
            .unwrap();

        store
            .set_nx_ex("checkout:a", "a", Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;

        assert_eq!(hook.keys().len(), 1);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_hook_does_not_stop_later_hooks() {
        let store = MemoryReservationStore::new();
        let hook = Arc::new(RecordingHook::default());
        let handle = memory_notifier(&store)
            .with_hook(Arc::new(FailingHook))
            .with_hook(hook.clone())
            .start()
            .await
            .unwrap();

        for id in ["x", "y"] {
            store
                .set_nx_ex(&format!("checkout:{id}"), id, Duration::from_secs(1))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;

        let mut keys = hook.keys();
        keys.sort();
        assert_eq!(keys, vec!["checkout:x", "checkout:y"]);
        assert!(handle.is_alive());
        handle.shutdown().await;
    }

    #[test]
    fn test_fallback_hook_uses_configured_namespace() {
        let store = MemoryReservationStore::new();
        let notifier =
            ExpiryNotifier::new(Arc::new(store), 0, "cart", &NotifierConfig::default());

        let hook = notifier.fallback_hook();
        assert_eq!(hook.namespace(), "cart");
        assert_eq!(hook.name(), "logging");
    }

    #[tokio::test]
    async fn test_invalid_flags_start_nothing() {
        let store = MemoryReservationStore::new();
        let config = NotifierConfig {
            keyspace_events: "KEQ".to_string(),
            ..NotifierConfig::default()
        };
        let err = ExpiryNotifier::new(Arc::new(store), 0, "checkout", &config)
            .start()
            .await
            .unwrap_err();

        assert!(err.is(ErrorKind::Configuration));
        assert!(err.message.starts_with("Unable to set keyspace events: "));
    }

    #[tokio::test]
    async fn test_subscribe_failure_is_returned() {
        let store = Arc::new(ScriptedStore {
            fail_subscribe: true,
            ..ScriptedStore::default()
        });
        let err = ExpiryNotifier::new(store.clone(), 0, "checkout", &NotifierConfig::default())
            .start()
            .await
            .unwrap_err();

        assert!(err.is(ErrorKind::Subscription));
        assert_eq!(store.calls(), vec!["enable_expiry_events", "psubscribe"]);
    }

    #[tokio::test]
    async fn test_events_failure_skips_subscribe() {
        let store = Arc::new(ScriptedStore {
            fail_events: true,
            ..ScriptedStore::default()
        });
        let result = ExpiryNotifier::new(store.clone(), 0, "checkout", &NotifierConfig::default())
            .start()
            .await;

        assert!(result.is_err());
        assert_eq!(store.calls(), vec!["enable_expiry_events"]);
    }

    #[tokio::test]
    async fn test_closed_subscription_ends_loop() {
        let store = Arc::new(ScriptedStore::default());
        let handle = ExpiryNotifier::new(store, 0, "checkout", &NotifierConfig::default())
            .start()
            .await
            .unwrap();

        assert!(matches!(handle.wait().await, LoopExit::SubscriptionFailed(_)));
    }

    #[tokio::test]
    async fn test_cancel_stops_loop() {
        let store = MemoryReservationStore::new();
        let handle = memory_notifier(&store).start().await.unwrap();

        let token = handle.cancellation_token();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
        assert_eq!(handle.wait().await, LoopExit::Cancelled);
    }
}
