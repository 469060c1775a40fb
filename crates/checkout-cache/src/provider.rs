//! Store manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use checkout_core::config::store::StoreConfig;
use checkout_core::error::AppError;
use checkout_core::events::ExpiryStream;
use checkout_core::result::AppResult;
use checkout_core::traits::store::{BatchedEntry, ReservationStore};

/// Store manager that wraps the configured reservation store.
///
/// The provider is selected at construction time based on configuration.
/// A single manager is created by the entry point and shared (cloned) by
/// the reservation service and the expiry notifier.
#[derive(Debug, Clone)]
pub struct StoreManager {
    /// The inner store.
    inner: Arc<dyn ReservationStore>,
    /// Logical database whose keyevent channel carries expirations.
    database: i64,
}

impl StoreManager {
    /// Create a new store manager from configuration.
    pub async fn new(config: &StoreConfig) -> AppResult<Self> {
        let (inner, database): (Arc<dyn ReservationStore>, i64) = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis reservation store");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                let database = client.database();
                (
                    Arc::new(crate::redis::RedisReservationStore::new(client)),
                    database,
                )
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory reservation store");
                (Arc::new(crate::memory::MemoryReservationStore::new()), 0)
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner, database })
    }

    /// Logical database index of the store.
    pub fn database(&self) -> i64 {
        self.database
    }
}

#[async_trait]
impl ReservationStore for StoreManager {
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        self.inner.set_nx_ex(key, value, ttl).await
    }

    async fn set_nx_keep_ttl(&self, key: &str, value: &str) -> AppResult<bool> {
        self.inner.set_nx_keep_ttl(key, value).await
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn ttl(&self, key: &str) -> AppResult<i64> {
        self.inner.ttl(key).await
    }

    async fn get_with_ttl(&self, key: &str) -> AppResult<BatchedEntry> {
        self.inner.get_with_ttl(key).await
    }

    async fn enable_expiry_events(&self, flags: &str) -> AppResult<()> {
        self.inner.enable_expiry_events(flags).await
    }

    async fn psubscribe(&self, pattern: &str) -> AppResult<ExpiryStream> {
        self.inner.psubscribe(pattern).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
