//! Redis reservation store implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use checkout_core::error::{AppError, ErrorKind};
use checkout_core::events::ExpiryStream;
use checkout_core::result::AppResult;
use checkout_core::traits::store::{BatchedEntry, ReservationStore};

use super::client::RedisClient;
use super::pubsub;

/// Redis-backed reservation store.
#[derive(Debug, Clone)]
pub struct RedisReservationStore {
    /// Redis client.
    client: RedisClient,
}

impl RedisReservationStore {
    /// Create a new Redis reservation store.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Store, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl ReservationStore for RedisReservationStore {
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();

        // SET key value EX ttl NX
        let result: Option<String> = redis::cmd("SET")
            .arg(&full_key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs())
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(result.is_some())
    }

    async fn set_nx_keep_ttl(&self, key: &str, value: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();

        // SET key value NX KEEPTTL
        let result: Option<String> = redis::cmd("SET")
            .arg(&full_key)
            .arg(value)
            .arg("NX")
            .arg("KEEPTTL")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(result.is_some())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: Option<String> = conn.get(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn ttl(&self, key: &str) -> AppResult<i64> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: i64 = conn.ttl(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn get_with_ttl(&self, key: &str) -> AppResult<BatchedEntry> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();

        let (value, ttl): (Option<String>, i64) = redis::pipe()
            .get(&full_key)
            .ttl(&full_key)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        match value {
            Some(value) => Ok(BatchedEntry { value, ttl }),
            None => {
                debug!(key = %full_key, "Pipeline GET returned nil");
                Err(AppError::not_found(format!(
                    "Pipeline execution failed: nil reply for '{key}'"
                )))
            }
        }
    }

    async fn enable_expiry_events(&self, flags: &str) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        let _: () = redis::cmd("CONFIG")
            .arg("SET")
            .arg("notify-keyspace-events")
            .arg(flags)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("CONFIG SET notify-keyspace-events failed: {e}"),
                    e,
                )
            })?;
        Ok(())
    }

    async fn psubscribe(&self, pattern: &str) -> AppResult<ExpiryStream> {
        pubsub::psubscribe(&self.client, pattern).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}
