//! Store trait for the key-value backend that holds reservations.

use std::time::Duration;

use async_trait::async_trait;

use crate::events::ExpiryStream;
use crate::result::AppResult;

/// Value and TTL fetched together in one round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchedEntry {
    /// Stored value.
    pub value: String,
    /// Raw TTL reply for the same key.
    pub ttl: i64,
}

/// Operations the reservation core needs from a key-value store with
/// native expiry and expiry notifications.
///
/// Implementations must be safe for concurrent use from many tasks; the
/// service shares a single instance and performs no locking of its own.
/// The store is responsible for key prefixing.
#[async_trait]
pub trait ReservationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Set `key` to `value` with an expiry, only if the key is absent.
    /// Returns `true` if the value was set, `false` if the key already existed.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool>;

    /// Set `key` to `value` only if absent, keeping any existing expiry
    /// (`SET NX KEEPTTL`). Returns `true` if the value was set.
    async fn set_nx_keep_ttl(&self, key: &str, value: &str) -> AppResult<bool>;

    /// Get a value by key. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Raw TTL reply: `-2` absent, `-1` no expiry, otherwise seconds left.
    async fn ttl(&self, key: &str) -> AppResult<i64>;

    /// Fetch value and TTL as a single batch.
    ///
    /// The batch fails as a whole: an absent key is reported as an error
    /// rather than an empty entry, with no per-command detail.
    async fn get_with_ttl(&self, key: &str) -> AppResult<BatchedEntry>;

    /// Turn on server-side keyspace event publication with the given flags.
    /// Idempotent.
    async fn enable_expiry_events(&self, flags: &str) -> AppResult<()>;

    /// Subscribe to every channel matching `pattern`. Keys in the returned
    /// events have the store's key prefix removed.
    async fn psubscribe(&self, pattern: &str) -> AppResult<ExpiryStream>;

    /// Check that the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
