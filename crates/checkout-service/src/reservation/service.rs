//! Acquire and status lookup for time-bounded reservations.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use checkout_core::config::reservation::ReservationConfig;
use checkout_core::error::{AppError, ErrorKind};
use checkout_core::keys;
use checkout_core::result::AppResult;
use checkout_core::traits::store::ReservationStore;
use checkout_core::types::status::{CheckoutInfo, StatusInfo, TtlStatus};

/// Shortest hold a reservation can have, in seconds.
pub const MIN_TTL_SECONDS: i64 = 1;

/// Reservation service.
///
/// Stateless: the store is the only source of truth, and exclusivity comes
/// from its atomic set-if-absent. Safe to call concurrently from any number
/// of tasks.
#[derive(Debug, Clone)]
pub struct ReservationService {
    /// Shared store handle.
    store: Arc<dyn ReservationStore>,
    /// Namespace and sentinel key.
    config: ReservationConfig,
}

impl ReservationService {
    /// Creates a new reservation service.
    pub fn new(store: Arc<dyn ReservationStore>, config: ReservationConfig) -> Self {
        Self { store, config }
    }

    /// Namespace reservations are created in.
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Hold time actually applied for a requested TTL.
    pub fn effective_ttl(ttl_seconds: i64) -> i64 {
        ttl_seconds.max(MIN_TTL_SECONDS)
    }

    /// Reserve `resource_id` for `ttl_seconds` (clamped to at least one
    /// second).
    ///
    /// Fails with [`ErrorKind::Contention`] while another reservation for
    /// the same id is live, and with [`ErrorKind::Store`] when the store
    /// cannot be reached. Never retries.
    pub async fn acquire(&self, resource_id: &str, ttl_seconds: i64) -> AppResult<CheckoutInfo> {
        let ttl = Self::effective_ttl(ttl_seconds);
        let key = keys::resource_key(&self.config.namespace, resource_id);

        self.refresh_sentinel().await;

        let created = self
            .store
            .set_nx_ex(&key, resource_id, Duration::from_secs(ttl as u64))
            .await
            .map_err(|e| {
                warn!(key = %key, error = %e, "Checkout failed");
                AppError::with_source(e.kind, format!("Checkout error : {}", e.message), e)
            })?;

        if !created {
            info!(key = %key, "Checkout rejected: reservation is live");
            return Err(AppError::contention(format!(
                "'{resource_id}' is already checked out"
            )));
        }

        info!(key = %key, ttl_seconds = ttl, "Checkout created");
        Ok(CheckoutInfo {
            ttl,
            value: format!("Set checkout ID : {created}"),
        })
    }

    /// Remaining hold time of `resource_id` in `namespace`.
    ///
    /// Reads value and TTL in one batch; if the batch fails for any reason
    /// (an absent key included) falls back to a single TTL query.
    pub async fn query_status(&self, namespace: &str, resource_id: &str) -> AppResult<StatusInfo> {
        let key = keys::resource_key(namespace, resource_id);

        match self.store.get_with_ttl(&key).await {
            Ok(entry) => {
                debug!(key = %key, ttl = entry.ttl, "Batched status read");
                return Ok(StatusInfo::new(entry.ttl, Some(entry.value)));
            }
            Err(e) => {
                debug!(key = %key, error = %e, "Batched read failed, falling back to TTL");
            }
        }

        let ttl = self.store.ttl(&key).await.map_err(|e| {
            if e.is(ErrorKind::NotFound) {
                AppError::not_found(format!("'{resource_id}' has no reservation"))
            } else {
                warn!(key = %key, error = %e, "TTL query failed");
                AppError::with_source(e.kind, format!("Get TTL error : {}", e.message), e)
            }
        })?;

        match TtlStatus::from_raw(ttl) {
            TtlStatus::Missing => Err(AppError::not_found(format!(
                "'{resource_id}' has no reservation"
            ))),
            _ => Ok(StatusInfo::new(ttl, None)),
        }
    }

    /// Heartbeat on the sentinel key. Outcomes are logged, never surfaced.
    async fn refresh_sentinel(&self) {
        let sentinel = &self.config.sentinel_key;
        match self.store.set_nx_keep_ttl(sentinel, "").await {
            Ok(true) => debug!(key = %sentinel, "Sentinel key set"),
            Ok(false) => debug!(key = %sentinel, "Sentinel key already present"),
            Err(e) => warn!(key = %sentinel, error = %e, "Sentinel refresh failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStore;
    use checkout_cache::memory::MemoryReservationStore;
    use checkout_core::traits::store::BatchedEntry;

    fn service_over(store: Arc<dyn ReservationStore>) -> ReservationService {
        ReservationService::new(store, ReservationConfig::default())
    }

    fn memory_service() -> (ReservationService, MemoryReservationStore) {
        let store = MemoryReservationStore::new();
        (service_over(Arc::new(store.clone())), store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_acquire_is_contention() {
        let (service, _) = memory_service();

        let info = service.acquire("order-42", 2).await.unwrap();
        assert_eq!(info.value, "Set checkout ID : true");
        assert_eq!(info.ttl, 2);

        let err = service.acquire("order-42", 5).await.unwrap_err();
        assert!(err.is(ErrorKind::Contention));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_positive_ttl_clamped_to_one() {
        let (service, store) = memory_service();

        for (i, requested) in [0, -1, -3600, i64::MIN].into_iter().enumerate() {
            let id = format!("clamp-{i}");
            let info = service.acquire(&id, requested).await.unwrap();
            assert_eq!(info.ttl, 1);
            assert_eq!(store.ttl(&format!("checkout:{id}")).await.unwrap(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_after_acquire_reports_remaining() {
        let (service, _) = memory_service();
        service.acquire("order-7", 10).await.unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;

        let status = service.query_status("checkout", "order-7").await.unwrap();
        assert!(status.ttl > 0 && status.ttl <= 10);
        assert_eq!(status.value.as_deref(), Some("order-7"));
        assert!(status.description.starts_with("Remaining "));
        assert!(status.description.ends_with("(in seconds)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkout_scenario() {
        let (service, _) = memory_service();

        service.acquire("order-42", 2).await.unwrap();
        let err = service.acquire("order-42", 5).await.unwrap_err();
        assert!(err.is(ErrorKind::Contention));

        tokio::time::sleep(Duration::from_secs(3)).await;

        let err = service.query_status("checkout", "order-42").await.unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
        let err = service.query_status("checkout", "order-99").await.unwrap_err();
        assert!(err.is(ErrorKind::NotFound));

        // Expired reservations can be taken again.
        service.acquire("order-42", 5).await.unwrap();
    }

    #[tokio::test]
    async fn test_huge_ttl_rejected_by_store() {
        let (service, _) = memory_service();

        let err = service.acquire("order-big", i64::MAX).await.unwrap_err();
        assert!(err.is(ErrorKind::Store));
        assert!(err.message.starts_with("Checkout error : "));

        // Nothing was reserved.
        let err = service.query_status("checkout", "order-big").await.unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_sentinel_set_without_expiry() {
        let (service, store) = memory_service();
        service.acquire("order-1", 30).await.unwrap();
        assert_eq!(store.ttl("checkout").await.unwrap(), -1);
        // A second acquire leaves the sentinel in place.
        service.acquire("order-2", 30).await.unwrap();
        assert_eq!(store.get("checkout").await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_sentinel_failure_not_surfaced() {
        let store = ScriptedStore {
            fail_sentinel: true,
            ..ScriptedStore::default()
        };
        let service = service_over(Arc::new(store));
        assert!(service.acquire("order-1", 5).await.is_ok());
    }

    #[tokio::test]
    async fn test_store_failure_on_acquire() {
        let store = ScriptedStore {
            fail_set: true,
            ..ScriptedStore::default()
        };
        let service = service_over(Arc::new(store));

        let err = service.acquire("order-1", 5).await.unwrap_err();
        assert!(err.is(ErrorKind::Store));
        assert!(err.message.starts_with("Checkout error : "));
        assert!(err.kind.is_client_error());
    }

    #[tokio::test]
    async fn test_batch_success_skips_fallback() {
        let store = Arc::new(ScriptedStore {
            batch: Some(BatchedEntry {
                value: "order-5".to_string(),
                ttl: 8,
            }),
            ..ScriptedStore::default()
        });
        let service = service_over(store.clone());

        let status = service.query_status("checkout", "order-5").await.unwrap();
        assert_eq!(status.ttl, 8);
        assert_eq!(status.description, "Remaining 8 (in seconds)");
        assert_eq!(store.calls(), vec!["get_with_ttl"]);
    }

    #[tokio::test]
    async fn test_batch_failure_falls_back_to_ttl() {
        let store = Arc::new(ScriptedStore {
            ttl_reply: Some(-1),
            ..ScriptedStore::default()
        });
        let service = service_over(store.clone());

        let status = service.query_status("checkout", "order-5").await.unwrap();
        assert_eq!(status.ttl, -1);
        assert_eq!(status.value, None);
        assert_eq!(status.description, "Key exists but has no associated expire.");
        assert_eq!(store.calls(), vec!["get_with_ttl", "ttl"]);
    }

    #[tokio::test]
    async fn test_fallback_store_failure() {
        let store = ScriptedStore {
            ttl_reply: None,
            ..ScriptedStore::default()
        };
        let service = service_over(Arc::new(store));

        let err = service.query_status("checkout", "order-5").await.unwrap_err();
        assert!(err.is(ErrorKind::Store));
        assert!(err.message.starts_with("Get TTL error : "));
    }

    #[tokio::test]
    async fn test_query_uses_given_namespace() {
        let (service, store) = memory_service();
        store
            .set_nx_ex("cart:abc", "abc", Duration::from_secs(20))
            .await
            .unwrap();

        let status = service.query_status("cart", "abc").await.unwrap();
        assert_eq!(status.value.as_deref(), Some("abc"));
        assert!(service.query_status("checkout", "abc").await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_acquires_have_one_winner() {
        let (service, _) = memory_service();

        let attempts = (0..16).map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.acquire("hot-item", 30).await })
        });
        let results = futures::future::join_all(attempts).await;

        let winners = results
            .into_iter()
            .map(|joined| joined.unwrap())
            .filter(Result::is_ok)
            .count();
        assert_eq!(winners, 1);
    }
}
