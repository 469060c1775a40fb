//! Scriptable store fake for unit tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use checkout_core::error::{AppError, ErrorKind};
use checkout_core::events::ExpiryStream;
use checkout_core::result::AppResult;
use checkout_core::traits::store::{BatchedEntry, ReservationStore};

/// Store whose replies are fixed up front. Records the calls it receives.
#[derive(Debug, Default)]
pub struct ScriptedStore {
    pub fail_sentinel: bool,
    pub fail_set: bool,
    /// Reply to `get_with_ttl`; `None` fails the batch.
    pub batch: Option<BatchedEntry>,
    /// Reply to `ttl`; `None` fails the query.
    pub ttl_reply: Option<i64>,
    pub fail_events: bool,
    pub fail_subscribe: bool,
    pub(crate) calls: Mutex<Vec<&'static str>>,
}

impl ScriptedStore {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn unreachable() -> AppError {
        AppError::store("Redis error: connection refused")
    }
}

#[async_trait]
impl ReservationStore for ScriptedStore {
    async fn set_nx_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<bool> {
        self.record("set_nx_ex");
        if self.fail_set {
            return Err(Self::unreachable());
        }
        Ok(true)
    }

    async fn set_nx_keep_ttl(&self, _key: &str, _value: &str) -> AppResult<bool> {
        self.record("set_nx_keep_ttl");
        if self.fail_sentinel {
            return Err(Self::unreachable());
        }
        Ok(true)
    }

    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        self.record("get");
        Ok(self.batch.as_ref().map(|b| b.value.clone()))
    }

    async fn ttl(&self, _key: &str) -> AppResult<i64> {
        self.record("ttl");
        self.ttl_reply.ok_or_else(Self::unreachable)
    }

    async fn get_with_ttl(&self, _key: &str) -> AppResult<BatchedEntry> {
        self.record("get_with_ttl");
        self.batch
            .clone()
            .ok_or_else(|| AppError::not_found("Pipeline execution failed"))
    }

    async fn enable_expiry_events(&self, _flags: &str) -> AppResult<()> {
        self.record("enable_expiry_events");
        if self.fail_events {
            return Err(AppError::configuration("ERR Invalid argument"));
        }
        Ok(())
    }

    async fn psubscribe(&self, _pattern: &str) -> AppResult<ExpiryStream> {
        self.record("psubscribe");
        if self.fail_subscribe {
            return Err(AppError::new(ErrorKind::Subscription, "connection reset"));
        }
        // Subscription that closes immediately.
        Ok(futures::stream::empty().boxed())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_overrides_keep_call_log() {
        let store = ScriptedStore {
            fail_set: true,
            ..ScriptedStore::default()
        };
        assert!(store.set_nx_ex("k", "v", Duration::from_secs(1)).await.is_err());
        assert!(store.set_nx_keep_ttl("s", "").await.unwrap());
        assert_eq!(store.calls(), vec!["set_nx_ex", "set_nx_keep_ttl"]);
    }
}
