//! Shared test helpers for HTTP tests.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use checkout_api::{AppState, build_app};
use checkout_cache::memory::MemoryReservationStore;
use checkout_core::config::reservation::ReservationConfig;
use checkout_service::ReservationService;

/// Test application over an in-memory store.
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// The store behind the router, for direct inspection
    pub store: MemoryReservationStore,
}

/// Status and decoded body of a test response.
pub struct TestResponse {
    pub status: StatusCode,
    /// JSON body, or a JSON string when the body is not JSON.
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryReservationStore::new();
        let shared = Arc::new(store.clone());
        let reservations = Arc::new(ReservationService::new(
            shared.clone(),
            ReservationConfig::default(),
        ));
        let router = build_app(AppState::new(reservations, shared));
        Self { router, store }
    }

    /// Send a request with an optional JSON body.
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        match body {
            Some(json) => {
                self.request_raw(method, path, Some("application/json"), json.to_string())
                    .await
            }
            None => self.request_raw(method, path, None, String::new()).await,
        }
    }

    /// Send a request with a raw body and content type.
    pub async fn request_raw(
        &self,
        method: &str,
        path: &str,
        content_type: Option<&str>,
        body: String,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body)).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse { status, body }
    }

    /// Acquire `id` for `expire` seconds.
    pub async fn checkout(&self, id: &str, expire: i64) -> TestResponse {
        self.request(
            "POST",
            "/checkout",
            Some(serde_json::json!({ "id": id, "expire": expire })),
        )
        .await
    }
}
