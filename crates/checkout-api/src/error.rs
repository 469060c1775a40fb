//! Maps service results to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use checkout_core::result::AppResult;
use checkout_core::types::response::ResponseEnvelope;

/// Response envelope sent with its own `status` as the HTTP status code.
#[derive(Debug, Clone)]
pub struct Envelope<T>(pub ResponseEnvelope<T>);

impl<T> Envelope<T> {
    /// Failed envelope with an explicit status.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self(ResponseEnvelope::error(status.as_u16(), message))
    }
}

impl<T> From<AppResult<T>> for Envelope<T> {
    fn from(result: AppResult<T>) -> Self {
        if let Err(e) = &result {
            if !e.kind.is_client_error() {
                tracing::error!(kind = %e.kind, error = %e.message, "Request failed");
            }
        }
        Self(result.into())
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}
