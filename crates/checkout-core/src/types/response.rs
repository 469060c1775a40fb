//! Uniform response envelope handed to transports.

use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// Status code reported for successful operations.
pub const STATUS_OK: u16 = 200;

/// Transport-agnostic result shape: a status code, an optional payload,
/// and an optional error message. Exactly one of `data`/`error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    /// HTTP-style status code.
    pub status: u16,
    /// Payload of a successful operation.
    pub data: Option<T>,
    /// Message of a failed operation.
    pub error: Option<String>,
}

impl<T> ResponseEnvelope<T> {
    /// Successful envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            status: STATUS_OK,
            data: Some(data),
            error: None,
        }
    }

    /// Failed envelope with an explicit status.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Whether the envelope carries a payload.
    pub fn is_ok(&self) -> bool {
        self.data.is_some()
    }
}

impl<T> From<AppResult<T>> for ResponseEnvelope<T> {
    fn from(result: AppResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::error(err.kind.http_status(), err.message),
        }
    }
}
