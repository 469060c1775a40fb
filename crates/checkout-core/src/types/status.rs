//! Reservation payloads and TTL interpretation.

use serde::{Deserialize, Serialize};

/// TTL reply for a key that does not exist.
pub const TTL_MISSING: i64 = -2;
/// TTL reply for a key that exists without an expiry.
pub const TTL_PERSISTENT: i64 = -1;

/// Interpretation of a raw `TTL` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlStatus {
    /// The key does not exist.
    Missing,
    /// The key exists but has no associated expire.
    Persistent,
    /// Seconds left before the key is removed.
    Remaining(i64),
}

impl TtlStatus {
    /// Classify a raw TTL reply. Any other negative value is treated as
    /// missing.
    pub fn from_raw(ttl: i64) -> Self {
        match ttl {
            TTL_PERSISTENT => Self::Persistent,
            t if t < 0 => Self::Missing,
            t => Self::Remaining(t),
        }
    }

    /// Human-readable description of the TTL.
    pub fn describe(self) -> String {
        match self {
            Self::Missing => "Key does not exist.".to_string(),
            Self::Persistent => "Key exists but has no associated expire.".to_string(),
            Self::Remaining(secs) => format!("Remaining {secs} (in seconds)"),
        }
    }
}

/// Payload of a successful acquire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutInfo {
    /// Effective hold time in seconds, after clamping.
    pub ttl: i64,
    /// Confirmation echoed from the store.
    pub value: String,
}

/// Payload of a successful status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    /// Remaining seconds, or `-1` when the key has no expiry.
    pub ttl: i64,
    /// Stored value; only present when the batched read succeeded.
    pub value: Option<String>,
    /// Human-readable description of `ttl`.
    pub description: String,
}

impl StatusInfo {
    /// Build a status from a raw TTL reply and optional stored value.
    pub fn new(ttl: i64, value: Option<String>) -> Self {
        Self {
            ttl,
            value,
            description: TtlStatus::from_raw(ttl).describe(),
        }
    }
}
