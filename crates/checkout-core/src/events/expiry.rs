//! Key expiry notifications.

use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::keys;
use crate::result::AppResult;

/// A single key expiration reported by the store.
///
/// Delivered at most once per expiration and only to subscribers that are
/// actively receiving when the key lapses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryEvent {
    /// Channel the event was published on (e.g. `__keyevent@0__:expired`).
    pub channel: String,
    /// The expired key.
    pub key: String,
    /// When the subscriber received the event.
    pub received_at: DateTime<Utc>,
}

impl ExpiryEvent {
    /// Create an event received now.
    pub fn new(channel: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            key: key.into(),
            received_at: Utc::now(),
        }
    }

    /// Resource id of the expired reservation, if the key is in `namespace`.
    pub fn resource_id(&self, namespace: &str) -> Option<&str> {
        keys::resource_id(namespace, &self.key)
    }
}

/// Stream of expiry events from a pattern subscription.
///
/// An `Err` item is a failed read; the stream ending means the
/// subscription connection is gone.
pub type ExpiryStream = BoxStream<'static, AppResult<ExpiryEvent>>;
