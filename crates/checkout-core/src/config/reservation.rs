//! Reservation key layout.

use serde::{Deserialize, Serialize};

/// Reservation namespace and heartbeat key settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfig {
    /// Namespace prefixed to every reservation key (`<namespace>:<id>`).
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Sentinel key refreshed on every acquire.
    #[serde(default = "default_sentinel_key")]
    pub sentinel_key: String,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            sentinel_key: default_sentinel_key(),
        }
    }
}

fn default_namespace() -> String {
    "checkout".to_string()
}

fn default_sentinel_key() -> String {
    "checkout".to_string()
}
