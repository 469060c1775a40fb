//! Request DTOs.

use serde::{Deserialize, Serialize};

/// Body of `POST /checkout`.
///
/// Absent fields take their zero value, so a body without `expire` asks for
/// the shortest possible hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutRequest {
    /// Resource to reserve.
    pub id: String,
    /// Requested hold time in seconds.
    pub expire: i64,
}
