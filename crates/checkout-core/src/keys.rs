//! Key builders for every key and channel the service touches.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

/// Namespace used for reservations unless configured otherwise.
pub const DEFAULT_NAMESPACE: &str = "checkout";

// ── Reservation keys ───────────────────────────────────────

/// Key holding the reservation of `resource_id` in `namespace`.
pub fn resource_key(namespace: &str, resource_id: &str) -> String {
    format!("{namespace}:{resource_id}")
}

/// Splits a reservation key back into its resource id, if it belongs to
/// `namespace`.
pub fn resource_id<'a>(namespace: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(namespace)?.strip_prefix(':')
}

// ── Keyspace event channels ────────────────────────────────

/// Pattern matching the `expired` keyevent channel of a logical database.
pub fn expired_event_pattern(database: i64) -> String {
    format!("__keyevent@{database}__:expired")
}
