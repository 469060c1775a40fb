//! Expiry notifier configuration.

use serde::{Deserialize, Serialize};

/// Expiry notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Whether to enable keyspace events and run the receive loop.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Value written to `notify-keyspace-events`.
    #[serde(default = "default_keyspace_events")]
    pub keyspace_events: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keyspace_events: default_keyspace_events(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_keyspace_events() -> String {
    "KEA".to_string()
}
