//! Key-value store configuration.

use serde::{Deserialize, Serialize};

/// Top-level store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store provider type: `"redis"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Redis-specific configuration.
    #[serde(default)]
    pub redis: RedisStoreConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redis: RedisStoreConfig::default(),
        }
    }
}

/// Redis backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStoreConfig {
    /// Redis connection URL, without a database path.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Logical database index. Also selects the keyevent channel
    /// (`__keyevent@<database>__:expired`).
    #[serde(default)]
    pub database: i64,
    /// Prefix applied to every key the service touches.
    #[serde(default)]
    pub key_prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            database: 0,
            key_prefix: String::new(),
        }
    }
}

impl RedisStoreConfig {
    /// Connection URL with the database index appended.
    pub fn connection_url(&self) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), self.database)
    }
}

fn default_provider() -> String {
    "redis".to_string()
}

fn default_redis_url() -> String {
    "redis://redis:6379".to_string()
}
