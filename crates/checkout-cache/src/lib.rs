//! # checkout-cache
//!
//! Reservation store implementations for the checkout service. Supports two
//! providers:
//!
//! - **redis**: Redis-backed store using the [redis](https://crates.io/crates/redis) crate,
//!   with keyspace notifications for expiry events
//! - **memory**: in-process store with per-key deadlines and expiry events,
//!   for single-node runs and tests
//!
//! The provider is selected at runtime based on configuration.

#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::StoreManager;
