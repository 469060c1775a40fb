//! Redis reservation store.

pub mod client;
pub mod operations;
pub mod pubsub;

pub use client::RedisClient;
pub use operations::RedisReservationStore;
