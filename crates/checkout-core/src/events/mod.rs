//! Events observed from the key-value store.

pub mod expiry;

pub use expiry::{ExpiryEvent, ExpiryStream};
