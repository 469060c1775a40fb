//! # checkout-core
//!
//! Core crate for the checkout reservation service. Contains the store
//! trait, configuration schemas, key builders, the expiry event type,
//! status/response types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other checkout crates.

pub mod config;
pub mod error;
pub mod events;
pub mod keys;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
