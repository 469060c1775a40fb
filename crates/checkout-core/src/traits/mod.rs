//! Core traits defined in `checkout-core` and implemented by other crates.

pub mod store;

pub use store::{BatchedEntry, ReservationStore};
