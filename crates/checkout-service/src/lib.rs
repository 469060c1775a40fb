//! # checkout-service
//!
//! Business logic for the checkout reservation service.
//!
//! - [`ReservationService`]: acquire a time-bounded reservation and query
//!   how long it has left.
//! - [`ExpiryNotifier`]: turn store key expirations into calls to
//!   [`ExpiryHook`]s from a background task.
//!
//! Services follow constructor injection: the store handle is created by
//! the entry point and passed in as an `Arc`.

pub mod expiry;
pub mod reservation;

#[cfg(test)]
mod testing;

pub use expiry::{ExpiryHook, ExpiryNotifier, LoggingHook, LoopExit, NotifierHandle};
pub use reservation::ReservationService;
