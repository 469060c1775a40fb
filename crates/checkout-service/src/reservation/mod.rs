//! Time-bounded reservations.

pub mod service;

pub use service::ReservationService;
