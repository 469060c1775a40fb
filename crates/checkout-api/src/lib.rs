//! # checkout-api
//!
//! HTTP API layer for the checkout service built on Axum.
//!
//! A thin adapter: binds JSON requests, calls [`ReservationService`], and
//! turns each result into a response envelope whose `status` is also the
//! HTTP status code.
//!
//! [`ReservationService`]: checkout_service::ReservationService

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use state::AppState;
