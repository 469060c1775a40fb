//! Request and response bodies.

pub mod request;
pub mod response;

pub use request::CheckoutRequest;
pub use response::HealthResponse;
