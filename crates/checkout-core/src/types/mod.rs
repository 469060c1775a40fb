//! Core type definitions used across the checkout workspace.

pub mod response;
pub mod status;

pub use response::ResponseEnvelope;
pub use status::{CheckoutInfo, StatusInfo, TtlStatus};
