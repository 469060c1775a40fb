//! In-memory reservation store.

pub mod store;

pub use store::MemoryReservationStore;
