//! Application state shared across all handlers.

use std::sync::Arc;

use checkout_core::traits::store::ReservationStore;
use checkout_service::ReservationService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Reservation service
    pub reservations: Arc<ReservationService>,
    /// Store handle, used for health checks
    pub store: Arc<dyn ReservationStore>,
}

impl AppState {
    /// Creates the state from the reservation service and its store.
    pub fn new(reservations: Arc<ReservationService>, store: Arc<dyn ReservationStore>) -> Self {
        Self {
            reservations,
            store,
        }
    }
}
