//! Reservation handlers.

use axum::extract::{Path, State};

use checkout_core::types::status::{CheckoutInfo, StatusInfo};

use crate::dto::CheckoutRequest;
use crate::error::Envelope;
use crate::extractors::EnvelopeJson;
use crate::state::AppState;

/// POST /checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    EnvelopeJson(req): EnvelopeJson<CheckoutRequest>,
) -> Envelope<CheckoutInfo> {
    state.reservations.acquire(&req.id, req.expire).await.into()
}

/// GET /checkout/{id}
pub async fn get_checkout(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Envelope<StatusInfo> {
    let reservations = &state.reservations;
    reservations
        .query_status(reservations.namespace(), &id)
        .await
        .into()
}
