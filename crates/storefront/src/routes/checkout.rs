//! Checkout route handlers.

use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use gallery_core::checkout::OrderReceipt;

use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::services::checkout::{CheckoutService, CheckoutView, PgCheckoutStore};
use crate::state::AppState;

/// `POST /api/checkout`
///
/// Freezes the selected cart lines into the checkout snapshot.
#[instrument(skip(state, session))]
pub async fn proceed(State(state): State<AppState>, session: Session) -> Result<Json<CheckoutView>> {
    let store = PgCheckoutStore::new(state.pool());
    let service = CheckoutService::new(&session, state.paypal(), &store, &state.config().pricing);
    Ok(Json(service.proceed().await?))
}

/// `GET /api/checkout`
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CheckoutView>> {
    let store = PgCheckoutStore::new(state.pool());
    let service = CheckoutService::new(&session, state.paypal(), &store, &state.config().pricing);
    Ok(Json(service.current().await?))
}

/// `GET /api/checkout/last-order`
#[instrument(skip(state, session))]
pub async fn last_order(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<OrderReceipt>> {
    let store = PgCheckoutStore::new(state.pool());
    let service = CheckoutService::new(&session, state.paypal(), &store, &state.config().pricing);
    service
        .last_order()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
}
