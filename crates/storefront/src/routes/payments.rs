//! Payment route handlers.
//!
//! The client opens a provider order, the buyer approves it in the
//! provider's hosted widget, and the client then asks us to capture it.

use axum::{
    extract::State,
    http::StatusCode,
};
use tower_sessions::Session;
use tracing::instrument;

use gallery_core::checkout::OrderReceipt;

use crate::error::Result;
use crate::extract::{Json, Path};
use crate::services::checkout::{CheckoutService, PaymentOrderView, PgCheckoutStore};
use crate::state::AppState;

/// `POST /api/payments/orders`
#[instrument(skip(state, session))]
pub async fn create_order(
    State(state): State<AppState>,
    session: Session,
) -> Result<(StatusCode, Json<PaymentOrderView>)> {
    let store = PgCheckoutStore::new(state.pool());
    let service = CheckoutService::new(&session, state.paypal(), &store, &state.config().pricing);
    let order = service.create_payment().await?;
    tracing::info!(provider_order_id = %order.provider_order_id, "payment order created");
    Ok((StatusCode::CREATED, Json(order)))
}

/// `POST /api/payments/orders/{provider_order_id}/capture`
#[instrument(skip(state, session))]
pub async fn capture(
    State(state): State<AppState>,
    session: Session,
    Path(provider_order_id): Path<String>,
) -> Result<Json<OrderReceipt>> {
    let store = PgCheckoutStore::new(state.pool());
    let service = CheckoutService::new(&session, state.paypal(), &store, &state.config().pricing);
    Ok(Json(service.capture(&provider_order_id).await?))
}
