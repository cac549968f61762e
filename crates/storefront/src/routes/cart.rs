//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Every handler returns the
//! updated cart with per-line selection and cart-stage totals.

use axum::extract::State;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use gallery_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::services::CartService;
use crate::services::cart::CartView;
use crate::state::AppState;

/// Body for `POST /api/cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    /// Signed quantity change; defaults to 1.
    #[serde(default = "default_delta")]
    pub quantity: i64,
}

const fn default_delta() -> i64 {
    1
}

/// Body for `PUT /api/cart/items/{id}`.
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

/// Body for the selection routes.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub selected: bool,
}

/// `GET /api/cart`
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let service = CartService::new(&session, &state.config().pricing);
    let cart = service.load().await?;
    Ok(Json(service.view(&cart)))
}

/// `DELETE /api/cart`
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let service = CartService::new(&session, &state.config().pricing);
    let cart = service.clear().await?;
    Ok(Json(service.view(&cart)))
}

/// `POST /api/cart/items`
///
/// Adds `quantity` to the line, creating it from the current catalog entry
/// if absent. Stock is not checked here; checkout does that.
#[instrument(skip(state, session))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let product = ProductRepository::new(state.pool())
        .get(input.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    let service = CartService::new(&session, &state.config().pricing);
    let cart = service.add(&product, input.quantity).await?;
    Ok(Json(service.view(&cart)))
}

/// `PUT /api/cart/items/{id}`
#[instrument(skip(state, session))]
pub async fn set_quantity(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Json(input): Json<SetQuantityRequest>,
) -> Result<Json<CartView>> {
    let service = CartService::new(&session, &state.config().pricing);
    let cart = service.set_quantity(id, input.quantity).await?;
    Ok(Json(service.view(&cart)))
}

/// `DELETE /api/cart/items/{id}`
#[instrument(skip(state, session))]
pub async fn remove_item(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let service = CartService::new(&session, &state.config().pricing);
    let cart = service.remove(id).await?;
    Ok(Json(service.view(&cart)))
}

/// `PUT /api/cart/items/{id}/selected`
#[instrument(skip(state, session))]
pub async fn select_item(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Json(input): Json<SelectRequest>,
) -> Result<Json<CartView>> {
    let service = CartService::new(&session, &state.config().pricing);
    let cart = service.select(id, input.selected).await?;
    Ok(Json(service.view(&cart)))
}

/// `PUT /api/cart/selection`
#[instrument(skip(state, session))]
pub async fn select_all(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<SelectRequest>,
) -> Result<Json<CartView>> {
    let service = CartService::new(&session, &state.config().pricing);
    let cart = service.select_all(input.selected).await?;
    Ok(Json(service.view(&cart)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_item_quantity_defaults_to_one() {
        let input: AddItemRequest = serde_json::from_str(r#"{"product_id": 4}"#).unwrap();
        assert_eq!(input.product_id, ProductId::new(4));
        assert_eq!(input.quantity, 1);

        let input: AddItemRequest =
            serde_json::from_str(r#"{"product_id": 4, "quantity": -2}"#).unwrap();
        assert_eq!(input.quantity, -2);
    }
}
