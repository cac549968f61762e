//! Order route handlers.
//!
//! Paid orders are written by the payment capture flow. `POST /api/orders`
//! is staff manual entry: lines name products and quantities, and prices
//! come from the catalog.

use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
};
use tracing::instrument;

use gallery_core::OrderId;
use gallery_core::cart::LineItem;
use gallery_core::catalog::{NewOrder, Order, OrderLineInput, OrderUpdate, Product};

use crate::db::{ManualOrder, OrderRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::state::AppState;

/// `GET /api/orders`
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderRepository::new(state.pool()).list().await?))
}

/// `GET /api/orders/{id}`
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
}

/// `POST /api/orders`
#[instrument(skip(state, claims, input), fields(user_id = %claims.sub))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Json(input): Json<NewOrder>,
) -> Result<(StatusCode, Json<Order>)> {
    input.validate()?;

    let ids: Vec<_> = input.items.iter().map(|line| line.product_id).collect();
    let products = ProductRepository::new(state.pool()).get_many(&ids).await?;
    let items = price_lines(&input.items, &products)?;
    let totals = state.config().pricing.checkout_totals(&items);

    let order = OrderRepository::new(state.pool())
        .create(&ManualOrder {
            status: input.status,
            customer_name: input.customer_name,
            customer_email: input.customer_email,
            items,
            totals,
        })
        .await?;

    tracing::info!(order_id = %order.id, "manual order created");
    Ok((StatusCode::CREATED, Json(order)))
}

/// `PUT /api/orders/{id}`
#[instrument(skip(state, claims, input), fields(user_id = %claims.sub))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(input): Json<OrderUpdate>,
) -> Result<Json<Order>> {
    input.validate()?;
    let order = OrderRepository::new(state.pool()).update(id, &input).await?;
    Ok(Json(order))
}

/// `DELETE /api/orders/{id}`
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    OrderRepository::new(state.pool()).delete(id).await?;
    tracing::info!(order_id = %id, "order deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Price requested lines from catalog products.
fn price_lines(lines: &[OrderLineInput], products: &[Product]) -> Result<Vec<LineItem>> {
    let by_id: HashMap<_, _> = products.iter().map(|p| (p.id, p)).collect();
    lines
        .iter()
        .map(|line| {
            by_id
                .get(&line.product_id)
                .map(|product| LineItem::from_product(product, line.quantity))
                .ok_or_else(|| {
                    AppError::BadRequest(format!("product {} does not exist", line.product_id))
                })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use gallery_core::ProductId;

    use super::*;

    fn product(id: i32, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Print #{id}"),
            description: String::new(),
            price: Decimal::new(price, 0),
            image_url: None,
            category_id: None,
            stock: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_lines_uses_catalog_prices() {
        let lines = [OrderLineInput {
            product_id: ProductId::new(2),
            quantity: 3,
        }];
        let items = price_lines(&lines, &[product(1, 5), product(2, 12)]).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, Decimal::new(12, 0));
        assert_eq!(items[0].line_total(), Decimal::new(36, 0));
    }

    #[test]
    fn test_price_lines_rejects_unknown_product() {
        let lines = [OrderLineInput {
            product_id: ProductId::new(9),
            quantity: 1,
        }];
        assert!(matches!(
            price_lines(&lines, &[product(1, 5)]),
            Err(AppError::BadRequest(_))
        ));
    }
}
