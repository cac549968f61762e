//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog (writes require an admin token)
//! GET    /api/artworks                  - Artwork listing
//! POST   /api/artworks                  - Create artwork
//! GET    /api/artworks/{id}             - Artwork detail
//! PUT    /api/artworks/{id}             - Update artwork
//! DELETE /api/artworks/{id}             - Delete artwork
//! POST   /api/artworks/{id}/like        - Like an artwork
//! GET    /api/categories[/{id}]         - Categories (POST, PUT, DELETE as above)
//! GET    /api/products[/{id}]           - Products (POST, PUT; no delete)
//!
//! # Orders (reads require any token, writes an admin token)
//! GET    /api/orders[/{id}]
//! POST   /api/orders                    - Manual order entry
//! PUT    /api/orders/{id}
//! DELETE /api/orders/{id}
//!
//! # Auth
//! POST   /api/auth/login                - Email + password → token (rate limited)
//!
//! # Cart (session, rate limited)
//! GET    /api/cart                      - Cart with totals
//! DELETE /api/cart                      - Empty the cart
//! POST   /api/cart/items                - Add {product_id, quantity?}
//! PUT    /api/cart/items/{id}           - Set {quantity}
//! DELETE /api/cart/items/{id}           - Remove line
//! PUT    /api/cart/items/{id}/selected  - Select one {selected}
//! PUT    /api/cart/selection            - Select all {selected}
//!
//! # Checkout (session)
//! POST   /api/checkout                  - Snapshot selected lines
//! GET    /api/checkout                  - Snapshot, totals and state
//! GET    /api/checkout/last-order       - Receipt of the last completed order
//! POST   /api/payments/orders           - Open a provider order
//! POST   /api/payments/orders/{provider_order_id}/capture
//! ```

pub mod artworks;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod orders;
pub mod payments;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the artwork routes router.
pub fn artwork_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(artworks::index).post(artworks::create))
        .route(
            "/{id}",
            get(artworks::show)
                .put(artworks::update)
                .delete(artworks::destroy),
        )
        .route("/{id}/like", post(artworks::like))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route(
            "/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::destroy),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/{id}", get(products::show).put(products::update))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route(
            "/{id}",
            get(orders::show).put(orders::update).delete(orders::destroy),
        )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter())
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            put(cart::set_quantity).delete(cart::remove_item),
        )
        .route("/items/{id}/selected", put(cart::select_item))
        .route("/selection", put(cart::select_all))
        .layer(api_rate_limiter())
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::proceed))
        .route("/last-order", get(checkout::last_order))
        .layer(api_rate_limiter())
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(payments::create_order))
        .route(
            "/orders/{provider_order_id}/capture",
            post(payments::capture),
        )
        .layer(api_rate_limiter())
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/artworks", artwork_routes())
        .nest("/api/categories", category_routes())
        .nest("/api/products", product_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/auth", auth_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/checkout", checkout_routes())
        .nest("/api/payments", payment_routes())
}
