//! Gallery storefront library.
//!
//! JSON API for the catalog, session cart, checkout and payment capture.
//! The binary in `main.rs` wires it to a listener; tests and tooling use
//! the library directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::from_fn,
    routing::get,
};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router.
///
/// Layers, innermost first: security headers, sessions, request ID, tracing.
/// Sentry layers are added by the binary.
///
/// # Errors
///
/// Returns an error if the session store cannot be configured.
pub fn app(state: AppState) -> Result<Router, middleware::SessionStoreError> {
    let session_layer = middleware::create_session_layer(state.pool(), state.config())?;

    Ok(Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::state::tests::test_state;

    fn request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "198.51.100.7");
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn router() -> Router {
        app(test_state()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(request("GET", "/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_new_visitor_has_empty_cart() {
        let response = router()
            .oneshot(request("GET", "/api/cart", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["item_count"], 0);
        assert_eq!(json["items"], serde_json::json!([]));
        assert_eq!(json["totals"]["shipping"], "0");
    }

    #[tokio::test]
    async fn test_checkout_with_empty_cart_is_rejected() {
        let response = router()
            .oneshot(request("POST", "/api/checkout", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_body(response).await;
        assert_eq!(json["error"], "select at least one item to check out");
    }

    #[tokio::test]
    async fn test_order_writes_require_token() {
        let response = router()
            .oneshot(request("POST", "/api/orders", Some(r#"{"items": []}"#)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_product_delete_route_does_not_exist() {
        let response = router()
            .oneshot(request("DELETE", "/api/products/1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    async fn assert_bad_request(method: &str, uri: &str, body: &str) {
        let response = router()
            .oneshot(request(method, uri, Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let json = json_body(response).await;
        assert!(json["error"].as_str().is_some_and(|msg| !msg.is_empty()));
    }

    #[tokio::test]
    async fn test_non_numeric_path_id_is_json_bad_request() {
        assert_bad_request("PUT", "/api/cart/items/abc", r#"{"quantity": 2}"#).await;
    }

    #[tokio::test]
    async fn test_mistyped_body_field_is_json_bad_request() {
        assert_bad_request("PUT", "/api/cart/items/1", r#"{"quantity": "x"}"#).await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_bad_request() {
        assert_bad_request("PUT", "/api/cart/selection", "not json").await;
    }
}
