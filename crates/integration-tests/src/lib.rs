//! Integration tests for the Gallery storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and seed a database, create a user, start the server
//! gallery-cli migrate
//! gallery-cli seed crates/cli/seed/catalog.yaml
//! echo "$GALLERY_ADMIN_PASSWORD" | gallery-cli user create -e "$GALLERY_ADMIN_EMAIL" -n Tests -r admin
//! cargo run -p gallery-storefront
//!
//! # Run the ignored tests against it
//! cargo test -p gallery-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `GALLERY_API_URL` - Server base URL (default `http://127.0.0.1:3000`)
//! - `GALLERY_ADMIN_EMAIL` / `GALLERY_ADMIN_PASSWORD` - An admin login
//!
//! Tests that would capture a real payment are not included; capture is
//! covered by the checkout service unit tests with a fake gateway.

use std::str::FromStr;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

const LOGIN_ATTEMPTS: u32 = 5;

/// Base URL for the storefront API.
#[must_use]
pub fn base_url() -> String {
    std::env::var("GALLERY_API_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
}

/// A client that keeps the session cookie, as a browser would.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn visitor() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Admin credentials from the environment.
///
/// # Panics
///
/// Panics if either variable is unset.
#[must_use]
pub fn admin_credentials() -> (String, String) {
    (
        std::env::var("GALLERY_ADMIN_EMAIL").expect("GALLERY_ADMIN_EMAIL not set"),
        std::env::var("GALLERY_ADMIN_PASSWORD").expect("GALLERY_ADMIN_PASSWORD not set"),
    )
}

/// Log in as the admin and return the bearer token.
///
/// Login is rate limited, so a 429 is retried after the refill period.
///
/// # Panics
///
/// Panics if login fails.
pub async fn admin_token(client: &Client) -> String {
    let (email, password) = admin_credentials();
    let mut attempts = 0;
    let resp = loop {
        let resp = client
            .post(format!("{}/api/auth/login", base_url()))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to log in");
        attempts += 1;
        if resp.status() != StatusCode::TOO_MANY_REQUESTS || attempts == LOGIN_ATTEMPTS {
            break resp;
        }
        tokio::time::sleep(Duration::from_secs(6)).await;
    };
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to read login response");
    body["token"]
        .as_str()
        .expect("login response has no token")
        .to_string()
}

/// Create an in-stock product with a unique name and return its JSON.
///
/// # Panics
///
/// Panics if creation fails.
pub async fn create_product(client: &Client, token: &str, price: &str, stock: i32) -> Value {
    let resp = client
        .post(format!("{}/api/products", base_url()))
        .bearer_auth(token)
        .json(&json!({
            "name": format!("Test product {}", uuid::Uuid::new_v4()),
            "price": price,
            "stock": stock,
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to read product")
}

/// Read a decimal field serialized as a string.
///
/// # Panics
///
/// Panics if the value is not a decimal string.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal is serialized as a string"))
        .expect("invalid decimal")
}
