//! Integration tests for login and role checks.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The storefront running (cargo run -p gallery-storefront)
//! - An admin user (`GALLERY_ADMIN_EMAIL` / `GALLERY_ADMIN_PASSWORD`)

use gallery_integration_tests::{admin_credentials, admin_token, base_url, visitor};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health_endpoints() {
    let client = visitor();
    let resp = client
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin user"]
async fn test_login_returns_token_and_user() {
    let client = visitor();
    let (email, password) = admin_credentials();
    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to read body");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], email.to_lowercase());
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin user"]
async fn test_wrong_password_is_rejected() {
    let client = visitor();
    let (email, _) = admin_credentials();
    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": email, "password": "definitely-not-it" }))
        .send()
        .await
        .expect("Failed to send login");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("Failed to read body");
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin user"]
async fn test_orders_need_a_token() {
    let client = visitor();
    let resp = client
        .get(format!("{}/api/orders", base_url()))
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let token = admin_token(&client).await;
    let resp = client
        .get(format!("{}/api/orders", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/api/orders", base_url()))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
