//! Integration tests for catalog CRUD routes.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The storefront running (cargo run -p gallery-storefront)
//! - An admin user (`GALLERY_ADMIN_EMAIL` / `GALLERY_ADMIN_PASSWORD`)

use gallery_integration_tests::{admin_token, base_url, create_product, decimal, visitor};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_catalog_lists_are_public() {
    let client = visitor();
    for path in ["/api/artworks", "/api/products", "/api/categories"] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .expect("Failed to list");
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        let body: Value = resp.json().await.expect("Failed to read body");
        assert!(body.is_array(), "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_writes_need_admin_token() {
    let client = visitor();
    let resp = client
        .post(format!("{}/api/categories", base_url()))
        .json(&json!({ "name": "Anonymous" }))
        .send()
        .await
        .expect("Failed to send");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin user"]
async fn test_category_crud() {
    let client = visitor();
    let token = admin_token(&client).await;
    let url = format!("{}/api/categories", base_url());
    let name = format!("Category {}", Uuid::new_v4());

    let resp = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("Failed to create");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("Failed to read body");
    let id = created["id"].as_i64().expect("id");

    // Names are unique.
    let resp = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("Failed to create");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = client
        .put(format!("{url}/{id}"))
        .bearer_auth(&token)
        .json(&json!({ "description": "Updated" }))
        .send()
        .await
        .expect("Failed to update");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("Failed to read body");
    assert_eq!(updated["name"], name);
    assert_eq!(updated["description"], "Updated");

    let resp = client
        .delete(format!("{url}/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to delete");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{url}/{id}"))
        .send()
        .await
        .expect("Failed to get");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin user"]
async fn test_artwork_like_increments() {
    let client = visitor();
    let token = admin_token(&client).await;
    let url = format!("{}/api/artworks", base_url());

    let resp = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({
            "title": format!("Study {}", Uuid::new_v4()),
            "artist": "Integration",
            "price": "100.00",
        }))
        .send()
        .await
        .expect("Failed to create");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let artwork: Value = resp.json().await.expect("Failed to read body");
    let id = artwork["id"].as_i64().expect("id");
    assert_eq!(artwork["likes"], 0);

    let resp = client
        .post(format!("{url}/{id}/like"))
        .send()
        .await
        .expect("Failed to like");
    assert_eq!(resp.status(), StatusCode::OK);
    let liked: Value = resp.json().await.expect("Failed to read body");
    assert_eq!(liked["likes"], 1);

    client
        .delete(format!("{url}/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to delete");
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin user"]
async fn test_products_cannot_be_deleted() {
    let client = visitor();
    let token = admin_token(&client).await;
    let product = create_product(&client, &token, "15.00", 3).await;
    assert_eq!(decimal(&product["price"]), Decimal::new(1500, 2));

    let resp = client
        .delete(format!("{}/api/products/{}", base_url(), product["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send");
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin user"]
async fn test_negative_price_is_rejected() {
    let client = visitor();
    let token = admin_token(&client).await;
    let resp = client
        .post(format!("{}/api/products", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "name": "Broken", "price": "-5.00" }))
        .send()
        .await
        .expect("Failed to send");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
