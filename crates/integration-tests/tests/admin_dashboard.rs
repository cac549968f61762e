//! Integration tests for the admin dashboard client.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The storefront running (cargo run -p gallery-storefront)
//! - An admin user (`GALLERY_ADMIN_EMAIL` / `GALLERY_ADMIN_PASSWORD`)

use gallery_admin::{AdminError, ApiClient, Dashboard, PanelQuery, Sort, Tab};
use gallery_core::catalog::{CategoryUpdate, NewCategory};
use gallery_integration_tests::{admin_credentials, base_url};
use secrecy::SecretString;
use url::Url;
use uuid::Uuid;

async fn logged_in() -> ApiClient {
    let (email, password) = admin_credentials();
    let api = ApiClient::new(Url::parse(&base_url()).expect("GALLERY_API_URL")).expect("client");
    api.login(&email, &SecretString::from(password))
        .await
        .expect("Failed to log in");
    api
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin user"]
async fn test_load_all_tabs() {
    let api = logged_in().await;
    let mut dashboard = Dashboard::new();
    let errors = dashboard.load_all(&api).await;
    assert!(errors.is_empty(), "{errors:?}");
    for tab in Tab::ALL {
        let table = dashboard.table(tab, &PanelQuery::default());
        assert_eq!(table.headers.len(), tab.columns().len());
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin user"]
async fn test_category_panel_round_trip() {
    let api = logged_in().await;
    let mut dashboard = Dashboard::new();
    let name = format!("Panel {}", Uuid::new_v4());

    let created = dashboard
        .categories
        .create(
            &api,
            &NewCategory {
                name: name.clone(),
                description: None,
            },
        )
        .await
        .expect("Failed to create");
    assert!(dashboard.categories.get(created.id).is_some());

    let query = PanelQuery {
        search: Some(name.to_uppercase()),
        sort: Some(Sort::ascending("name")),
        ..PanelQuery::default()
    };
    assert_eq!(dashboard.categories.view(&query).len(), 1);

    dashboard
        .categories
        .update(
            &api,
            created.id,
            &CategoryUpdate {
                description: Some("From the dashboard".to_string()),
                ..CategoryUpdate::default()
            },
        )
        .await
        .expect("Failed to update");
    assert_eq!(
        dashboard
            .categories
            .get(created.id)
            .and_then(|c| c.description.as_deref()),
        Some("From the dashboard")
    );

    dashboard
        .categories
        .delete(&api, created.id)
        .await
        .expect("Failed to delete");
    assert!(dashboard.categories.get(created.id).is_none());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_bad_login_reports_api_error() {
    let api = ApiClient::new(Url::parse(&base_url()).expect("GALLERY_API_URL")).expect("client");
    let err = api
        .login("nobody@gallery.test", &SecretString::from("wrong-password".to_string()))
        .await
        .expect_err("login with a wrong password must fail");
    assert!(matches!(err, AdminError::Api { status: 400, .. }));
    assert!(!api.is_logged_in().await);
}
