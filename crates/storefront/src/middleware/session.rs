//! Session middleware configuration.
//!
//! Carts and checkout progress live in `PostgreSQL`-backed sessions keyed by
//! a cookie. Visitors never log in.

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "gallery_session";

/// Sessions expire after 30 days without activity.
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Session store names rejected by the `PostgreSQL` store.
#[derive(Debug, Error)]
#[error("invalid session store identifier: {0}")]
pub struct SessionStoreError(String);

/// Build the `PostgreSQL` session store in `schema.table`.
fn session_store(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<PostgresStore, SessionStoreError> {
    PostgresStore::new(pool.clone())
        .with_schema_name(schema)
        .map_err(SessionStoreError)?
        .with_table_name(table)
        .map_err(SessionStoreError)
}

/// Create the session layer with `PostgreSQL` store.
///
/// The `gallery.session` table is created by the migrations.
///
/// # Errors
///
/// Returns an error if the store rejects the schema or table name.
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> Result<SessionManagerLayer<PostgresStore>, SessionStoreError> {
    let store = session_store(pool, "gallery", "session")?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::config::tests::test_config;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/gallery_test")
            .unwrap()
    }

    #[tokio::test]
    async fn test_session_layer_builds() {
        assert!(create_session_layer(&lazy_pool(), &test_config()).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_store_name_is_an_error() {
        let err = session_store(&lazy_pool(), "gallery; drop", "session").unwrap_err();
        assert!(err.to_string().contains("invalid session store identifier"));
        assert!(session_store(&lazy_pool(), "gallery", "").is_err());
    }
}
