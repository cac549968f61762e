//! Subcommand implementations.

pub mod dashboard;
pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;

/// Read a required environment variable, loading `.env` first.
pub(crate) fn required_env(key: &'static str) -> Result<String, MissingEnvVar> {
    dotenvy::dotenv().ok();
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(MissingEnvVar(key))
}

/// The storefront database URL.
pub(crate) fn database_url() -> Result<SecretString, MissingEnvVar> {
    required_env("GALLERY_DATABASE_URL").map(SecretString::from)
}

/// A required environment variable is missing or empty.
#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVar(pub &'static str);
