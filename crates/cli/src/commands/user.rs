//! Login user management.
//!
//! # Usage
//!
//! ```bash
//! echo "$PASSWORD" | gallery-cli user create -e curator@example.com -n "Curator" -r admin
//! ```
//!
//! # Environment Variables
//!
//! - `GALLERY_DATABASE_URL` - `PostgreSQL` connection string for the storefront

use std::io::BufRead;

use gallery_core::UserRole;
use gallery_storefront::services::auth::{self, AuthError};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use super::MissingEnvVar;

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Could not read password from stdin: {0}")]
    Stdin(#[from] std::io::Error),

    #[error("No password given on stdin")]
    EmptyPassword,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a login user with a password read from stdin.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `UserError::Auth` for invalid input or an existing email.
pub async fn create(email: &str, name: &str, role: UserRole) -> Result<i32, UserError> {
    let password = read_password(std::io::stdin().lock())?;
    let database_url = super::database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = gallery_storefront::db::create_pool(&database_url).await?;

    let user = auth::register(&pool, email, name, role, password.expose_secret()).await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(user.id.as_i32())
}

/// First line of `input`, without its line ending.
fn read_password(mut input: impl BufRead) -> Result<SecretString, UserError> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(UserError::EmptyPassword);
    }
    Ok(SecretString::from(password.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_password_strips_line_ending() {
        let password = read_password("s3cret pass\r\nignored\n".as_bytes()).unwrap();
        assert_eq!(password.expose_secret(), "s3cret pass");
    }

    #[test]
    fn test_read_password_rejects_empty() {
        assert!(matches!(
            read_password("\n".as_bytes()),
            Err(UserError::EmptyPassword)
        ));
        assert!(matches!(
            read_password("".as_bytes()),
            Err(UserError::EmptyPassword)
        ));
    }
}
