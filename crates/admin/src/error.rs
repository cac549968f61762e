//! Admin client errors.

use thiserror::Error;

/// Errors that can occur while driving the dashboard.
#[derive(Debug, Error)]
pub enum AdminError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A protected call was made before `login`.
    #[error("not logged in")]
    NotLoggedIn,

    /// Endpoint URL could not be built.
    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    /// The panel's entity has no such operation.
    #[error("{entity} cannot be {operation}")]
    Unsupported {
        entity: &'static str,
        operation: &'static str,
    },
}

impl AdminError {
    /// HTTP status for API errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
