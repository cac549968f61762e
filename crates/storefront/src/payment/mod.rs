//! Payment provider integration.
//!
//! Checkout talks to the provider through [`PaymentGateway`], so the flow can
//! be exercised without network access. [`PayPalClient`] is the production
//! implementation (`PayPal` Orders v2).

pub mod paypal;

use std::future::Future;

use thiserror::Error;

use gallery_core::Money;
use gallery_core::cart::LineItem;
use gallery_core::checkout::{PaymentErrorKind, PaymentFailure};

pub use paypal::PayPalClient;

/// Errors that can occur when talking to the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed (connect, timeout, body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider refused the payment.
    #[error("payment declined: {0}")]
    Declined(String),

    /// Provider answered with an unexpected error status.
    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// Our API credentials were rejected.
    #[error("provider authentication failed: {0}")]
    Authentication(String),

    /// Provider response could not be understood.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// Provider order id is not something we would have issued.
    #[error("invalid payment order id")]
    InvalidOrderId,

    /// Endpoint URL could not be built.
    #[error("invalid provider URL: {0}")]
    Url(#[from] url::ParseError),
}

impl PaymentError {
    /// Broad failure category shown to the visitor.
    #[must_use]
    pub fn kind(&self) -> PaymentErrorKind {
        match self {
            Self::Http(err) if err.is_timeout() || err.is_connect() || err.is_request() => {
                PaymentErrorKind::Network
            }
            Self::Declined(_) => PaymentErrorKind::ProviderDeclined,
            Self::InvalidOrderId => PaymentErrorKind::Validation,
            Self::Http(_)
            | Self::Provider { .. }
            | Self::Authentication(_)
            | Self::InvalidResponse(_)
            | Self::Url(_) => PaymentErrorKind::Unknown,
        }
    }

    /// Visitor-facing failure. Provider internals stay in the logs.
    #[must_use]
    pub fn to_failure(&self) -> PaymentFailure {
        let message = match self.kind() {
            PaymentErrorKind::Network => "The payment service could not be reached. Please try again.".to_string(),
            PaymentErrorKind::ProviderDeclined => match self {
                Self::Declined(reason) if !reason.is_empty() => format!("Payment declined: {reason}"),
                _ => "Payment declined.".to_string(),
            },
            PaymentErrorKind::Validation => self.to_string(),
            PaymentErrorKind::Unknown => "The payment could not be processed.".to_string(),
        };
        PaymentFailure::new(self.kind(), message)
    }
}

/// An order created at the provider, waiting for buyer approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOrder {
    pub id: String,
    pub status: String,
    /// Where the buyer approves the payment, when the provider returns one.
    pub approve_url: Option<String>,
}

/// Status of a provider capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStatus {
    Completed,
    Pending,
    Declined,
    Other(String),
}

impl CaptureStatus {
    /// Parse a provider status string (`COMPLETED`, `PENDING`, ...).
    #[must_use]
    pub fn from_provider(status: &str) -> Self {
        match status {
            "COMPLETED" => Self::Completed,
            "PENDING" => Self::Pending,
            "DECLINED" | "FAILED" => Self::Declined,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Result of capturing a provider order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCapture {
    pub order_id: String,
    pub capture_id: String,
    pub status: CaptureStatus,
    /// Amount actually captured.
    pub amount: Money,
    pub payer_name: Option<String>,
    pub payer_email: Option<String>,
}

/// A payment provider able to create and capture orders.
pub trait PaymentGateway: Send + Sync {
    /// Create a provider order for `amount`.
    fn create_order(
        &self,
        amount: &Money,
        items: &[LineItem],
    ) -> impl Future<Output = Result<ProviderOrder, PaymentError>> + Send;

    /// Capture a buyer-approved provider order.
    fn capture_order(
        &self,
        provider_order_id: &str,
    ) -> impl Future<Output = Result<ProviderCapture, PaymentError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            PaymentError::Declined("INSTRUMENT_DECLINED".to_string()).kind(),
            PaymentErrorKind::ProviderDeclined
        );
        assert_eq!(
            PaymentError::Provider {
                status: 500,
                message: "boom".to_string()
            }
            .kind(),
            PaymentErrorKind::Unknown
        );
        assert_eq!(
            PaymentError::InvalidOrderId.kind(),
            PaymentErrorKind::Validation
        );
    }

    #[test]
    fn test_failure_hides_provider_details() {
        let failure = PaymentError::Authentication("client_id=abc rejected".to_string()).to_failure();
        assert_eq!(failure.kind, PaymentErrorKind::Unknown);
        assert!(!failure.message.contains("abc"));

        let failure = PaymentError::Declined("INSTRUMENT_DECLINED".to_string()).to_failure();
        assert_eq!(failure.message, "Payment declined: INSTRUMENT_DECLINED");
    }

    #[test]
    fn test_capture_status_from_provider() {
        assert_eq!(CaptureStatus::from_provider("COMPLETED"), CaptureStatus::Completed);
        assert_eq!(CaptureStatus::from_provider("DECLINED"), CaptureStatus::Declined);
        assert_eq!(
            CaptureStatus::from_provider("REFUNDED"),
            CaptureStatus::Other("REFUNDED".to_string())
        );
    }
}
