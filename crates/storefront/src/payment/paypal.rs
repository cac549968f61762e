//! `PayPal` Orders v2 REST client.
//!
//! # Authentication
//!
//! OAuth2 client credentials. The access token is cached in memory and
//! fetched again 60 seconds before it expires.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::instrument;
use url::Url;

use gallery_core::cart::LineItem;
use gallery_core::{CurrencyCode, Money};

use super::{CaptureStatus, PaymentError, PaymentGateway, ProviderCapture, ProviderOrder};
use crate::config::PayPalConfig;

/// Refresh the access token this long before `PayPal` says it expires.
const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

/// Outbound request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `PayPal` REST API client.
#[derive(Clone)]
pub struct PayPalClient {
    inner: Arc<PayPalClientInner>,
}

struct PayPalClientInner {
    client: reqwest::Client,
    api_base: Url,
    client_id: String,
    client_secret: SecretString,
    /// In-memory token cache
    token: RwLock<Option<AccessToken>>,
}

#[derive(Clone)]
struct AccessToken {
    value: SecretString,
    /// Unix timestamp when the token expires.
    expires_at: i64,
}

impl AccessToken {
    fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.expires_at - TOKEN_EXPIRY_BUFFER_SECS
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Token lifetime in seconds.
    expires_in: i64,
}

#[derive(Serialize)]
struct CreateOrderRequest<'a> {
    intent: &'static str,
    purchase_units: Vec<PurchaseUnitRequest<'a>>,
}

#[derive(Serialize)]
struct PurchaseUnitRequest<'a> {
    description: &'a str,
    amount: AmountWire,
}

#[derive(Debug, Serialize, Deserialize)]
struct AmountWire {
    currency_code: String,
    value: String,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<LinkWire>,
}

#[derive(Deserialize)]
struct LinkWire {
    href: String,
    rel: String,
}

#[derive(Deserialize)]
struct CaptureResponse {
    id: String,
    #[serde(default)]
    payer: Option<PayerWire>,
    #[serde(default)]
    purchase_units: Vec<CapturedUnitWire>,
}

#[derive(Deserialize)]
struct PayerWire {
    #[serde(default)]
    name: Option<PayerNameWire>,
    #[serde(default)]
    email_address: Option<String>,
}

#[derive(Deserialize)]
struct PayerNameWire {
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    surname: Option<String>,
}

#[derive(Deserialize)]
struct CapturedUnitWire {
    #[serde(default)]
    payments: Option<PaymentsWire>,
}

#[derive(Deserialize)]
struct PaymentsWire {
    #[serde(default)]
    captures: Vec<CaptureWire>,
}

#[derive(Deserialize)]
struct CaptureWire {
    id: String,
    status: String,
    amount: AmountWire,
}

/// `PayPal` error body.
#[derive(Deserialize, Default)]
struct ErrorResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    issue: Option<String>,
}

impl ErrorResponse {
    /// The most specific reason available.
    fn reason(self) -> String {
        self.details
            .into_iter()
            .find_map(|d| d.issue)
            .or(self.message)
            .or(self.name)
            .unwrap_or_default()
    }
}

impl PayPalClient {
    /// Create a client for the configured `PayPal` environment.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` if the HTTP client cannot be built.
    pub fn new(config: &PayPalConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(PayPalClientInner {
                client,
                api_base: config.api_base.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                token: RwLock::new(None),
            }),
        })
    }

    /// A valid access token, fetching a new one if needed.
    async fn access_token(&self) -> Result<SecretString, PaymentError> {
        if let Some(token) = self.inner.token.read().await.as_ref()
            && !token.is_expired()
        {
            return Ok(token.value.clone());
        }

        let token = self.fetch_access_token().await?;
        let value = token.value.clone();
        *self.inner.token.write().await = Some(token);
        Ok(value)
    }

    #[instrument(skip(self))]
    async fn fetch_access_token(&self) -> Result<AccessToken, PaymentError> {
        let now = chrono::Utc::now().timestamp();
        let url = self.inner.api_base.join("/v1/oauth2/token")?;

        let response = self
            .inner
            .client
            .post(url)
            .basic_auth(
                &self.inner.client_id,
                Some(self.inner.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: TokenResponse = response.json().await?;
            tracing::debug!(expires_in = body.expires_in, "PayPal access token refreshed");
            return Ok(AccessToken {
                value: SecretString::from(body.access_token),
                expires_at: now + body.expires_in,
            });
        }

        let error: ErrorResponse = response.json().await.unwrap_or_default();
        Err(PaymentError::Authentication(format!(
            "HTTP {status}: {}",
            error.reason()
        )))
    }

    /// Turn a non-success response into a `PaymentError`.
    async fn error_from(response: reqwest::Response) -> PaymentError {
        let status = response.status();
        let error: ErrorResponse = response.json().await.unwrap_or_default();
        let reason = error.reason();

        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            return PaymentError::Declined(reason);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return PaymentError::Authentication(reason);
        }
        PaymentError::Provider {
            status: status.as_u16(),
            message: reason,
        }
    }
}

impl PaymentGateway for PayPalClient {
    #[instrument(skip(self, items), fields(amount = %amount, lines = items.len()))]
    async fn create_order(
        &self,
        amount: &Money,
        items: &[LineItem],
    ) -> Result<ProviderOrder, PaymentError> {
        let token = self.access_token().await?;
        let url = self.inner.api_base.join("/v2/checkout/orders")?;

        let body = CreateOrderRequest {
            intent: "CAPTURE",
            purchase_units: vec![PurchaseUnitRequest {
                description: "Gallery order",
                amount: AmountWire {
                    currency_code: amount.currency_code.code().to_string(),
                    value: amount.to_minor_string(),
                },
            }],
        };

        let response = self
            .inner
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .header("PayPal-Request-Id", uuid::Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let order: OrderResponse = response.json().await?;
        let approve_url = order
            .links
            .into_iter()
            .find(|link| link.rel == "approve" || link.rel == "payer-action")
            .map(|link| link.href);

        tracing::info!(provider_order_id = %order.id, status = %order.status, "PayPal order created");

        Ok(ProviderOrder {
            id: order.id,
            status: order.status,
            approve_url,
        })
    }

    #[instrument(skip(self))]
    async fn capture_order(&self, provider_order_id: &str) -> Result<ProviderCapture, PaymentError> {
        validate_order_id(provider_order_id)?;

        let token = self.access_token().await?;
        let url = self
            .inner
            .api_base
            .join(&format!("/v2/checkout/orders/{provider_order_id}/capture"))?;

        let response = self
            .inner
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .header("PayPal-Request-Id", format!("capture-{provider_order_id}"))
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: CaptureResponse = response.json().await?;
        let capture = parse_capture(body)?;

        tracing::info!(
            provider_order_id = %capture.order_id,
            capture_id = %capture.capture_id,
            status = ?capture.status,
            "PayPal order captured"
        );

        Ok(capture)
    }
}

/// Provider order ids are short uppercase alphanumerics; anything else never
/// reaches a URL.
fn validate_order_id(id: &str) -> Result<(), PaymentError> {
    if id.is_empty() || id.len() > 64 || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(PaymentError::InvalidOrderId);
    }
    Ok(())
}

fn parse_capture(body: CaptureResponse) -> Result<ProviderCapture, PaymentError> {
    let capture = body
        .purchase_units
        .into_iter()
        .filter_map(|unit| unit.payments)
        .flat_map(|payments| payments.captures)
        .next()
        .ok_or_else(|| PaymentError::InvalidResponse("capture response has no captures".to_string()))?;

    let amount = Decimal::from_str(&capture.amount.value).map_err(|e| {
        PaymentError::InvalidResponse(format!("bad capture amount {}: {e}", capture.amount.value))
    })?;
    let currency = capture
        .amount
        .currency_code
        .parse::<CurrencyCode>()
        .map_err(PaymentError::InvalidResponse)?;

    let (payer_name, payer_email) = body.payer.map_or((None, None), |payer| {
        let name = payer.name.and_then(|n| {
            let full = [n.given_name, n.surname]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            (!full.is_empty()).then_some(full)
        });
        (name, payer.email_address)
    });

    Ok(ProviderCapture {
        order_id: body.id,
        capture_id: capture.id,
        status: CaptureStatus::from_provider(&capture.status),
        amount: Money::new(amount, currency),
        payer_name,
        payer_email,
    })
}
