//! Checkout service: snapshot, payment creation and capture.
//!
//! The flow spans three requests:
//!
//! 1. `proceed` freezes the selected cart lines into a checkout snapshot.
//! 2. `create_payment` re-prices the snapshot against the catalog, checks
//!    stock and opens a provider order for the checkout total.
//! 3. `capture` captures the approved provider order, verifies the captured
//!    amount and records a paid order. The provider order id is the
//!    idempotency key: a second capture of the same order is rejected.
//!
//! Every failure moves the attempt to `Failed` and is returned to the
//! visitor. Nothing is retried automatically. A repeated capture of an
//! order already in the ledger is rejected but leaves the session completed
//! against that order.

use std::collections::HashMap;
use std::future::Future;

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use gallery_core::cart::{Cart, CheckoutTotals, LineItem, PricingPolicy};
use gallery_core::catalog::{Order, Product};
use gallery_core::checkout::{
    CapturedOrder, CheckoutSnapshot, CheckoutState, EmptySelection, OrderReceipt,
    PaymentErrorKind, PaymentFailure, TransitionError,
};
use gallery_core::{ProductId, round_cents};

use super::storage::{SessionStorage, StorageError};
use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::models::session_keys;
use crate::payment::{CaptureStatus, PaymentGateway};

/// Errors that end a checkout request.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing selected when proceeding.
    #[error("select at least one item to check out")]
    EmptySelection,

    /// No snapshot in the session.
    #[error("no checkout in progress")]
    NoCheckout,

    /// Requested step is not allowed from the current state.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// An order was already recorded for this provider order.
    #[error("this payment has already been captured")]
    DuplicateCapture,

    /// Payment failed; the attempt is now `Failed`.
    #[error("{}", .0.message)]
    Payment(PaymentFailure),

    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<EmptySelection> for CheckoutError {
    fn from(_: EmptySelection) -> Self {
        Self::EmptySelection
    }
}

/// Catalog lookups used to re-price a snapshot.
pub trait ProductCatalog: Send + Sync {
    /// Products with the given IDs. Unknown IDs are omitted.
    fn products(
        &self,
        ids: &[ProductId],
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;
}

/// Where paid orders are recorded.
pub trait OrderLedger: Send + Sync {
    /// The order recorded for a provider order, if any.
    fn find_by_provider_order_id(
        &self,
        provider_order_id: &str,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Record a captured payment and decrement stock atomically.
    /// A duplicate provider order id is `RepositoryError::Conflict`.
    fn record_paid_order(
        &self,
        captured: &CapturedOrder,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;
}

/// `PostgreSQL`-backed catalog and ledger.
pub struct PgCheckoutStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgCheckoutStore<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl ProductCatalog for PgCheckoutStore<'_> {
    async fn products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        ProductRepository::new(self.pool).get_many(ids).await
    }
}

impl OrderLedger for PgCheckoutStore<'_> {
    async fn find_by_provider_order_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(self.pool)
            .find_by_provider_order_id(provider_order_id)
            .await
    }

    async fn record_paid_order(&self, captured: &CapturedOrder) -> Result<Order, RepositoryError> {
        OrderRepository::new(self.pool).record_paid(captured).await
    }
}

/// The checkout as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutView {
    pub items: Vec<LineItem>,
    pub totals: CheckoutTotals,
    pub state: CheckoutState,
}

/// A provider order waiting for buyer approval.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOrderView {
    pub provider_order_id: String,
    pub approve_url: Option<String>,
    pub totals: CheckoutTotals,
}

/// Checkout operations for one visitor.
pub struct CheckoutService<'a, S, G, C> {
    storage: &'a S,
    gateway: &'a G,
    store: &'a C,
    pricing: &'a PricingPolicy,
}

impl<'a, S, G, C> CheckoutService<'a, S, G, C>
where
    S: SessionStorage,
    G: PaymentGateway,
    C: ProductCatalog + OrderLedger,
{
    #[must_use]
    pub const fn new(storage: &'a S, gateway: &'a G, store: &'a C, pricing: &'a PricingPolicy) -> Self {
        Self {
            storage,
            gateway,
            store,
            pricing,
        }
    }

    /// Snapshot the selected cart lines and start a fresh attempt.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptySelection` when nothing is selected.
    pub async fn proceed(&self) -> Result<CheckoutView, CheckoutError> {
        let cart = self
            .storage
            .load::<Cart>(session_keys::CART)
            .await?
            .unwrap_or_default();
        let snapshot = CheckoutSnapshot::take(&cart, Utc::now())?;
        let state = CheckoutState::Idle;

        self.storage
            .store(session_keys::CHECKOUT_ITEMS, &snapshot)
            .await?;
        self.storage
            .store(session_keys::CHECKOUT_STATE, &state)
            .await?;

        Ok(self.view(snapshot, state))
    }

    /// The checkout in progress.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoCheckout` if there is no snapshot.
    pub async fn current(&self) -> Result<CheckoutView, CheckoutError> {
        let snapshot = self.snapshot().await?;
        let state = self.state().await?;
        Ok(self.view(snapshot, state))
    }

    /// Re-price the snapshot and open a provider order for its total.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Payment` when a line is unavailable, out of
    /// stock, or the provider fails. Returns `CheckoutError::Transition` when
    /// a capture is already running or the attempt completed.
    pub async fn create_payment(&self) -> Result<PaymentOrderView, CheckoutError> {
        let snapshot = self.snapshot().await?;
        let state = self.state().await?;
        // Reject before contacting the provider.
        state.begin(String::new())?;

        let items = match self.reprice(&snapshot.items).await {
            Ok(items) => items,
            Err(CheckoutError::Payment(failure)) => return Err(self.fail(&state, failure).await),
            Err(other) => return Err(other),
        };
        let snapshot = CheckoutSnapshot {
            items,
            taken_at: snapshot.taken_at,
        };
        self.storage
            .store(session_keys::CHECKOUT_ITEMS, &snapshot)
            .await?;

        let totals = self.pricing.checkout_totals(&snapshot.items);
        let order = match self
            .gateway
            .create_order(&totals.amount_due(), &snapshot.items)
            .await
        {
            Ok(order) => order,
            Err(err) => {
                tracing::warn!(error = %err, "payment order creation failed");
                return Err(self.fail(&state, err.to_failure()).await);
            }
        };

        let next = state.begin(order.id.clone())?;
        self.storage
            .store(session_keys::CHECKOUT_STATE, &next)
            .await?;

        Ok(PaymentOrderView {
            provider_order_id: order.id,
            approve_url: order.approve_url,
            totals,
        })
    }

    /// Capture an approved provider order and record the paid order.
    ///
    /// On success the cart is emptied, the snapshot discarded and the
    /// receipt stored as the last order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Transition` unless awaiting capture of this
    /// provider order. Returns `CheckoutError::DuplicateCapture` if an order
    /// already exists for it; the session then completes against that order.
    /// Returns `CheckoutError::Payment` when the provider fails or the
    /// captured amount differs from the total.
    pub async fn capture(&self, provider_order_id: &str) -> Result<OrderReceipt, CheckoutError> {
        let snapshot = self.snapshot().await?;
        let state = self.state().await?;

        let processing = state.approve(provider_order_id)?;
        self.storage
            .store(session_keys::CHECKOUT_STATE, &processing)
            .await?;

        if let Some(existing) = self
            .store
            .find_by_provider_order_id(provider_order_id)
            .await?
        {
            return Err(self
                .settle_duplicate(&processing, provider_order_id, existing)
                .await?);
        }

        let capture = match self.gateway.capture_order(provider_order_id).await {
            Ok(capture) => capture,
            Err(err) => {
                tracing::warn!(error = %err, provider_order_id, "payment capture failed");
                // A concurrent submit may have captured and recorded it first
                if let Some(existing) = self
                    .store
                    .find_by_provider_order_id(provider_order_id)
                    .await?
                {
                    return Err(self
                        .settle_duplicate(&processing, provider_order_id, existing)
                        .await?);
                }
                return Err(self.fail(&processing, err.to_failure()).await);
            }
        };

        if capture.status != CaptureStatus::Completed {
            let failure = PaymentFailure::new(
                PaymentErrorKind::ProviderDeclined,
                format!("Payment was not completed (status {:?}).", capture.status),
            );
            return Err(self.fail(&processing, failure).await);
        }

        let totals = self.pricing.checkout_totals(&snapshot.items);
        let expected = totals.amount_due();
        if capture.amount.currency_code != expected.currency_code
            || round_cents(capture.amount.amount) != round_cents(expected.amount)
        {
            tracing::error!(
                provider_order_id,
                captured = %capture.amount,
                expected = %expected,
                "captured amount does not match checkout total"
            );
            let failure = PaymentFailure::new(
                PaymentErrorKind::Validation,
                "The captured amount does not match the order total.",
            );
            return Err(self.fail(&processing, failure).await);
        }

        let captured = CapturedOrder {
            provider_order_id: provider_order_id.to_string(),
            capture_id: capture.capture_id,
            customer_name: capture.payer_name,
            customer_email: capture.payer_email,
            items: snapshot.items,
            totals,
        };

        let order = match self.store.record_paid_order(&captured).await {
            Ok(order) => order,
            Err(RepositoryError::Conflict(_)) => {
                tracing::warn!(provider_order_id, "order recorded by a concurrent capture");
                let existing = self.store.find_by_provider_order_id(provider_order_id).await?;
                return Err(match existing {
                    Some(existing) => {
                        self.settle_duplicate(&processing, provider_order_id, existing)
                            .await?
                    }
                    None => {
                        self.fail(&processing, duplicate_failure()).await;
                        CheckoutError::DuplicateCapture
                    }
                });
            }
            Err(err) => {
                let failure = PaymentFailure::new(
                    PaymentErrorKind::Unknown,
                    "Payment captured but the order could not be saved. Please contact us.",
                );
                self.fail(&processing, failure).await;
                return Err(err.into());
            }
        };

        let completed = processing.complete(order.id)?;
        let receipt = OrderReceipt {
            order_id: order.id,
            provider_order_id: provider_order_id.to_string(),
            items: captured.items,
            totals: captured.totals,
            completed_at: Utc::now(),
        };

        self.finish(&receipt, &completed).await?;

        tracing::info!(order_id = %order.id, provider_order_id, "checkout completed");
        Ok(receipt)
    }

    /// Receipt of the visitor's most recent completed order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be read.
    pub async fn last_order(&self) -> Result<Option<OrderReceipt>, CheckoutError> {
        Ok(self.storage.load(session_keys::LAST_ORDER).await?)
    }

    async fn snapshot(&self) -> Result<CheckoutSnapshot, CheckoutError> {
        self.storage
            .load::<CheckoutSnapshot>(session_keys::CHECKOUT_ITEMS)
            .await?
            .ok_or(CheckoutError::NoCheckout)
    }

    async fn state(&self) -> Result<CheckoutState, CheckoutError> {
        Ok(self
            .storage
            .load::<CheckoutState>(session_keys::CHECKOUT_STATE)
            .await?
            .unwrap_or_default())
    }

    fn view(&self, snapshot: CheckoutSnapshot, state: CheckoutState) -> CheckoutView {
        let totals = self.pricing.checkout_totals(&snapshot.items);
        CheckoutView {
            items: snapshot.items,
            totals,
            state,
        }
    }

    /// Replace snapshot prices with catalog prices and check stock.
    async fn reprice(&self, items: &[LineItem]) -> Result<Vec<LineItem>, CheckoutError> {
        let ids: Vec<ProductId> = items.iter().map(|item| item.id).collect();
        let products: HashMap<ProductId, Product> = self
            .store
            .products(&ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        items
            .iter()
            .map(|item| {
                let Some(product) = products.get(&item.id) else {
                    return Err(CheckoutError::Payment(PaymentFailure::new(
                        PaymentErrorKind::Validation,
                        format!("{} is no longer available.", item.name),
                    )));
                };
                if !product.has_stock_for(item.quantity) {
                    return Err(CheckoutError::Payment(PaymentFailure::new(
                        PaymentErrorKind::Validation,
                        format!(
                            "Only {} of {} left in stock.",
                            product.stock.max(0),
                            product.name
                        ),
                    )));
                }
                Ok(LineItem::from_product(product, item.quantity))
            })
            .collect()
    }

    /// Empty the cart, drop the snapshot and store the receipt.
    async fn finish(
        &self,
        receipt: &OrderReceipt,
        completed: &CheckoutState,
    ) -> Result<(), CheckoutError> {
        self.storage.store(session_keys::CART, &Cart::new()).await?;
        self.storage.remove(session_keys::CHECKOUT_ITEMS).await?;
        self.storage
            .store(session_keys::LAST_ORDER, receipt)
            .await?;
        self.storage
            .store(session_keys::CHECKOUT_STATE, completed)
            .await?;
        Ok(())
    }

    /// Settle a capture whose provider order is already in the ledger.
    ///
    /// The session awaited this provider order, so the recorded order is the
    /// visitor's own and the session completes against it.
    async fn settle_duplicate(
        &self,
        processing: &CheckoutState,
        provider_order_id: &str,
        existing: Order,
    ) -> Result<CheckoutError, CheckoutError> {
        let completed = processing.complete(existing.id)?;
        let receipt = OrderReceipt {
            order_id: existing.id,
            provider_order_id: provider_order_id.to_string(),
            items: existing.items,
            totals: CheckoutTotals {
                subtotal: existing.subtotal,
                shipping: existing.shipping,
                tax: existing.tax,
                total: existing.total,
                currency: existing.currency_code,
            },
            completed_at: existing.created_at,
        };
        self.finish(&receipt, &completed).await?;

        tracing::info!(order_id = %existing.id, provider_order_id, "capture already recorded");
        Ok(CheckoutError::DuplicateCapture)
    }

    /// Move the attempt to `Failed` and return the error for the visitor.
    ///
    /// A storage error while recording the failure is logged; the payment
    /// failure is still what the visitor sees.
    async fn fail(&self, state: &CheckoutState, failure: PaymentFailure) -> CheckoutError {
        let failed = state
            .fail(failure.clone())
            .unwrap_or_else(|_| CheckoutState::Failed {
                failure: failure.clone(),
            });
        if let Err(err) = self
            .storage
            .store(session_keys::CHECKOUT_STATE, &failed)
            .await
        {
            tracing::error!(error = %err, "failed to store checkout failure");
        }
        CheckoutError::Payment(failure)
    }
}

fn duplicate_failure() -> PaymentFailure {
    PaymentFailure::new(
        PaymentErrorKind::Validation,
        "This payment has already been captured.",
    )
}
