//! Checkout snapshot and the payment-capture state machine.
//!
//! ```text
//! Idle ──begin──▶ AwaitingCapture ──approve──▶ Processing ──complete──▶ Completed
//!  ▲                    │                          │
//!  └──── Failed ◀───────┴──────────fail────────────┘
//! ```
//!
//! `Completed` and `Failed` end an attempt. A failed attempt may be restarted
//! with a new provider order; nothing retries on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CheckoutTotals, LineItem};
use crate::OrderId;

/// Frozen copy of the selected cart lines, taken when the visitor proceeds
/// to checkout. Later cart edits do not affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSnapshot {
    pub items: Vec<LineItem>,
    pub taken_at: DateTime<Utc>,
}

/// Proceeding to checkout with nothing selected.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no cart items are selected")]
pub struct EmptySelection;

impl CheckoutSnapshot {
    /// Snapshot the selected lines of `cart`.
    ///
    /// # Errors
    ///
    /// Returns [`EmptySelection`] when no line is selected.
    pub fn take(cart: &Cart, taken_at: DateTime<Utc>) -> Result<Self, EmptySelection> {
        let items: Vec<LineItem> = cart.selected_lines().cloned().collect();
        if items.is_empty() {
            return Err(EmptySelection);
        }
        Ok(Self { items, taken_at })
    }
}

/// Broad category of a payment failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorKind {
    /// Provider unreachable or timed out.
    Network,
    /// Provider refused the payment.
    ProviderDeclined,
    /// Our own checks failed (empty snapshot, amount mismatch, stock).
    Validation,
    Unknown,
}

/// Why a checkout attempt failed. The message is shown to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailure {
    pub kind: PaymentErrorKind,
    pub message: String,
}

impl PaymentFailure {
    #[must_use]
    pub fn new(kind: PaymentErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Where a checkout attempt stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutState {
    #[default]
    Idle,
    AwaitingCapture {
        provider_order_id: String,
    },
    Processing {
        provider_order_id: String,
    },
    Completed {
        order_id: OrderId,
        provider_order_id: String,
    },
    Failed {
        failure: PaymentFailure,
    },
}

/// A transition that is not allowed from the current state.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action} while checkout is {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
    #[error("payment order {actual} does not match the pending order")]
    OrderMismatch { actual: String },
}

impl CheckoutState {
    /// Snake-case state name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingCapture { .. } => "awaiting_capture",
            Self::Processing { .. } => "processing",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether this attempt is over.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    /// A provider order was created for this attempt.
    ///
    /// Allowed from `Idle` and `Failed` (manual resubmission), and from
    /// `AwaitingCapture` when the visitor abandons the pending order for a
    /// fresh one.
    ///
    /// # Errors
    ///
    /// Fails from `Processing` and `Completed`.
    pub fn begin(&self, provider_order_id: impl Into<String>) -> Result<Self, TransitionError> {
        match self {
            Self::Idle | Self::Failed { .. } | Self::AwaitingCapture { .. } => {
                Ok(Self::AwaitingCapture {
                    provider_order_id: provider_order_id.into(),
                })
            }
            Self::Processing { .. } | Self::Completed { .. } => Err(self.invalid("start payment")),
        }
    }

    /// The visitor approved `provider_order_id`; capture is about to run.
    ///
    /// # Errors
    ///
    /// Fails unless awaiting capture of that same order.
    pub fn approve(&self, provider_order_id: &str) -> Result<Self, TransitionError> {
        match self {
            Self::AwaitingCapture {
                provider_order_id: pending,
            } if pending == provider_order_id => Ok(Self::Processing {
                provider_order_id: pending.clone(),
            }),
            Self::AwaitingCapture { .. } => Err(TransitionError::OrderMismatch {
                actual: provider_order_id.to_string(),
            }),
            _ => Err(self.invalid("capture payment")),
        }
    }

    /// The capture succeeded and the order was recorded.
    ///
    /// # Errors
    ///
    /// Fails unless processing.
    pub fn complete(&self, order_id: OrderId) -> Result<Self, TransitionError> {
        match self {
            Self::Processing { provider_order_id } => Ok(Self::Completed {
                order_id,
                provider_order_id: provider_order_id.clone(),
            }),
            _ => Err(self.invalid("complete checkout")),
        }
    }

    /// The attempt failed.
    ///
    /// # Errors
    ///
    /// Fails once the attempt is already over.
    pub fn fail(&self, failure: PaymentFailure) -> Result<Self, TransitionError> {
        if self.is_terminal() {
            return Err(self.invalid("fail checkout"));
        }
        Ok(Self::Failed { failure })
    }

    /// Provider order id of the attempt in flight, if any.
    #[must_use]
    pub fn provider_order_id(&self) -> Option<&str> {
        match self {
            Self::AwaitingCapture { provider_order_id }
            | Self::Processing { provider_order_id }
            | Self::Completed {
                provider_order_id, ..
            } => Some(provider_order_id),
            Self::Idle | Self::Failed { .. } => None,
        }
    }

    const fn invalid(&self, action: &'static str) -> TransitionError {
        TransitionError::InvalidState {
            action,
            state: self.name(),
        }
    }
}

/// A captured payment ready to be written to the order ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedOrder {
    pub provider_order_id: String,
    pub capture_id: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub items: Vec<LineItem>,
    pub totals: CheckoutTotals,
}

/// Summary of the last completed order, kept for the confirmation view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub provider_order_id: String,
    pub items: Vec<LineItem>,
    pub totals: CheckoutTotals,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ProductId;
    use crate::cart::tests::line;

    fn failure() -> PaymentFailure {
        PaymentFailure::new(PaymentErrorKind::ProviderDeclined, "card declined")
    }

    #[test]
    fn test_snapshot_copies_selected_lines_only() {
        let cart = Cart::new()
            .add(line(1, 10, 0), 2)
            .add(line(2, 5, 0), 1)
            .select(ProductId::new(2), false);
        let snapshot = CheckoutSnapshot::take(&cart, Utc::now()).unwrap();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].id, ProductId::new(1));

        let edited = cart.remove(ProductId::new(1));
        assert!(edited.get(ProductId::new(1)).is_none());
        assert_eq!(snapshot.items[0].quantity, 2);
    }

    #[test]
    fn test_snapshot_requires_selection() {
        let cart = Cart::new().add(line(1, 10, 0), 1).select_all(false);
        assert_eq!(
            CheckoutSnapshot::take(&cart, Utc::now()),
            Err(EmptySelection)
        );
        assert_eq!(
            CheckoutSnapshot::take(&Cart::new(), Utc::now()),
            Err(EmptySelection)
        );
    }

    #[test]
    fn test_happy_path_transitions() {
        let state = CheckoutState::Idle.begin("PAY-1").unwrap();
        assert_eq!(state.provider_order_id(), Some("PAY-1"));

        let state = state.approve("PAY-1").unwrap();
        assert_eq!(state.name(), "processing");

        let state = state.complete(OrderId::new(9)).unwrap();
        assert!(state.is_terminal());
        assert_eq!(
            state,
            CheckoutState::Completed {
                order_id: OrderId::new(9),
                provider_order_id: "PAY-1".to_string()
            }
        );
    }

    #[test]
    fn test_approve_rejects_other_order_and_wrong_state() {
        let awaiting = CheckoutState::Idle.begin("PAY-1").unwrap();
        assert_eq!(
            awaiting.approve("PAY-2"),
            Err(TransitionError::OrderMismatch {
                actual: "PAY-2".to_string()
            })
        );
        assert!(matches!(
            CheckoutState::Idle.approve("PAY-1"),
            Err(TransitionError::InvalidState { state: "idle", .. })
        ));

        let processing = awaiting.approve("PAY-1").unwrap();
        assert!(processing.approve("PAY-1").is_err());
    }

    #[test]
    fn test_failed_attempt_can_be_resubmitted() {
        let failed = CheckoutState::Idle
            .begin("PAY-1")
            .unwrap()
            .fail(failure())
            .unwrap();
        assert!(failed.is_terminal());
        assert!(failed.fail(failure()).is_err());

        let retry = failed.begin("PAY-2").unwrap();
        assert_eq!(retry.provider_order_id(), Some("PAY-2"));
    }

    #[test]
    fn test_completed_attempt_is_final() {
        let done = CheckoutState::Processing {
            provider_order_id: "PAY-1".to_string(),
        }
        .complete(OrderId::new(1))
        .unwrap();
        assert!(done.begin("PAY-2").is_err());
        assert!(done.fail(failure()).is_err());
        assert!(CheckoutState::Idle.complete(OrderId::new(1)).is_err());
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let state = CheckoutState::AwaitingCapture {
            provider_order_id: "PAY-1".to_string(),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "awaiting_capture");
        assert_eq!(json["provider_order_id"], "PAY-1");

        let back: CheckoutState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
