//! Orders recorded by checkout or entered by staff.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::{self, MAX_NAME_LENGTH, ValidationError};
use crate::cart::LineItem;
use crate::{CurrencyCode, Email, OrderId, OrderStatus, ProductId};

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Payment provider order id. Unique; `None` for staff-entered orders.
    pub provider_order_id: Option<String>,
    /// Provider capture (transaction) id.
    pub capture_id: Option<String>,
    pub status: OrderStatus,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    /// Line items as they were at checkout time.
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub currency_code: CurrencyCode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

/// One requested line of a staff-entered order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Payload for `POST /api/orders`.
///
/// Prices are resolved from the catalog server-side; the client only names
/// products and quantities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub items: Vec<OrderLineInput>,
    #[serde(default)]
    pub status: OrderStatus,
}

impl NewOrder {
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::optional_text("customer_name", self.customer_name.as_deref(), MAX_NAME_LENGTH)?;
        validate_email(self.customer_email.as_deref())?;
        if self.items.is_empty() {
            return Err(ValidationError::Empty { field: "items" });
        }
        if self.items.iter().any(|line| line.quantity == 0) {
            return Err(ValidationError::Invalid {
                field: "items",
                reason: "quantity must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Payload for `PUT /api/orders/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
}

impl OrderUpdate {
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::optional_text("customer_name", self.customer_name.as_deref(), MAX_NAME_LENGTH)?;
        validate_email(self.customer_email.as_deref())
    }
}

fn validate_email(email: Option<&str>) -> Result<(), ValidationError> {
    match email {
        Some(raw) => Email::parse(raw)
            .map(|_| ())
            .map_err(|e| ValidationError::Invalid {
                field: "customer_email",
                reason: e.to_string(),
            }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_requires_items() {
        let order = NewOrder {
            customer_name: Some("Walk-in".to_string()),
            customer_email: None,
            items: vec![],
            status: OrderStatus::Pending,
        };
        assert_eq!(order.validate(), Err(ValidationError::Empty { field: "items" }));
    }

    #[test]
    fn test_new_order_rejects_zero_quantity_and_bad_email() {
        let mut order = NewOrder {
            customer_name: None,
            customer_email: Some("collector@gallery.test".to_string()),
            items: vec![OrderLineInput {
                product_id: ProductId::new(1),
                quantity: 0,
            }],
            status: OrderStatus::Pending,
        };
        assert!(matches!(
            order.validate(),
            Err(ValidationError::Invalid { field: "items", .. })
        ));

        order.items[0].quantity = 2;
        assert!(order.validate().is_ok());

        order.customer_email = Some("not-an-email".to_string());
        assert!(matches!(
            order.validate(),
            Err(ValidationError::Invalid {
                field: "customer_email",
                ..
            })
        ));
    }
}
