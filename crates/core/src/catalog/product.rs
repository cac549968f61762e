//! Purchasable products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::{self, MAX_NAME_LENGTH, ValidationError};
use crate::{CategoryId, ProductId};

/// A product that can be added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
    /// Units on hand. Decremented when a paid order is recorded.
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether `quantity` units can be sold right now.
    #[must_use]
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        u32::try_from(self.stock).is_ok_and(|stock| stock >= quantity)
    }
}

/// Payload for `POST /api/products`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub stock: i32,
}

impl NewProduct {
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::text("name", &self.name, MAX_NAME_LENGTH)?;
        validation::long_text("description", &self.description)?;
        validation::price("price", self.price)?;
        validation::count("stock", self.stock)
    }
}

/// Payload for `PUT /api/products/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
}

impl ProductUpdate {
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::optional_text("name", self.name.as_deref(), MAX_NAME_LENGTH)?;
        if let Some(description) = &self.description {
            validation::long_text("description", description)?;
        }
        if let Some(price) = self.price {
            validation::price("price", price)?;
        }
        if let Some(stock) = self.stock {
            validation::count("stock", stock)?;
        }
        Ok(())
    }
}
