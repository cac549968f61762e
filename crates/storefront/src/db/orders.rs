//! Order repository.
//!
//! Orders written by checkout carry the payment provider's order id, which is
//! unique in the table. Recording the same provider order twice fails with
//! `RepositoryError::Conflict`, so a capture can never credit two orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use gallery_core::cart::{CheckoutTotals, LineItem};
use gallery_core::catalog::{Order, OrderUpdate};
use gallery_core::checkout::CapturedOrder;
use gallery_core::{CurrencyCode, OrderId, OrderStatus};

use super::RepositoryError;

const COLUMNS: &str = "id, provider_order_id, capture_id, status, customer_name, customer_email, \
                       items, subtotal, shipping, tax, total, currency_code, created_at, updated_at";

const DUPLICATE_PROVIDER_ORDER: &str = "an order already exists for this payment";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    provider_order_id: Option<String>,
    capture_id: Option<String>,
    status: OrderStatus,
    customer_name: Option<String>,
    customer_email: Option<String>,
    items: Json<Vec<LineItem>>,
    subtotal: Decimal,
    shipping: Decimal,
    tax: Decimal,
    total: Decimal,
    currency_code: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let currency_code = row.currency_code.parse::<CurrencyCode>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            provider_order_id: row.provider_order_id,
            capture_id: row.capture_id,
            status: row.status,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            items: row.items.0,
            subtotal: row.subtotal,
            shipping: row.shipping,
            tax: row.tax,
            total: row.total,
            currency_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A staff-entered order with its lines already priced.
#[derive(Debug, Clone)]
pub struct ManualOrder {
    pub status: OrderStatus,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub items: Vec<LineItem>,
    pub totals: CheckoutTotals,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored currency is unknown.
    pub async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"SELECT {COLUMNS} FROM gallery."order" ORDER BY created_at DESC, id DESC"#
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"SELECT {COLUMNS} FROM gallery."order" WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Find the order recorded for a payment provider order, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_provider_order_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"SELECT {COLUMNS} FROM gallery."order" WHERE provider_order_id = $1"#
        ))
        .bind(provider_order_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Insert a staff-entered order. Stock is not touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ManualOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO gallery."order"
                (status, customer_name, customer_email, items,
                 subtotal, shipping, tax, total, currency_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(input.status)
        .bind(input.customer_name.as_deref())
        .bind(input.customer_email.as_deref())
        .bind(Json(&input.items))
        .bind(input.totals.subtotal)
        .bind(input.totals.shipping)
        .bind(input.totals.tax)
        .bind(input.totals.total)
        .bind(input.totals.currency.code())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Record a captured payment as a paid order and take its lines out of
    /// stock, in one transaction.
    ///
    /// Stock never goes below zero: the payment has already been captured, so
    /// the order is recorded even when a line outsold its stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an order already exists for the
    /// provider order id.
    pub async fn record_paid(&self, captured: &CapturedOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO gallery."order"
                (provider_order_id, capture_id, status, customer_name, customer_email, items,
                 subtotal, shipping, tax, total, currency_code)
            VALUES ($1, $2, 'paid', $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&captured.provider_order_id)
        .bind(&captured.capture_id)
        .bind(captured.customer_name.as_deref())
        .bind(captured.customer_email.as_deref())
        .bind(Json(&captured.items))
        .bind(captured.totals.subtotal)
        .bind(captured.totals.shipping)
        .bind(captured.totals.tax)
        .bind(captured.totals.total)
        .bind(captured.totals.currency.code())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_as_conflict(e, DUPLICATE_PROVIDER_ORDER))?;

        for item in &captured.items {
            let quantity = i32::try_from(item.quantity).unwrap_or(i32::MAX);
            sqlx::query(
                r"
                UPDATE gallery.product
                SET stock = GREATEST(stock - $2, 0), updated_at = now()
                WHERE id = $1
                ",
            )
            .bind(item.id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        row.try_into()
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update(&self, id: OrderId, input: &OrderUpdate) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE gallery."order"
            SET status = COALESCE($2, status),
                customer_name = COALESCE($3, customer_name),
                customer_email = COALESCE($4, customer_email),
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.status)
        .bind(input.customer_name.as_deref())
        .bind(input.customer_email.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query(r#"DELETE FROM gallery."order" WHERE id = $1"#)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
