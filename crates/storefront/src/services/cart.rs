//! Cart service: the visitor's cart over session storage.
//!
//! Every mutation loads the cart, applies the change and persists the whole
//! cart before returning. Two concurrent requests on one session are
//! last-write-wins.

use rust_decimal::Decimal;
use serde::Serialize;

use gallery_core::ProductId;
use gallery_core::cart::{Cart, CartTotals, LineItem, PricingPolicy};
use gallery_core::catalog::Product;

use super::storage::{SessionStorage, StorageError};
use crate::models::session_keys;

/// A cart line as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub item: LineItem,
    pub selected: bool,
    pub line_total: Decimal,
}

/// The cart as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    /// Total units across all lines, selected or not.
    pub item_count: u64,
    /// Totals over the selected lines, tax excluded.
    pub totals: CartTotals,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, pricing: &PricingPolicy) -> Self {
        let items = cart
            .lines()
            .iter()
            .map(|line| CartLineView {
                item: line.clone(),
                selected: cart.is_selected(line.id),
                line_total: line.line_total(),
            })
            .collect();

        Self {
            items,
            item_count: cart.lines().iter().map(|l| u64::from(l.quantity)).sum(),
            totals: pricing.cart_totals(cart),
        }
    }
}

/// Cart operations for one visitor.
pub struct CartService<'a, S> {
    storage: &'a S,
    pricing: &'a PricingPolicy,
}

impl<'a, S: SessionStorage> CartService<'a, S> {
    #[must_use]
    pub const fn new(storage: &'a S, pricing: &'a PricingPolicy) -> Self {
        Self { storage, pricing }
    }

    /// The stored cart, or an empty one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be read.
    pub async fn load(&self) -> Result<Cart, StorageError> {
        Ok(self
            .storage
            .load::<Cart>(session_keys::CART)
            .await?
            .unwrap_or_default())
    }

    /// Render `cart` for the API.
    #[must_use]
    pub fn view(&self, cart: &Cart) -> CartView {
        CartView::new(cart, self.pricing)
    }

    /// Add `delta` units of `product`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be read or written.
    pub async fn add(&self, product: &Product, delta: i64) -> Result<Cart, StorageError> {
        let cart = self.load().await?;
        self.save(cart.add(LineItem::from_product(product, 0), delta))
            .await
    }

    /// Set a line's quantity; zero or below removes it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be read or written.
    pub async fn set_quantity(&self, id: ProductId, quantity: i64) -> Result<Cart, StorageError> {
        let cart = self.load().await?;
        self.save(cart.set_quantity(id, quantity)).await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be read or written.
    pub async fn remove(&self, id: ProductId) -> Result<Cart, StorageError> {
        let cart = self.load().await?;
        self.save(cart.remove(id)).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be written.
    pub async fn clear(&self) -> Result<Cart, StorageError> {
        self.save(Cart::new()).await
    }

    /// Select or deselect one line.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be read or written.
    pub async fn select(&self, id: ProductId, selected: bool) -> Result<Cart, StorageError> {
        let cart = self.load().await?;
        self.save(cart.select(id, selected)).await
    }

    /// Select or deselect every line.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be read or written.
    pub async fn select_all(&self, selected: bool) -> Result<Cart, StorageError> {
        let cart = self.load().await?;
        self.save(cart.select_all(selected)).await
    }

    async fn save(&self, cart: Cart) -> Result<Cart, StorageError> {
        self.storage.store(session_keys::CART, &cart).await?;
        Ok(cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::services::storage::MemoryStorage;

    fn product(id: i32, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Print #{id}"),
            description: String::new(),
            price: Decimal::new(price, 0),
            image_url: None,
            category_id: None,
            stock: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_every_mutation_is_persisted() {
        let storage = MemoryStorage::new();
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);

        service.add(&product(1, 10), 2).await.unwrap();
        service.add(&product(1, 10), 1).await.unwrap();
        service.add(&product(2, 4), 1).await.unwrap();

        let reloaded = CartService::new(&storage, &pricing).load().await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(ProductId::new(1)).unwrap().quantity, 3);

        service.set_quantity(ProductId::new(2), 0).await.unwrap();
        let reloaded = service.load().await.unwrap();
        assert!(reloaded.get(ProductId::new(2)).is_none());

        service.clear().await.unwrap();
        assert!(service.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_view_reports_selection_totals() {
        let storage = MemoryStorage::new();
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);

        service.add(&product(1, 10), 2).await.unwrap();
        service.add(&product(2, 7), 1).await.unwrap();
        let cart = service.select(ProductId::new(2), false).await.unwrap();

        let view = service.view(&cart);
        assert_eq!(view.item_count, 3);
        assert!(!view.items[1].selected);
        assert_eq!(view.totals.subtotal, Decimal::new(20, 0));
        assert_eq!(view.totals.total_excl_tax, Decimal::new(30, 0));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["items"][0]["id"], 1);
        assert_eq!(json["items"][0]["selected"], true);
    }
}
