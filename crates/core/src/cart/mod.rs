//! Shopping cart with line-item reconciliation and selection.
//!
//! A [`Cart`] is an immutable value: every mutation returns a new snapshot,
//! leaving the original untouched. Callers persist the returned cart.
//!
//! Two invariants hold for every cart this module hands out:
//!
//! - every line has `quantity >= 1` (a line that would drop to zero is removed)
//! - the selection map has exactly one entry per line, and newly added lines
//!   start selected

pub mod pricing;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ProductId;
use crate::catalog::Product;

pub use pricing::{CartTotals, CheckoutTotals, PricingPolicy};

/// One product entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub description: String,
    pub quantity: u32,
}

impl LineItem {
    /// Build a line for `product` with the given quantity.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.image_url.clone(),
            description: product.description.clone(),
            quantity,
        }
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// An ordered, id-unique collection of line items plus their selection state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCart")]
pub struct Cart {
    lines: Vec<LineItem>,
    selection: BTreeMap<ProductId, bool>,
}

/// Wire shape of a cart. Converted through [`Cart::reconciled`] on load so a
/// stale or hand-edited session value cannot break the invariants.
#[derive(Deserialize)]
struct StoredCart {
    #[serde(default)]
    lines: Vec<LineItem>,
    #[serde(default)]
    selection: BTreeMap<ProductId, bool>,
}

impl From<StoredCart> for Cart {
    fn from(stored: StoredCart) -> Self {
        let mut lines: Vec<LineItem> = Vec::with_capacity(stored.lines.len());
        for line in stored.lines {
            if line.quantity == 0 {
                continue;
            }
            match lines.iter_mut().find(|l| l.id == line.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => lines.push(line),
            }
        }
        Self::reconciled(lines, stored.selection)
    }
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.lines.iter().find(|line| line.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the line for `id` is selected. Absent lines are not.
    #[must_use]
    pub fn is_selected(&self, id: ProductId) -> bool {
        self.selection.get(&id).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn selection(&self) -> &BTreeMap<ProductId, bool> {
        &self.selection
    }

    /// Lines currently selected for checkout, in cart order.
    pub fn selected_lines(&self) -> impl Iterator<Item = &LineItem> {
        self.lines.iter().filter(|line| self.is_selected(line.id))
    }

    /// Add `delta` units of `item`.
    ///
    /// A present line has its quantity adjusted by `delta` and is removed when
    /// the result is zero or below. An absent line is appended with
    /// `quantity = delta`; a non-positive delta for an absent line changes
    /// nothing. Quantities saturate at `u32::MAX`. The existing line keeps
    /// its stored name and price.
    #[must_use]
    pub fn add(&self, item: LineItem, delta: i64) -> Self {
        let mut lines = self.lines.clone();
        match lines.iter_mut().find(|line| line.id == item.id) {
            Some(existing) => match apply_delta(existing.quantity, delta) {
                Some(quantity) => existing.quantity = quantity,
                None => lines.retain(|line| line.id != item.id),
            },
            None => {
                if let Some(quantity) = apply_delta(0, delta) {
                    lines.push(LineItem { quantity, ..item });
                }
            }
        }
        Self::reconciled(lines, self.selection.clone())
    }

    /// Remove the line for `id`. No-op when absent.
    #[must_use]
    pub fn remove(&self, id: ProductId) -> Self {
        let lines = self
            .lines
            .iter()
            .filter(|line| line.id != id)
            .cloned()
            .collect();
        Self::reconciled(lines, self.selection.clone())
    }

    /// Set the quantity of an existing line. Expressed as an [`add`](Self::add)
    /// of the difference, so a quantity of zero or below removes the line.
    /// No-op when `id` is not in the cart.
    #[must_use]
    pub fn set_quantity(&self, id: ProductId, quantity: i64) -> Self {
        match self.get(id) {
            Some(line) => {
                let delta = quantity.saturating_sub(i64::from(line.quantity));
                self.add(line.clone(), delta)
            }
            None => self.clone(),
        }
    }

    /// An empty cart.
    #[must_use]
    pub fn clear(&self) -> Self {
        Self::new()
    }

    /// Select or deselect one line. No-op when `id` is not in the cart.
    #[must_use]
    pub fn select(&self, id: ProductId, selected: bool) -> Self {
        let mut selection = self.selection.clone();
        if let Some(entry) = selection.get_mut(&id) {
            *entry = selected;
        }
        Self::reconciled(self.lines.clone(), selection)
    }

    /// Select or deselect every line.
    #[must_use]
    pub fn select_all(&self, selected: bool) -> Self {
        let selection = self.lines.iter().map(|line| (line.id, selected)).collect();
        Self::reconciled(self.lines.clone(), selection)
    }

    /// Prune selection entries with no line and select lines with no entry.
    fn reconciled(lines: Vec<LineItem>, mut selection: BTreeMap<ProductId, bool>) -> Self {
        selection.retain(|id, _| lines.iter().any(|line| line.id == *id));
        for line in &lines {
            selection.entry(line.id).or_insert(true);
        }
        Self { lines, selection }
    }
}

/// `current + delta` clamped to `u32`, or `None` when the result is `<= 0`.
fn apply_delta(current: u32, delta: i64) -> Option<u32> {
    let next = i64::from(current).saturating_add(delta);
    if next <= 0 {
        return None;
    }
    Some(u32::try_from(next).unwrap_or(u32::MAX))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn line(id: i32, price: i64, quantity: u32) -> LineItem {
        LineItem {
            id: ProductId::new(id),
            name: format!("Print #{id}"),
            price: Decimal::new(price, 0),
            image: None,
            description: String::new(),
            quantity,
        }
    }

    #[test]
    fn test_adding_same_product_twice_merges_quantities() {
        let cart = Cart::new().add(line(1, 10, 0), 2).add(line(1, 10, 0), 3);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 5);
    }

    #[test]
    fn test_mutation_returns_new_snapshot() {
        let empty = Cart::new();
        let one = empty.add(line(1, 10, 0), 1);
        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let cart = Cart::new()
            .add(line(3, 1, 0), 1)
            .add(line(1, 1, 0), 1)
            .add(line(2, 1, 0), 1)
            .add(line(3, 1, 0), 1);
        let ids: Vec<i32> = cart.lines().iter().map(|l| l.id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_quantity_reaching_zero_removes_line() {
        let cart = Cart::new().add(line(1, 10, 0), 2);
        assert!(cart.add(line(1, 10, 0), -2).is_empty());
        assert!(cart.add(line(1, 10, 0), -7).is_empty());
        assert!(cart.set_quantity(ProductId::new(1), 0).is_empty());
        assert!(cart.set_quantity(ProductId::new(1), -1).is_empty());
        assert!(cart.selection().is_empty());
    }

    #[test]
    fn test_non_positive_add_of_absent_line_is_noop() {
        let cart = Cart::new().add(line(1, 10, 0), 0).add(line(2, 10, 0), -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_replaces_count() {
        let cart = Cart::new()
            .add(line(1, 10, 0), 4)
            .set_quantity(ProductId::new(1), 9);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 9);

        let unchanged = cart.set_quantity(ProductId::new(99), 3);
        assert_eq!(unchanged, cart);
    }

    #[test]
    fn test_quantity_saturates() {
        let cart = Cart::new()
            .add(line(1, 1, 0), i64::from(u32::MAX))
            .add(line(1, 1, 0), 10);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, u32::MAX);
    }

    #[test]
    fn test_new_lines_are_selected_and_removed_lines_pruned() {
        let cart = Cart::new().add(line(1, 10, 0), 1).add(line(2, 5, 0), 1);
        assert!(cart.is_selected(ProductId::new(1)));
        assert!(cart.is_selected(ProductId::new(2)));

        let cart = cart.remove(ProductId::new(1));
        assert_eq!(cart.selection().len(), 1);
        assert!(!cart.selection().contains_key(&ProductId::new(1)));
    }

    #[test]
    fn test_deselect_keeps_line_in_cart() {
        let cart = Cart::new()
            .add(line(1, 10, 0), 1)
            .add(line(2, 5, 0), 1)
            .select(ProductId::new(1), false);
        assert_eq!(cart.len(), 2);
        let selected: Vec<ProductId> = cart.selected_lines().map(|l| l.id).collect();
        assert_eq!(selected, vec![ProductId::new(2)]);

        let none = cart.select_all(false);
        assert_eq!(none.selected_lines().count(), 0);
        assert_eq!(none.select_all(true).selected_lines().count(), 2);
    }

    #[test]
    fn test_readding_deselected_line_keeps_selection() {
        let cart = Cart::new()
            .add(line(1, 10, 0), 1)
            .select(ProductId::new(1), false)
            .add(line(1, 10, 0), 1);
        assert!(!cart.is_selected(ProductId::new(1)));
    }

    #[test]
    fn test_deserialize_repairs_stored_cart() {
        let json = r#"{
            "lines": [
                {"id": 1, "name": "A", "price": "10", "image": null, "description": "", "quantity": 1},
                {"id": 1, "name": "A", "price": "10", "image": null, "description": "", "quantity": 2},
                {"id": 2, "name": "B", "price": "4", "image": null, "description": "", "quantity": 0}
            ],
            "selection": {"7": true}
        }"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 3);
        assert!(cart.is_selected(ProductId::new(1)));
        assert_eq!(cart.selection().len(), 1);
    }

    #[test]
    fn test_serde_round_trip_keeps_selection() {
        let cart = Cart::new()
            .add(line(1, 10, 0), 2)
            .add(line(2, 3, 0), 1)
            .select(ProductId::new(2), false);
        let json = serde_json::to_string(&cart).unwrap();
        let back: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cart);
    }
}
