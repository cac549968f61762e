//! Selection subtotal, shipping and tax.
//!
//! The cart stage shows `subtotal + shipping` without tax. Tax is only added
//! at the checkout stage, computed from the frozen checkout snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Cart, LineItem};
use crate::{CurrencyCode, Money, round_cents};

/// Store-wide pricing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Flat fee charged when at least one unit is selected.
    pub shipping_fee: Decimal,
    /// Fraction of the subtotal charged as tax (`0.10` = 10%).
    pub tax_rate: Decimal,
    pub currency: CurrencyCode,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            shipping_fee: Decimal::new(10, 0),
            tax_rate: Decimal::new(10, 2),
            currency: CurrencyCode::USD,
        }
    }
}

impl PricingPolicy {
    /// Totals over the cart's selected lines, tax excluded.
    #[must_use]
    pub fn cart_totals(&self, cart: &Cart) -> CartTotals {
        let (selected_quantity, subtotal) = sum_lines(cart.selected_lines());
        let shipping = self.shipping_for(selected_quantity);
        CartTotals {
            selected_quantity,
            subtotal,
            shipping,
            total_excl_tax: subtotal + shipping,
            currency: self.currency,
        }
    }

    /// Totals over checkout snapshot lines, tax included.
    #[must_use]
    pub fn checkout_totals(&self, items: &[LineItem]) -> CheckoutTotals {
        let (quantity, subtotal) = sum_lines(items.iter());
        let shipping = self.shipping_for(quantity);
        let tax = round_cents(subtotal * self.tax_rate);
        CheckoutTotals {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
            currency: self.currency,
        }
    }

    fn shipping_for(&self, quantity: u64) -> Decimal {
        if quantity > 0 {
            self.shipping_fee
        } else {
            Decimal::ZERO
        }
    }
}

fn sum_lines<'a>(lines: impl Iterator<Item = &'a LineItem>) -> (u64, Decimal) {
    lines.fold((0, Decimal::ZERO), |(quantity, subtotal), line| {
        (
            quantity + u64::from(line.quantity),
            subtotal + line.line_total(),
        )
    })
}

/// Cart-stage totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub selected_quantity: u64,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    /// `subtotal + shipping`.
    pub total_excl_tax: Decimal,
    pub currency: CurrencyCode,
}

/// Checkout-stage totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    /// `subtotal + shipping + tax`.
    pub total: Decimal,
    pub currency: CurrencyCode,
}

impl CheckoutTotals {
    /// The amount to charge.
    #[must_use]
    pub const fn amount_due(&self) -> Money {
        Money::new(self.total, self.currency)
    }
}
