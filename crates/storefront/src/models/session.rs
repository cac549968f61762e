//! Keys of the per-visitor session store.
//!
//! The session is cookie-identified and stored in `PostgreSQL`. Login tokens
//! are never stored here; they travel in the `Authorization` header.

/// Session keys for cart and checkout state.
pub mod keys {
    /// The visitor's cart.
    pub const CART: &str = "cart";

    /// Checkout snapshot of the selected cart lines.
    pub const CHECKOUT_ITEMS: &str = "checkoutItems";

    /// Payment state machine of the current checkout attempt.
    pub const CHECKOUT_STATE: &str = "checkoutState";

    /// Receipt of the most recent completed order.
    pub const LAST_ORDER: &str = "lastOrder";
}
