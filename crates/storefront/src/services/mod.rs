//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Staff login and JWT issuing
//! - `cart` - Session cart mutations and totals
//! - `checkout` - Checkout snapshot, payment creation and capture
//! - `storage` - Per-visitor session storage used by cart and checkout

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod storage;

pub use auth::AuthService;
pub use cart::CartService;
pub use checkout::{CheckoutError, CheckoutService, PgCheckoutStore};
pub use storage::{MemoryStorage, SessionStorage, StorageError};
