//! Gallery Core - shared types library.
//!
//! Used by every Gallery component:
//! - `storefront` - the public JSON API, cart and checkout
//! - `admin` - the dashboard client and its CRUD panels
//! - `cli` - migrations, seeding and dashboard commands
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. The optional `postgres` feature adds `sqlx`
//! encodings for IDs and status enums.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, emails and statuses
//! - [`catalog`] - Artworks, products, categories, orders and users
//! - [`cart`] - Cart reconciliation, selection and pricing
//! - [`checkout`] - Checkout snapshot and payment-capture state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod types;

pub use types::*;
