//! Gallery admin dashboard library.
//!
//! Tabbed CRUD panels over the storefront JSON API. Each panel fetches its
//! full list, filters and sorts it client-side, and refetches after every
//! write. The `gallery-cli` binary drives it from the terminal.
//!
//! # Security
//!
//! Every write needs an admin login. The bearer token is held in memory and
//! never written to disk.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod dashboard;
pub mod error;
pub mod panel;
pub mod query;
pub mod resource;

pub use client::{AdminApi, ApiClient, LoginResponse};
pub use dashboard::{Dashboard, Tab, Table};
pub use error::AdminError;
pub use panel::Panel;
pub use query::{Direction, PanelQuery, Sort};
pub use resource::{Column, Resource, SortValue};
