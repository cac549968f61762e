//! Catalog entities and their create/update payloads.
//!
//! Every entity served by the storefront API lives here so the server and
//! the admin dashboard client agree on one wire format.

pub mod artwork;
pub mod category;
pub mod order;
pub mod product;
pub mod user;
pub mod validation;

pub use artwork::{Artwork, ArtworkUpdate, NewArtwork};
pub use category::{Category, CategoryUpdate, NewCategory};
pub use order::{NewOrder, Order, OrderLineInput, OrderUpdate};
pub use product::{NewProduct, Product, ProductUpdate};
pub use user::User;
pub use validation::ValidationError;
