//! Entities a dashboard panel can manage.

use std::cmp::Ordering;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;

use gallery_core::catalog::{
    Artwork, ArtworkUpdate, Category, CategoryUpdate, NewArtwork, NewCategory, NewOrder,
    NewProduct, Order, OrderUpdate, Product, ProductUpdate,
};
use gallery_core::{ArtworkId, CategoryId, OrderId, OrderStatus, ProductId};

/// Column definition for a panel table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Key used for sorting and cell lookup.
    pub key: &'static str,
    /// Header label.
    pub label: &'static str,
    pub sortable: bool,
}

impl Column {
    const fn sortable(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: true,
        }
    }

    const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: false,
        }
    }
}

/// A comparable cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortValue {
    Text(String),
    Number(Decimal),
    Integer(i64),
    Time(DateTime<Utc>),
    /// Missing values sort first.
    Missing,
}

impl SortValue {
    fn text(value: &str) -> Self {
        Self::Text(value.to_lowercase())
    }
}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            (Self::Missing, Self::Missing) => Ordering::Equal,
            (Self::Missing, _) => Ordering::Less,
            (_, Self::Missing) => Ordering::Greater,
            // Keys never mix kinds within one column.
            _ => Ordering::Equal,
        }
    }
}

/// An entity exposed by the API with list/create/update(/delete) routes.
pub trait Resource: DeserializeOwned + Clone + Send + Sync + 'static {
    type Id: Display + Copy + PartialEq + Send + Sync + 'static;
    type Create: Serialize + Send + Sync;
    type Update: Serialize + Send + Sync;

    /// Plural name, for messages.
    const NAME: &'static str;
    /// Collection route.
    const PATH: &'static str;
    /// Whether the API has a delete route.
    const DELETABLE: bool = true;
    /// Table columns, in display order.
    const COLUMNS: &'static [Column];

    fn id(&self) -> Self::Id;

    /// Text fields matched by the search box.
    fn search_text(&self) -> Vec<&str>;

    /// Value of a sortable column; `None` for unknown keys.
    fn sort_value(&self, key: &str) -> Option<SortValue>;

    /// Display text of a column.
    fn cell(&self, key: &str) -> String;

    fn category_id(&self) -> Option<CategoryId> {
        None
    }

    fn status(&self) -> Option<OrderStatus> {
        None
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl Resource for Artwork {
    type Id = ArtworkId;
    type Create = NewArtwork;
    type Update = ArtworkUpdate;

    const NAME: &'static str = "artworks";
    const PATH: &'static str = "/api/artworks";
    const COLUMNS: &'static [Column] = &[
        Column::new("id", "ID"),
        Column::sortable("title", "Title"),
        Column::sortable("artist", "Artist"),
        Column::sortable("year", "Year"),
        Column::new("medium", "Medium"),
        Column::sortable("price", "Price"),
        Column::new("available", "Available"),
        Column::sortable("likes", "Likes"),
        Column::sortable("created", "Created"),
    ];

    fn id(&self) -> ArtworkId {
        self.id
    }

    fn search_text(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.artist.as_str(), self.description.as_str()];
        fields.extend(self.medium.as_deref());
        fields
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        Some(match key {
            "title" => SortValue::text(&self.title),
            "artist" => SortValue::text(&self.artist),
            "year" => self
                .year
                .map_or(SortValue::Missing, |y| SortValue::Integer(i64::from(y))),
            "price" => SortValue::Number(self.price),
            "likes" => SortValue::Integer(i64::from(self.likes)),
            "created" => SortValue::Time(self.created_at),
            _ => return None,
        })
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "id" => self.id.to_string(),
            "title" => self.title.clone(),
            "artist" => self.artist.clone(),
            "year" => optional(self.year),
            "medium" => self.medium.clone().unwrap_or_default(),
            "price" => format!("{:.2}", self.price),
            "available" => (if self.available { "yes" } else { "no" }).to_string(),
            "likes" => self.likes.to_string(),
            "created" => self.created_at.format("%Y-%m-%d").to_string(),
            _ => String::new(),
        }
    }

    fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }
}

impl Resource for Product {
    type Id = ProductId;
    type Create = NewProduct;
    type Update = ProductUpdate;

    const NAME: &'static str = "products";
    const PATH: &'static str = "/api/products";
    const DELETABLE: bool = false;
    const COLUMNS: &'static [Column] = &[
        Column::new("id", "ID"),
        Column::sortable("name", "Name"),
        Column::sortable("price", "Price"),
        Column::sortable("stock", "Stock"),
        Column::new("category", "Category"),
        Column::sortable("created", "Created"),
    ];

    fn id(&self) -> ProductId {
        self.id
    }

    fn search_text(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.description.as_str()]
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        Some(match key {
            "name" => SortValue::text(&self.name),
            "price" => SortValue::Number(self.price),
            "stock" => SortValue::Integer(i64::from(self.stock)),
            "created" => SortValue::Time(self.created_at),
            _ => return None,
        })
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "id" => self.id.to_string(),
            "name" => self.name.clone(),
            "price" => format!("{:.2}", self.price),
            "stock" => self.stock.to_string(),
            "category" => optional(self.category_id),
            "created" => self.created_at.format("%Y-%m-%d").to_string(),
            _ => String::new(),
        }
    }

    fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }
}

impl Resource for Category {
    type Id = CategoryId;
    type Create = NewCategory;
    type Update = CategoryUpdate;

    const NAME: &'static str = "categories";
    const PATH: &'static str = "/api/categories";
    const COLUMNS: &'static [Column] = &[
        Column::new("id", "ID"),
        Column::sortable("name", "Name"),
        Column::new("description", "Description"),
        Column::sortable("created", "Created"),
    ];

    fn id(&self) -> CategoryId {
        self.id
    }

    fn search_text(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        Some(match key {
            "name" => SortValue::text(&self.name),
            "created" => SortValue::Time(self.created_at),
            _ => return None,
        })
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "id" => self.id.to_string(),
            "name" => self.name.clone(),
            "description" => self.description.clone().unwrap_or_default(),
            "created" => self.created_at.format("%Y-%m-%d").to_string(),
            _ => String::new(),
        }
    }
}

impl Resource for Order {
    type Id = OrderId;
    type Create = NewOrder;
    type Update = OrderUpdate;

    const NAME: &'static str = "orders";
    const PATH: &'static str = "/api/orders";
    const COLUMNS: &'static [Column] = &[
        Column::new("id", "ID"),
        Column::sortable("customer", "Customer"),
        Column::new("email", "Email"),
        Column::sortable("status", "Status"),
        Column::sortable("items", "Items"),
        Column::sortable("total", "Total"),
        Column::sortable("created", "Created"),
    ];

    fn id(&self) -> OrderId {
        self.id
    }

    fn search_text(&self) -> Vec<&str> {
        let mut fields = Vec::with_capacity(3);
        fields.extend(self.customer_name.as_deref());
        fields.extend(self.customer_email.as_deref());
        fields.extend(self.provider_order_id.as_deref());
        fields
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        Some(match key {
            "customer" => self
                .customer_name
                .as_deref()
                .map_or(SortValue::Missing, SortValue::text),
            "status" => SortValue::Text(self.status.as_str().to_string()),
            "items" => SortValue::Integer(i64::try_from(self.item_count()).unwrap_or(i64::MAX)),
            "total" => SortValue::Number(self.total),
            "created" => SortValue::Time(self.created_at),
            _ => return None,
        })
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "id" => self.id.to_string(),
            "customer" => self.customer_name.clone().unwrap_or_default(),
            "email" => self.customer_email.clone().unwrap_or_default(),
            "status" => self.status.to_string(),
            "items" => self.item_count().to_string(),
            "total" => format!("{:.2} {}", self.total, self.currency_code),
            "created" => self.created_at.format("%Y-%m-%d %H:%M").to_string(),
            _ => String::new(),
        }
    }

    fn status(&self) -> Option<OrderStatus> {
        Some(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sorts_first() {
        let mut values = vec![
            SortValue::Integer(3),
            SortValue::Missing,
            SortValue::Integer(1),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![SortValue::Missing, SortValue::Integer(1), SortValue::Integer(3)]
        );
    }

    #[test]
    fn test_sortable_columns_have_sort_values() {
        fn check<R: Resource>(sample: &R) {
            for column in R::COLUMNS.iter().filter(|c| c.sortable) {
                assert!(
                    sample.sort_value(column.key).is_some(),
                    "{} column {} is not sortable",
                    R::NAME,
                    column.key
                );
            }
        }

        let now = Utc::now();
        check(&Category {
            id: CategoryId::new(1),
            name: "Prints".to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        });
        check(&Product {
            id: ProductId::new(1),
            name: "Poster".to_string(),
            description: String::new(),
            price: Decimal::new(1500, 2),
            image_url: None,
            category_id: None,
            stock: 4,
            created_at: now,
            updated_at: now,
        });
    }
}
