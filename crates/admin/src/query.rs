//! Client-side search, sort and filter over a fetched list.
//!
//! A query never touches the list it reads; it returns references in view
//! order.

use std::str::FromStr;

use gallery_core::{CategoryId, OrderStatus};

use crate::resource::Resource;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Sort by one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub key: String,
    pub direction: Direction,
}

impl Sort {
    #[must_use]
    pub fn ascending(key: &str) -> Self {
        Self {
            key: key.to_string(),
            direction: Direction::Ascending,
        }
    }

    #[must_use]
    pub fn descending(key: &str) -> Self {
        Self {
            key: key.to_string(),
            direction: Direction::Descending,
        }
    }
}

impl FromStr for Sort {
    type Err = String;

    /// `price` sorts ascending, `-price` descending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (key, direction) = s
            .strip_prefix('-')
            .map_or((s, Direction::Ascending), |key| (key, Direction::Descending));
        if key.is_empty() {
            return Err("sort key cannot be empty".to_string());
        }
        Ok(Self {
            key: key.to_string(),
            direction,
        })
    }
}

/// What a panel shows of its fetched list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelQuery {
    /// Case-insensitive substring over the entity's text fields.
    pub search: Option<String>,
    pub sort: Option<Sort>,
    /// Only entities in this category (products and artworks).
    pub category: Option<CategoryId>,
    /// Only orders with this status.
    pub status: Option<OrderStatus>,
}

impl PanelQuery {
    /// Apply the query. Unknown sort keys keep fetch order.
    #[must_use]
    pub fn apply<'a, R: Resource>(&self, items: &'a [R]) -> Vec<&'a R> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut view: Vec<&R> = items
            .iter()
            .filter(|item| {
                needle.as_deref().is_none_or(|needle| {
                    item.search_text()
                        .iter()
                        .any(|field| field.to_lowercase().contains(needle))
                })
            })
            .filter(|item| {
                self.category
                    .is_none_or(|category| item.category_id() == Some(category))
            })
            .filter(|item| self.status.is_none_or(|status| item.status() == Some(status)))
            .collect();

        if let Some(sort) = &self.sort {
            // Stable, so ties keep fetch order.
            view.sort_by(|a, b| {
                let ordering = a.sort_value(&sort.key).cmp(&b.sort_value(&sort.key));
                match sort.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        view
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use gallery_core::ProductId;
    use gallery_core::catalog::Product;

    use super::*;

    fn product(id: i32, name: &str, price: i64, category: Option<i32>) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: String::new(),
            price: Decimal::new(price, 0),
            image_url: None,
            category_id: category.map(CategoryId::new),
            stock: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ids(view: &[&Product]) -> Vec<i32> {
        view.iter().map(|p| p.id.as_i32()).collect()
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Harbor Print", 40, Some(1)),
            product(2, "Night Poster", 15, Some(2)),
            product(3, "harbor tote", 25, None),
        ]
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let items = catalog();
        let query = PanelQuery {
            search: Some("HARBOR".to_string()),
            ..PanelQuery::default()
        };
        assert_eq!(ids(&query.apply(&items)), vec![1, 3]);
    }

    #[test]
    fn test_sort_and_filter_do_not_mutate() {
        let items = catalog();
        let before = items.clone();

        let query = PanelQuery {
            sort: Some(Sort::descending("price")),
            ..PanelQuery::default()
        };
        assert_eq!(ids(&query.apply(&items)), vec![1, 3, 2]);

        let query = PanelQuery {
            category: Some(CategoryId::new(2)),
            ..PanelQuery::default()
        };
        assert_eq!(ids(&query.apply(&items)), vec![2]);

        assert_eq!(items, before);
    }

    #[test]
    fn test_unknown_sort_key_keeps_fetch_order() {
        let items = catalog();
        let query = PanelQuery {
            sort: Some(Sort::ascending("colour")),
            ..PanelQuery::default()
        };
        assert_eq!(ids(&query.apply(&items)), vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_from_str() {
        assert_eq!("-price".parse::<Sort>().unwrap(), Sort::descending("price"));
        assert_eq!("name".parse::<Sort>().unwrap(), Sort::ascending("name"));
        assert!("-".parse::<Sort>().is_err());
    }
}
