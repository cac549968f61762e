//! The tabbed admin dashboard: one panel per entity.

use std::fmt;
use std::str::FromStr;

use gallery_core::catalog::{Artwork, Category, Order, OrderUpdate, Product};
use gallery_core::{OrderId, OrderStatus};

use crate::client::AdminApi;
use crate::error::AdminError;
use crate::panel::Panel;
use crate::query::PanelQuery;
use crate::resource::{Column, Resource};

/// Dashboard tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Artworks,
    Products,
    Categories,
    Orders,
}

impl Tab {
    pub const ALL: [Self; 4] = [Self::Artworks, Self::Products, Self::Categories, Self::Orders];

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Artworks => "Artworks",
            Self::Products => "Products",
            Self::Categories => "Categories",
            Self::Orders => "Orders",
        }
    }

    /// Table columns for the tab.
    #[must_use]
    pub const fn columns(self) -> &'static [Column] {
        match self {
            Self::Artworks => Artwork::COLUMNS,
            Self::Products => Product::COLUMNS,
            Self::Categories => Category::COLUMNS,
            Self::Orders => Order::COLUMNS,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|tab| tab.title().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown tab: {s}"))
    }
}

/// A rendered panel view: header labels and cell text per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn build<R: Resource>(panel: &Panel<R>, query: &PanelQuery) -> Self {
        Self {
            headers: R::COLUMNS.iter().map(|c| c.label).collect(),
            rows: panel
                .view(query)
                .into_iter()
                .map(|item| R::COLUMNS.iter().map(|c| item.cell(c.key)).collect())
                .collect(),
        }
    }
}

/// All four panels plus the selected tab.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub active: Tab,
    pub artworks: Panel<Artwork>,
    pub products: Panel<Product>,
    pub categories: Panel<Category>,
    pub orders: Panel<Order>,
}

impl Dashboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch one tab's list.
    ///
    /// # Errors
    ///
    /// Returns the API error for that tab.
    pub async fn load(&mut self, api: &impl AdminApi, tab: Tab) -> Result<(), AdminError> {
        match tab {
            Tab::Artworks => self.artworks.load(api).await.map(|_| ()),
            Tab::Products => self.products.load(api).await.map(|_| ()),
            Tab::Categories => self.categories.load(api).await.map(|_| ()),
            Tab::Orders => self.orders.load(api).await.map(|_| ()),
        }
    }

    /// Fetch every tab. A failing tab does not stop the others; its error is
    /// returned alongside the tab.
    pub async fn load_all(&mut self, api: &impl AdminApi) -> Vec<(Tab, AdminError)> {
        let mut errors = Vec::new();
        for tab in Tab::ALL {
            if let Err(e) = self.load(api, tab).await {
                tracing::warn!(tab = %tab, error = %e, "failed to load panel");
                errors.push((tab, e));
            }
        }
        errors
    }

    /// Render a tab through `query`.
    #[must_use]
    pub fn table(&self, tab: Tab, query: &PanelQuery) -> Table {
        match tab {
            Tab::Artworks => Table::build(&self.artworks, query),
            Tab::Products => Table::build(&self.products, query),
            Tab::Categories => Table::build(&self.categories, query),
            Tab::Orders => Table::build(&self.orders, query),
        }
    }

    /// Move an order to a new status, then refetch orders.
    ///
    /// # Errors
    ///
    /// Returns the API error from the update or the refetch.
    pub async fn set_order_status(
        &mut self,
        api: &impl AdminApi,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, AdminError> {
        let update = OrderUpdate {
            status: Some(status),
            ..OrderUpdate::default()
        };
        self.orders.update(api, id, &update).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use gallery_core::{CurrencyCode, ProductId};

    use super::*;
    use crate::panel::tests::FakeApi;
    use crate::query::Sort;

    fn product(id: i32, name: &str, price: i64) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: String::new(),
            price: Decimal::new(price, 0),
            image_url: None,
            category_id: None,
            stock: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn order(id: i32, status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(id),
            provider_order_id: None,
            capture_id: None,
            status,
            customer_name: Some(format!("Collector {id}")),
            customer_email: None,
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            shipping: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            currency_code: CurrencyCode::USD,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_tab_parses_case_insensitively() {
        assert_eq!("orders".parse::<Tab>().unwrap(), Tab::Orders);
        assert_eq!(" Artworks ".parse::<Tab>().unwrap(), Tab::Artworks);
        assert!("users".parse::<Tab>().is_err());
    }

    #[tokio::test]
    async fn test_load_all_fetches_each_tab() {
        let api = FakeApi::default().with(&[product(1, "Poster", 20)]);
        let mut dashboard = Dashboard::new();

        let errors = dashboard.load_all(&api).await;
        assert!(errors.is_empty());
        for tab in Tab::ALL {
            let path = match tab {
                Tab::Artworks => Artwork::PATH,
                Tab::Products => Product::PATH,
                Tab::Categories => Category::PATH,
                Tab::Orders => Order::PATH,
            };
            assert_eq!(api.list_calls(path), 1, "{tab}");
        }
        assert_eq!(dashboard.products.items().len(), 1);
    }

    #[tokio::test]
    async fn test_table_renders_sorted_rows() {
        let api = FakeApi::default().with(&[
            product(1, "Poster", 20),
            product(2, "Canvas", 90),
            product(3, "Mug", 12),
        ]);
        let mut dashboard = Dashboard::new();
        dashboard.load(&api, Tab::Products).await.unwrap();

        let query = PanelQuery {
            sort: Some(Sort::descending("price")),
            ..PanelQuery::default()
        };
        let table = dashboard.table(Tab::Products, &query);
        assert_eq!(table.headers[1], "Name");
        let names: Vec<_> = table.rows.iter().map(|row| row[1].as_str()).collect();
        assert_eq!(names, vec!["Canvas", "Poster", "Mug"]);
        assert_eq!(table.rows[0][2], "90.00");
    }

    #[tokio::test]
    async fn test_set_order_status_refetches_orders() {
        let api = FakeApi::default().with(&[order(1, OrderStatus::Paid), order(2, OrderStatus::Paid)]);
        let mut dashboard = Dashboard::new();
        dashboard.load(&api, Tab::Orders).await.unwrap();

        let updated = dashboard
            .set_order_status(&api, OrderId::new(2), OrderStatus::Fulfilled)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Fulfilled);
        assert_eq!(api.list_calls(Order::PATH), 2);

        let query = PanelQuery {
            status: Some(OrderStatus::Fulfilled),
            ..PanelQuery::default()
        };
        let fulfilled = dashboard.orders.view(&query);
        assert_eq!(fulfilled.len(), 1);
        assert_eq!(fulfilled[0].id, OrderId::new(2));
    }
}
