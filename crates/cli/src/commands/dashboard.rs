//! Admin dashboard from the terminal.
//!
//! Logs in to a running storefront and drives the same panels the dashboard
//! library exposes: list with search/sort/filter, delete, and order status.
//!
//! # Environment Variables
//!
//! - `GALLERY_API_URL` - Base URL of the storefront API (e.g. `http://127.0.0.1:3000`)
//! - `GALLERY_ADMIN_EMAIL` - Login email
//! - `GALLERY_ADMIN_PASSWORD` - Login password

use gallery_admin::{AdminError, ApiClient, Dashboard, PanelQuery, Sort, Tab, Table};
use gallery_core::{CategoryId, OrderId, OrderStatus};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use super::MissingEnvVar;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    #[error("Invalid GALLERY_API_URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid ID: {0}")]
    InvalidId(i32),

    #[error(transparent)]
    Api(#[from] AdminError),
}

/// Build a panel query from command-line flags.
#[must_use]
pub fn query(
    search: Option<String>,
    sort: Option<String>,
    desc: bool,
    category: Option<CategoryId>,
    status: Option<OrderStatus>,
) -> PanelQuery {
    PanelQuery {
        search,
        sort: sort.map(|key| {
            if desc {
                Sort::descending(&key)
            } else {
                Sort::ascending(&key)
            }
        }),
        category,
        status,
    }
}

/// A logged-in dashboard.
pub struct Session {
    api: ApiClient,
    dashboard: Dashboard,
}

impl Session {
    /// Log in with the credentials from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error for missing variables or a failed login.
    pub async fn connect() -> Result<Self, DashboardError> {
        let base_url = Url::parse(&super::required_env("GALLERY_API_URL")?)?;
        let email = super::required_env("GALLERY_ADMIN_EMAIL")?;
        let password = SecretString::from(super::required_env("GALLERY_ADMIN_PASSWORD")?);

        let api = ApiClient::new(base_url)?;
        api.login(&email, &password).await?;

        Ok(Self {
            api,
            dashboard: Dashboard::new(),
        })
    }

    /// Fetch a tab and print it through `query`.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn list(mut self, tab: Tab, query: &PanelQuery) -> Result<(), DashboardError> {
        self.dashboard.active = tab;
        self.dashboard.load(&self.api, tab).await?;
        print_table(&self.dashboard.table(tab, query));
        Ok(())
    }

    /// Delete one entity from a tab.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unsupported` for products, otherwise the API error.
    pub async fn delete(mut self, tab: Tab, id: i32) -> Result<(), DashboardError> {
        if id <= 0 {
            return Err(DashboardError::InvalidId(id));
        }
        let dashboard = &mut self.dashboard;
        match tab {
            Tab::Artworks => dashboard.artworks.delete(&self.api, id.into()).await?,
            Tab::Products => dashboard.products.delete(&self.api, id.into()).await?,
            Tab::Categories => dashboard.categories.delete(&self.api, id.into()).await?,
            Tab::Orders => dashboard.orders.delete(&self.api, id.into()).await?,
        }
        tracing::info!(tab = %tab, id, "deleted");
        print_table(&self.dashboard.table(tab, &PanelQuery::default()));
        Ok(())
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn set_order_status(
        mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), DashboardError> {
        let order = self
            .dashboard
            .set_order_status(&self.api, id, status)
            .await?;
        tracing::info!(order_id = %order.id, status = %order.status, "order updated");
        Ok(())
    }
}

/// Render a table with columns padded to their widest cell.
fn render(table: &Table) -> String {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = padded(table.headers.iter().copied(), &widths);
    out.push('\n');
    for row in &table.rows {
        out.push_str(&padded(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out.push_str(&format!("({} rows)", table.rows.len()));
    out
}

fn padded<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[allow(clippy::print_stdout)]
fn print_table(table: &Table) {
    println!("{}", render(table));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gallery_admin::Direction;

    use super::*;

    #[test]
    fn test_query_from_flags() {
        let query = query(Some("oil".to_string()), Some("price".to_string()), true, None, None);
        assert_eq!(query.search.as_deref(), Some("oil"));
        let sort = query.sort.unwrap();
        assert_eq!(sort.key, "price");
        assert_eq!(sort.direction, Direction::Descending);
    }

    #[test]
    fn test_render_pads_columns() {
        let table = Table {
            headers: vec!["ID", "Name"],
            rows: vec![
                vec!["1".to_string(), "Canvas".to_string()],
                vec!["10".to_string(), "Mug".to_string()],
            ],
        };
        assert_eq!(render(&table), "ID  Name\n1   Canvas\n10  Mug\n(2 rows)");
    }
}
