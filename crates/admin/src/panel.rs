//! One dashboard tab bound to one entity type.
//!
//! A panel holds the last fetched list. Every write goes to the API and is
//! followed by a full refetch, so the panel always shows server state.

use crate::client::AdminApi;
use crate::error::AdminError;
use crate::query::PanelQuery;
use crate::resource::Resource;

/// CRUD panel for `R`.
#[derive(Debug, Clone)]
pub struct Panel<R> {
    items: Vec<R>,
    loaded: bool,
}

impl<R> Default for Panel<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loaded: false,
        }
    }
}

impl<R: Resource> Panel<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a fetch has completed.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The fetched list, in server order.
    #[must_use]
    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// Find a fetched entity by ID.
    #[must_use]
    pub fn get(&self, id: R::Id) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// The fetched list after search, filter and sort.
    #[must_use]
    pub fn view(&self, query: &PanelQuery) -> Vec<&R> {
        query.apply(&self.items)
    }

    /// Fetch the full list, replacing what the panel holds.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous list is kept.
    pub async fn load(&mut self, api: &impl AdminApi) -> Result<&[R], AdminError> {
        self.items = api.list::<R>().await?;
        self.loaded = true;
        tracing::debug!(entity = R::NAME, count = self.items.len(), "panel loaded");
        Ok(&self.items)
    }

    /// Create an entity, then refetch.
    ///
    /// # Errors
    ///
    /// Returns the API error from the write or the refetch.
    pub async fn create(&mut self, api: &impl AdminApi, input: &R::Create) -> Result<R, AdminError> {
        let created = api.create::<R>(input).await?;
        self.load(api).await?;
        Ok(created)
    }

    /// Update an entity, then refetch.
    ///
    /// # Errors
    ///
    /// Returns the API error from the write or the refetch.
    pub async fn update(
        &mut self,
        api: &impl AdminApi,
        id: R::Id,
        input: &R::Update,
    ) -> Result<R, AdminError> {
        let updated = api.update::<R>(id, input).await?;
        self.load(api).await?;
        Ok(updated)
    }

    /// Delete an entity, then refetch.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unsupported` for entities without a delete route,
    /// otherwise the API error from the write or the refetch.
    pub async fn delete(&mut self, api: &impl AdminApi, id: R::Id) -> Result<(), AdminError> {
        if !R::DELETABLE {
            return Err(AdminError::Unsupported {
                entity: R::NAME,
                operation: "deleted",
            });
        }
        api.delete::<R>(id).await?;
        self.load(api).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;
    use serde_json::Value;

    use gallery_core::catalog::{Category, CategoryUpdate, NewCategory, Product};
    use gallery_core::{CategoryId, ProductId};

    use super::*;

    /// In-memory API keeping JSON lists per route, counting list calls.
    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub(crate) lists: Mutex<HashMap<&'static str, Vec<Value>>>,
        pub(crate) list_calls: Mutex<HashMap<&'static str, usize>>,
    }

    impl FakeApi {
        pub(crate) fn with<R: Resource + serde::Serialize>(self, items: &[R]) -> Self {
            self.lists.lock().unwrap().insert(
                R::PATH,
                items.iter().map(|i| serde_json::to_value(i).unwrap()).collect(),
            );
            self
        }

        pub(crate) fn list_calls(&self, path: &str) -> usize {
            self.list_calls
                .lock()
                .unwrap()
                .get(path)
                .copied()
                .unwrap_or_default()
        }
    }

    impl AdminApi for FakeApi {
        async fn list<R: Resource>(&self) -> Result<Vec<R>, AdminError> {
            *self.list_calls.lock().unwrap().entry(R::PATH).or_default() += 1;
            let lists = self.lists.lock().unwrap();
            Ok(lists
                .get(R::PATH)
                .map(|items| {
                    items
                        .iter()
                        .map(|v| serde_json::from_value(v.clone()).unwrap())
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn create<R: Resource>(&self, input: &R::Create) -> Result<R, AdminError> {
            let mut lists = self.lists.lock().unwrap();
            let items = lists.entry(R::PATH).or_default();
            let mut value = serde_json::to_value(input).unwrap();
            let now = serde_json::to_value(Utc::now()).unwrap();
            value["id"] = Value::from(items.len() + 1);
            value["created_at"] = now.clone();
            value["updated_at"] = now;
            items.push(value.clone());
            Ok(serde_json::from_value(value).unwrap())
        }

        async fn update<R: Resource>(&self, id: R::Id, input: &R::Update) -> Result<R, AdminError> {
            let mut lists = self.lists.lock().unwrap();
            let items = lists.entry(R::PATH).or_default();
            let item = items
                .iter_mut()
                .find(|v| v["id"].to_string() == id.to_string())
                .ok_or(AdminError::Api {
                    status: 404,
                    message: "not found".to_string(),
                })?;
            if let (Value::Object(target), Value::Object(patch)) =
                (item, serde_json::to_value(input).unwrap())
            {
                target.extend(patch);
                return Ok(serde_json::from_value(Value::Object(target.clone())).unwrap());
            }
            unreachable!("entities serialize as objects")
        }

        async fn delete<R: Resource>(&self, id: R::Id) -> Result<(), AdminError> {
            let mut lists = self.lists.lock().unwrap();
            let items = lists.entry(R::PATH).or_default();
            items.retain(|v| v["id"].to_string() != id.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_every_write_refetches() {
        let api = FakeApi::default();
        let mut panel = Panel::<Category>::new();

        panel.load(&api).await.unwrap();
        assert!(panel.is_loaded());
        assert_eq!(api.list_calls(Category::PATH), 1);

        let created = panel
            .create(
                &api,
                &NewCategory {
                    name: "Prints".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(api.list_calls(Category::PATH), 2);
        assert_eq!(panel.items().len(), 1);

        panel
            .update(
                &api,
                created.id,
                &CategoryUpdate {
                    name: Some("Fine Prints".to_string()),
                    ..CategoryUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(api.list_calls(Category::PATH), 3);
        assert_eq!(panel.get(created.id).unwrap().name, "Fine Prints");

        panel.delete(&api, created.id).await.unwrap();
        assert_eq!(api.list_calls(Category::PATH), 4);
        assert!(panel.items().is_empty());
    }

    #[tokio::test]
    async fn test_products_panel_has_no_delete() {
        let api = FakeApi::default();
        let mut panel = Panel::<Product>::new();

        let err = panel.delete(&api, ProductId::new(1)).await.unwrap_err();
        assert!(matches!(err, AdminError::Unsupported { .. }));
        assert_eq!(api.list_calls(Product::PATH), 0);
    }

    #[tokio::test]
    async fn test_view_leaves_items_untouched() {
        let now = Utc::now();
        let categories = [
            Category {
                id: CategoryId::new(1),
                name: "Sculpture".to_string(),
                description: None,
                created_at: now,
                updated_at: now,
            },
            Category {
                id: CategoryId::new(2),
                name: "Painting".to_string(),
                description: None,
                created_at: now,
                updated_at: now,
            },
        ];
        let api = FakeApi::default().with(&categories);
        let mut panel = Panel::<Category>::new();
        panel.load(&api).await.unwrap();

        let query = PanelQuery {
            sort: Some(crate::query::Sort::ascending("name")),
            ..PanelQuery::default()
        };
        let view: Vec<_> = panel.view(&query).iter().map(|c| c.id).collect();
        assert_eq!(view, vec![CategoryId::new(2), CategoryId::new(1)]);
        assert_eq!(panel.items(), &categories);
    }
}
