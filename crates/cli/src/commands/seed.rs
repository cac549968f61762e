//! Seed the catalog from a YAML file.
//!
//! The file lists categories, products and artworks. Products and artworks
//! name their category instead of using an ID. Seeding is repeatable:
//! entries whose name (or artwork title) already exists are skipped.
//!
//! ```yaml
//! categories:
//!   - name: Prints
//! products:
//!   - name: Harbour at Dusk (A3 print)
//!     price: "45.00"
//!     stock: 20
//!     category: Prints
//! artworks:
//!   - title: Harbour at Dusk
//!     artist: M. Okafor
//!     price: "1800.00"
//!     category: Prints
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use gallery_core::CategoryId;
use gallery_core::catalog::{NewArtwork, NewCategory, NewProduct, ValidationError};
use gallery_storefront::db::{
    ArtworkRepository, CategoryRepository, ProductRepository, RepositoryError,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use super::MissingEnvVar;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{entry}: {source}")]
    Invalid {
        entry: String,
        source: ValidationError,
    },

    #[error("{entry}: unknown category {category:?}")]
    UnknownCategory { entry: String, category: String },

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Catalog file contents.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    #[serde(default)]
    pub categories: Vec<NewCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
    #[serde(default)]
    pub artworks: Vec<SeedArtwork>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    /// Category name.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(flatten)]
    pub product: NewProduct,
}

#[derive(Debug, Deserialize)]
pub struct SeedArtwork {
    /// Category name.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(flatten)]
    pub artwork: NewArtwork,
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

impl CatalogFile {
    /// Validate every entry and check that category names resolve, either to
    /// a category in the file or to one in `existing`.
    ///
    /// # Errors
    ///
    /// Returns the first invalid entry.
    pub fn validate(&self, existing: &HashSet<String>) -> Result<(), SeedError> {
        let mut known = existing.clone();
        for category in &self.categories {
            category.validate().map_err(|source| SeedError::Invalid {
                entry: format!("category {:?}", category.name),
                source,
            })?;
            known.insert(category.name.clone());
        }

        let check_category = |entry: &str, category: Option<&String>| match category {
            Some(name) if !known.contains(name) => Err(SeedError::UnknownCategory {
                entry: entry.to_owned(),
                category: name.clone(),
            }),
            _ => Ok(()),
        };

        for seed in &self.products {
            let entry = format!("product {:?}", seed.product.name);
            seed.product
                .validate()
                .map_err(|source| SeedError::Invalid {
                    entry: entry.clone(),
                    source,
                })?;
            check_category(&entry, seed.category.as_ref())?;
        }
        for seed in &self.artworks {
            let entry = format!("artwork {:?}", seed.artwork.title);
            seed.artwork
                .validate()
                .map_err(|source| SeedError::Invalid {
                    entry: entry.clone(),
                    source,
                })?;
            check_category(&entry, seed.category.as_ref())?;
        }
        Ok(())
    }
}

/// Look up a category ID by name. Validation has already checked the name.
fn category_id(ids: &HashMap<String, CategoryId>, name: Option<&String>) -> Option<CategoryId> {
    name.and_then(|name| ids.get(name).copied())
}

/// Load the catalog file at `file_path` into the storefront database.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or a database
/// operation fails. Validation runs before anything is written.
pub async fn catalog(file_path: &str) -> Result<SeedSummary, SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path).await?;
    let file: CatalogFile = serde_yaml::from_str(&content)?;
    info!(
        categories = file.categories.len(),
        products = file.products.len(),
        artworks = file.artworks.len(),
        "Parsed catalog"
    );

    let database_url = super::database_url()?;
    let pool = gallery_storefront::db::create_pool(&database_url).await?;
    info!("Connected to database");

    let categories = CategoryRepository::new(&pool);
    let mut category_ids: HashMap<String, CategoryId> = categories
        .list()
        .await?
        .into_iter()
        .map(|c| (c.name, c.id))
        .collect();
    let existing: HashSet<String> = category_ids.keys().cloned().collect();
    file.validate(&existing)?;

    let mut summary = SeedSummary::default();

    for category in &file.categories {
        if category_ids.contains_key(&category.name) {
            summary.skipped += 1;
            continue;
        }
        let created = categories.create(category).await?;
        category_ids.insert(created.name, created.id);
        summary.inserted += 1;
    }

    let products = ProductRepository::new(&pool);
    let product_names: HashSet<String> =
        products.list().await?.into_iter().map(|p| p.name).collect();
    for seed in file.products {
        if product_names.contains(&seed.product.name) {
            summary.skipped += 1;
            continue;
        }
        let product = NewProduct {
            category_id: category_id(&category_ids, seed.category.as_ref())
                .or(seed.product.category_id),
            ..seed.product
        };
        products.create(&product).await?;
        summary.inserted += 1;
    }

    let artworks = ArtworkRepository::new(&pool);
    let artwork_titles: HashSet<String> =
        artworks.list().await?.into_iter().map(|a| a.title).collect();
    for seed in file.artworks {
        if artwork_titles.contains(&seed.artwork.title) {
            summary.skipped += 1;
            continue;
        }
        let artwork = NewArtwork {
            category_id: category_id(&category_ids, seed.category.as_ref())
                .or(seed.artwork.category_id),
            ..seed.artwork
        };
        artworks.create(&artwork).await?;
        summary.inserted += 1;
    }

    info!("Seeding complete!");
    info!("  Inserted: {}", summary.inserted);
    if summary.skipped > 0 {
        warn!("  Skipped (already exist): {}", summary.skipped);
    }
    Ok(summary)
}
