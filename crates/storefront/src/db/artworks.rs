//! Artwork repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use gallery_core::catalog::{Artwork, ArtworkUpdate, NewArtwork};
use gallery_core::{ArtworkId, CategoryId};

use super::RepositoryError;

const COLUMNS: &str = "id, title, artist, description, image_url, price, category_id, \
                       year, medium, available, likes, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ArtworkRow {
    id: i32,
    title: String,
    artist: String,
    description: String,
    image_url: Option<String>,
    price: Decimal,
    category_id: Option<i32>,
    year: Option<i32>,
    medium: Option<String>,
    available: bool,
    likes: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ArtworkRow> for Artwork {
    fn from(row: ArtworkRow) -> Self {
        Self {
            id: ArtworkId::new(row.id),
            title: row.title,
            artist: row.artist,
            description: row.description,
            image_url: row.image_url,
            price: row.price,
            category_id: row.category_id.map(CategoryId::new),
            year: row.year,
            medium: row.medium,
            available: row.available,
            likes: row.likes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for artwork database operations.
pub struct ArtworkRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ArtworkRepository<'a> {
    /// Create a new artwork repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All artworks, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Artwork>, RepositoryError> {
        let rows = sqlx::query_as::<_, ArtworkRow>(&format!(
            "SELECT {COLUMNS} FROM gallery.artwork ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Artwork::from).collect())
    }

    /// Get an artwork by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ArtworkId) -> Result<Option<Artwork>, RepositoryError> {
        let row = sqlx::query_as::<_, ArtworkRow>(&format!(
            "SELECT {COLUMNS} FROM gallery.artwork WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Artwork::from))
    }

    /// Create an artwork.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category doesn't exist.
    pub async fn create(&self, input: &NewArtwork) -> Result<Artwork, RepositoryError> {
        let row = sqlx::query_as::<_, ArtworkRow>(&format!(
            r"
            INSERT INTO gallery.artwork
                (title, artist, description, image_url, price, category_id, year, medium, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {COLUMNS}
            "
        ))
        .bind(input.title.trim())
        .bind(input.artist.trim())
        .bind(&input.description)
        .bind(input.image_url.as_deref())
        .bind(input.price)
        .bind(input.category_id)
        .bind(input.year)
        .bind(input.medium.as_deref())
        .bind(input.available)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::foreign_key_as_conflict(e, "category does not exist"))?;

        Ok(row.into())
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the artwork doesn't exist.
    /// Returns `RepositoryError::Conflict` if the category doesn't exist.
    pub async fn update(
        &self,
        id: ArtworkId,
        input: &ArtworkUpdate,
    ) -> Result<Artwork, RepositoryError> {
        let row = sqlx::query_as::<_, ArtworkRow>(&format!(
            r"
            UPDATE gallery.artwork
            SET title = COALESCE($2, title),
                artist = COALESCE($3, artist),
                description = COALESCE($4, description),
                image_url = COALESCE($5, image_url),
                price = COALESCE($6, price),
                category_id = COALESCE($7, category_id),
                year = COALESCE($8, year),
                medium = COALESCE($9, medium),
                available = COALESCE($10, available),
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "
        ))
        .bind(id)
        .bind(input.title.as_deref().map(str::trim))
        .bind(input.artist.as_deref().map(str::trim))
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.price)
        .bind(input.category_id)
        .bind(input.year)
        .bind(input.medium.as_deref())
        .bind(input.available)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::foreign_key_as_conflict(e, "category does not exist"))?;

        row.map(Artwork::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete an artwork.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the artwork doesn't exist.
    pub async fn delete(&self, id: ArtworkId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM gallery.artwork WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Increment the like counter in one statement, so concurrent likes
    /// are never lost.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the artwork doesn't exist.
    pub async fn like(&self, id: ArtworkId) -> Result<Artwork, RepositoryError> {
        let row = sqlx::query_as::<_, ArtworkRow>(&format!(
            r"
            UPDATE gallery.artwork
            SET likes = likes + 1
            WHERE id = $1
            RETURNING {COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Artwork::from).ok_or(RepositoryError::NotFound)
    }
}
