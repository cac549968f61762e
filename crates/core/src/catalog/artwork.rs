//! Gallery artworks.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::{self, MAX_NAME_LENGTH, ValidationError};
use crate::{ArtworkId, CategoryId};

/// An artwork shown in the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: ArtworkId,
    pub title: String,
    pub artist: String,
    pub description: String,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub category_id: Option<CategoryId>,
    pub year: Option<i32>,
    pub medium: Option<String>,
    /// Still for sale.
    pub available: bool,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `POST /api/artworks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArtwork {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

impl NewArtwork {
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::text("title", &self.title, MAX_NAME_LENGTH)?;
        validation::text("artist", &self.artist, MAX_NAME_LENGTH)?;
        validation::long_text("description", &self.description)?;
        validation::price("price", self.price)?;
        validation::optional_text("medium", self.medium.as_deref(), MAX_NAME_LENGTH)
    }
}

/// Payload for `PUT /api/artworks/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtworkUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl ArtworkUpdate {
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::optional_text("title", self.title.as_deref(), MAX_NAME_LENGTH)?;
        validation::optional_text("artist", self.artist.as_deref(), MAX_NAME_LENGTH)?;
        if let Some(description) = &self.description {
            validation::long_text("description", description)?;
        }
        if let Some(price) = self.price {
            validation::price("price", price)?;
        }
        validation::optional_text("medium", self.medium.as_deref(), MAX_NAME_LENGTH)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_artwork_defaults_to_available() {
        let artwork: NewArtwork = serde_json::from_str(
            r#"{"title":"Harbour at Dusk","artist":"M. Ilie","price":"1200.00"}"#,
        )
        .unwrap();
        assert!(artwork.available);
        assert!(artwork.validate().is_ok());
    }

    #[test]
    fn test_new_artwork_requires_artist() {
        let artwork = NewArtwork {
            title: "Untitled".to_string(),
            artist: String::new(),
            description: String::new(),
            image_url: None,
            price: Decimal::ONE,
            category_id: None,
            year: None,
            medium: None,
            available: true,
        };
        assert_eq!(
            artwork.validate(),
            Err(ValidationError::Empty { field: "artist" })
        );
    }
}
