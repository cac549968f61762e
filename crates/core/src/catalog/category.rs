//! Artwork and product categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{self, MAX_NAME_LENGTH, ValidationError};
use crate::CategoryId;

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `POST /api/categories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewCategory {
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::text("name", &self.name, MAX_NAME_LENGTH)?;
        if let Some(description) = &self.description {
            validation::long_text("description", description)?;
        }
        Ok(())
    }
}

/// Payload for `PUT /api/categories/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CategoryUpdate {
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::optional_text("name", self.name.as_deref(), MAX_NAME_LENGTH)?;
        if let Some(description) = &self.description {
            validation::long_text("description", description)?;
        }
        Ok(())
    }
}
