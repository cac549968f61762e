//! Category route handlers.

use axum::{
    extract::State,
    http::StatusCode,
};
use tracing::instrument;

use gallery_core::CategoryId;
use gallery_core::catalog::{Category, CategoryUpdate, NewCategory};

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// `GET /api/categories`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}

/// `GET /api/categories/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category".to_string()))
}

/// `POST /api/categories`
#[instrument(skip(state, claims, input), fields(user_id = %claims.sub))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Json(input): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    input.validate()?;
    let category = CategoryRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT /api/categories/{id}`
#[instrument(skip(state, claims, input), fields(user_id = %claims.sub))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Path(id): Path<CategoryId>,
    Json(input): Json<CategoryUpdate>,
) -> Result<Json<Category>> {
    input.validate()?;
    let category = CategoryRepository::new(state.pool()).update(id, &input).await?;
    Ok(Json(category))
}

/// `DELETE /api/categories/{id}`
///
/// Products and artworks in the category keep existing with no category.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    CategoryRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
