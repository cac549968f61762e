//! Artwork route handlers.

use axum::{
    extract::State,
    http::StatusCode,
};
use tracing::instrument;

use gallery_core::ArtworkId;
use gallery_core::catalog::{Artwork, ArtworkUpdate, NewArtwork};

use crate::db::ArtworkRepository;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// `GET /api/artworks`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Artwork>>> {
    let artworks = ArtworkRepository::new(state.pool()).list().await?;
    Ok(Json(artworks))
}

/// `GET /api/artworks/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ArtworkId>,
) -> Result<Json<Artwork>> {
    ArtworkRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Artwork".to_string()))
}

/// `POST /api/artworks`
#[instrument(skip(state, claims, input), fields(user_id = %claims.sub))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Json(input): Json<NewArtwork>,
) -> Result<(StatusCode, Json<Artwork>)> {
    input.validate()?;
    let artwork = ArtworkRepository::new(state.pool()).create(&input).await?;
    tracing::info!(artwork_id = %artwork.id, "artwork created");
    Ok((StatusCode::CREATED, Json(artwork)))
}

/// `PUT /api/artworks/{id}`
#[instrument(skip(state, claims, input), fields(user_id = %claims.sub))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Path(id): Path<ArtworkId>,
    Json(input): Json<ArtworkUpdate>,
) -> Result<Json<Artwork>> {
    input.validate()?;
    let artwork = ArtworkRepository::new(state.pool()).update(id, &input).await?;
    Ok(Json(artwork))
}

/// `DELETE /api/artworks/{id}`
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Path(id): Path<ArtworkId>,
) -> Result<StatusCode> {
    ArtworkRepository::new(state.pool()).delete(id).await?;
    tracing::info!(artwork_id = %id, "artwork deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/artworks/{id}/like`
#[instrument(skip(state))]
pub async fn like(
    State(state): State<AppState>,
    Path(id): Path<ArtworkId>,
) -> Result<Json<Artwork>> {
    let artwork = ArtworkRepository::new(state.pool()).like(id).await?;
    Ok(Json(artwork))
}
