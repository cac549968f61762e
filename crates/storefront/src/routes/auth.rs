//! Login route handler.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{Result, set_sentry_user};
use crate::extract::Json;
use crate::services::AuthService;
use crate::services::auth::LoginResponse;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/login`
///
/// Returns a signed token and the user. The server keeps nothing; the client
/// stores the token and sends it as a bearer token.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());

    let response = auth.login(&form.email, &form.password).await.inspect_err(|err| {
        tracing::warn!(error = %err, "login failed");
    })?;

    set_sentry_user(&response.user.id, Some(response.user.email.as_str()));
    tracing::info!(user_id = %response.user.id, "user logged in");

    Ok(Json(response))
}
