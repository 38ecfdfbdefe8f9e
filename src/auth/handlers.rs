use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, MeResponse, RefreshRequest, TokenResponse},
        extractors::AuthUser,
        services::{authenticate, issue_tokens, JwtKeys},
    },
    error::ApiError,
    extract::JsonBody,
    state::AppState,
    users::repo_types::User,
};

pub fn login_routes() -> Router<AppState> {
    Router::new()
        .route("/login/users", post(login))
        .route("/login/refresh", post(refresh))
        .route("/login/me", get(read_me))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    info!(email = %email, "login attempt");

    let user_id = match authenticate(&state, &email, &payload.password).await {
        Ok(id) => id.to_string(),
        Err(e) => {
            warn!(email = %email, status = %e.status(), "login failed");
            return Err(e);
        }
    };
    info!(user_id = %user_id, "login successful");

    let tokens = issue_tokens(&state, &user_id).await?;
    Ok(Json(tokens))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        ApiError::Unauthorized("Invalid or expired token")
    })?;

    match User::find_by_id(state.data.as_ref(), &claims.sub).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!(user_id = %claims.sub, "refresh for deleted user");
            return Err(ApiError::Unauthorized("Invalid or expired token"));
        }
        Err(e) => return Err(ApiError::internal("Token generation failed", e)),
    }

    let tokens = issue_tokens(&state, &claims.sub).await?;
    info!(user_id = %claims.sub, "tokens refreshed");
    Ok(Json(tokens))
}

#[instrument]
pub async fn read_me(AuthUser(user_id): AuthUser) -> Json<MeResponse> {
    Json(MeResponse { user_id })
}
