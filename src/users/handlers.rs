use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{extractors::AuthUser, services::is_valid_email},
    error::ApiError,
    extract::JsonBody,
    state::AppState,
    supabase::DataError,
    users::{
        dto::{CreateUserRequest, CreatedUser, UpdateUserRequest},
        password::{generate_user_based_password, DEFAULT_PASSWORD_LENGTH},
        repo_types::{NewUser, User},
    },
};

const DUPLICATE: &str = "Email or mobile already exists";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/create/user", post(create_user))
        .route("/users/allusers", get(list_users))
        .route("/users/update/:user_id", patch(update_user))
        .route("/users/delete/:user_id", delete(delete_user))
}

fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::validation("Invalid email"));
    }
    Ok(email)
}

fn require(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// A blank office address counts as not given.
fn optional_email(raw: Option<&str>) -> Result<Option<String>, ApiError> {
    match raw.map(str::trim) {
        Some("") | None => Ok(None),
        Some(raw) => normalize_email(raw).map(Some),
    }
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreatedUser>), ApiError> {
    const FAILED: &str = "Failed to create user";

    let name = require("name", &payload.name)?;
    let email = normalize_email(&payload.email)?;
    let mobile = require("mobile", &payload.mobile)?;
    let role = require("role", &payload.role)?;
    let office_mail = optional_email(payload.office_mail.as_deref())?;
    info!(caller = %caller, email = %email, "user creation attempt");

    let existing = User::find_conflicting(state.data.as_ref(), &email, &mobile)
        .await
        .with_context(|| format!("duplicate check for email={email}"))
        .map_err(|e| ApiError::internal(FAILED, e))?;
    if let Some(id) = existing {
        warn!(email = %email, mobile = %mobile, existing_id = %id, "email or mobile already exists");
        return Err(ApiError::validation(DUPLICATE));
    }

    let password = generate_user_based_password(&name, &email, DEFAULT_PASSWORD_LENGTH)
        .with_context(|| format!("generate password for email={email}"))
        .map_err(|e| ApiError::internal("Failed to generate password", e))?;

    let new_user = NewUser {
        name: &name,
        email: &email,
        office_mail: office_mail.as_deref(),
        password: &password,
        role: &role,
        mobile: &mobile,
        created_by: payload.created_by.as_deref(),
    };

    let created = match User::create(state.data.as_ref(), &new_user).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Err(ApiError::internal(
                FAILED,
                anyhow::anyhow!("insert returned no row for email={email}"),
            ))
        }
        Err(DataError::Conflict(detail)) => {
            // lost the race between the duplicate check and the insert
            warn!(email = %email, %detail, "insert rejected as duplicate");
            return Err(ApiError::validation(DUPLICATE));
        }
        Err(e) => {
            let e = anyhow::Error::new(e).context(format!("insert user email={email}"));
            return Err(ApiError::internal(FAILED, e));
        }
    };

    info!(user_id = %created.id, email = %email, "user created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedUser {
            id: created.id,
            email: created.email.unwrap_or(email),
            name: created.name.unwrap_or(name),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<User>>, ApiError> {
    info!(caller = %caller, "fetching all users");
    let users = User::list_all(state.data.as_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to fetch users", e))?;
    info!(count = users.len(), "fetched users");
    Ok(Json(users))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
    JsonBody(mut payload): JsonBody<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    const FAILED: &str = "Failed to update user";

    info!(caller = %caller, user_id = %user_id, "updating user");
    payload.name = payload.name.as_deref().map(|v| require("name", v)).transpose()?;
    payload.mobile = payload.mobile.as_deref().map(|v| require("mobile", v)).transpose()?;
    payload.role = payload.role.as_deref().map(|v| require("role", v)).transpose()?;
    payload.email = payload.email.as_deref().map(normalize_email).transpose()?;
    payload.office_mail = optional_email(payload.office_mail.as_deref())?;
    if payload.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let patch = serde_json::to_value(&payload).map_err(|e| ApiError::internal(FAILED, e))?;
    match User::update(state.data.as_ref(), &user_id, patch).await {
        Ok(Some(user)) => Ok(Json(user)),
        Ok(None) => {
            warn!(user_id = %user_id, "user not found for update");
            Err(ApiError::NotFound("User not found"))
        }
        Err(DataError::Conflict(detail)) => {
            warn!(user_id = %user_id, %detail, "update rejected as duplicate");
            Err(ApiError::validation(DUPLICATE))
        }
        Err(e) => {
            let e = anyhow::Error::new(e).context(format!("update user_id={user_id}"));
            Err(ApiError::internal(FAILED, e))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!(caller = %caller, user_id = %user_id, "deleting user");
    let removed = User::delete(state.data.as_ref(), &user_id)
        .await
        .with_context(|| format!("delete user_id={user_id}"))
        .map_err(|e| ApiError::internal("Failed to delete user", e))?;

    if removed == 0 {
        warn!(user_id = %user_id, "user not found for delete");
        return Err(ApiError::NotFound("User not found"));
    }

    info!(user_id = %user_id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
