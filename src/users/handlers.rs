use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::auth::dto::PublicUser;
use crate::auth::jwt::AuthUser;
use crate::auth::service::is_valid_email;
use crate::state::AppState;
use crate::store::StoreError;
use crate::users::dto::{ListQuery, UpdateUserRequest};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/users/:id", put(update_user).delete(delete_user))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "user store error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_requester): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PublicUser>>, (StatusCode, String)> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);
    let users = state.store.list(limit, offset).await.map_err(internal)?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_requester): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = state
        .store
        .find_by_id(id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(_requester): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let email = payload.email.map(|e| e.trim().to_lowercase());
    if let Some(email) = &email {
        if !is_valid_email(email) {
            warn!(email = %email, "invalid email");
            return Err((StatusCode::BAD_REQUEST, "Invalid email".to_string()));
        }
    }

    let updated = state
        .store
        .update(id, email.as_deref(), payload.name.as_deref())
        .await
        .map_err(|e| match e {
            StoreError::DuplicateEmail => {
                (StatusCode::CONFLICT, "Email already registered".to_string())
            }
            other => internal(other),
        })?;

    let user = updated.ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(_requester): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = state.store.delete(id).await.map_err(internal)?;
    if !removed {
        return Err((StatusCode::NOT_FOUND, "User not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
