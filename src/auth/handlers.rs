use axum::{
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest};
use crate::auth::error::AuthError;
use crate::auth::jwt::bearer_token;
use crate::auth::service::AuthService;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let svc = AuthService::from_ref(&state);
    let (access_token, user) = svc
        .register(&payload.email, &payload.password, payload.name.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(AuthResponse { access_token, user })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let svc = AuthService::from_ref(&state);
    let (access_token, user) = svc.login(&payload.email, &payload.password).await?;
    Ok(Json(AuthResponse { access_token, user }))
}

#[instrument(skip(state, headers))]
pub async fn profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PublicUser>, AuthError> {
    let token = bearer_token(&headers).ok_or(AuthError::InvalidToken)?;
    let svc = AuthService::from_ref(&state);
    let user = svc.resolve_current_user(token).await?;
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_serializes_token_and_user() {
        let user = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: None,
            created_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&AuthResponse {
            access_token: "tok".to_string(),
            user,
        })
        .unwrap();
        assert!(json.contains("access_token"));
        assert!(json.contains("test@example.com"));
    }
}
