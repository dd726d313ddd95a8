use crate::state::AppState;
use axum::Router;

pub(crate) mod dto;
pub(crate) mod error;
pub mod handlers;
pub(crate) mod jwt;
mod password;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
