pub mod blocks;
mod health;
mod pages;
mod session;
mod storage;
mod templates;
mod workspaces;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, Router};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// Header carrying the caller's user id
pub const USER_HEADER: &str = "x-user-id";

/// The authenticated caller, read from the `x-user-id` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Create the API router
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(session::router())
        .merge(workspaces::router())
        .merge(pages::router())
        .merge(blocks::router())
        .merge(templates::router())
        .merge(storage::router())
}
