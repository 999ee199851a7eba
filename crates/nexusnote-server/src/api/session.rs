use axum::{routing::get, Json, Router};
use serde::Serialize;
use uuid::Uuid;

use super::CurrentUser;
use crate::AppState;

#[derive(Debug, Serialize)]
struct SessionResponse {
    user_id: Option<Uuid>,
}

/// The signed-in user, or `null` when the request carries no identity
async fn current_session(user: Option<CurrentUser>) -> Json<SessionResponse> {
    Json(SessionResponse {
        user_id: user.map(|CurrentUser(id)| id),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/session", get(current_session))
}
