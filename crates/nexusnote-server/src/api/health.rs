use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct Liveness {
    service: &'static str,
    status: &'static str,
    version: &'static str,
    /// Whether the upload directory exists yet
    storage: bool,
}

/// Liveness only; the database is not queried
async fn liveness(State(state): State<AppState>) -> Json<Liveness> {
    let storage = tokio::fs::try_exists(state.storage.root())
        .await
        .unwrap_or(false);
    Json(Liveness {
        service: env!("CARGO_PKG_NAME"),
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(liveness))
}
