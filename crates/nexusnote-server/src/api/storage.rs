use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap},
    routing::{delete, post},
    Json, Router,
};
use nexusnote_core::MediaKind;
use serde::Deserialize;
use serde_json::{json, Value};

use super::CurrentUser;
use crate::error::AppError;
use crate::storage::StoredFile;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub name: String,
}

/// Store the raw request body as the caller's file
async fn upload_file(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StoredFile>, AppError> {
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream");
    let stored = state
        .storage
        .save(user_id, &query.name, mime_type, &body)
        .await?;
    Ok(Json(stored))
}

async fn delete_file(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(path): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.storage.delete(user_id, &path).await?;
    Ok(Json(json!({ "deleted": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/storage",
            post(upload_file).layer(DefaultBodyLimit::max(MediaKind::Pdf.max_size() as usize)),
        )
        .route("/api/storage/*path", delete(delete_file))
}
