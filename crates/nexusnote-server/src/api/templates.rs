use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use nexusnote_core::template::blocks_from_page;
use nexusnote_core::Template;
use serde_json::{json, Value};
use uuid::Uuid;

use super::CurrentUser;
use crate::db::NewTemplate;
use crate::error::AppError;
use crate::AppState;

/// The caller's templates plus public ones
async fn list_templates(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Template>>, AppError> {
    Ok(Json(state.db.list_templates(user_id).await?))
}

/// Save a page's blocks, in order, as a new template
async fn create_template_from_page(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(page_id): Path<Uuid>,
    Json(req): Json<NewTemplate>,
) -> Result<Json<Template>, AppError> {
    if req.name.trim().is_empty() {
        return Err(nexusnote_core::NexusError::Required { field: "name" }.into());
    }
    let page = state
        .db
        .get_page(user_id, page_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Page {} not found", page_id)))?;
    let blocks = state.db.list_blocks(user_id, page_id).await?;

    let template = state
        .db
        .create_template_from_page(user_id, &page, blocks_from_page(&blocks), &req)
        .await?;
    Ok(Json(template))
}

async fn delete_template(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.db.delete_template(user_id, id).await? {
        return Err(AppError::NotFound(format!("Template {} not found", id)));
    }
    Ok(Json(json!({ "deleted": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/templates", get(list_templates))
        .route("/api/templates/:id", delete(delete_template))
        .route("/api/pages/:id/template", post(create_template_from_page))
}
