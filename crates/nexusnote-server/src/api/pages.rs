use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use nexusnote_core::{NewPage, Page, PageSummary, PageUpdate};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::CurrentUser;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FromTemplateRequest {
    pub template_id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
}

fn page_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Page {} not found", id))
}

fn workspace_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Workspace {} not found", id))
}

/// Pages of a workspace with their block counts
async fn list_pages(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(workspace_id): Path<Uuid>,
) -> Result<Json<Vec<PageSummary>>, AppError> {
    Ok(Json(state.db.list_pages(user_id, workspace_id).await?))
}

async fn create_page(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(workspace_id): Path<Uuid>,
    Json(req): Json<NewPage>,
) -> Result<Json<Page>, AppError> {
    let req = req.validate()?;
    let page = state
        .db
        .create_page(user_id, workspace_id, &req)
        .await?
        .ok_or_else(|| workspace_not_found(workspace_id))?;
    Ok(Json(page))
}

async fn create_page_from_template(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(workspace_id): Path<Uuid>,
    Json(req): Json<FromTemplateRequest>,
) -> Result<Json<Page>, AppError> {
    let template = state
        .db
        .get_template(user_id, req.template_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {} not found", req.template_id)))?;
    let page = state
        .db
        .create_page_from_template(user_id, workspace_id, &template, req.title.as_deref())
        .await?
        .ok_or_else(|| workspace_not_found(workspace_id))?;
    Ok(Json(page))
}

async fn get_page(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Page>, AppError> {
    let page = state
        .db
        .get_page(user_id, id)
        .await?
        .ok_or_else(|| page_not_found(id))?;
    Ok(Json(page))
}

async fn update_page(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PageUpdate>,
) -> Result<Json<Page>, AppError> {
    let req = req.validate()?;
    let page = state
        .db
        .update_page(user_id, id, &req)
        .await?
        .ok_or_else(|| page_not_found(id))?;
    Ok(Json(page))
}

async fn delete_page(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.db.delete_page(user_id, id).await? {
        return Err(page_not_found(id));
    }
    Ok(Json(json!({ "deleted": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/workspaces/:id/pages",
            get(list_pages).post(create_page),
        )
        .route(
            "/api/workspaces/:id/pages/from-template",
            post(create_page_from_template),
        )
        .route(
            "/api/pages/:id",
            get(get_page).put(update_page).delete(delete_page),
        )
}
