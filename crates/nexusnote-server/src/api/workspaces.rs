use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use nexusnote_core::{NewWorkspace, Workspace, WorkspaceUpdate};
use serde_json::{json, Value};
use uuid::Uuid;

use super::CurrentUser;
use crate::error::AppError;
use crate::AppState;

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Workspace {} not found", id))
}

/// List the caller's live workspaces
async fn list_workspaces(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Workspace>>, AppError> {
    Ok(Json(state.db.list_workspaces(user_id).await?))
}

async fn create_workspace(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<NewWorkspace>,
) -> Result<Json<Workspace>, AppError> {
    let req = req.validate()?;
    let workspace = state.db.create_workspace(user_id, &req).await?;
    tracing::info!("Created workspace {} for {}", workspace.id, user_id);
    Ok(Json(workspace))
}

async fn get_workspace(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Workspace>, AppError> {
    let workspace = state
        .db
        .get_workspace(user_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(workspace))
}

async fn update_workspace(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<WorkspaceUpdate>,
) -> Result<Json<Workspace>, AppError> {
    let req = req.validate()?;
    let workspace = state
        .db
        .update_workspace(user_id, id, &req)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(workspace))
}

/// Soft delete
async fn delete_workspace(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.db.soft_delete_workspace(user_id, id).await? {
        return Err(not_found(id));
    }
    Ok(Json(json!({ "deleted": true })))
}

async fn restore_workspace(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Workspace>, AppError> {
    let workspace = state
        .db
        .restore_workspace(user_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(workspace))
}

async fn delete_workspace_permanently(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.db.delete_workspace_permanently(user_id, id).await? {
        return Err(not_found(id));
    }
    tracing::info!("Permanently deleted workspace {}", id);
    Ok(Json(json!({ "deleted": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/workspaces", get(list_workspaces).post(create_workspace))
        .route(
            "/api/workspaces/:id",
            get(get_workspace)
                .put(update_workspace)
                .delete(delete_workspace),
        )
        .route("/api/workspaces/:id/restore", post(restore_workspace))
        .route(
            "/api/workspaces/:id/permanent",
            delete(delete_workspace_permanently),
        )
}
