use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Json, Router,
};
use nexusnote_core::{Block, BlockContent, NewBlock};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::CurrentUser;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    pub content: Value,
}

#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    pub page_id: Uuid,
    pub position: i32,
}

fn block_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Block {} not found", id))
}

/// Payload must parse as content of the block's own type
fn check_content(block: &Block, content: &Value) -> Result<(), AppError> {
    BlockContent::from_value(block.kind, content)?;
    Ok(())
}

/// Blocks of a page ordered by position
async fn list_blocks(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(page_id): Path<Uuid>,
) -> Result<Json<Vec<Block>>, AppError> {
    if state.db.get_page(user_id, page_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Page {} not found", page_id)));
    }
    Ok(Json(state.db.list_blocks(user_id, page_id).await?))
}

async fn insert_block(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(page_id): Path<Uuid>,
    Json(req): Json<NewBlock>,
) -> Result<Json<Block>, AppError> {
    // Reject payloads that don't fit the block type
    BlockContent::from_value(req.kind, &req.content)?;
    let block = state
        .db
        .insert_block(user_id, page_id, &req)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Page {} not found", page_id)))?;
    Ok(Json(block))
}

async fn update_block_content(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ContentRequest>,
) -> Result<Json<Block>, AppError> {
    let current = state
        .db
        .get_block(user_id, id)
        .await?
        .ok_or_else(|| block_not_found(id))?;
    check_content(&current, &req.content)?;

    let block = state
        .db
        .update_block_content(user_id, id, &req.content)
        .await?
        .ok_or_else(|| block_not_found(id))?;
    Ok(Json(block))
}

async fn update_block_position(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PositionRequest>,
) -> Result<Json<Value>, AppError> {
    if req.position < 0 {
        return Err(AppError::BadRequest("position must not be negative".to_string()));
    }
    if !state
        .db
        .update_block_position(user_id, req.page_id, id, req.position)
        .await?
    {
        return Err(block_not_found(id));
    }
    Ok(Json(json!({ "updated": true })))
}

async fn delete_block(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.db.delete_block(user_id, id).await? {
        return Err(block_not_found(id));
    }
    Ok(Json(json!({ "deleted": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/pages/:id/blocks",
            get(list_blocks).post(insert_block),
        )
        .route("/api/blocks/:id/content", put(update_block_content))
        .route("/api/blocks/:id/position", put(update_block_position))
        .route("/api/blocks/:id", delete(delete_block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;
    use nexusnote_core::BlockType;

    fn block_of(kind: BlockType) -> Block {
        Block {
            id: Uuid::new_v4(),
            page_id: Uuid::new_v4(),
            kind,
            content: BlockContent::default_for(kind).to_value(),
            position: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_content_checked_against_block_type() {
        let task = block_of(BlockType::Task);
        assert!(check_content(&task, &json!({ "tasks": [] })).is_ok());

        let err = check_content(&task, &json!({ "tasks": "all of them" })).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let text = block_of(BlockType::Text);
        assert!(check_content(&text, &json!({ "text": 42 })).is_err());
    }
}
