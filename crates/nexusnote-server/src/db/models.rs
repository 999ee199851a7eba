use chrono::{DateTime, Utc};
use nexusnote_core::{Block, Page, PageSummary, Template, TemplateBlock, Workspace};
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::AppError;

/// Workspace database model
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkspaceRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<WorkspaceRow> for Workspace {
    fn from(row: WorkspaceRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            icon: row.icon,
            color: row.color,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Page database model
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PageRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub title: String,
    pub grid_type: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PageRow> for Page {
    type Error = AppError;

    fn try_from(row: PageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            workspace_id: row.workspace_id,
            title: row.title,
            grid_type: row.grid_type.parse().map_err(corrupt("pages", row.id))?,
            color: row.color,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Page row joined with its block count
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PageSummaryRow {
    #[sqlx(flatten)]
    pub page: PageRow,
    pub block_count: i64,
}

impl TryFrom<PageSummaryRow> for PageSummary {
    type Error = AppError;

    fn try_from(row: PageSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            page: row.page.try_into()?,
            block_count: row.block_count,
        })
    }
}

/// Block database model
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BlockRow {
    pub id: Uuid,
    pub page_id: Uuid,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub content: Value,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BlockRow> for Block {
    type Error = AppError;

    fn try_from(row: BlockRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            page_id: row.page_id,
            kind: row.kind.parse().map_err(corrupt("blocks", row.id))?,
            content: row.content,
            position: row.position,
            created_at: row.created_at,
        })
    }
}

/// Template database model
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TemplateRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub is_public: bool,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: Option<String>,
    pub grid_type: String,
    pub blocks: Json<Vec<TemplateBlock>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TemplateRow> for Template {
    type Error = AppError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            is_public: row.is_public,
            name: row.name,
            description: row.description,
            icon: row.icon,
            category: row.category,
            grid_type: row.grid_type.parse().map_err(corrupt("templates", row.id))?,
            blocks: row.blocks.0,
            created_at: row.created_at,
        })
    }
}

/// Convert rows, failing on the first one holding an unknown enum value
pub fn convert<R, T>(rows: Vec<R>) -> Result<Vec<T>, AppError>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn corrupt(table: &'static str, id: Uuid) -> impl FnOnce(nexusnote_core::NexusError) -> AppError {
    move |e| AppError::Internal(format!("{} row {}: {}", table, id, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexusnote_core::{BlockType, GridType};
    use serde_json::json;

    fn page_row(grid_type: &str) -> PageRow {
        PageRow {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            title: "Week 1".to_string(),
            grid_type: grid_type.to_string(),
            color: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_page_row_parses_grid() {
        let page = Page::try_from(page_row("squares")).unwrap();
        assert_eq!(page.grid_type, GridType::Squares);
    }

    #[test]
    fn test_unknown_grid_is_internal_error() {
        let err = Page::try_from(page_row("hexagons")).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_block_row_keeps_content() {
        let row = BlockRow {
            id: Uuid::new_v4(),
            page_id: Uuid::new_v4(),
            kind: "code".to_string(),
            content: json!({ "code": "let x = 1;", "language": "rust" }),
            position: 3,
            created_at: Utc::now(),
        };
        let blocks: Vec<Block> = convert(vec![row]).unwrap();
        assert_eq!(blocks[0].kind, BlockType::Code);
        assert_eq!(blocks[0].content["language"], "rust");
    }
}
