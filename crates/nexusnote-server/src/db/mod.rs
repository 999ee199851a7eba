pub mod models;

use nexusnote_core::{
    Block, NewBlock, NewPage, NewWorkspace, Page, PageSummary, PageUpdate, Template,
    TemplateBlock, Workspace, WorkspaceUpdate,
};
use serde::Deserialize;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use models::{convert, BlockRow, PageRow, PageSummaryRow, TemplateRow, WorkspaceRow};

const WORKSPACE_COLUMNS: &str =
    "id, user_id, name, description, icon, color, created_at, updated_at, deleted_at";

/// Fields of a template captured from an existing page
#[derive(Debug, Clone, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// Database connection wrapper.
///
/// Every query is scoped to the calling user: rows of other users read as
/// missing.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to the database
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Pool that connects on first use
    pub fn connect_lazy(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    // Workspaces

    /// Live workspaces of a user, newest first
    pub async fn list_workspaces(&self, user_id: Uuid) -> Result<Vec<Workspace>, AppError> {
        let sql = format!(
            "SELECT {} FROM workspaces WHERE user_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC",
            WORKSPACE_COLUMNS
        );
        let rows = sqlx::query_as::<_, WorkspaceRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a workspace, soft deleted or not
    pub async fn get_workspace(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Workspace>, AppError> {
        let sql = format!(
            "SELECT {} FROM workspaces WHERE id = $1 AND user_id = $2",
            WORKSPACE_COLUMNS
        );
        let row = sqlx::query_as::<_, WorkspaceRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    pub async fn create_workspace(
        &self,
        user_id: Uuid,
        workspace: &NewWorkspace,
    ) -> Result<Workspace, AppError> {
        let sql = format!(
            "INSERT INTO workspaces (user_id, name, description, icon, color) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            WORKSPACE_COLUMNS
        );
        let row = sqlx::query_as::<_, WorkspaceRow>(&sql)
            .bind(user_id)
            .bind(&workspace.name)
            .bind(&workspace.description)
            .bind(&workspace.icon)
            .bind(&workspace.color)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    pub async fn update_workspace(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: &WorkspaceUpdate,
    ) -> Result<Option<Workspace>, AppError> {
        let sql = format!(
            "UPDATE workspaces SET \
                name = COALESCE($3, name), \
                description = COALESCE($4, description), \
                icon = COALESCE($5, icon), \
                color = COALESCE($6, color), \
                updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING {}",
            WORKSPACE_COLUMNS
        );
        let row = sqlx::query_as::<_, WorkspaceRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(&update.name)
            .bind(&update.description)
            .bind(&update.icon)
            .bind(&update.color)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Mark a workspace deleted; it disappears from listings
    pub async fn soft_delete_workspace(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE workspaces SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn restore_workspace(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Workspace>, AppError> {
        let sql = format!(
            "UPDATE workspaces SET deleted_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING {}",
            WORKSPACE_COLUMNS
        );
        let row = sqlx::query_as::<_, WorkspaceRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Remove a workspace with its pages and blocks
    pub async fn delete_workspace_permanently(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM workspaces WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // Pages

    /// Pages of a live workspace with their block counts, oldest first
    pub async fn list_pages(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Vec<PageSummary>, AppError> {
        let rows = sqlx::query_as::<_, PageSummaryRow>(
            r#"
            SELECT p.id, p.workspace_id, p.title, p.grid_type, p.color, p.created_at, p.updated_at,
                   COUNT(b.id) AS block_count
            FROM pages p
            JOIN workspaces w ON w.id = p.workspace_id
            LEFT JOIN blocks b ON b.page_id = p.id
            WHERE p.workspace_id = $1 AND w.user_id = $2 AND w.deleted_at IS NULL
            GROUP BY p.id
            ORDER BY p.created_at
            "#,
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        convert(rows)
    }

    /// Create a page; `None` when the workspace is not the user's
    pub async fn create_page(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
        page: &NewPage,
    ) -> Result<Option<Page>, AppError> {
        let row = sqlx::query_as::<_, PageRow>(
            r#"
            INSERT INTO pages (workspace_id, title, grid_type, color)
            SELECT w.id, $3, $4, $5 FROM workspaces w
            WHERE w.id = $1 AND w.user_id = $2 AND w.deleted_at IS NULL
            RETURNING id, workspace_id, title, grid_type, color, created_at, updated_at
            "#,
        )
        .bind(workspace_id)
        .bind(user_id)
        .bind(&page.title)
        .bind(page.grid_type.as_str())
        .bind(&page.color)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Page::try_from).transpose()
    }

    pub async fn get_page(&self, user_id: Uuid, id: Uuid) -> Result<Option<Page>, AppError> {
        let row = sqlx::query_as::<_, PageRow>(
            r#"
            SELECT p.id, p.workspace_id, p.title, p.grid_type, p.color, p.created_at, p.updated_at
            FROM pages p
            JOIN workspaces w ON w.id = p.workspace_id
            WHERE p.id = $1 AND w.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Page::try_from).transpose()
    }

    pub async fn update_page(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: &PageUpdate,
    ) -> Result<Option<Page>, AppError> {
        let row = sqlx::query_as::<_, PageRow>(
            r#"
            UPDATE pages p SET
                title = COALESCE($3, p.title),
                grid_type = COALESCE($4, p.grid_type),
                color = COALESCE($5, p.color),
                updated_at = NOW()
            FROM workspaces w
            WHERE p.id = $1 AND w.id = p.workspace_id AND w.user_id = $2
            RETURNING p.id, p.workspace_id, p.title, p.grid_type, p.color, p.created_at, p.updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&update.title)
        .bind(update.grid_type.map(|g| g.as_str()))
        .bind(&update.color)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Page::try_from).transpose()
    }

    /// Delete a page; its blocks go with it
    pub async fn delete_page(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM pages p USING workspaces w \
             WHERE p.id = $1 AND w.id = p.workspace_id AND w.user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Create a page seeded with a template's blocks, atomically
    pub async fn create_page_from_template(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
        template: &Template,
        title: Option<&str>,
    ) -> Result<Option<Page>, AppError> {
        let new_page = template.new_page(title).validate()?;
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PageRow>(
            r#"
            INSERT INTO pages (workspace_id, title, grid_type)
            SELECT w.id, $3, $4 FROM workspaces w
            WHERE w.id = $1 AND w.user_id = $2 AND w.deleted_at IS NULL
            RETURNING id, workspace_id, title, grid_type, color, created_at, updated_at
            "#,
        )
        .bind(workspace_id)
        .bind(user_id)
        .bind(&new_page.title)
        .bind(new_page.grid_type.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let page = Page::try_from(row)?;

        for block in template.seed_blocks() {
            sqlx::query("INSERT INTO blocks (page_id, type, content, position) VALUES ($1, $2, $3, $4)")
                .bind(page.id)
                .bind(block.kind.as_str())
                .bind(&block.content)
                .bind(block.position)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(
            "Seeded page {} from template {} with {} blocks",
            page.id,
            template.id,
            template.blocks.len()
        );
        Ok(Some(page))
    }

    // Blocks

    /// Blocks of a page ordered by position
    pub async fn list_blocks(&self, user_id: Uuid, page_id: Uuid) -> Result<Vec<Block>, AppError> {
        let rows = sqlx::query_as::<_, BlockRow>(
            r#"
            SELECT b.id, b.page_id, b.type, b.content, b.position, b.created_at
            FROM blocks b
            JOIN pages p ON p.id = b.page_id
            JOIN workspaces w ON w.id = p.workspace_id
            WHERE b.page_id = $1 AND w.user_id = $2
            ORDER BY b.position, b.created_at
            "#,
        )
        .bind(page_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        convert(rows)
    }

    pub async fn insert_block(
        &self,
        user_id: Uuid,
        page_id: Uuid,
        block: &NewBlock,
    ) -> Result<Option<Block>, AppError> {
        let row = sqlx::query_as::<_, BlockRow>(
            r#"
            INSERT INTO blocks (page_id, type, content, position)
            SELECT p.id, $3, $4, $5 FROM pages p
            JOIN workspaces w ON w.id = p.workspace_id
            WHERE p.id = $1 AND w.user_id = $2
            RETURNING id, page_id, type, content, position, created_at
            "#,
        )
        .bind(page_id)
        .bind(user_id)
        .bind(block.kind.as_str())
        .bind(&block.content)
        .bind(block.position)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Block::try_from).transpose()
    }

    pub async fn get_block(&self, user_id: Uuid, id: Uuid) -> Result<Option<Block>, AppError> {
        let row = sqlx::query_as::<_, BlockRow>(
            r#"
            SELECT b.id, b.page_id, b.type, b.content, b.position, b.created_at
            FROM blocks b
            JOIN pages p ON p.id = b.page_id
            JOIN workspaces w ON w.id = p.workspace_id
            WHERE b.id = $1 AND w.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Block::try_from).transpose()
    }

    pub async fn update_block_content(
        &self,
        user_id: Uuid,
        id: Uuid,
        content: &Value,
    ) -> Result<Option<Block>, AppError> {
        let row = sqlx::query_as::<_, BlockRow>(
            r#"
            UPDATE blocks b SET content = $3
            FROM pages p, workspaces w
            WHERE b.id = $1 AND p.id = b.page_id AND w.id = p.workspace_id AND w.user_id = $2
            RETURNING b.id, b.page_id, b.type, b.content, b.position, b.created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Block::try_from).transpose()
    }

    /// Write one block position. Each call stands alone; there is no batch
    /// transaction.
    pub async fn update_block_position(
        &self,
        user_id: Uuid,
        page_id: Uuid,
        id: Uuid,
        position: i32,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE blocks b SET position = $4
            FROM pages p, workspaces w
            WHERE b.id = $1 AND b.page_id = $3 AND p.id = b.page_id
              AND w.id = p.workspace_id AND w.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(page_id)
        .bind(position)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_block(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM blocks b USING pages p, workspaces w
            WHERE b.id = $1 AND p.id = b.page_id AND w.id = p.workspace_id AND w.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // Templates

    /// The user's own templates plus public ones, newest first
    pub async fn list_templates(&self, user_id: Uuid) -> Result<Vec<Template>, AppError> {
        let rows = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, user_id, is_public, name, description, icon, category, grid_type, blocks, created_at
            FROM templates
            WHERE user_id = $1 OR is_public
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        convert(rows)
    }

    pub async fn get_template(&self, user_id: Uuid, id: Uuid) -> Result<Option<Template>, AppError> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, user_id, is_public, name, description, icon, category, grid_type, blocks, created_at
            FROM templates
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let template = row.map(Template::try_from).transpose()?;
        Ok(template.filter(|t| t.visible_to(user_id)))
    }

    /// Capture a page's layout as a new template owned by the user
    pub async fn create_template_from_page(
        &self,
        user_id: Uuid,
        page: &Page,
        blocks: Vec<TemplateBlock>,
        template: &NewTemplate,
    ) -> Result<Template, AppError> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            INSERT INTO templates (user_id, is_public, name, description, icon, category, grid_type, blocks)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, is_public, name, description, icon, category, grid_type, blocks, created_at
            "#,
        )
        .bind(user_id)
        .bind(template.is_public)
        .bind(&template.name)
        .bind(&template.description)
        .bind(&template.icon)
        .bind(&template.category)
        .bind(page.grid_type.as_str())
        .bind(Json(blocks))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    /// Delete one of the user's own templates
    pub async fn delete_template(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
