//! Backend interfaces consumed by the editor.
//!
//! Each trait maps onto a narrow set of CRUD calls. Nothing here is
//! transactional: a batch of position writes is a set of independent calls.

use async_trait::async_trait;
use futures::future::join_all;
use nexusnote_core::{Block, NewBlock, Page, PageUpdate, PositionChange, Workspace};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;

/// Location of an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Key inside the storage bucket
    pub path: String,
    /// Public URL the file is served from
    pub url: String,
}

#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Blocks of a page ordered by position
    async fn fetch_blocks(&self, page_id: Uuid) -> Result<Vec<Block>, StoreError>;

    async fn insert_block(&self, page_id: Uuid, block: NewBlock) -> Result<Block, StoreError>;

    async fn update_block_content(&self, block_id: Uuid, content: Value)
        -> Result<Block, StoreError>;

    async fn update_block_position(
        &self,
        page_id: Uuid,
        block_id: Uuid,
        position: i32,
    ) -> Result<(), StoreError>;

    async fn delete_block(&self, block_id: Uuid) -> Result<(), StoreError>;

    /// Write every position concurrently.
    ///
    /// Writes that succeed stay applied when others fail.
    async fn update_positions(
        &self,
        page_id: Uuid,
        changes: &[PositionChange],
    ) -> Result<(), StoreError> {
        let results = join_all(
            changes
                .iter()
                .map(|c| self.update_block_position(page_id, c.block_id, c.position)),
        )
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            for err in results.iter().filter_map(|r| r.as_ref().err()) {
                tracing::error!("Position update failed: {}", err);
            }
            return Err(StoreError::PartialBatch {
                failed,
                total: changes.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
pub trait PageStore: Send + Sync {
    async fn get_page(&self, page_id: Uuid) -> Result<Page, StoreError>;

    async fn update_page(&self, page_id: Uuid, update: PageUpdate) -> Result<Page, StoreError>;

    /// Workspaces of a user, excluding soft-deleted ones
    async fn list_workspaces(&self, user_id: Uuid) -> Result<Vec<Workspace>, StoreError>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn upload_file(
        &self,
        user_id: Uuid,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, StoreError>;

    async fn delete_file(&self, path: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn current_user_id(&self) -> Result<Uuid, StoreError>;
}

/// Everything the page editor needs from a backend
pub trait Backend: BlockStore + PageStore + FileStore + SessionStore + 'static {}

impl<T> Backend for T where T: BlockStore + PageStore + FileStore + SessionStore + 'static {}
