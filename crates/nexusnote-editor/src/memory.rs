//! In-process backend used by tests and offline demos.

use async_trait::async_trait;
use chrono::Utc;
use nexusnote_core::workspace::{DEFAULT_COLOR, DEFAULT_ICON};
use nexusnote_core::{storage_path, Block, GridType, NewBlock, Page, PageUpdate, Workspace};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{BlockStore, FileStore, PageStore, SessionStore, StoredFile};

#[derive(Debug, Default)]
struct MemoryState {
    workspaces: HashMap<Uuid, Workspace>,
    pages: HashMap<Uuid, Page>,
    blocks: HashMap<Uuid, Block>,
    files: HashMap<String, Vec<u8>>,
    content_writes: usize,
    position_writes: usize,
    offline: bool,
    failing_positions: HashSet<Uuid>,
    failing_file_deletes: bool,
    content_write_delay: Option<Duration>,
}

/// Backend holding everything in memory for a single signed-in user
#[derive(Debug)]
pub struct MemoryBackend {
    user_id: Uuid,
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            state: Mutex::new(MemoryState::default()),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn online(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        let state = self.state();
        if state.offline {
            return Err(StoreError::Unavailable("backend offline".to_string()));
        }
        Ok(state)
    }

    /// Make every subsequent call fail until switched back
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Make position writes for one block fail
    pub fn fail_position_writes(&self, block_id: Uuid) {
        self.state().failing_positions.insert(block_id);
    }

    /// Make file deletion fail while leaving the files in place
    pub fn fail_file_deletes(&self, failing: bool) {
        self.state().failing_file_deletes = failing;
    }

    /// Hold every content write for `delay` before applying it
    pub fn delay_content_writes(&self, delay: Duration) {
        self.state().content_write_delay = Some(delay);
    }

    pub fn add_workspace(&self, name: &str) -> Workspace {
        let now = Utc::now();
        let workspace = Workspace {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            name: name.to_string(),
            description: None,
            icon: DEFAULT_ICON.to_string(),
            color: DEFAULT_COLOR.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.state()
            .workspaces
            .insert(workspace.id, workspace.clone());
        workspace
    }

    pub fn soft_delete_workspace(&self, workspace_id: Uuid) {
        if let Some(ws) = self.state().workspaces.get_mut(&workspace_id) {
            ws.deleted_at = Some(Utc::now());
        }
    }

    pub fn add_page(&self, workspace_id: Uuid, title: &str) -> Page {
        let now = Utc::now();
        let page = Page {
            id: Uuid::new_v4(),
            workspace_id,
            title: title.to_string(),
            grid_type: GridType::None,
            color: None,
            created_at: now,
            updated_at: now,
        };
        self.state().pages.insert(page.id, page.clone());
        page
    }

    pub fn add_block(&self, page_id: Uuid, block: NewBlock) -> Block {
        let block = Block {
            id: Uuid::new_v4(),
            page_id,
            kind: block.kind,
            content: block.content,
            position: block.position,
            created_at: Utc::now(),
        };
        self.state().blocks.insert(block.id, block.clone());
        block
    }

    pub fn stored_block(&self, block_id: Uuid) -> Option<Block> {
        self.state().blocks.get(&block_id).cloned()
    }

    /// Stored blocks of a page, ordered by position
    pub fn stored_blocks(&self, page_id: Uuid) -> Vec<Block> {
        let mut blocks: Vec<Block> = self
            .state()
            .blocks
            .values()
            .filter(|b| b.page_id == page_id)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| b.position);
        blocks
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.state().files.contains_key(path)
    }

    /// Number of successful content updates
    pub fn content_writes(&self) -> usize {
        self.state().content_writes
    }

    /// Number of successful position updates
    pub fn position_writes(&self) -> usize {
        self.state().position_writes
    }
}

#[async_trait]
impl BlockStore for MemoryBackend {
    async fn fetch_blocks(&self, page_id: Uuid) -> Result<Vec<Block>, StoreError> {
        drop(self.online()?);
        Ok(self.stored_blocks(page_id))
    }

    async fn insert_block(&self, page_id: Uuid, block: NewBlock) -> Result<Block, StoreError> {
        if !self.online()?.pages.contains_key(&page_id) {
            return Err(StoreError::NotFound(format!("Page {}", page_id)));
        }
        Ok(self.add_block(page_id, block))
    }

    async fn update_block_content(
        &self,
        block_id: Uuid,
        content: Value,
    ) -> Result<Block, StoreError> {
        let delay = self.state().content_write_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.online()?;
        let block = state
            .blocks
            .get_mut(&block_id)
            .ok_or_else(|| StoreError::NotFound(format!("Block {}", block_id)))?;
        block.content = content;
        let block = block.clone();
        state.content_writes += 1;
        Ok(block)
    }

    async fn update_block_position(
        &self,
        page_id: Uuid,
        block_id: Uuid,
        position: i32,
    ) -> Result<(), StoreError> {
        let mut state = self.online()?;
        if state.failing_positions.contains(&block_id) {
            return Err(StoreError::Unavailable(format!(
                "position write for {} rejected",
                block_id
            )));
        }
        let block = state
            .blocks
            .get_mut(&block_id)
            .filter(|b| b.page_id == page_id)
            .ok_or_else(|| StoreError::NotFound(format!("Block {}", block_id)))?;
        block.position = position;
        state.position_writes += 1;
        Ok(())
    }

    async fn delete_block(&self, block_id: Uuid) -> Result<(), StoreError> {
        self.online()?.blocks.remove(&block_id);
        Ok(())
    }
}

#[async_trait]
impl PageStore for MemoryBackend {
    async fn get_page(&self, page_id: Uuid) -> Result<Page, StoreError> {
        self.online()?
            .pages
            .get(&page_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Page {}", page_id)))
    }

    async fn update_page(&self, page_id: Uuid, update: PageUpdate) -> Result<Page, StoreError> {
        let mut state = self.online()?;
        let page = state
            .pages
            .get_mut(&page_id)
            .ok_or_else(|| StoreError::NotFound(format!("Page {}", page_id)))?;
        update.apply(page);
        page.updated_at = Utc::now();
        Ok(page.clone())
    }

    async fn list_workspaces(&self, user_id: Uuid) -> Result<Vec<Workspace>, StoreError> {
        let mut workspaces: Vec<Workspace> = self
            .online()?
            .workspaces
            .values()
            .filter(|w| w.user_id == user_id && !w.is_deleted())
            .cloned()
            .collect();
        workspaces.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(workspaces)
    }
}

#[async_trait]
impl FileStore for MemoryBackend {
    async fn upload_file(
        &self,
        user_id: Uuid,
        _file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, StoreError> {
        let mut state = self.online()?;
        // Millisecond keys can collide within one test; bump until free
        let mut millis = Utc::now().timestamp_millis();
        let mut path = storage_path(user_id, mime_type, millis);
        while state.files.contains_key(&path) {
            millis += 1;
            path = storage_path(user_id, mime_type, millis);
        }
        state.files.insert(path.clone(), bytes);
        Ok(StoredFile {
            url: format!("memory://files/{}", path),
            path,
        })
    }

    async fn delete_file(&self, path: &str) -> Result<(), StoreError> {
        let mut state = self.online()?;
        if state.failing_file_deletes {
            return Err(StoreError::Status {
                status: 500,
                message: format!("could not delete {}", path),
            });
        }
        state.files.remove(path);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryBackend {
    async fn current_user_id(&self) -> Result<Uuid, StoreError> {
        drop(self.online()?);
        Ok(self.user_id)
    }
}
