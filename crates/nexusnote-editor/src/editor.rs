use nexusnote_core::{
    Block, BlockContent, BlockList, BlockType, DragGesture, NewBlock, NexusError, Page,
    PageUpdate, Point, Workspace,
};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use uuid::Uuid;

use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::notify::{Notice, Notifier};
use crate::store::Backend;

struct EditorInner<B> {
    backend: Arc<B>,
    config: EditorConfig,
    notifier: Notifier,
    page: RwLock<Page>,
    blocks: Mutex<BlockList>,
    workspaces: Vec<Workspace>,
}

/// Editing session for one page.
///
/// Cheap to clone; block widgets keep a clone to write their content back.
/// Every remote failure is logged and surfaced as an error [`Notice`] in
/// addition to being returned.
pub struct PageEditor<B> {
    inner: Arc<EditorInner<B>>,
}

impl<B> Clone for PageEditor<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> PageEditor<B> {
    /// Load a page, its blocks and the user's workspaces concurrently
    pub async fn open(backend: Arc<B>, page_id: Uuid, config: EditorConfig) -> Result<Self> {
        Self::open_with_notifier(backend, page_id, config, Notifier::new()).await
    }

    pub async fn open_with_notifier(
        backend: Arc<B>,
        page_id: Uuid,
        config: EditorConfig,
        notifier: Notifier,
    ) -> Result<Self> {
        let loaded = async {
            let user_id = backend.current_user_id().await?;
            tokio::try_join!(
                backend.get_page(page_id),
                backend.fetch_blocks(page_id),
                backend.list_workspaces(user_id),
            )
        }
        .await;

        let (page, blocks, workspaces) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!("Error loading page {}: {}", page_id, e);
                notifier.error("Failed to load page");
                return Err(e.into());
            }
        };

        let blocks = BlockList::from_blocks(page_id, blocks);
        if !blocks.is_contiguous() {
            tracing::warn!("Page {} has gapped or duplicate block positions", page_id);
        }

        Ok(Self {
            inner: Arc::new(EditorInner {
                backend,
                config,
                notifier,
                page: RwLock::new(page),
                blocks: Mutex::new(blocks),
                workspaces,
            }),
        })
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.inner.backend
    }

    pub fn config(&self) -> &EditorConfig {
        &self.inner.config
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.inner.notifier.subscribe()
    }

    pub async fn page(&self) -> Page {
        self.inner.page.read().await.clone()
    }

    /// Sibling workspaces, for the navigation sidebar
    pub fn workspaces(&self) -> &[Workspace] {
        &self.inner.workspaces
    }

    /// Current blocks in render order
    pub async fn blocks(&self) -> Vec<Block> {
        self.inner.blocks.lock().await.snapshot()
    }

    pub async fn block(&self, block_id: Uuid) -> Option<Block> {
        self.inner.blocks.lock().await.get(block_id).cloned()
    }

    pub(crate) async fn require_block(&self, block_id: Uuid) -> Result<Block> {
        self.block(block_id)
            .await
            .ok_or_else(|| NexusError::BlockNotFound(block_id).into())
    }

    /// Update the page title, grid or color
    pub async fn update_page(&self, update: PageUpdate) -> Result<Page> {
        let update = match update.validate() {
            Ok(update) => update,
            Err(e) => {
                self.inner.notifier.error(e.to_string());
                return Err(e.into());
            }
        };
        let page_id = self.inner.page.read().await.id;
        match self.inner.backend.update_page(page_id, update).await {
            Ok(page) => {
                *self.inner.page.write().await = page.clone();
                self.inner.notifier.success("Page updated");
                Ok(page)
            }
            Err(e) => {
                tracing::error!("Error updating page {}: {}", page_id, e);
                self.inner.notifier.error("Failed to update page");
                Err(e.into())
            }
        }
    }

    /// Append a block of `kind` with its default content
    pub async fn add_block(&self, kind: BlockType) -> Result<Block> {
        self.append(NewBlock::with_default(kind, 0), "Block added", "Failed to add block")
            .await
    }

    /// Append a copy of an existing block
    pub async fn duplicate_block(&self, block_id: Uuid) -> Result<Block> {
        let source = self.require_block(block_id).await?;
        let new_block = NewBlock {
            kind: source.kind,
            content: source.content,
            position: 0,
        };
        self.append(new_block, "Block duplicated", "Failed to duplicate block")
            .await
    }

    async fn append(&self, mut new_block: NewBlock, ok: &str, failed: &str) -> Result<Block> {
        let page_id = self.inner.page.read().await.id;
        new_block.position = self.inner.blocks.lock().await.next_position();

        match self.inner.backend.insert_block(page_id, new_block).await {
            Ok(block) => {
                self.inner.blocks.lock().await.push(block.clone());
                self.inner.notifier.success(ok);
                Ok(block)
            }
            Err(e) => {
                tracing::error!("Error inserting block on page {}: {}", page_id, e);
                self.inner.notifier.error(failed);
                Err(e.into())
            }
        }
    }

    /// Persist new content for a block, then mirror it locally
    pub async fn update_block(&self, block_id: Uuid, content: &BlockContent) -> Result<Block> {
        let current = self.require_block(block_id).await?;
        if current.kind != content.kind() {
            return Err(NexusError::WrongBlockType {
                expected: current.kind,
                found: content.kind(),
            }
            .into());
        }

        match self
            .inner
            .backend
            .update_block_content(block_id, content.to_value())
            .await
        {
            Ok(saved) => {
                // The block may have been deleted while the write was in flight
                let mut blocks = self.inner.blocks.lock().await;
                if let Err(e) = blocks.set_content(block_id, saved.content.clone()) {
                    tracing::debug!("Saved content for a block no longer on the page: {}", e);
                }
                Ok(saved)
            }
            Err(e) => {
                tracing::error!("Error updating block {}: {}", block_id, e);
                self.inner.notifier.error("Failed to save block");
                Err(e.into())
            }
        }
    }

    /// Delete a block and close the gap in positions.
    ///
    /// The shifted positions are written back best-effort: a failure there is
    /// reported but the deletion stands.
    pub async fn delete_block(&self, block_id: Uuid) -> Result<Block> {
        self.require_block(block_id).await?;

        if let Err(e) = self.inner.backend.delete_block(block_id).await {
            tracing::error!("Error deleting block {}: {}", block_id, e);
            self.inner.notifier.error("Failed to delete block");
            return Err(e.into());
        }

        let (page_id, removed, changes) = {
            let mut blocks = self.inner.blocks.lock().await;
            let (removed, changes) = blocks.remove(block_id)?;
            (blocks.page_id(), removed, changes)
        };

        if !changes.is_empty() {
            if let Err(e) = self.inner.backend.update_positions(page_id, &changes).await {
                tracing::error!("Error renumbering blocks after delete: {}", e);
                self.inner.notifier.error("Failed to update block order");
            }
        }

        self.inner.notifier.success("Block deleted");
        Ok(removed)
    }

    /// Move the block at `from` to index `to`.
    ///
    /// The local order changes immediately. Every position is then written
    /// back; if any write fails the local order reverts to what it was before
    /// the move. Writes that already landed remotely are not undone.
    pub async fn reorder(&self, from: usize, to: usize) -> Result<()> {
        if from == to {
            return Ok(());
        }

        let (page_id, snapshot, changes) = {
            let mut blocks = self.inner.blocks.lock().await;
            let snapshot = blocks.snapshot();
            let changes = blocks.move_block(from, to)?;
            (blocks.page_id(), snapshot, changes)
        };

        match self.inner.backend.update_positions(page_id, &changes).await {
            Ok(()) => {
                self.inner.notifier.success("Blocks reordered");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error reordering blocks: {}", e);
                self.inner.blocks.lock().await.restore(snapshot);
                self.inner.notifier.error("Failed to reorder blocks");
                Err(e.into())
            }
        }
    }

    /// Track a press on a block handle; it becomes a drag past the configured distance
    pub fn start_drag(&self, origin: Point) -> DragGesture {
        DragGesture::with_activation_distance(origin, self.inner.config.drag_activation_distance)
    }

    /// Drop the dragged block `active` onto the slot of `over`
    pub async fn drop_block(&self, active: Uuid, over: Uuid) -> Result<()> {
        let target = self.inner.blocks.lock().await.resolve_drop(active, over);
        match target {
            Some((from, to)) => self.reorder(from, to).await,
            None => Ok(()),
        }
    }
}
