use nexusnote_core::{BlockContent, BlockType, GridType, NexusError};
use nexusnote_history::{CanvasState, Snapshot};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::editor::PageEditor;
use crate::error::Result;
use crate::store::Backend;

/// Drawing session for a canvas block.
///
/// Strokes only touch local history. The image at the history cursor is
/// written back on a fixed interval until the editor is dropped.
pub struct CanvasBlockEditor<B: Backend> {
    editor: PageEditor<B>,
    block_id: Uuid,
    state: Arc<Mutex<CanvasState>>,
    autosave: JoinHandle<()>,
}

impl<B: Backend> PageEditor<B> {
    pub async fn canvas_editor(&self, block_id: Uuid) -> Result<CanvasBlockEditor<B>> {
        let block = self.require_block(block_id).await?;
        let content = match block.typed_content()? {
            BlockContent::Canvas(content) => content,
            other => {
                return Err(NexusError::WrongBlockType {
                    expected: BlockType::Canvas,
                    found: other.kind(),
                }
                .into())
            }
        };

        let state = Arc::new(Mutex::new(CanvasState::with_max_snapshots(
            &content,
            self.config().canvas_history,
        )));

        let period = self.config().canvas_autosave;
        let editor = self.clone();
        let saved_state = Arc::clone(&state);
        let autosave = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let content = saved_state.lock().await.to_content();
                if let Err(e) = editor
                    .update_block(block_id, &BlockContent::Canvas(content))
                    .await
                {
                    tracing::warn!("Canvas autosave for {} failed: {}", block_id, e);
                }
            }
        });

        Ok(CanvasBlockEditor {
            editor: self.clone(),
            block_id,
            state,
            autosave,
        })
    }
}

impl<B: Backend> CanvasBlockEditor<B> {
    pub fn block_id(&self) -> Uuid {
        self.block_id
    }

    /// Record the image after a finished stroke
    pub async fn commit_stroke(&self, snapshot: Snapshot) {
        self.state.lock().await.commit_stroke(snapshot);
    }

    pub async fn undo(&self) -> Option<Snapshot> {
        self.state.lock().await.undo()
    }

    pub async fn redo(&self) -> Option<Snapshot> {
        self.state.lock().await.redo()
    }

    pub async fn clear(&self) {
        self.state.lock().await.clear();
    }

    pub async fn can_undo(&self) -> bool {
        self.state.lock().await.can_undo()
    }

    pub async fn can_redo(&self) -> bool {
        self.state.lock().await.can_redo()
    }

    pub async fn current(&self) -> Option<Snapshot> {
        self.state.lock().await.current().cloned()
    }

    /// Change the background grid and save right away
    pub async fn set_grid_type(&self, grid_type: GridType) -> Result<()> {
        self.state.lock().await.set_grid_type(grid_type);
        self.save_now().await
    }

    pub async fn save_now(&self) -> Result<()> {
        let content = self.state.lock().await.to_content();
        self.editor
            .update_block(self.block_id, &BlockContent::Canvas(content))
            .await?;
        Ok(())
    }
}

impl<B: Backend> Drop for CanvasBlockEditor<B> {
    fn drop(&mut self) {
        self.autosave.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editor::tests::{fixture, open};
    use std::time::Duration;
    use tokio::time::sleep;

    const PNG_A: &str = "data:image/png;base64,AAAA";
    const PNG_B: &str = "data:image/png;base64,BBBB";

    #[tokio::test(start_paused = true)]
    async fn test_autosave_writes_image_at_cursor() {
        let f = fixture(&[BlockType::Canvas]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let canvas = editor.canvas_editor(id).await.unwrap();

        canvas.commit_stroke(Snapshot::new(PNG_A)).await;
        canvas.commit_stroke(Snapshot::new(PNG_B)).await;
        assert_eq!(canvas.undo().await, Some(Snapshot::new(PNG_A)));

        sleep(Duration::from_millis(4900)).await;
        assert_eq!(f.backend.content_writes(), 0);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(f.backend.content_writes(), 1);
        assert_eq!(f.backend.stored_block(id).unwrap().content["dataURL"], PNG_A);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_autosave() {
        let f = fixture(&[BlockType::Canvas]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let canvas = editor.canvas_editor(id).await.unwrap();

        canvas.commit_stroke(Snapshot::new(PNG_A)).await;
        drop(canvas);
        sleep(Duration::from_secs(20)).await;

        assert_eq!(f.backend.content_writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_then_undo_restores_drawing() {
        let f = fixture(&[BlockType::Canvas]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let canvas = editor.canvas_editor(id).await.unwrap();

        canvas.commit_stroke(Snapshot::new(PNG_A)).await;
        canvas.clear().await;
        assert!(canvas.current().await.unwrap().is_blank());

        assert_eq!(canvas.undo().await, Some(Snapshot::new(PNG_A)));
        assert!(canvas.can_redo().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grid_change_saves_immediately() {
        let f = fixture(&[BlockType::Canvas]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let canvas = editor.canvas_editor(id).await.unwrap();

        canvas.set_grid_type(GridType::Lines).await.unwrap();

        assert_eq!(f.backend.content_writes(), 1);
        assert_eq!(f.backend.stored_block(id).unwrap().content["gridType"], "lines");
    }

    #[tokio::test]
    async fn test_canvas_editor_requires_canvas_block() {
        let f = fixture(&[BlockType::Text]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;

        assert!(editor.canvas_editor(id).await.is_err());
    }
}
