use nexusnote_core::{BlockContent, BlockType, NexusError};
use uuid::Uuid;

use crate::debounce::Debouncer;
use crate::editor::PageEditor;
use crate::error::Result;
use crate::store::Backend;

/// Local draft of a text or code block.
///
/// Edits land in the draft immediately and are written back once typing has
/// paused for the configured debounce. Editing back to the saved content
/// drops the pending write. Dropping the draft discards anything unsaved.
pub struct BlockDraft<B: Backend> {
    editor: PageEditor<B>,
    block_id: Uuid,
    draft: BlockContent,
    saver: Debouncer<BlockContent>,
}

impl<B: Backend> PageEditor<B> {
    /// Start a debounced draft for a text or code block
    pub async fn draft(&self, block_id: Uuid) -> Result<BlockDraft<B>> {
        let block = self.require_block(block_id).await?;
        if !block.kind.is_debounced() {
            return Err(NexusError::UnsupportedOperation {
                kind: block.kind,
                operation: "draft",
            }
            .into());
        }

        let editor = self.clone();
        let saver = Debouncer::new(self.config().draft_debounce, move |content: BlockContent| {
            let editor = editor.clone();
            async move {
                // update_block reports its own failures
                let _ = editor.update_block(block_id, &content).await;
            }
        });

        Ok(BlockDraft {
            editor: self.clone(),
            block_id,
            draft: block.typed_content()?,
            saver,
        })
    }
}

impl<B: Backend> BlockDraft<B> {
    pub fn block_id(&self) -> Uuid {
        self.block_id
    }

    pub fn content(&self) -> &BlockContent {
        &self.draft
    }

    pub async fn set_text(&mut self, text: impl Into<String>) -> Result<()> {
        match &mut self.draft {
            BlockContent::Text(content) => content.text = text.into(),
            other => return Err(unsupported(other.kind(), "set_text")),
        }
        self.changed().await
    }

    pub async fn set_code(&mut self, code: impl Into<String>) -> Result<()> {
        match &mut self.draft {
            BlockContent::Code(content) => content.code = code.into(),
            other => return Err(unsupported(other.kind(), "set_code")),
        }
        self.changed().await
    }

    pub async fn set_language(&mut self, language: impl Into<String>) -> Result<()> {
        match &mut self.draft {
            BlockContent::Code(content) => content.language = language.into(),
            other => return Err(unsupported(other.kind(), "set_language")),
        }
        self.changed().await
    }

    /// Whether the draft differs from the last saved content
    pub async fn is_dirty(&self) -> bool {
        match self.saved().await {
            Some(saved) => saved != self.draft,
            None => false,
        }
    }

    /// Write the draft now instead of waiting for the quiet period
    pub async fn save_now(&self) -> Result<()> {
        self.saver.cancel();
        self.editor.update_block(self.block_id, &self.draft).await?;
        Ok(())
    }

    async fn changed(&self) -> Result<()> {
        if self.saved().await.as_ref() == Some(&self.draft) {
            self.saver.cancel();
        } else {
            self.saver.schedule(self.draft.clone());
        }
        Ok(())
    }

    async fn saved(&self) -> Option<BlockContent> {
        let block = self.editor.block(self.block_id).await?;
        block.typed_content().ok()
    }
}

fn unsupported(kind: BlockType, operation: &'static str) -> crate::error::EditorError {
    NexusError::UnsupportedOperation { kind, operation }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editor::tests::{fixture, open};
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_saves_once() {
        let f = fixture(&[BlockType::Text]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let mut draft = editor.draft(id).await.unwrap();

        for text in ["#", "# N", "# No", "# Notes"] {
            draft.set_text(text).await.unwrap();
            sleep(Duration::from_millis(200)).await;
        }
        assert_eq!(f.backend.content_writes(), 0);
        assert!(draft.is_dirty().await);

        sleep(Duration::from_millis(900)).await;
        assert_eq!(f.backend.content_writes(), 1);
        assert_eq!(
            f.backend.stored_block(id).unwrap().content,
            json!({ "text": "# Notes" })
        );
        assert!(!draft.is_dirty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverting_to_saved_skips_write() {
        let f = fixture(&[BlockType::Code]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let mut draft = editor.draft(id).await.unwrap();

        draft.set_language("rust").await.unwrap();
        sleep(Duration::from_millis(300)).await;
        draft.set_language("javascript").await.unwrap();
        sleep(Duration::from_secs(3)).await;

        assert_eq!(f.backend.content_writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_draft_discards_pending_edit() {
        let f = fixture(&[BlockType::Text]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let mut draft = editor.draft(id).await.unwrap();

        draft.set_text("unsaved").await.unwrap();
        drop(draft);
        sleep(Duration::from_secs(3)).await;

        assert_eq!(f.backend.content_writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_now_skips_debounce() {
        let f = fixture(&[BlockType::Code]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let mut draft = editor.draft(id).await.unwrap();

        draft.set_code("fn main() {}").await.unwrap();
        draft.save_now().await.unwrap();
        sleep(Duration::from_secs(3)).await;

        assert_eq!(f.backend.content_writes(), 1);
        assert_eq!(
            editor.block(id).await.unwrap().content["code"],
            "fn main() {}"
        );
    }

    #[tokio::test]
    async fn test_only_text_and_code_have_drafts() {
        let f = fixture(&[BlockType::Task, BlockType::Text]);
        let editor = open(&f, EditorConfig::default()).await;
        let blocks = editor.blocks().await;

        assert!(editor.draft(blocks[0].id).await.is_err());

        let mut draft = editor.draft(blocks[1].id).await.unwrap();
        let err = draft.set_code("x").await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::EditorError::Model(NexusError::UnsupportedOperation { .. })
        ));
    }
}
