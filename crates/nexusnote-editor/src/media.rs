use nexusnote_core::{Block, BlockContent, MediaKind, NexusError};
use uuid::Uuid;

use crate::editor::PageEditor;
use crate::error::Result;
use crate::store::Backend;

/// Upload and metadata handling for image and PDF blocks
pub struct MediaBlockEditor<B: Backend> {
    editor: PageEditor<B>,
    block_id: Uuid,
    kind: MediaKind,
}

impl<B: Backend> PageEditor<B> {
    pub async fn media_editor(&self, block_id: Uuid) -> Result<MediaBlockEditor<B>> {
        let block = self.require_block(block_id).await?;
        let kind = MediaKind::for_block(block.kind).ok_or(NexusError::UnsupportedOperation {
            kind: block.kind,
            operation: "upload",
        })?;
        Ok(MediaBlockEditor {
            editor: self.clone(),
            block_id,
            kind,
        })
    }
}

impl<B: Backend> MediaBlockEditor<B> {
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub async fn content(&self) -> Result<BlockContent> {
        Ok(self.editor.require_block(self.block_id).await?.typed_content()?)
    }

    /// Validate and upload a file, then point the block at it.
    ///
    /// A file the block referenced before is deleted afterwards on a
    /// best-effort basis.
    pub async fn upload(&self, file_name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<Block> {
        let notifier = self.editor.notifier();
        let size = bytes.len() as u64;
        if let Err(e) = self.kind.validate(mime_type, size) {
            notifier.error(e.to_string());
            return Err(e.into());
        }

        let previous = self.content().await?;
        let backend = self.editor.backend();

        let stored = async {
            let user_id = backend.current_user_id().await?;
            backend.upload_file(user_id, file_name, mime_type, bytes).await
        }
        .await;
        let stored = match stored {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!("Error uploading {}: {}", file_name, e);
                notifier.error("Failed to upload file");
                return Err(e.into());
            }
        };

        let content = match previous.clone() {
            BlockContent::Image(mut image) => {
                image.url = Some(stored.url);
                image.path = Some(stored.path.clone());
                image.file_name = Some(file_name.to_string());
                image.file_size = Some(size);
                image.mime_type = Some(mime_type.to_string());
                BlockContent::Image(image)
            }
            BlockContent::Pdf(mut pdf) => {
                pdf.url = Some(stored.url);
                pdf.path = Some(stored.path.clone());
                pdf.title = file_name.to_string();
                pdf.file_name = Some(file_name.to_string());
                pdf.file_size = Some(size);
                BlockContent::Pdf(pdf)
            }
            other => {
                return Err(NexusError::UnsupportedOperation {
                    kind: other.kind(),
                    operation: "upload",
                }
                .into())
            }
        };

        let block = match self.editor.update_block(self.block_id, &content).await {
            Ok(block) => block,
            Err(e) => {
                // Orphaned upload
                if let Err(cleanup) = backend.delete_file(&stored.path).await {
                    tracing::warn!("Could not remove orphaned file {}: {}", stored.path, cleanup);
                }
                return Err(e);
            }
        };

        if let Some(old_path) = previous.file_path() {
            if old_path != stored.path {
                if let Err(e) = backend.delete_file(old_path).await {
                    tracing::warn!("Could not remove replaced file {}: {}", old_path, e);
                }
            }
        }

        notifier.success("File uploaded");
        Ok(block)
    }

    /// Set the caption shown under an image
    pub async fn set_caption(&self, caption: &str) -> Result<Block> {
        match self.content().await? {
            BlockContent::Image(mut image) => {
                image.caption = caption.to_string();
                self.editor
                    .update_block(self.block_id, &BlockContent::Image(image))
                    .await
            }
            other => Err(unsupported(&other, "set_caption")),
        }
    }

    /// Set the display title of a PDF
    pub async fn set_title(&self, title: &str) -> Result<Block> {
        match self.content().await? {
            BlockContent::Pdf(mut pdf) => {
                pdf.title = title.to_string();
                self.editor
                    .update_block(self.block_id, &BlockContent::Pdf(pdf))
                    .await
            }
            other => Err(unsupported(&other, "set_title")),
        }
    }

    /// Delete the stored file, then the block.
    ///
    /// The block is kept when the file cannot be removed, so the file stays
    /// reachable for another attempt.
    pub async fn delete(self) -> Result<Block> {
        let content = self.content().await?;
        if let Some(path) = content.file_path() {
            if let Err(e) = self.editor.backend().delete_file(path).await {
                tracing::error!("Error deleting file {}: {}", path, e);
                self.editor.notifier().error("Failed to delete file");
                return Err(e.into());
            }
        }
        self.editor.delete_block(self.block_id).await
    }
}

fn unsupported(content: &BlockContent, operation: &'static str) -> crate::error::EditorError {
    NexusError::UnsupportedOperation {
        kind: content.kind(),
        operation,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editor::tests::{fixture, open};
    use crate::notify::NoticeLevel;
    use nexusnote_core::BlockType;

    #[tokio::test]
    async fn test_image_upload_sets_url_and_keeps_caption() {
        let f = fixture(&[BlockType::Image]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let media = editor.media_editor(id).await.unwrap();
        media.set_caption("Figure 1").await.unwrap();

        let block = media
            .upload("diagram.png", "image/png", vec![0u8; 2048])
            .await
            .unwrap();

        let path = block.content["path"].as_str().unwrap().to_string();
        assert!(path.starts_with(&f.backend.user_id().to_string()));
        assert!(path.ends_with(".png"));
        assert!(f.backend.has_file(&path));
        assert_eq!(block.content["caption"], "Figure 1");
        assert_eq!(block.content["fileSize"], 2048);
        assert_eq!(block.content["mimeType"], "image/png");
    }

    #[tokio::test]
    async fn test_pdf_upload_uses_file_name_as_title() {
        let f = fixture(&[BlockType::Pdf]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let media = editor.media_editor(id).await.unwrap();

        let block = media
            .upload("syllabus.pdf", "application/pdf", vec![1, 2, 3])
            .await
            .unwrap();

        assert_eq!(block.content["title"], "syllabus.pdf");
    }

    #[tokio::test]
    async fn test_oversized_image_rejected_without_upload() {
        let f = fixture(&[BlockType::Image]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let media = editor.media_editor(id).await.unwrap();
        let mut rx = editor.subscribe();

        let err = media
            .upload("huge.png", "image/png", vec![0u8; 5 * 1024 * 1024 + 1])
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(rx.recv().await.unwrap().level, NoticeLevel::Error);
        assert_eq!(f.backend.content_writes(), 0);
    }

    #[tokio::test]
    async fn test_wrong_mime_rejected() {
        let f = fixture(&[BlockType::Pdf]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let media = editor.media_editor(id).await.unwrap();

        let err = media
            .upload("notes.png", "image/png", vec![0u8; 10])
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_replacing_upload_removes_old_file() {
        let f = fixture(&[BlockType::Image]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let media = editor.media_editor(id).await.unwrap();

        let first = media.upload("a.png", "image/png", vec![1]).await.unwrap();
        let first_path = first.content["path"].as_str().unwrap().to_string();
        let second = media.upload("b.jpg", "image/jpeg", vec![2]).await.unwrap();
        let second_path = second.content["path"].as_str().unwrap().to_string();

        assert!(!f.backend.has_file(&first_path));
        assert!(f.backend.has_file(&second_path));
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_block() {
        let f = fixture(&[BlockType::Text, BlockType::Pdf]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[1].id;
        let media = editor.media_editor(id).await.unwrap();
        let block = media
            .upload("slides.pdf", "application/pdf", vec![7; 16])
            .await
            .unwrap();
        let path = block.content["path"].as_str().unwrap().to_string();

        media.delete().await.unwrap();

        assert!(!f.backend.has_file(&path));
        assert_eq!(editor.blocks().await.len(), 1);
        assert!(f.backend.stored_block(id).is_none());
    }

    #[tokio::test]
    async fn test_failed_file_delete_keeps_block() {
        let f = fixture(&[BlockType::Pdf]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let media = editor.media_editor(id).await.unwrap();
        let block = media
            .upload("slides.pdf", "application/pdf", vec![7; 16])
            .await
            .unwrap();
        let path = block.content["path"].as_str().unwrap().to_string();
        f.backend.fail_file_deletes(true);
        let mut rx = editor.subscribe();

        let err = media.delete().await.unwrap_err();

        assert!(!err.is_validation());
        assert_eq!(rx.recv().await.unwrap().level, NoticeLevel::Error);
        assert!(f.backend.has_file(&path));
        assert!(f.backend.stored_block(id).is_some());
        assert_eq!(editor.blocks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_media_editor_rejects_text_block() {
        let f = fixture(&[BlockType::Text]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;

        assert!(editor.media_editor(id).await.is_err());
    }
}
