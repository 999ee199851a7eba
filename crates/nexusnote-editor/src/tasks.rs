use nexusnote_core::{BlockContent, BlockType, NexusError, TaskListContent, TaskPriority, TaskStatus};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::editor::PageEditor;
use crate::error::Result;
use crate::store::Backend;

/// Edits the rows of a task block.
///
/// Task edits are not debounced: every change writes the whole list back.
/// Edits run one at a time so each starts from the list the previous one saved.
pub struct TaskBlockEditor<B: Backend> {
    editor: PageEditor<B>,
    block_id: Uuid,
    editing: Mutex<()>,
}

impl<B: Backend> PageEditor<B> {
    pub async fn task_editor(&self, block_id: Uuid) -> Result<TaskBlockEditor<B>> {
        let block = self.require_block(block_id).await?;
        if block.kind != BlockType::Task {
            return Err(NexusError::WrongBlockType {
                expected: BlockType::Task,
                found: block.kind,
            }
            .into());
        }
        Ok(TaskBlockEditor {
            editor: self.clone(),
            block_id,
            editing: Mutex::new(()),
        })
    }
}

impl<B: Backend> TaskBlockEditor<B> {
    /// Current task list as last saved
    pub async fn tasks(&self) -> Result<TaskListContent> {
        let block = self.editor.require_block(self.block_id).await?;
        match block.typed_content()? {
            BlockContent::Task(tasks) => Ok(tasks),
            other => Err(NexusError::WrongBlockType {
                expected: BlockType::Task,
                found: other.kind(),
            }
            .into()),
        }
    }

    /// Append an empty task, returning its id
    pub async fn add_task(&self) -> Result<String> {
        self.edit(|tasks| Ok(tasks.add_task())).await
    }

    pub async fn remove_task(&self, task_id: &str) -> Result<()> {
        self.edit(|tasks| tasks.remove_task(task_id).map(|_| ()))
            .await
    }

    pub async fn set_text(&self, task_id: &str, text: &str) -> Result<()> {
        self.edit(|tasks| tasks.set_text(task_id, text)).await
    }

    pub async fn set_due_date(&self, task_id: &str, due: &str) -> Result<()> {
        self.edit(|tasks| tasks.set_due_date(task_id, due)).await
    }

    pub async fn toggle_completed(&self, task_id: &str) -> Result<bool> {
        self.edit(|tasks| tasks.toggle_completed(task_id)).await
    }

    pub async fn toggle_approved(&self, task_id: &str) -> Result<bool> {
        self.edit(|tasks| tasks.toggle_approved(task_id)).await
    }

    pub async fn cycle_status(&self, task_id: &str) -> Result<TaskStatus> {
        self.edit(|tasks| tasks.cycle_status(task_id)).await
    }

    pub async fn cycle_priority(&self, task_id: &str) -> Result<TaskPriority> {
        self.edit(|tasks| tasks.cycle_priority(task_id)).await
    }

    async fn edit<R>(
        &self,
        f: impl FnOnce(&mut TaskListContent) -> std::result::Result<R, NexusError>,
    ) -> Result<R> {
        let _editing = self.editing.lock().await;
        let mut tasks = self.tasks().await?;
        let result = f(&mut tasks)?;
        self.editor
            .update_block(self.block_id, &BlockContent::Task(tasks))
            .await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editor::tests::{fixture, open};
    use std::time::Duration;

    #[tokio::test]
    async fn test_each_edit_writes_immediately() {
        let f = fixture(&[BlockType::Task]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let tasks = editor.task_editor(id).await.unwrap();

        let task_id = tasks.add_task().await.unwrap();
        tasks.set_text(&task_id, "Read chapter 3").await.unwrap();
        assert!(tasks.toggle_completed(&task_id).await.unwrap());

        assert_eq!(f.backend.content_writes(), 3);
        let stored = f.backend.stored_block(id).unwrap().content;
        assert_eq!(stored["tasks"][0]["text"], "Read chapter 3");
        assert_eq!(stored["tasks"][0]["completed"], true);
        assert_eq!(stored["tasks"][0]["status"], "Not Started");
    }

    #[tokio::test]
    async fn test_cycles_persist_labels() {
        let f = fixture(&[BlockType::Task]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let tasks = editor.task_editor(id).await.unwrap();
        let task_id = tasks.add_task().await.unwrap();

        assert_eq!(
            tasks.cycle_status(&task_id).await.unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!(
            tasks.cycle_priority(&task_id).await.unwrap(),
            TaskPriority::Low
        );

        let stored = f.backend.stored_block(id).unwrap().content;
        assert_eq!(stored["tasks"][0]["status"], "In Progress");
        assert_eq!(stored["tasks"][0]["priority"], "Low");
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_edits_both_kept() {
        let f = fixture(&[BlockType::Task]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let tasks = editor.task_editor(id).await.unwrap();
        f.backend.delay_content_writes(Duration::from_millis(200));

        let (first, second) = tokio::join!(tasks.add_task(), tasks.add_task());
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_ne!(first, second);
        let stored = f.backend.stored_block(id).unwrap().content;
        assert_eq!(stored["tasks"].as_array().unwrap().len(), 2);
        assert_eq!(tasks.tasks().await.unwrap().tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_task_writes_nothing() {
        let f = fixture(&[BlockType::Task]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;
        let tasks = editor.task_editor(id).await.unwrap();

        assert!(tasks.toggle_approved("nope").await.is_err());
        assert_eq!(f.backend.content_writes(), 0);
    }

    #[tokio::test]
    async fn test_task_editor_requires_task_block() {
        let f = fixture(&[BlockType::Image]);
        let editor = open(&f, EditorConfig::default()).await;
        let id = editor.blocks().await[0].id;

        assert!(editor.task_editor(id).await.is_err());
    }
}
