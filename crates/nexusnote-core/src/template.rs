use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::block::{Block, BlockType, NewBlock};
use crate::page::{GridType, NewPage};

/// Shape of one block a template seeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateBlock {
    #[serde(rename = "type")]
    pub kind: BlockType,
    #[serde(default)]
    pub content: Value,
}

/// A reusable page layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    /// `None` for built-in templates
    pub user_id: Option<Uuid>,
    pub is_public: bool,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: Option<String>,
    pub grid_type: GridType,
    pub blocks: Vec<TemplateBlock>,
    pub created_at: DateTime<Utc>,
}

impl Template {
    /// Visible to `user_id` when owned by them or public
    pub fn visible_to(&self, user_id: Uuid) -> bool {
        self.is_public || self.user_id == Some(user_id)
    }

    /// The page a template creates; falls back to the template name
    pub fn new_page(&self, title: Option<&str>) -> NewPage {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.name);
        NewPage::new(title).with_grid(self.grid_type)
    }

    /// Blocks to insert into the seeded page, positioned in template order
    pub fn seed_blocks(&self) -> Vec<NewBlock> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| NewBlock {
                kind: block.kind,
                content: block.content.clone(),
                position: index as i32,
            })
            .collect()
    }
}

/// Capture a page's blocks, in order, as template block shapes
pub fn blocks_from_page(blocks: &[Block]) -> Vec<TemplateBlock> {
    let mut ordered: Vec<&Block> = blocks.iter().collect();
    ordered.sort_by_key(|b| b.position);
    ordered
        .into_iter()
        .map(|b| TemplateBlock {
            kind: b.kind,
            content: b.content.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> Template {
        Template {
            id: Uuid::new_v4(),
            user_id: None,
            is_public: true,
            name: "Project".to_string(),
            description: None,
            icon: Some("💻".to_string()),
            category: Some("project".to_string()),
            grid_type: GridType::Squares,
            blocks: vec![
                TemplateBlock {
                    kind: BlockType::Text,
                    content: json!({ "text": "# Project" }),
                },
                TemplateBlock {
                    kind: BlockType::Task,
                    content: json!({ "tasks": [{ "id": "1", "text": "Setup" }] }),
                },
                TemplateBlock {
                    kind: BlockType::Canvas,
                    content: json!({ "dataURL": null, "gridType": "squares" }),
                },
            ],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_seed_blocks_positions() {
        let seeded = template().seed_blocks();
        assert_eq!(seeded.len(), 3);
        for (index, block) in seeded.iter().enumerate() {
            assert_eq!(block.position, index as i32);
        }
        assert_eq!(seeded[1].kind, BlockType::Task);
    }

    #[test]
    fn test_new_page_title_fallback() {
        let t = template();
        assert_eq!(t.new_page(None).title, "Project");
        assert_eq!(t.new_page(Some("  ")).title, "Project");
        let page = t.new_page(Some("Capstone"));
        assert_eq!(page.title, "Capstone");
        assert_eq!(page.grid_type, GridType::Squares);
    }

    #[test]
    fn test_visibility() {
        let mut t = template();
        let owner = Uuid::new_v4();
        assert!(t.visible_to(owner));
        t.is_public = false;
        assert!(!t.visible_to(owner));
        t.user_id = Some(owner);
        assert!(t.visible_to(owner));
    }

    #[test]
    fn test_blocks_from_page_orders_by_position() {
        let page_id = Uuid::new_v4();
        let make = |kind, position| Block {
            id: Uuid::new_v4(),
            page_id,
            kind,
            content: Value::Null,
            position,
            created_at: Utc::now(),
        };
        let shapes = blocks_from_page(&[make(BlockType::Code, 1), make(BlockType::Text, 0)]);
        assert_eq!(shapes[0].kind, BlockType::Text);
        assert_eq!(shapes[1].kind, BlockType::Code);
    }
}
