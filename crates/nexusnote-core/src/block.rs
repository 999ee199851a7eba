use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::NexusError;
use crate::page::GridType;
use crate::task::TaskListContent;

/// The kind of content a block holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Code,
    Task,
    Image,
    Pdf,
    Canvas,
}

impl BlockType {
    pub const ALL: [BlockType; 6] = [
        BlockType::Text,
        BlockType::Code,
        BlockType::Task,
        BlockType::Canvas,
        BlockType::Image,
        BlockType::Pdf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Code => "code",
            BlockType::Task => "task",
            BlockType::Image => "image",
            BlockType::Pdf => "pdf",
            BlockType::Canvas => "canvas",
        }
    }

    /// Text and code blocks persist through a debounced draft
    pub fn is_debounced(&self) -> bool {
        matches!(self, BlockType::Text | BlockType::Code)
    }

    /// Image and pdf blocks reference a file in storage
    pub fn is_media(&self) -> bool {
        matches!(self, BlockType::Image | BlockType::Pdf)
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = NexusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| NexusError::UnknownBlockType(s.to_string()))
    }
}

/// Markdown text block payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextContent {
    pub text: String,
}

/// Source code block payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeContent {
    pub code: String,
    pub language: String,
}

impl Default for CodeContent {
    fn default() -> Self {
        Self {
            code: String::new(),
            language: "javascript".to_string(),
        }
    }
}

/// Freehand canvas payload; the drawing is a PNG data URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasContent {
    #[serde(rename = "dataURL")]
    pub data_url: Option<String>,
    pub grid_type: GridType,
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasContent {
    fn default() -> Self {
        Self {
            data_url: None,
            grid_type: GridType::Dots,
            width: 800,
            height: 600,
        }
    }
}

/// Uploaded image payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageContent {
    pub url: Option<String>,
    pub path: Option<String>,
    pub caption: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Uploaded PDF payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PdfContent {
    pub url: Option<String>,
    pub path: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

/// Typed view over a block's opaque JSON payload
#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    Text(TextContent),
    Code(CodeContent),
    Task(TaskListContent),
    Canvas(CanvasContent),
    Image(ImageContent),
    Pdf(PdfContent),
}

impl BlockContent {
    /// The payload a freshly added block of `kind` starts with
    pub fn default_for(kind: BlockType) -> Self {
        match kind {
            BlockType::Text => BlockContent::Text(TextContent::default()),
            BlockType::Code => BlockContent::Code(CodeContent::default()),
            BlockType::Task => BlockContent::Task(TaskListContent::default()),
            BlockType::Canvas => BlockContent::Canvas(CanvasContent::default()),
            BlockType::Image => BlockContent::Image(ImageContent::default()),
            BlockType::Pdf => BlockContent::Pdf(PdfContent::default()),
        }
    }

    pub fn kind(&self) -> BlockType {
        match self {
            BlockContent::Text(_) => BlockType::Text,
            BlockContent::Code(_) => BlockType::Code,
            BlockContent::Task(_) => BlockType::Task,
            BlockContent::Canvas(_) => BlockType::Canvas,
            BlockContent::Image(_) => BlockType::Image,
            BlockContent::Pdf(_) => BlockType::Pdf,
        }
    }

    /// Parse a stored payload. `null` reads as the default payload.
    pub fn from_value(kind: BlockType, value: &Value) -> Result<Self, NexusError> {
        if value.is_null() {
            return Ok(Self::default_for(kind));
        }
        Ok(match kind {
            BlockType::Text => BlockContent::Text(parse(kind, value)?),
            BlockType::Code => BlockContent::Code(parse(kind, value)?),
            BlockType::Task => BlockContent::Task(parse(kind, value)?),
            BlockType::Canvas => BlockContent::Canvas(parse(kind, value)?),
            BlockType::Image => BlockContent::Image(parse(kind, value)?),
            BlockType::Pdf => BlockContent::Pdf(parse(kind, value)?),
        })
    }

    pub fn to_value(&self) -> Value {
        let result = match self {
            BlockContent::Text(c) => serde_json::to_value(c),
            BlockContent::Code(c) => serde_json::to_value(c),
            BlockContent::Task(c) => serde_json::to_value(c),
            BlockContent::Canvas(c) => serde_json::to_value(c),
            BlockContent::Image(c) => serde_json::to_value(c),
            BlockContent::Pdf(c) => serde_json::to_value(c),
        };
        // Plain structs with string keys always serialize
        result.unwrap_or(Value::Null)
    }

    /// Storage path of the referenced file, for media blocks
    pub fn file_path(&self) -> Option<&str> {
        match self {
            BlockContent::Image(c) => c.path.as_deref(),
            BlockContent::Pdf(c) => c.path.as_deref(),
            _ => None,
        }
    }
}

fn parse<T: DeserializeOwned>(kind: BlockType, value: &Value) -> Result<T, NexusError> {
    T::deserialize(value).map_err(|e| NexusError::InvalidContent {
        kind,
        message: e.to_string(),
    })
}

/// A block as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: Uuid,
    pub page_id: Uuid,
    #[serde(rename = "type")]
    pub kind: BlockType,
    pub content: Value,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl Block {
    /// Decode the payload according to the block's type
    pub fn typed_content(&self) -> Result<BlockContent, NexusError> {
        BlockContent::from_value(self.kind, &self.content)
    }

    /// Replace the payload, rejecting content of another block type
    pub fn set_content(&mut self, content: &BlockContent) -> Result<(), NexusError> {
        if content.kind() != self.kind {
            return Err(NexusError::WrongBlockType {
                expected: self.kind,
                found: content.kind(),
            });
        }
        self.content = content.to_value();
        Ok(())
    }
}

/// Insert request for a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBlock {
    #[serde(rename = "type")]
    pub kind: BlockType,
    pub content: Value,
    pub position: i32,
}

impl NewBlock {
    pub fn new(content: &BlockContent, position: i32) -> Self {
        Self {
            kind: content.kind(),
            content: content.to_value(),
            position,
        }
    }

    /// A block of `kind` with its default payload
    pub fn with_default(kind: BlockType, position: i32) -> Self {
        Self::new(&BlockContent::default_for(kind), position)
    }
}
