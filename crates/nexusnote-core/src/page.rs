use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::NexusError;
use crate::workspace::validate_color;

/// Background drawn behind a page or canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridType {
    #[default]
    None,
    Dots,
    Squares,
    Lines,
}

impl GridType {
    pub const ALL: [GridType; 4] = [
        GridType::None,
        GridType::Dots,
        GridType::Squares,
        GridType::Lines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GridType::None => "none",
            GridType::Dots => "dots",
            GridType::Squares => "squares",
            GridType::Lines => "lines",
        }
    }

    /// Spacing in pixels between grid marks, if the grid draws anything
    pub fn spacing(&self) -> Option<u32> {
        match self {
            GridType::None => None,
            GridType::Dots | GridType::Squares => Some(20),
            GridType::Lines => Some(30),
        }
    }
}

impl fmt::Display for GridType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GridType {
    type Err = NexusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GridType::ALL
            .into_iter()
            .find(|grid| grid.as_str() == s)
            .ok_or_else(|| NexusError::UnknownGridType(s.to_string()))
    }
}

/// A titled page inside a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub title: String,
    pub grid_type: GridType,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A page listed together with the number of blocks it holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    #[serde(flatten)]
    pub page: Page,
    pub block_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPage {
    pub title: String,
    #[serde(default)]
    pub grid_type: GridType,
    #[serde(default)]
    pub color: Option<String>,
}

impl NewPage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_grid(mut self, grid_type: GridType) -> Self {
        self.grid_type = grid_type;
        self
    }

    /// Trim the title and check required fields
    pub fn validate(mut self) -> Result<Self, NexusError> {
        self.title = validate_title(&self.title)?;
        if let Some(color) = &self.color {
            validate_color(color)?;
        }
        Ok(self)
    }
}

/// Partial page update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_type: Option<GridType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl PageUpdate {
    pub fn validate(mut self) -> Result<Self, NexusError> {
        if let Some(title) = &self.title {
            self.title = Some(validate_title(title)?);
        }
        if let Some(color) = &self.color {
            validate_color(color)?;
        }
        Ok(self)
    }

    pub fn apply(&self, page: &mut Page) {
        if let Some(title) = &self.title {
            page.title = title.clone();
        }
        if let Some(grid_type) = self.grid_type {
            page.grid_type = grid_type;
        }
        if let Some(color) = &self.color {
            page.color = Some(color.clone());
        }
    }
}

fn validate_title(title: &str) -> Result<String, NexusError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(NexusError::Required { field: "title" });
    }
    Ok(trimmed.to_string())
}
