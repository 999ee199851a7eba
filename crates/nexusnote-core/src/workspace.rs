use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::error::NexusError;

pub const DEFAULT_ICON: &str = "📚";
pub const DEFAULT_COLOR: &str = "#2d7a8e";

/// Top-level container owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the workspace is soft deleted
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Workspace {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkspace {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl NewWorkspace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            icon: default_icon(),
            color: default_color(),
        }
    }

    pub fn validate(mut self) -> Result<Self, NexusError> {
        self.name = validate_name(&self.name)?;
        validate_color(&self.color)?;
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Ok(self)
    }
}

/// Partial workspace update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl WorkspaceUpdate {
    pub fn validate(mut self) -> Result<Self, NexusError> {
        if let Some(name) = &self.name {
            self.name = Some(validate_name(name)?);
        }
        if let Some(color) = &self.color {
            validate_color(color)?;
        }
        Ok(self)
    }
}

fn validate_name(name: &str) -> Result<String, NexusError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NexusError::Required { field: "name" });
    }
    Ok(trimmed.to_string())
}

/// Accept `#rrggbb` hex colors only
pub fn validate_color(color: &str) -> Result<(), NexusError> {
    static HEX_COLOR: OnceLock<Regex> = OnceLock::new();
    let re = HEX_COLOR.get_or_init(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid regex"));
    if re.is_match(color) {
        Ok(())
    } else {
        Err(NexusError::InvalidColor(color.to_string()))
    }
}
