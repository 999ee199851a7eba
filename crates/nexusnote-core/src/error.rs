use thiserror::Error;
use uuid::Uuid;

use crate::block::BlockType;

/// Errors raised by local (client-side) operations on the note model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NexusError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("Invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),

    #[error("Unknown block type '{0}'")]
    UnknownBlockType(String),

    #[error("Unknown grid type '{0}'")]
    UnknownGridType(String),

    #[error("Block {0} not found")]
    BlockNotFound(Uuid),

    #[error("Task {0} not found")]
    TaskNotFound(String),

    #[error("Index {index} out of range for {len} blocks")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid content for {kind} block: {message}")]
    InvalidContent { kind: BlockType, message: String },

    #[error("Expected a {expected} block, found {found}")]
    WrongBlockType { expected: BlockType, found: BlockType },

    #[error("{operation} is not supported on {kind} blocks")]
    UnsupportedOperation {
        kind: BlockType,
        operation: &'static str,
    },

    #[error("Unsupported file type '{mime}', expected {expected}")]
    UnsupportedFileType { mime: String, expected: &'static str },

    #[error("File is {size} bytes, limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },
}

impl NexusError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            NexusError::Required { .. } => "REQUIRED",
            NexusError::InvalidColor(_) => "INVALID_COLOR",
            NexusError::UnknownBlockType(_) => "UNKNOWN_BLOCK_TYPE",
            NexusError::UnknownGridType(_) => "UNKNOWN_GRID_TYPE",
            NexusError::BlockNotFound(_) => "BLOCK_NOT_FOUND",
            NexusError::TaskNotFound(_) => "TASK_NOT_FOUND",
            NexusError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            NexusError::InvalidContent { .. } => "INVALID_CONTENT",
            NexusError::WrongBlockType { .. } => "WRONG_BLOCK_TYPE",
            NexusError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            NexusError::UnsupportedFileType { .. } => "UNSUPPORTED_FILE_TYPE",
            NexusError::FileTooLarge { .. } => "FILE_TOO_LARGE",
        }
    }

    /// Whether the error comes from validating user input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            NexusError::Required { .. }
                | NexusError::InvalidColor(_)
                | NexusError::UnsupportedFileType { .. }
                | NexusError::FileTooLarge { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_messages() {
        let err = NexusError::Required { field: "title" };
        assert_eq!(err.code(), "REQUIRED");
        assert_eq!(err.to_string(), "title is required");
        assert!(err.is_validation());

        let err = NexusError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(err.code(), "INDEX_OUT_OF_RANGE");
        assert!(!err.is_validation());
    }
}
