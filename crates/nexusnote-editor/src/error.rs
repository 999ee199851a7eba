use nexusnote_core::NexusError;
use thiserror::Error;

/// Failure talking to the backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No authenticated user")]
    NotAuthenticated,

    #[error("{failed} of {total} position updates failed")]
    PartialBatch { failed: usize, total: usize },

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Error returned by editor operations
#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] NexusError),
}

impl EditorError {
    /// Local validation failures, as opposed to remote-call failures
    pub fn is_validation(&self) -> bool {
        matches!(self, EditorError::Model(e) if e.is_validation())
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
