//! Page editing session for NexusNote.
//!
//! [`PageEditor`] owns the in-memory block list of one page and keeps it in
//! sync with a [`Backend`]. Per-block editors hang off it:
//! - [`BlockDraft`] for debounced text and code edits
//! - [`TaskBlockEditor`] for task lists
//! - [`CanvasBlockEditor`] for drawing history and autosave
//! - [`MediaBlockEditor`] for image and PDF uploads

pub mod canvas;
pub mod config;
pub mod debounce;
pub mod draft;
pub mod editor;
pub mod error;
pub mod http;
pub mod media;
pub mod memory;
pub mod notify;
pub mod store;
pub mod tasks;

pub use canvas::CanvasBlockEditor;
pub use config::EditorConfig;
pub use debounce::Debouncer;
pub use draft::BlockDraft;
pub use editor::PageEditor;
pub use error::{EditorError, Result, StoreError};
pub use http::HttpBackend;
pub use media::MediaBlockEditor;
pub use memory::MemoryBackend;
pub use notify::{Notice, NoticeLevel, Notifier};
pub use store::{Backend, BlockStore, FileStore, PageStore, SessionStore, StoredFile};
pub use tasks::TaskBlockEditor;
