pub mod block;
pub mod block_list;
pub mod drag;
pub mod error;
pub mod media;
pub mod page;
pub mod tag;
pub mod task;
pub mod template;
pub mod workspace;

pub use block::{
    Block, BlockContent, BlockType, CanvasContent, CodeContent, ImageContent, NewBlock,
    PdfContent, TextContent,
};
pub use block_list::{BlockList, PositionChange};
pub use drag::{DragGesture, Point};
pub use error::NexusError;
pub use media::{file_extension, format_file_size, storage_path, MediaKind};
pub use page::{GridType, NewPage, Page, PageSummary, PageUpdate};
pub use tag::{PageTag, Tag};
pub use task::{Task, TaskListContent, TaskPriority, TaskStatus};
pub use template::{Template, TemplateBlock};
pub use workspace::{validate_color, NewWorkspace, Workspace, WorkspaceUpdate};
