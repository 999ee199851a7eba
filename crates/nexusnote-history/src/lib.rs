pub mod canvas;
pub mod stack;

pub use canvas::{CanvasState, Snapshot};
pub use stack::SnapshotHistory;
