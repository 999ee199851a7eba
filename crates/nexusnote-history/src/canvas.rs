use nexusnote_core::{CanvasContent, GridType};
use serde::{Deserialize, Serialize};

use crate::stack::{SnapshotHistory, DEFAULT_MAX_SNAPSHOTS};

/// A rasterized canvas image, stored as a PNG data URL.
///
/// The empty snapshot stands for a canvas with nothing drawn on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(String);

impl Snapshot {
    pub fn new(data_url: impl Into<String>) -> Self {
        Self(data_url.into())
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_data_url(&self) -> Option<&str> {
        if self.is_blank() {
            None
        } else {
            Some(&self.0)
        }
    }
}

/// Local drawing state of one canvas block
#[derive(Debug, Clone)]
pub struct CanvasState {
    width: u32,
    height: u32,
    grid_type: GridType,
    history: SnapshotHistory<Snapshot>,
}

impl CanvasState {
    /// Start from stored content; the loaded image becomes the base snapshot
    pub fn from_content(content: &CanvasContent) -> Self {
        Self::with_max_snapshots(content, DEFAULT_MAX_SNAPSHOTS)
    }

    pub fn with_max_snapshots(content: &CanvasContent, max_snapshots: usize) -> Self {
        let mut history = SnapshotHistory::new(max_snapshots);
        history.record(
            content
                .data_url
                .clone()
                .map(Snapshot::new)
                .unwrap_or_default(),
        );
        Self {
            width: content.width,
            height: content.height,
            grid_type: content.grid_type,
            history,
        }
    }

    /// Record the image after a completed stroke or shape
    pub fn commit_stroke(&mut self, snapshot: Snapshot) {
        self.history.record(snapshot);
    }

    /// Step back, returning the image to repaint
    pub fn undo(&mut self) -> Option<Snapshot> {
        self.history.undo().cloned()
    }

    /// Step forward, returning the image to repaint
    pub fn redo(&mut self) -> Option<Snapshot> {
        self.history.redo().cloned()
    }

    /// Wipe the drawing; recorded as a stroke so it can be undone
    pub fn clear(&mut self) {
        self.history.record(Snapshot::blank());
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.history.current()
    }

    pub fn grid_type(&self) -> GridType {
        self.grid_type
    }

    pub fn set_grid_type(&mut self, grid_type: GridType) {
        self.grid_type = grid_type;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn history(&self) -> &SnapshotHistory<Snapshot> {
        &self.history
    }

    /// Payload for saving: the snapshot at the cursor plus grid and size
    pub fn to_content(&self) -> CanvasContent {
        CanvasContent {
            data_url: self
                .current()
                .and_then(Snapshot::as_data_url)
                .map(str::to_string),
            grid_type: self.grid_type,
            width: self.width,
            height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_canvas_base_snapshot() {
        let state = CanvasState::from_content(&CanvasContent::default());
        assert_eq!(state.current(), Some(&Snapshot::blank()));
        assert!(!state.can_undo());
        assert_eq!(state.to_content(), CanvasContent::default());
    }

    #[test]
    fn test_loaded_image_is_base() {
        let content = CanvasContent {
            data_url: Some("data:image/png;base64,AAA".to_string()),
            grid_type: GridType::Squares,
            width: 1024,
            height: 768,
        };
        let mut state = CanvasState::from_content(&content);
        state.commit_stroke(Snapshot::new("data:image/png;base64,BBB"));

        assert_eq!(
            state.undo(),
            Some(Snapshot::new("data:image/png;base64,AAA"))
        );
        assert_eq!(state.to_content(), content);
        assert_eq!(state.size(), (1024, 768));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut state = CanvasState::from_content(&CanvasContent::default());
        state.commit_stroke(Snapshot::new("s1"));
        state.commit_stroke(Snapshot::new("s2"));
        let before = state.current().cloned();

        state.undo();
        let after = state.redo();

        assert_eq!(after, before);
    }

    #[test]
    fn test_stroke_after_undo_discards_future() {
        let mut state = CanvasState::from_content(&CanvasContent::default());
        state.commit_stroke(Snapshot::new("s1"));
        state.commit_stroke(Snapshot::new("s2"));
        state.undo();
        state.commit_stroke(Snapshot::new("s3"));

        assert!(!state.can_redo());
        assert_eq!(state.redo(), None);
        assert_eq!(state.undo(), Some(Snapshot::new("s1")));
    }

    #[test]
    fn test_clear_is_undoable() {
        let mut state = CanvasState::from_content(&CanvasContent::default());
        state.commit_stroke(Snapshot::new("s1"));
        state.clear();
        assert_eq!(state.to_content().data_url, None);
        assert_eq!(state.undo(), Some(Snapshot::new("s1")));
    }

    #[test]
    fn test_grid_type_saved() {
        let mut state = CanvasState::from_content(&CanvasContent::default());
        state.set_grid_type(GridType::Lines);
        assert_eq!(state.to_content().grid_type, GridType::Lines);
    }
}
