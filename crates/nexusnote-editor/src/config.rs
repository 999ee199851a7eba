use std::time::Duration;

use nexusnote_core::drag::DEFAULT_ACTIVATION_DISTANCE;

/// Editor timing and sizing knobs
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Quiet period before a text or code draft is saved
    pub draft_debounce: Duration,
    /// Interval between canvas autosaves
    pub canvas_autosave: Duration,
    /// Pointer travel in pixels before a press starts a drag
    pub drag_activation_distance: f64,
    /// Snapshots kept per canvas for undo
    pub canvas_history: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            draft_debounce: Duration::from_secs(1),
            canvas_autosave: Duration::from_secs(5),
            drag_activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            canvas_history: 50,
        }
    }
}

impl EditorConfig {
    pub fn with_draft_debounce(mut self, delay: Duration) -> Self {
        self.draft_debounce = delay;
        self
    }

    pub fn with_canvas_autosave(mut self, period: Duration) -> Self {
        self.canvas_autosave = period;
        self
    }
}
