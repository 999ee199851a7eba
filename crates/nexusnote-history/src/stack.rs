/// Default number of snapshots kept per history
pub const DEFAULT_MAX_SNAPSHOTS: usize = 50;

/// Linear undo/redo history of full state snapshots.
///
/// `cursor` indexes the snapshot currently shown. Snapshots after the cursor
/// are the redo future and are discarded by the next [`SnapshotHistory::record`].
#[derive(Clone)]
pub struct SnapshotHistory<T> {
    snapshots: Vec<T>,
    /// Index of the current snapshot, `None` while empty
    cursor: Option<usize>,
    /// Maximum number of snapshots retained
    max_size: usize,
}

impl<T> Default for SnapshotHistory<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SNAPSHOTS)
    }
}

impl<T> SnapshotHistory<T> {
    /// Create a history that keeps at most `max_size` snapshots
    pub fn new(max_size: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: None,
            max_size: max_size.max(1),
        }
    }

    /// Record a new snapshot after the current one, dropping the redo future
    pub fn record(&mut self, snapshot: T) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.snapshots.truncate(keep);
        self.snapshots.push(snapshot);

        // Limit history size
        let overflow = self.snapshots.len().saturating_sub(self.max_size);
        if overflow > 0 {
            self.snapshots.drain(..overflow);
        }

        self.cursor = Some(self.snapshots.len() - 1);
    }

    /// Step back; returns the snapshot to repaint
    pub fn undo(&mut self) -> Option<&T> {
        let cursor = self.cursor.filter(|&c| c > 0)?;
        self.cursor = Some(cursor - 1);
        self.snapshots.get(cursor - 1)
    }

    /// Step forward; returns the snapshot to repaint
    pub fn redo(&mut self) -> Option<&T> {
        let next = self.cursor? + 1;
        if next >= self.snapshots.len() {
            return None;
        }
        self.cursor = Some(next);
        self.snapshots.get(next)
    }

    /// The snapshot at the cursor
    pub fn current(&self) -> Option<&T> {
        self.cursor.and_then(|c| self.snapshots.get(c))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The first snapshot is the base image and cannot be undone
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor
            .is_some_and(|c| c + 1 < self.snapshots.len())
    }

    pub fn undo_count(&self) -> usize {
        self.cursor.unwrap_or(0)
    }

    pub fn redo_count(&self) -> usize {
        self.cursor
            .map_or(0, |c| self.snapshots.len() - c - 1)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
    }
}

impl<T> std::fmt::Debug for SnapshotHistory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotHistory")
            .field("len", &self.snapshots.len())
            .field("cursor", &self.cursor)
            .field("max_size", &self.max_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(items: &[&'static str]) -> SnapshotHistory<&'static str> {
        let mut history = SnapshotHistory::new(100);
        for item in items {
            history.record(*item);
        }
        history
    }

    #[test]
    fn test_undo_redo() {
        let mut history = history_of(&["blank", "stroke1", "stroke2"]);

        assert_eq!(history.current(), Some(&"stroke2"));
        assert!(history.can_undo());
        assert!(!history.can_redo());

        // Undo
        assert_eq!(history.undo(), Some(&"stroke1"));
        assert!(history.can_redo());

        // Redo restores the exact snapshot
        assert_eq!(history.redo(), Some(&"stroke2"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_base_snapshot_cannot_be_undone() {
        let mut history = history_of(&["blank"]);
        assert!(!history.can_undo());
        assert_eq!(history.undo(), None);
        assert_eq!(history.current(), Some(&"blank"));

        let mut empty: SnapshotHistory<&str> = SnapshotHistory::default();
        assert_eq!(empty.undo(), None);
        assert_eq!(empty.redo(), None);
        assert_eq!(empty.current(), None);
    }

    #[test]
    fn test_record_after_undo_truncates_future() {
        let mut history = history_of(&["blank", "a", "b", "c"]);
        history.undo();
        history.undo();
        assert_eq!(history.redo_count(), 2);

        history.record("d");

        assert_eq!(history.len(), 3);
        assert!(!history.can_redo());
        assert_eq!(history.current(), Some(&"d"));
        assert_eq!(history.undo(), Some(&"a"));
        assert_eq!(history.undo(), Some(&"blank"));
    }

    #[test]
    fn test_max_size() {
        let mut history = SnapshotHistory::new(3);
        for i in 0..5 {
            history.record(i);
        }

        // Should only keep the 3 newest
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), Some(&4));
        assert_eq!(history.undo(), Some(&3));
        assert_eq!(history.undo(), Some(&2));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn test_counts_and_clear() {
        let mut history = history_of(&["blank", "a", "b"]);
        history.undo();
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 1);

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.cursor(), None);
        assert_eq!(history.undo_count(), 0);
        assert_eq!(history.redo_count(), 0);
    }
}
