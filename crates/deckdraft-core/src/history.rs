//! Linear undo/redo timeline of surface snapshots.

use crate::slides::Blob;
use std::collections::VecDeque;

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Bounded undo/redo timeline over opaque blobs.
///
/// There is one timeline for the whole editor. The coordinator clears it on
/// every slide switch, add and delete, so in practice it covers the edits made
/// to the active slide since it was last shown.
#[derive(Debug, Clone)]
pub struct History {
    /// Older states, most recent at the back.
    past: VecDeque<Blob>,
    /// The last committed or restored state.
    present: Blob,
    /// Undone states, next redo at the front.
    future: VecDeque<Blob>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create an empty history whose present is the empty scene.
    pub fn new() -> Self {
        Self::with_limit(MAX_UNDO_HISTORY)
    }

    /// Create an empty history keeping at most `limit` past states.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: Blob::empty_scene(),
            future: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Commit a new state. This is the only operation that discards redo states.
    pub fn save_state(&mut self, blob: Blob) {
        let previous = std::mem::replace(&mut self.present, blob);
        self.past.push_back(previous);
        self.future.clear();

        while self.past.len() > self.limit {
            self.past.pop_front();
        }
    }

    /// Step back one state.
    /// Returns the new present, or `None` if there was nothing to undo.
    pub fn undo(&mut self) -> Option<&Blob> {
        let restored = self.past.pop_back()?;
        let current = std::mem::replace(&mut self.present, restored);
        self.future.push_front(current);
        Some(&self.present)
    }

    /// Step forward one state.
    /// Returns the new present, or `None` if there was nothing to redo.
    pub fn redo(&mut self) -> Option<&Blob> {
        let restored = self.future.pop_front()?;
        let current = std::mem::replace(&mut self.present, restored);
        self.past.push_back(current);
        Some(&self.present)
    }

    /// Drop every undo and redo state, keeping the present.
    pub fn clear_history(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn present(&self) -> &Blob {
        &self.present
    }

    pub fn past(&self) -> &VecDeque<Blob> {
        &self.past
    }

    pub fn future(&self) -> &VecDeque<Blob> {
        &self.future
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(s: &str) -> Blob {
        Blob::from(s)
    }

    #[test]
    fn test_initial_state() {
        let history = History::new();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.present(), &Blob::empty_scene());
    }

    #[test]
    fn test_save_undo_redo_scenario() {
        let mut history = History::new();
        history.save_state(blob("A"));
        history.save_state(blob("B"));

        assert_eq!(history.undo(), Some(&blob("A")));
        assert_eq!(history.present(), &blob("A"));
        assert!(history.can_redo());

        assert_eq!(history.redo(), Some(&blob("B")));
        assert_eq!(history.present(), &blob("B"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_save_then_undo_round_trip() {
        let mut history = History::new();
        history.save_state(blob("P"));
        history.save_state(blob("Q"));
        history.undo();

        assert_eq!(history.present(), &blob("P"));
        assert_eq!(history.future().iter().collect::<Vec<_>>(), vec![&blob("Q")]);
    }

    #[test]
    fn test_past_is_bounded() {
        let mut history = History::new();
        for i in 0..200 {
            history.save_state(blob(&i.to_string()));
            assert!(history.past().len() <= MAX_UNDO_HISTORY);
        }
        assert_eq!(history.past().len(), MAX_UNDO_HISTORY);
        // Oldest states were dropped first.
        assert_eq!(history.past().front(), Some(&blob("149")));
    }

    #[test]
    fn test_undo_redo_on_empty_are_noops() {
        let mut history = History::new();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.present(), &Blob::empty_scene());
    }

    #[test]
    fn test_save_clears_future() {
        let mut history = History::new();
        history.save_state(blob("A"));
        history.save_state(blob("B"));
        history.undo();
        assert!(history.can_redo());

        history.save_state(blob("C"));
        assert!(!history.can_redo());
        assert_eq!(history.past().back(), Some(&blob("A")));
    }

    #[test]
    fn test_undo_does_not_discard() {
        let mut history = History::new();
        history.save_state(blob("A"));
        history.save_state(blob("B"));
        history.save_state(blob("C"));

        history.undo();
        history.undo();
        history.redo();
        history.undo();

        assert_eq!(history.present(), &blob("A"));
        assert_eq!(history.future().len(), 2);
        assert_eq!(history.past().len(), 1);
    }

    #[test]
    fn test_clear_keeps_present() {
        let mut history = History::new();
        history.save_state(blob("A"));
        history.save_state(blob("B"));
        history.undo();

        history.clear_history();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.present(), &blob("A"));
    }

    #[test]
    fn test_custom_limit() {
        let mut history = History::with_limit(3);
        for i in 0..10 {
            history.save_state(blob(&i.to_string()));
        }
        assert_eq!(history.past().len(), 3);
        assert_eq!(history.limit(), 3);
    }
}
