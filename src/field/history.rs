//! Change records and the field history resource for undo/redo.

use bevy::prelude::*;

use crate::constants::MAX_HISTORY_SIZE;

/// A completed edit session's effect on one field, replayable in both
/// directions.
///
/// The revision pair ties the field's text change to the project-level tile
/// mutations made in the same session, so both are undone together.
#[derive(Debug, Clone, PartialEq)]
pub struct TilemapChange {
    pub field: Entity,
    pub old_text: String,
    pub new_text: String,
    pub old_revision: u64,
    pub new_revision: u64,
}

impl TilemapChange {
    /// True when replaying this change would do nothing: neither the
    /// project revision nor the field text moved.
    pub fn is_inert(&self) -> bool {
        self.old_revision == self.new_revision && self.old_text == self.new_text
    }
}

/// Resource tracking tilemap changes for undo/redo
#[derive(Resource, Default)]
pub struct FieldHistory {
    /// Stack of changes that can be undone (most recent last)
    undo_stack: Vec<TilemapChange>,
    /// Stack of changes that can be redone (most recent last)
    redo_stack: Vec<TilemapChange>,
}

impl FieldHistory {
    /// Record a new change. Inert changes are suppressed.
    pub fn push(&mut self, change: TilemapChange) {
        if change.is_inert() {
            return;
        }

        // Clear redo stack when a new change is recorded
        self.redo_stack.clear();

        self.undo_stack.push(change);

        // Trim history if it exceeds max size
        while self.undo_stack.len() > MAX_HISTORY_SIZE {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the last change for undo
    pub fn pop_undo(&mut self) -> Option<TilemapChange> {
        self.undo_stack.pop()
    }

    /// Pop the last change for redo
    pub fn pop_redo(&mut self) -> Option<TilemapChange> {
        self.redo_stack.pop()
    }

    /// Push a change to the redo stack (used after undo)
    pub fn push_redo(&mut self, change: TilemapChange) {
        self.redo_stack.push(change);
    }

    /// Push a change to the undo stack (used after redo)
    pub fn push_undo(&mut self, change: TilemapChange) {
        self.undo_stack.push(change);
    }

    /// Check if there are changes to undo
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if there are changes to redo
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the count of undoable changes
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the count of redoable changes
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(old: &str, new: &str, old_rev: u64, new_rev: u64) -> TilemapChange {
        TilemapChange {
            field: Entity::PLACEHOLDER,
            old_text: old.to_string(),
            new_text: new.to_string(),
            old_revision: old_rev,
            new_revision: new_rev,
        }
    }

    #[test]
    fn test_push_records_change() {
        let mut history = FieldHistory::default();
        assert!(!history.can_undo());

        history.push(change("a", "b", 0, 1));
        assert!(history.can_undo());
        assert_eq!(history.undo_count(), 1);
    }

    #[test]
    fn test_inert_change_is_suppressed() {
        let mut history = FieldHistory::default();
        history.push(change("a", "a", 3, 3));
        assert!(!history.can_undo());

        // same text but revision moved: not inert
        history.push(change("a", "a", 3, 4));
        assert!(history.can_undo());
    }

    #[test]
    fn test_new_change_clears_redo() {
        let mut history = FieldHistory::default();
        history.push(change("a", "b", 0, 1));

        let undone = history.pop_undo().unwrap();
        history.push_redo(undone);
        assert!(history.can_redo());

        history.push(change("b", "c", 1, 2));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_history_max_size() {
        let mut history = FieldHistory::default();
        for i in 0..150 {
            history.push(change("a", "b", i, i + 1));
        }
        assert_eq!(history.undo_count(), MAX_HISTORY_SIZE);
    }
}
