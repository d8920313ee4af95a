use crate::draw::composite::RgbaBuffer;

/// Linear undo/redo over full overlay snapshots.
///
/// `entries[index]` always equals the live overlay after `commit`, `undo` or
/// `redo` returns. Every snapshot is a full-resolution copy, so memory grows
/// with the number of edits times the frame size.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawHistory {
    entries: Vec<RgbaBuffer>,
    index: usize,
}

impl DrawHistory {
    pub fn new(initial: &RgbaBuffer) -> Self {
        Self {
            entries: vec![initial.clone()],
            index: 0,
        }
    }

    /// Drops every entry after the current one, then records `overlay` as the
    /// newest state.
    pub fn commit(&mut self, overlay: &RgbaBuffer) {
        self.entries.truncate(self.index + 1);
        self.entries.push(overlay.clone());
        self.index = self.entries.len() - 1;
        tracing::debug!(index = self.index, len = self.entries.len(), "history commit");
    }

    /// Overwrites the current entry without touching the rest of history.
    /// Used when the overlay changes shape but not content, e.g. a window
    /// resize.
    pub fn replace_current(&mut self, overlay: &RgbaBuffer) {
        if let Some(entry) = self.entries.get_mut(self.index) {
            entry.clone_from(overlay);
        }
    }

    /// Steps back one entry and returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<&RgbaBuffer> {
        if self.index == 0 {
            tracing::debug!("nothing to undo");
            return None;
        }
        self.index -= 1;
        tracing::debug!(index = self.index, "history undo");
        self.entries.get(self.index)
    }

    /// Steps forward one entry and returns the snapshot to restore.
    pub fn redo(&mut self) -> Option<&RgbaBuffer> {
        if self.index + 1 >= self.entries.len() {
            tracing::debug!("nothing to redo");
            return None;
        }
        self.index += 1;
        tracing::debug!(index = self.index, "history redo");
        self.entries.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn current(&self) -> &RgbaBuffer {
        &self.entries[self.index]
    }

    pub fn memory_bytes(&self) -> usize {
        self.entries.iter().map(RgbaBuffer::memory_bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::model::Color;

    fn state(marker: u8) -> RgbaBuffer {
        let mut buffer = RgbaBuffer::transparent(2, 2);
        buffer.put_pixel(0, 0, Color::rgba(marker, 0, 0, 255));
        buffer
    }

    #[test]
    fn starts_with_single_initial_entry() {
        let history = DrawHistory::new(&RgbaBuffer::transparent(2, 2));
        assert_eq!(history.len(), 1);
        assert_eq!(history.index(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn new_commit_truncates_redo_branch() {
        let mut history = DrawHistory::new(&state(0));
        history.commit(&state(1));
        history.commit(&state(2));
        assert_eq!(history.undo(), Some(&state(1)));
        assert!(history.can_redo());

        history.commit(&state(3));
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);
        assert_eq!(history.redo(), None);
        assert_eq!(history.current(), &state(3));
    }

    #[test]
    fn undo_redo_walk_snapshots_in_order() {
        let mut history = DrawHistory::new(&state(0));
        history.commit(&state(1));
        history.commit(&state(2));

        assert_eq!(history.undo(), Some(&state(1)));
        assert_eq!(history.undo(), Some(&state(0)));
        assert_eq!(history.undo(), None);
        assert_eq!(history.index(), 0);

        assert_eq!(history.redo(), Some(&state(1)));
        assert_eq!(history.redo(), Some(&state(2)));
        assert_eq!(history.redo(), None);
        assert_eq!(history.index(), 2);
    }

    #[test]
    fn replace_current_keeps_neighbours_and_index() {
        let mut history = DrawHistory::new(&state(0));
        history.commit(&state(1));
        history.commit(&state(2));
        let _ = history.undo();

        history.replace_current(&state(9));
        assert_eq!(history.index(), 1);
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), &state(9));
        assert_eq!(history.redo(), Some(&state(2)));
        assert_eq!(history.undo(), Some(&state(9)));
    }

    #[test]
    fn memory_accounts_for_every_snapshot() {
        let mut history = DrawHistory::new(&state(0));
        history.commit(&state(1));
        assert_eq!(history.memory_bytes(), 2 * 2 * 2 * 4);
    }
}
