use std::collections::VecDeque;

use image::RgbaImage;

use crate::canvas::PixelCanvas;

/// Default cap on stored history entries.
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Default cap on total snapshot bytes (512 MiB). Oldest entries are evicted
/// first when either cap is exceeded.
pub const MAX_HISTORY_BYTES: usize = 512 * 1024 * 1024;

// ============================================================================
// COMMANDS
// ============================================================================

/// A reversible canvas edit. Commands own everything they need to move the
/// canvas between its before and after states in either direction.
pub trait Command {
    /// Re-apply the edit (redo).
    fn apply(&self, canvas: &mut PixelCanvas);
    /// Reverse the edit (undo).
    fn revert(&self, canvas: &mut PixelCanvas);
    /// Human-readable action name ("Draw", "Fill", "Resize", ...).
    fn label(&self) -> &str;
    /// Approximate heap footprint, used for the byte cap.
    fn memory_size(&self) -> usize;
}

/// Whole-canvas snapshot pair. Dimensions may differ between the two states,
/// which is what makes resize undoable with the same machinery as drawing.
pub struct SnapshotCommand {
    label: String,
    before: RgbaImage,
    after: RgbaImage,
}

impl SnapshotCommand {
    pub fn new(label: impl Into<String>, before: RgbaImage, after: RgbaImage) -> Self {
        Self {
            label: label.into(),
            before,
            after,
        }
    }
}

impl Command for SnapshotCommand {
    fn apply(&self, canvas: &mut PixelCanvas) {
        *canvas = PixelCanvas::from_image(self.after.clone());
    }

    fn revert(&self, canvas: &mut PixelCanvas) {
        *canvas = PixelCanvas::from_image(self.before.clone());
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn memory_size(&self) -> usize {
        self.before.as_raw().len() + self.after.as_raw().len()
    }
}

// ============================================================================
// HISTORY MANAGER
// ============================================================================

/// Undo/redo stacks with entry-count and byte-size caps. Pushing a new edit
/// always clears the redo stack; there are no branches.
pub struct HistoryManager {
    undo_stack: VecDeque<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    max_entries: usize,
    max_bytes: usize,
    /// Cached sum of memory_size over the undo stack.
    undo_bytes: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::with_caps(MAX_HISTORY_ENTRIES, MAX_HISTORY_BYTES)
    }
}

impl HistoryManager {
    pub fn with_caps(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_entries: max_entries.max(1),
            max_bytes,
            undo_bytes: 0,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the edit undo would reverse next.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.back().map(|c| c.label())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.label())
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// Record an already-applied edit. Evicts oldest entries past the caps.
    pub fn push(&mut self, command: Box<dyn Command>) {
        self.redo_stack.clear();
        self.undo_bytes += command.memory_size();
        self.undo_stack.push_back(command);
        while self.undo_stack.len() > self.max_entries
            || (self.undo_bytes > self.max_bytes && self.undo_stack.len() > 1)
        {
            if let Some(evicted) = self.undo_stack.pop_front() {
                self.undo_bytes -= evicted.memory_size();
            }
        }
    }

    /// Undo the most recent edit. Returns its label, or `None` when the
    /// stack is empty.
    pub fn undo(&mut self, canvas: &mut PixelCanvas) -> Option<String> {
        let command = self.undo_stack.pop_back()?;
        command.revert(canvas);
        self.undo_bytes -= command.memory_size();
        let label = command.label().to_string();
        self.redo_stack.push(command);
        Some(label)
    }

    /// Redo the most recently undone edit.
    pub fn redo(&mut self, canvas: &mut PixelCanvas) -> Option<String> {
        let command = self.redo_stack.pop()?;
        command.apply(canvas);
        self.undo_bytes += command.memory_size();
        let label = command.label().to_string();
        self.undo_stack.push_back(command);
        Some(label)
    }

    /// Drop both stacks, e.g. after opening a different document.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.undo_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelRect;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn snapshot_edit(canvas: &mut PixelCanvas, label: &str) -> Box<dyn Command> {
        let before = canvas.image().clone();
        canvas.fill_rect(PixelRect::new(0, 0, 2, 2), RED);
        Box::new(SnapshotCommand::new(label, before, canvas.image().clone()))
    }

    #[test]
    fn undo_then_redo_round_trips() {
        let mut canvas = PixelCanvas::new(8, 8);
        let blank = canvas.clone();
        let mut history = HistoryManager::default();
        history.push(snapshot_edit(&mut canvas, "Draw"));
        let painted = canvas.clone();

        assert_eq!(history.undo(&mut canvas).as_deref(), Some("Draw"));
        assert!(canvas.same_pixels(&blank));
        assert_eq!(history.redo(&mut canvas).as_deref(), Some("Draw"));
        assert!(canvas.same_pixels(&painted));
    }

    #[test]
    fn push_clears_redo() {
        let mut canvas = PixelCanvas::new(8, 8);
        let mut history = HistoryManager::default();
        history.push(snapshot_edit(&mut canvas, "Draw"));
        history.undo(&mut canvas);
        assert!(history.can_redo());
        assert_eq!(history.redo_label(), Some("Draw"));
        history.push(snapshot_edit(&mut canvas, "Fill"));
        assert!(!history.can_redo());
        assert_eq!(history.redo_label(), None);
    }

    #[test]
    fn entry_cap_evicts_oldest() {
        let mut canvas = PixelCanvas::new(8, 8);
        let mut history = HistoryManager::with_caps(3, usize::MAX);
        for i in 0..5 {
            history.push(snapshot_edit(&mut canvas, &format!("Edit {i}")));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.undo_label(), Some("Edit 4"));
    }

    #[test]
    fn resize_snapshot_restores_old_dimensions() {
        let mut canvas = PixelCanvas::new(10, 10);
        let before = canvas.image().clone();
        let mut history = HistoryManager::default();
        canvas = canvas.resized(20, 15);
        history.push(Box::new(SnapshotCommand::new(
            "Resize",
            before,
            canvas.image().clone(),
        )));
        history.undo(&mut canvas);
        assert_eq!((canvas.width(), canvas.height()), (10, 10));
        history.redo(&mut canvas);
        assert_eq!((canvas.width(), canvas.height()), (20, 15));
    }

    #[test]
    fn empty_stacks_return_none() {
        let mut canvas = PixelCanvas::new(4, 4);
        let mut history = HistoryManager::default();
        assert!(history.undo(&mut canvas).is_none());
        assert!(history.redo(&mut canvas).is_none());
    }
}
