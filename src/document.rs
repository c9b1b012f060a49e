use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::canvas::PixelCanvas;
use crate::history::{HistoryManager, SnapshotCommand};
use crate::io::{self, CodecError, SaveFormat};

/// An open document: the committed canvas, its undo history and file state.
pub struct Document {
    canvas: PixelCanvas,
    history: HistoryManager,
    /// Backing file, if the document has ever been saved or was opened.
    path: Option<PathBuf>,
    /// True when the canvas differs from what the backing file holds.
    dirty: bool,
}

impl Document {
    /// Fresh white document of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: PixelCanvas::new(width, height),
            history: HistoryManager::default(),
            path: None,
            dirty: false,
        }
    }

    /// Open a file into a new document. A decode failure returns the error
    /// without producing a document, so callers keep whatever they had.
    pub fn open(path: &Path) -> Result<Self, CodecError> {
        let canvas = io::load_canvas(path)?;
        crate::log_info!(
            "opened {} ({}x{})",
            path.display(),
            canvas.width(),
            canvas.height()
        );
        Ok(Self {
            canvas,
            history: HistoryManager::default(),
            path: Some(path.to_path_buf()),
            dirty: false,
        })
    }

    pub fn canvas(&self) -> &PixelCanvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut PixelCanvas {
        &mut self.canvas
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Commit an edit: replace the canvas with `after` and record a snapshot
    /// against the current content. A commit that changes nothing is dropped
    /// without touching the history or the dirty flag.
    pub fn commit(&mut self, label: &str, after: RgbaImage) {
        if self.canvas.image().as_raw() == after.as_raw() {
            return;
        }
        let before = self.canvas.image().clone();
        self.canvas = PixelCanvas::from_image(after);
        self.history.push(Box::new(SnapshotCommand::new(
            label,
            before,
            self.canvas.image().clone(),
        )));
        self.dirty = true;
        crate::log_info!("commit: {}", label);
    }

    /// Undo the latest edit; returns its label, `None` on an empty stack.
    pub fn undo(&mut self) -> Option<String> {
        let label = self.history.undo(&mut self.canvas)?;
        self.dirty = true;
        Some(label)
    }

    /// Redo the most recently undone edit.
    pub fn redo(&mut self) -> Option<String> {
        let label = self.history.redo(&mut self.canvas)?;
        self.dirty = true;
        Some(label)
    }

    /// Save to the document's backing file (native container).
    /// Fails with `Unsupported` when the document has never been saved.
    pub fn save(&mut self) -> Result<(), CodecError> {
        let Some(path) = self.path.clone() else {
            return Err(CodecError::Unsupported("document has no file path".into()));
        };
        self.save_as(&path)
    }

    /// Save to an explicit path, inferring the format from the extension.
    /// Native-container saves adopt the path and clear the dirty flag;
    /// exports to other formats leave both untouched. On failure nothing
    /// about the document changes.
    pub fn save_as(&mut self, path: &Path) -> Result<(), CodecError> {
        let format = SaveFormat::from_path(path).ok_or_else(|| {
            CodecError::Unsupported(format!("no known format for {}", path.display()))
        })?;
        io::export_image(self.canvas.image(), path, format)?;
        if format == SaveFormat::Document {
            self.path = Some(path.to_path_buf());
            self.dirty = false;
        }
        crate::log_info!("saved {} as {}", path.display(), format.label());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelRect;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn identical_commit_is_dropped() {
        let mut doc = Document::new(8, 8);
        let same = doc.canvas().image().clone();
        doc.commit("Draw", same);
        assert!(!doc.is_dirty());
        assert!(doc.undo().is_none());
    }

    #[test]
    fn commit_then_undo_restores_and_stays_dirty() {
        let mut doc = Document::new(8, 8);
        let mut after = doc.canvas().image().clone();
        after.put_pixel(1, 1, RED);
        doc.commit("Draw", after);
        assert!(doc.is_dirty());
        assert_eq!(doc.undo().as_deref(), Some("Draw"));
        assert_eq!(doc.canvas().pixel(1, 1), crate::canvas::BACKGROUND);
    }

    #[test]
    fn failed_export_leaves_dirty_flag() {
        let mut doc = Document::new(4, 4);
        let mut after = doc.canvas().image().clone();
        after.put_pixel(0, 0, RED);
        doc.commit("Draw", after);
        assert!(doc.is_dirty());
        // Unknown extension fails before any write happens
        assert!(doc.save_as(Path::new("/tmp/paintr-test.unknown")).is_err());
        assert!(doc.is_dirty());
    }

    #[test]
    fn resize_commit_is_undoable() {
        let mut doc = Document::new(10, 10);
        doc.canvas_mut().fill_rect(PixelRect::new(0, 0, 10, 10), RED);
        let resized = doc.canvas().resized(20, 5);
        doc.commit("Resize", resized.into_image());
        assert_eq!((doc.canvas().width(), doc.canvas().height()), (20, 5));
        doc.undo();
        assert_eq!((doc.canvas().width(), doc.canvas().height()), (10, 10));
    }
}
