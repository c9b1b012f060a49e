//! Raster canvas editing engine: a white RGBA8 canvas, sixteen classic
//! paint tools, snapshot undo, and a small native document container with
//! import/export to the common raster formats.
//!
//! The crate is display-agnostic. [`editor::EditorSession`] consumes plain
//! pointer events and reports back through the [`editor::EditorHost`]
//! capability trait; rendering the preview and driving the airbrush timer
//! are the embedder's job.

pub mod logger;

pub mod canvas;
pub mod cli;
pub mod document;
pub mod editor;
pub mod history;
pub mod io;
pub mod ops;
pub mod tools;

pub use canvas::{PixelCanvas, PixelRect};
pub use document::Document;
pub use editor::{EditorHost, EditorSession, NullHost};
pub use history::HistoryManager;
pub use tools::{BrushTip, ShapeStyle, Tool, ToolState};
