//! Pixel-level drawing operations. Every function here works on plain RGBA
//! buffers; committing results into the document goes through the history
//! layer, never directly from these modules.

pub mod fill;
pub mod selection;
pub mod shapes;
pub mod stroke;
pub mod text;
