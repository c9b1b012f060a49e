use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

use crate::canvas::{PixelCanvas, MAX_CANVAS_DIM};
use crate::tools::ToolState;

/// Native document extension.
pub const DOCUMENT_EXT: &str = "prd";

/// Fixed JPEG export quality.
pub const JPEG_QUALITY: u8 = 90;

/// Container header: two little-endian f64 values (logical width, height).
const HEADER_LEN: usize = 16;

// ============================================================================
// ERRORS
// ============================================================================

/// Error type for document and image file operations.
#[derive(Debug)]
pub enum CodecError {
    Io(std::io::Error),
    /// The file is structurally not a valid document.
    Corrupt(String),
    /// Bitmap encode/decode failure.
    Image(String),
    /// The path has no recognized format extension.
    Unsupported(String),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Io(e) => write!(f, "I/O error: {}", e),
            CodecError::Corrupt(e) => write!(f, "Corrupt document: {}", e),
            CodecError::Image(e) => write!(f, "Image codec error: {}", e),
            CodecError::Unsupported(e) => write!(f, "Unsupported format: {}", e),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<std::io::Error> for CodecError {
    fn from(e: std::io::Error) -> Self {
        CodecError::Io(e)
    }
}

impl From<image::ImageError> for CodecError {
    fn from(e: image::ImageError) -> Self {
        CodecError::Image(e.to_string())
    }
}

impl From<png::EncodingError> for CodecError {
    fn from(e: png::EncodingError) -> Self {
        CodecError::Image(e.to_string())
    }
}

impl From<png::DecodingError> for CodecError {
    fn from(e: png::DecodingError) -> Self {
        CodecError::Corrupt(e.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for CodecError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        CodecError::Corrupt(e.to_string())
    }
}

// ============================================================================
// NATIVE DOCUMENT CONTAINER
// ============================================================================

/// Encode a canvas into the native container: 8-byte LE f64 width, 8-byte
/// LE f64 height, then a PNG stream of the pixels.
pub fn encode_document(image: &RgbaImage) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(HEADER_LEN + image.as_raw().len() / 4);
    out.extend_from_slice(&(image.width() as f64).to_le_bytes());
    out.extend_from_slice(&(image.height() as f64).to_le_bytes());

    let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())?;
    writer.finish()?;
    Ok(out)
}

/// Decode the native container. Anything of 16 bytes or fewer cannot hold a
/// header plus payload and is rejected as corrupt.
///
/// The decoded bitmap's dimensions are authoritative; a header that
/// disagrees is logged and ignored, so documents written with a stale
/// logical size still open at their true pixel size.
pub fn decode_document(bytes: &[u8]) -> Result<RgbaImage, CodecError> {
    if bytes.len() <= HEADER_LEN {
        return Err(CodecError::Corrupt(format!(
            "file too small ({} bytes)",
            bytes.len()
        )));
    }

    let header_w = f64::from_le_bytes(bytes[0..8].try_into().unwrap());
    let header_h = f64::from_le_bytes(bytes[8..16].try_into().unwrap());
    if !header_w.is_finite() || !header_h.is_finite() || header_w < 1.0 || header_h < 1.0 {
        return Err(CodecError::Corrupt(format!(
            "invalid logical size {}x{}",
            header_w, header_h
        )));
    }

    let image = decode_png_rgba(&bytes[HEADER_LEN..])?;
    if image.width() > MAX_CANVAS_DIM || image.height() > MAX_CANVAS_DIM {
        return Err(CodecError::Corrupt(format!(
            "bitmap {}x{} exceeds the {} px limit",
            image.width(),
            image.height(),
            MAX_CANVAS_DIM
        )));
    }
    if image.width() != header_w as u32 || image.height() != header_h as u32 {
        crate::log_warn!(
            "document header says {}x{} but bitmap is {}x{}; using bitmap size",
            header_w,
            header_h,
            image.width(),
            image.height()
        );
    }
    Ok(image)
}

/// Decode a PNG stream to RGBA8, expanding palette/grayscale inputs.
fn decode_png_rgba(bytes: &[u8]) -> Result<RgbaImage, CodecError> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    buf.truncate(info.buffer_size());

    let (width, height) = (info.width, info.height);
    let pixels = match info.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => {
            let mut rgba = Vec::with_capacity(buf.len() / 3 * 4);
            for px in buf.chunks_exact(3) {
                rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
            rgba
        }
        png::ColorType::GrayscaleAlpha => {
            let mut rgba = Vec::with_capacity(buf.len() * 2);
            for px in buf.chunks_exact(2) {
                rgba.extend_from_slice(&[px[0], px[0], px[0], px[1]]);
            }
            rgba
        }
        png::ColorType::Grayscale => {
            let mut rgba = Vec::with_capacity(buf.len() * 4);
            for &g in &buf {
                rgba.extend_from_slice(&[g, g, g, 255]);
            }
            rgba
        }
        other => {
            return Err(CodecError::Corrupt(format!(
                "unexpected PNG color type {:?}",
                other
            )))
        }
    };
    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| CodecError::Corrupt("PNG payload size mismatch".into()))
}

pub fn save_document(path: &Path, image: &RgbaImage) -> Result<(), CodecError> {
    let bytes = encode_document(image)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

pub fn load_document(path: &Path) -> Result<RgbaImage, CodecError> {
    let bytes = std::fs::read(path)?;
    decode_document(&bytes)
}

// ============================================================================
// IMPORT
// ============================================================================

/// Load any supported file into a canvas. Native documents go through the
/// container decoder; everything else through the standard raster decoders,
/// normalized to RGBA8.
pub fn load_canvas(path: &Path) -> Result<PixelCanvas, CodecError> {
    let ext = extension_of(path);
    let image = if ext == DOCUMENT_EXT {
        load_document(path)?
    } else {
        image::open(path)?.to_rgba8()
    };
    if image.width() > MAX_CANVAS_DIM || image.height() > MAX_CANVAS_DIM {
        return Err(CodecError::Image(format!(
            "image {}x{} exceeds the {} px limit",
            image.width(),
            image.height(),
            MAX_CANVAS_DIM
        )));
    }
    Ok(PixelCanvas::from_image(image))
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

// ============================================================================
// EXPORT
// ============================================================================

/// Output formats for saving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Document,
    Png,
    Jpeg,
    Bmp,
    Tiff,
    Gif,
    Pdf,
}

impl SaveFormat {
    pub fn from_path(path: &Path) -> Option<SaveFormat> {
        match extension_of(path).as_str() {
            "prd" => Some(SaveFormat::Document),
            "png" => Some(SaveFormat::Png),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            "bmp" => Some(SaveFormat::Bmp),
            "tiff" | "tif" => Some(SaveFormat::Tiff),
            "gif" => Some(SaveFormat::Gif),
            "pdf" => Some(SaveFormat::Pdf),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Document => DOCUMENT_EXT,
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tiff => "tiff",
            SaveFormat::Gif => "gif",
            SaveFormat::Pdf => "pdf",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SaveFormat::Document => "Document",
            SaveFormat::Png => "PNG",
            SaveFormat::Jpeg => "JPEG",
            SaveFormat::Bmp => "BMP",
            SaveFormat::Tiff => "TIFF",
            SaveFormat::Gif => "GIF",
            SaveFormat::Pdf => "PDF",
        }
    }
}

/// Encode and write a canvas to disk in the given format.
pub fn export_image(image: &RgbaImage, path: &Path, format: SaveFormat) -> Result<(), CodecError> {
    match format {
        SaveFormat::Document => save_document(path, image),
        SaveFormat::Png => {
            let bytes = encode_png(image)?;
            std::fs::write(path, bytes)?;
            Ok(())
        }
        SaveFormat::Jpeg => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            encoder.encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ColorType::Rgb8,
            )?;
            Ok(())
        }
        SaveFormat::Bmp => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
            Ok(())
        }
        SaveFormat::Tiff => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            let err_map = |e: tiff::TiffError| CodecError::Image(format!("TIFF encode: {}", e));
            let mut enc = tiff::encoder::TiffEncoder::new(&mut writer).map_err(err_map)?;
            enc.write_image_with_compression::<tiff::encoder::colortype::RGBA8, _>(
                image.width(),
                image.height(),
                tiff::encoder::compression::Deflate::default(),
                image.as_raw(),
            )
            .map_err(err_map)?;
            Ok(())
        }
        SaveFormat::Gif => encode_static_gif(image, path),
        SaveFormat::Pdf => {
            let bytes = encode_pdf(image)?;
            std::fs::write(path, bytes)?;
            Ok(())
        }
    }
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())?;
    writer.finish()?;
    Ok(out)
}

// ============================================================================
// GIF
// ============================================================================

/// Single-frame GIF: quantize to 256 colors, write one frame.
fn encode_static_gif(image: &RgbaImage, path: &Path) -> Result<(), CodecError> {
    if image.width() > u16::MAX as u32 || image.height() > u16::MAX as u32 {
        return Err(CodecError::Image(
            "image dimensions exceed GIF maximum (65535x65535)".into(),
        ));
    }
    let (w, h) = (image.width() as u16, image.height() as u16);
    let file = File::create(path)?;

    let (palette, indexed) = quantize_rgba(image, 256);

    let mut encoder = gif::Encoder::new(BufWriter::new(file), w, h, &palette)
        .map_err(|e| CodecError::Image(format!("GIF encoder init: {}", e)))?;
    let frame = gif::Frame {
        width: w,
        height: h,
        buffer: std::borrow::Cow::Borrowed(&indexed),
        ..Default::default()
    };
    encoder
        .write_frame(&frame)
        .map_err(|e| CodecError::Image(format!("GIF write: {}", e)))?;
    Ok(())
}

/// Reduce an RGBA image to an indexed palette.
/// Returns (RGB palette bytes, per-pixel indices).
fn quantize_rgba(image: &RgbaImage, max_colors: usize) -> (Vec<u8>, Vec<u8>) {
    let pixels: Vec<u8> = image
        .pixels()
        .flat_map(|p| [p[0], p[1], p[2], p[3]])
        .collect();

    let nq = color_quant::NeuQuant::new(10, max_colors, &pixels);

    let mut palette = Vec::with_capacity(max_colors * 3);
    for i in 0..max_colors {
        if let Some(color) = nq.lookup(i) {
            palette.extend_from_slice(&color[..3]);
        } else {
            palette.extend_from_slice(&[0, 0, 0]);
        }
    }

    let indices = image
        .pixels()
        .map(|p| nq.index_of(&[p[0], p[1], p[2], p[3]]) as u8)
        .collect();

    (palette, indices)
}

// ============================================================================
// PDF
// ============================================================================

/// Minimal single-page PDF: a canvas-sized media box with the artwork as one
/// JPEG-compressed image XObject drawn at full size.
fn encode_pdf(image: &RgbaImage) -> Result<Vec<u8>, CodecError> {
    let w = image.width();
    let h = image.height();

    // DCTDecode payload
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    encoder.encode(rgb.as_raw(), w, h, image::ColorType::Rgb8)?;

    let content = format!("q\n{} 0 0 {} 0 0 cm\n/Im0 Do\nQ\n", w, h);

    let mut out: Vec<u8> = Vec::with_capacity(jpeg.len() + 1024);
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = [0usize; 5];
    let mut begin_obj = |out: &mut Vec<u8>, offsets: &mut [usize; 5], n: usize| {
        offsets[n - 1] = out.len();
        out.extend_from_slice(format!("{} 0 obj\n", n).as_bytes());
    };

    begin_obj(&mut out, &mut offsets, 1);
    out.extend_from_slice(b"<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    begin_obj(&mut out, &mut offsets, 2);
    out.extend_from_slice(b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");

    begin_obj(&mut out, &mut offsets, 3);
    out.extend_from_slice(
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Contents 4 0 R /Resources << /XObject << /Im0 5 0 R >> >> >>\nendobj\n",
            w, h
        )
        .as_bytes(),
    );

    begin_obj(&mut out, &mut offsets, 4);
    out.extend_from_slice(format!("<< /Length {} >>\nstream\n", content.len()).as_bytes());
    out.extend_from_slice(content.as_bytes());
    out.extend_from_slice(b"endstream\nendobj\n");

    begin_obj(&mut out, &mut offsets, 5);
    out.extend_from_slice(
        format!(
            "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
             /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode \
             /Length {} >>\nstream\n",
            w,
            h,
            jpeg.len()
        )
        .as_bytes(),
    );
    out.extend_from_slice(&jpeg);
    out.extend_from_slice(b"\nendstream\nendobj\n");

    let xref_offset = out.len();
    out.extend_from_slice(b"xref\n0 6\n0000000000 65535 f \n");
    for off in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size 6 /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            xref_offset
        )
        .as_bytes(),
    );
    Ok(out)
}

// ============================================================================
// TOOL STATE PERSISTENCE
// ============================================================================

/// Default location for the persisted tool settings.
///
/// `%APPDATA%\paintr\tools.bin`          (Windows)
/// `~/.local/share/paintr/tools.bin`     (Linux)
/// `~/Library/Application Support/paintr/tools.bin` (macOS)
pub fn tool_state_path() -> Option<PathBuf> {
    let base = if cfg!(target_os = "windows") {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    } else if cfg!(target_os = "macos") {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library").join("Application Support"))
    } else {
        std::env::var("XDG_DATA_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".local").join("share"))
            })
    };
    base.map(|b| b.join("paintr").join("tools.bin"))
}

pub fn save_tool_state(path: &Path, state: &ToolState) -> Result<(), CodecError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    bincode::serialize_into(BufWriter::new(file), state)?;
    Ok(())
}

pub fn load_tool_state(path: &Path) -> Result<ToolState, CodecError> {
    let file = File::open(path)?;
    Ok(bincode::deserialize_from(BufReader::new(file))?)
}

/// Load the tool state persisted by the previous session, falling back to
/// defaults when the file is missing or unreadable.
pub fn restore_tool_state() -> ToolState {
    tool_state_path()
        .and_then(|p| load_tool_state(&p).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn container_round_trips_pixels() {
        let mut img = RgbaImage::from_pixel(13, 7, Rgba([255, 255, 255, 255]));
        img.put_pixel(3, 4, Rgba([10, 200, 30, 255]));
        let bytes = encode_document(&img).unwrap();
        let back = decode_document(&bytes).unwrap();
        assert_eq!(back.dimensions(), (13, 7));
        assert_eq!(back.get_pixel(3, 4), &Rgba([10, 200, 30, 255]));
    }

    #[test]
    fn tiny_file_is_corrupt() {
        let err = decode_document(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, CodecError::Corrupt(_)));
        // Exactly header-sized is still too small to hold a payload
        let err = decode_document(&[0u8; 16]).unwrap_err();
        assert!(matches!(err, CodecError::Corrupt(_)));
    }

    #[test]
    fn bitmap_size_wins_over_header() {
        let img = RgbaImage::from_pixel(12, 9, Rgba([0, 0, 0, 255]));
        let mut bytes = encode_document(&img).unwrap();
        // Forge a wrong logical size
        bytes[0..8].copy_from_slice(&400.0f64.to_le_bytes());
        let back = decode_document(&bytes).unwrap();
        assert_eq!(back.dimensions(), (12, 9));
    }

    #[test]
    fn garbage_payload_is_corrupt() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&8.0f64.to_le_bytes());
        bytes.extend_from_slice(&8.0f64.to_le_bytes());
        bytes.extend_from_slice(&[0xAB; 64]);
        assert!(matches!(
            decode_document(&bytes),
            Err(CodecError::Corrupt(_))
        ));
    }

    #[test]
    fn format_detection_by_extension() {
        assert_eq!(
            SaveFormat::from_path(Path::new("a/b/pic.PNG")),
            Some(SaveFormat::Png)
        );
        assert_eq!(
            SaveFormat::from_path(Path::new("doc.prd")),
            Some(SaveFormat::Document)
        );
        assert_eq!(SaveFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn quantize_produces_full_palette_and_indices() {
        let img = RgbaImage::from_fn(16, 16, |x, y| {
            Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255])
        });
        let (palette, indices) = quantize_rgba(&img, 256);
        assert_eq!(palette.len(), 256 * 3);
        assert_eq!(indices.len(), 16 * 16);
    }

    #[test]
    fn tool_state_persists_round_trip() {
        let dir = std::env::temp_dir().join("paintr-io-tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tools.bin");

        let mut state = ToolState::default();
        state.foreground = [1, 2, 3, 255];
        state.brush_size = 9.5;
        save_tool_state(&path, &state).unwrap();
        let back = load_tool_state(&path).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn pdf_has_header_and_embedded_jpeg() {
        let img = RgbaImage::from_pixel(20, 10, Rgba([255, 0, 0, 255]));
        let bytes = encode_pdf(&img).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.windows(2).any(|w| w == [0xFF, 0xD8])); // JPEG SOI
        assert!(bytes.ends_with(b"%%EOF\n"));
    }
}
