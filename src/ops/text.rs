use ab_glyph::{point, Font, FontArc, GlyphId, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::tools::TextStyle;

/// Rasterized text ready to composite: an RGBA patch plus its canvas offset.
pub struct TextPatch {
    pub image: RgbaImage,
    pub off_x: i32,
    pub off_y: i32,
}

/// Lay out one line of text left-aligned at x = 0, returning positioned
/// glyphs (`(id, x, baseline_y)`) and the total advance width.
fn layout_line(font: &FontArc, text: &str, size: f32, baseline_y: f32) -> (Vec<(GlyphId, f32, f32)>, f32) {
    let scaled = font.as_scaled(size);
    let mut glyphs = Vec::with_capacity(text.len());
    let mut cursor_x = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(p) = prev {
            cursor_x += scaled.kern(p, id);
        }
        glyphs.push((id, cursor_x, baseline_y));
        cursor_x += scaled.h_advance(id);
        prev = Some(id);
    }
    (glyphs, cursor_x)
}

/// Rasterize multiline text at `origin` (top-left of the first line) into an
/// RGBA patch. Bold thickens by double-stamping one pixel right; italic
/// shears around each line's baseline; underline draws a bar per line.
///
/// Returns `None` when the text produces no visible pixels.
pub fn rasterize_text(
    font: &FontArc,
    text: &str,
    style: &TextStyle,
    origin: (f32, f32),
    color: Rgba<u8>,
) -> Option<TextPatch> {
    let size = style.size.max(1.0);
    let scaled = font.as_scaled(size);
    let ascent = scaled.ascent();
    let line_height = scaled.height() + scaled.line_gap();

    let mut all_glyphs: Vec<(GlyphId, f32, f32)> = Vec::new();
    let mut line_widths: Vec<f32> = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        let baseline = ascent + i as f32 * line_height;
        let (glyphs, width) = layout_line(font, line, size, baseline);
        all_glyphs.extend(glyphs);
        line_widths.push(width);
    }

    // Patch bounds from glyph boxes plus decoration extents
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for &(id, gx, gy) in &all_glyphs {
        let glyph = id.with_scale_and_position(size, point(gx, gy));
        let b = font.glyph_bounds(&glyph);
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }
    if style.underline {
        for (i, &w) in line_widths.iter().enumerate() {
            if w <= 0.0 {
                continue;
            }
            let baseline = ascent + i as f32 * line_height;
            min_x = min_x.min(0.0);
            max_x = max_x.max(w);
            min_y = min_y.min(baseline);
            max_y = max_y.max(baseline + size * 0.15);
        }
    }
    if min_x >= max_x || min_y >= max_y {
        return None;
    }

    let pad = 2.0 + if style.italic { size * 0.2 } else { 0.0 };
    min_x -= pad;
    min_y -= 2.0;
    max_x += pad;
    max_y += 2.0;

    let buf_w = (max_x - min_x).ceil() as usize;
    let buf_h = (max_y - min_y).ceil() as usize;
    let mut coverage = vec![0.0f32; buf_w * buf_h];

    let mut splat = |x: i32, y: i32, cov: f32, coverage: &mut [f32]| {
        if x >= 0 && y >= 0 && (x as usize) < buf_w && (y as usize) < buf_h {
            let idx = y as usize * buf_w + x as usize;
            coverage[idx] = coverage[idx].max(cov);
        }
    };

    for &(id, gx, gy) in &all_glyphs {
        let glyph = id.with_scale_and_position(size, point(gx, gy));
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let b = outlined.px_bounds();
        outlined.draw(|px, py, cov| {
            let mut cx = b.min.x + px as f32;
            let cy = b.min.y + py as f32;
            if style.italic {
                cx += (gy - cy) * 0.2;
            }
            let ix = (cx - min_x).round() as i32;
            let iy = (cy - min_y).round() as i32;
            splat(ix, iy, cov, &mut coverage);
            if style.bold {
                splat(ix + 1, iy, cov, &mut coverage);
            }
        });
    }

    if style.underline {
        let thickness = (size * 0.06).max(1.0);
        for (i, &w) in line_widths.iter().enumerate() {
            if w <= 0.0 {
                continue;
            }
            let baseline = ascent + i as f32 * line_height;
            let y0 = ((baseline + size * 0.08 - min_y).floor() as i32).max(0);
            let y1 = (y0 + thickness.ceil() as i32).min(buf_h as i32);
            let x0 = ((0.0 - min_x).floor() as i32).max(0);
            let x1 = ((w - min_x).ceil() as i32).min(buf_w as i32);
            for y in y0..y1 {
                for x in x0..x1 {
                    coverage[y as usize * buf_w + x as usize] = 1.0;
                }
            }
        }
    }

    let mut image = RgbaImage::new(buf_w as u32, buf_h as u32);
    for (i, &cov) in coverage.iter().enumerate() {
        if cov > 0.001 {
            let a = (color.0[3] as f32 * cov).round().min(255.0) as u8;
            let x = (i % buf_w) as u32;
            let y = (i / buf_w) as u32;
            image.put_pixel(x, y, Rgba([color.0[0], color.0[1], color.0[2], a]));
        }
    }

    Some(TextPatch {
        image,
        off_x: (origin.0 + min_x).floor() as i32,
        off_y: (origin.1 + min_y).floor() as i32,
    })
}

/// Candidate font file patterns per platform, checked in order.
#[cfg(target_os = "linux")]
const FONT_PATTERNS: &[&str] = &[
    "/usr/share/fonts/**/LiberationSans-Regular.ttf",
    "/usr/share/fonts/**/DejaVuSans.ttf",
    "/usr/share/fonts/**/*.ttf",
];
#[cfg(target_os = "macos")]
const FONT_PATTERNS: &[&str] = &[
    "/System/Library/Fonts/Helvetica.ttc",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/**/*.ttf",
];
#[cfg(target_os = "windows")]
const FONT_PATTERNS: &[&str] = &[
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\*.ttf",
];
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const FONT_PATTERNS: &[&str] = &[];

/// Load a usable default font from well-known system locations.
pub fn load_default_font() -> Option<FontArc> {
    for pattern in FONT_PATTERNS {
        let Ok(paths) = glob::glob(pattern) else {
            continue;
        };
        for path in paths.flatten() {
            if let Some(font) = load_font_file(&path) {
                return Some(font);
            }
        }
    }
    None
}

/// Load a font from an explicit file path.
pub fn load_font_file(path: &std::path::Path) -> Option<FontArc> {
    let bytes = std::fs::read(path).ok()?;
    FontArc::try_from_vec(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_font() -> Option<FontArc> {
        load_default_font()
    }

    #[test]
    fn empty_text_yields_no_patch() {
        let Some(font) = test_font() else {
            return;
        };
        let style = TextStyle::default();
        assert!(rasterize_text(&font, "", &style, (0.0, 0.0), Rgba([0, 0, 0, 255])).is_none());
    }

    #[test]
    fn plain_text_produces_opaque_pixels() {
        let Some(font) = test_font() else {
            return;
        };
        let style = TextStyle::default();
        let patch = rasterize_text(&font, "Hi", &style, (10.0, 10.0), Rgba([0, 0, 0, 255]))
            .expect("glyphs rendered");
        assert!(patch.image.pixels().any(|p| p.0[3] > 200));
    }

    #[test]
    fn underline_extends_the_patch() {
        let Some(font) = test_font() else {
            return;
        };
        let plain = TextStyle::default();
        let underlined = TextStyle {
            underline: true,
            ..TextStyle::default()
        };
        let a = rasterize_text(&font, "abc", &plain, (0.0, 0.0), Rgba([0, 0, 0, 255])).unwrap();
        let b = rasterize_text(&font, "abc", &underlined, (0.0, 0.0), Rgba([0, 0, 0, 255])).unwrap();
        assert!(b.image.height() >= a.image.height());
    }
}
