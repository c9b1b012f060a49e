use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::ops::stroke;
use crate::tools::{BrushTip, ShapeStyle};

/// Rounded-rectangle corner radius as a fraction of the shorter side.
pub const CORNER_RADIUS_RATIO: f32 = 0.25;

/// The two-corner drag shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragShape {
    Line,
    Rectangle,
    Ellipse,
    RoundedRect,
}

// ============================================================================
// CONSTRAINT
// ============================================================================

/// Apply the modifier-key constraint to a drag: both axes are projected to
/// `d = max(|dx|, |dy|)` with their original signs, turning rectangles into
/// squares, ellipses into circles and lines into 45°-stepped lines.
pub fn constrain_corner(start: (f32, f32), end: (f32, f32)) -> (f32, f32) {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let d = dx.abs().max(dy.abs());
    (start.0 + d * dx.signum(), start.1 + d * dy.signum())
}

// ============================================================================
// SDF PRIMITIVES — signed distance, negative = inside
// ============================================================================

/// SDF for a box centred at origin with half-extents (hx, hy).
#[inline]
fn sdf_box(px: f32, py: f32, hx: f32, hy: f32) -> f32 {
    let dx = px.abs() - hx;
    let dy = py.abs() - hy;
    let outside = (dx.max(0.0) * dx.max(0.0) + dy.max(0.0) * dy.max(0.0)).sqrt();
    let inside = dx.max(dy).min(0.0);
    outside + inside
}

/// SDF for a rounded box.
#[inline]
fn sdf_rounded_box(px: f32, py: f32, hx: f32, hy: f32, r: f32) -> f32 {
    let r = r.min(hx).min(hy);
    sdf_box(px, py, hx - r, hy - r) - r
}

/// SDF for an ellipse (approximation via normalised circle space).
#[inline]
fn sdf_ellipse(px: f32, py: f32, rx: f32, ry: f32) -> f32 {
    let nx = px / rx;
    let ny = py / ry;
    let len = (nx * nx + ny * ny).sqrt();
    if len < 1e-8 {
        return -rx.min(ry);
    }
    let scale = (rx * rx * ny * ny + ry * ry * nx * nx).sqrt() / (rx * ry * len);
    (len - 1.0) / scale
}

// ============================================================================
// DRAG SHAPE RASTERIZATION
// ============================================================================

/// Rasterize a two-corner drag shape into the working image under the active
/// shape style. Lines are stroke-only regardless of style.
pub fn rasterize_drag_shape(
    img: &mut RgbaImage,
    shape: DragShape,
    start: (f32, f32),
    end: (f32, f32),
    style: ShapeStyle,
    line_width: f32,
    foreground: Rgba<u8>,
    background: Rgba<u8>,
) {
    if let DragShape::Line = shape {
        stroke_polyline(img, &[start, end], line_width, foreground);
        return;
    }

    let cx = (start.0 + end.0) * 0.5;
    let cy = (start.1 + end.1) * 0.5;
    let hx = ((end.0 - start.0).abs() * 0.5).max(0.5);
    let hy = ((end.1 - start.1).abs() * 0.5).max(0.5);
    let corner_radius = CORNER_RADIUS_RATIO * (hx * 2.0).min(hy * 2.0);
    let outline_half = (line_width * 0.5).max(0.5);

    // Padded bounding rows that can contain the outline
    let pad = outline_half + 1.0;
    let canvas_w = img.width();
    let canvas_h = img.height();
    let x0 = ((cx - hx - pad).floor() as i32).max(0) as u32;
    let x1 = (((cx + hx + pad).ceil() as i32).max(0) as u32).min(canvas_w);
    let y0 = ((cy - hy - pad).floor() as i32).max(0) as u32;
    let y1 = (((cy + hy + pad).ceil() as i32).max(0) as u32).min(canvas_h);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let (fill_color, fill_on, stroke_on) = match style {
        ShapeStyle::Outline => (background, false, true),
        ShapeStyle::FilledOutline => (background, true, true),
        ShapeStyle::Filled => (foreground, true, false),
    };

    let row_bytes = canvas_w as usize * 4;
    img.as_mut()
        .par_chunks_mut(row_bytes)
        .enumerate()
        .filter(|(row, _)| *row >= y0 as usize && *row < y1 as usize)
        .for_each(|(row, row_buf)| {
            let py = row as f32 + 0.5 - cy;
            for x in x0..x1 {
                let px = x as f32 + 0.5 - cx;
                let d = match shape {
                    DragShape::Rectangle => sdf_box(px, py, hx, hy),
                    DragShape::Ellipse => sdf_ellipse(px, py, hx, hy),
                    DragShape::RoundedRect => sdf_rounded_box(px, py, hx, hy, corner_radius),
                    DragShape::Line => unreachable!("lines are stroked above"),
                };
                let idx = x as usize * 4;
                if stroke_on && d.abs() <= outline_half {
                    row_buf[idx..idx + 4].copy_from_slice(&foreground.0);
                } else if fill_on && d < 0.0 {
                    row_buf[idx..idx + 4].copy_from_slice(&fill_color.0);
                }
            }
        });
}

// ============================================================================
// POLYLINES & BÉZIER CURVES
// ============================================================================

/// Stroke an open polyline at the given width (round caps and joins).
pub fn stroke_polyline(img: &mut RgbaImage, points: &[(f32, f32)], width: f32, color: Rgba<u8>) {
    stroke::rasterize_stroke(img, points, width.max(1.0), color, BrushTip::Circle);
}

/// Flatten a quadratic Bézier (base line plus one control point) into a
/// polyline ready for stroking.
pub fn flatten_quadratic(
    p0: (f32, f32),
    c: (f32, f32),
    p1: (f32, f32),
    segments: usize,
) -> Vec<(f32, f32)> {
    let n = segments.max(2);
    (0..=n)
        .map(|i| {
            let t = i as f32 / n as f32;
            let u = 1.0 - t;
            (
                u * u * p0.0 + 2.0 * u * t * c.0 + t * t * p1.0,
                u * u * p0.1 + 2.0 * u * t * c.1 + t * t * p1.1,
            )
        })
        .collect()
}

/// Flatten a cubic Bézier through two control points.
pub fn flatten_cubic(
    p0: (f32, f32),
    c1: (f32, f32),
    c2: (f32, f32),
    p1: (f32, f32),
    segments: usize,
) -> Vec<(f32, f32)> {
    let n = segments.max(2);
    (0..=n)
        .map(|i| {
            let t = i as f32 / n as f32;
            let u = 1.0 - t;
            let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
            (
                a * p0.0 + b * c1.0 + c * c2.0 + d * p1.0,
                a * p0.1 + b * c1.1 + c * c2.1 + d * p1.1,
            )
        })
        .collect()
}

// ============================================================================
// POLYGONS
// ============================================================================

/// Even-odd point-in-polygon test against a closed vertex loop.
pub fn point_in_polygon(verts: &[(f32, f32)], px: f32, py: f32) -> bool {
    let n = verts.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = verts[i];
        let (xj, yj) = verts[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Rasterize a closed polygon under the active shape style: even-odd
/// scanline fill plus a stroked outline. The vertex loop is closed
/// implicitly (last vertex joins back to the first).
pub fn rasterize_polygon(
    img: &mut RgbaImage,
    verts: &[(f32, f32)],
    style: ShapeStyle,
    line_width: f32,
    foreground: Rgba<u8>,
    background: Rgba<u8>,
) {
    if verts.len() < 2 {
        return;
    }

    let (fill_color, fill_on, stroke_on) = match style {
        ShapeStyle::Outline => (background, false, true),
        ShapeStyle::FilledOutline => (background, true, true),
        ShapeStyle::Filled => (foreground, true, false),
    };

    if fill_on && verts.len() >= 3 {
        fill_polygon_scanline(img, verts, fill_color);
    }

    if stroke_on {
        let mut outline: Vec<(f32, f32)> = verts.to_vec();
        outline.push(verts[0]);
        stroke_polyline(img, &outline, line_width, foreground);
    } else if style == ShapeStyle::Filled {
        // A filled polygon still needs its boundary covered so thin shapes
        // are visible at all; stroke with the fill color at minimum width.
        let mut outline: Vec<(f32, f32)> = verts.to_vec();
        outline.push(verts[0]);
        stroke_polyline(img, &outline, 1.0, fill_color);
    }
}

/// Classic even-odd scanline fill over the polygon's bounding rows.
fn fill_polygon_scanline(img: &mut RgbaImage, verts: &[(f32, f32)], color: Rgba<u8>) {
    let canvas_w = img.width() as f32;
    let canvas_h = img.height() as i32;
    let min_y = verts.iter().map(|v| v.1).fold(f32::MAX, f32::min).floor() as i32;
    let max_y = verts.iter().map(|v| v.1).fold(f32::MIN, f32::max).ceil() as i32;
    let y0 = min_y.max(0);
    let y1 = max_y.min(canvas_h - 1);

    let n = verts.len();
    let mut crossings: Vec<f32> = Vec::with_capacity(8);
    for y in y0..=y1 {
        let sample_y = y as f32 + 0.5;
        crossings.clear();
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = verts[i];
            let (xj, yj) = verts[j];
            if (yi > sample_y) != (yj > sample_y) {
                crossings.push(xi + (sample_y - yi) / (yj - yi) * (xj - xi));
            }
            j = i;
        }
        crossings.sort_by(|a, b| a.total_cmp(b));
        for span in crossings.chunks_exact(2) {
            // Spans entirely off-canvas would otherwise saturate to column 0
            if span[1] < 0.0 || span[0] > canvas_w - 1.0 {
                continue;
            }
            let sx = span[0].max(0.0).round() as u32;
            let ex = span[1].min(canvas_w - 1.0).round() as u32;
            for x in sx..=ex.min(img.width() - 1) {
                img.put_pixel(x, y as u32, color);
            }
        }
    }
}
