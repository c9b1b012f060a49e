use image::{Rgba, RgbaImage};

/// Committed artwork is always opaque white until painted on.
pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Maximum supported canvas dimension in pixels (per axis).
/// Prevents memory exhaustion from crafted files and bogus resize requests.
pub const MAX_CANVAS_DIM: u32 = 8192;

// ============================================================================
// PIXEL RECT
// ============================================================================

/// Integer pixel rectangle in canvas coordinates. May extend outside the
/// canvas; operations clamp before touching pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Rect spanning two arbitrary corner points (inclusive of both).
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        let min_x = a.0.min(b.0).floor() as i32;
        let min_y = a.1.min(b.1).floor() as i32;
        let max_x = a.0.max(b.0).ceil() as i32;
        let max_y = a.1.max(b.1).ceil() as i32;
        Self {
            x: min_x,
            y: min_y,
            w: (max_x - min_x).max(1) as u32,
            h: (max_y - min_y).max(1) as u32,
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x as f32
            && py >= self.y as f32
            && px < (self.x + self.w as i32) as f32
            && py < (self.y + self.h as i32) as f32
    }

    /// Intersection with a `canvas_w × canvas_h` canvas, as clamped
    /// `(x0, y0, x1, y1)` bounds. `None` when fully outside.
    pub fn clamped(&self, canvas_w: u32, canvas_h: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.max(0) as u32;
        let y0 = self.y.max(0) as u32;
        let x1 = ((self.x + self.w as i32).max(0) as u32).min(canvas_w);
        let y1 = ((self.y + self.h as i32).max(0) as u32).min(canvas_h);
        if x0 >= x1 || y0 >= y1 {
            None
        } else {
            Some((x0, y0, x1, y1))
        }
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

// ============================================================================
// PIXEL CANVAS
// ============================================================================

/// The single source of truth for committed artwork: an owned flat RGBA8
/// buffer plus its logical size. The buffer byte length is `w * h * 4` at all
/// times; any resize produces a new buffer, never a resized view in place.
/// Previews never mutate it — tool commits replace the whole buffer.
#[derive(Clone)]
pub struct PixelCanvas {
    pixels: RgbaImage,
}

impl PixelCanvas {
    /// New canvas filled with the background white default.
    /// Dimensions are clamped to `1..=MAX_CANVAS_DIM` per axis.
    pub fn new(width: u32, height: u32) -> Self {
        let w = width.clamp(1, MAX_CANVAS_DIM);
        let h = height.clamp(1, MAX_CANVAS_DIM);
        Self {
            pixels: RgbaImage::from_pixel(w, h, BACKGROUND),
        }
    }

    /// Wrap an already-decoded RGBA image.
    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Adopt a decoded bitmap at exactly `(width, height)`: content is placed
    /// top-left anchored, white-padded (or cropped) where the decoded image
    /// differs in size.
    pub fn from_image_sized(decoded: &RgbaImage, width: u32, height: u32) -> Self {
        if decoded.width() == width && decoded.height() == height {
            return Self {
                pixels: decoded.clone(),
            };
        }
        let mut canvas = Self::new(width, height);
        let copy_w = decoded.width().min(canvas.width());
        let copy_h = decoded.height().min(canvas.height());
        for y in 0..copy_h {
            for x in 0..copy_w {
                canvas.pixels.put_pixel(x, y, *decoded.get_pixel(x, y));
            }
        }
        canvas
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        self.pixels.put_pixel(x, y, color);
    }

    /// Byte-for-byte comparison of committed content.
    pub fn same_pixels(&self, other: &PixelCanvas) -> bool {
        self.pixels.as_raw() == other.pixels.as_raw()
    }

    /// New canvas sized `(new_w, new_h)`, white-filled, with the overlapping
    /// top-left-anchored region copied from `self`. Areas the old image did
    /// not cover stay white.
    pub fn resized(&self, new_w: u32, new_h: u32) -> Self {
        let mut out = Self::new(new_w, new_h);
        let copy_w = self.width().min(out.width());
        let copy_h = self.height().min(out.height());
        let src_stride = self.width() as usize * 4;
        let dst_stride = out.width() as usize * 4;
        let row_bytes = copy_w as usize * 4;
        let src = self.pixels.as_raw();
        let dst = out.pixels.as_mut();
        for y in 0..copy_h as usize {
            let s = y * src_stride;
            let d = y * dst_stride;
            dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
        }
        out
    }

    /// Extract a sub-region as a standalone RGBA image. Pixels copied 1:1;
    /// parts of `rect` outside the canvas come out fully transparent.
    pub fn region(&self, rect: PixelRect) -> RgbaImage {
        let mut out = RgbaImage::new(rect.w.max(1), rect.h.max(1));
        if let Some((x0, y0, x1, y1)) = rect.clamped(self.width(), self.height()) {
            for y in y0..y1 {
                for x in x0..x1 {
                    let ox = (x as i32 - rect.x) as u32;
                    let oy = (y as i32 - rect.y) as u32;
                    out.put_pixel(ox, oy, *self.pixels.get_pixel(x, y));
                }
            }
        }
        out
    }

    /// Fill a rectangle with a solid color, clamped to the canvas.
    pub fn fill_rect(&mut self, rect: PixelRect, color: Rgba<u8>) {
        if let Some((x0, y0, x1, y1)) = rect.clamped(self.width(), self.height()) {
            for y in y0..y1 {
                for x in x0..x1 {
                    self.pixels.put_pixel(x, y, color);
                }
            }
        }
    }

    /// Composite an RGBA patch onto the canvas at `(off_x, off_y)` with
    /// standard source-over alpha blending.
    pub fn blit_over(&mut self, patch: &RgbaImage, off_x: i32, off_y: i32) {
        let cw = self.width() as i32;
        let ch = self.height() as i32;
        for (px, py, &src) in patch.enumerate_pixels() {
            let x = off_x + px as i32;
            let y = off_y + py as i32;
            if x < 0 || y < 0 || x >= cw || y >= ch {
                continue;
            }
            let sa = src.0[3] as u32;
            if sa == 0 {
                continue;
            }
            let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
            if sa == 255 {
                *dst = src;
                continue;
            }
            let da = dst.0[3] as u32;
            let out_a = sa + da * (255 - sa) / 255;
            if out_a == 0 {
                *dst = Rgba([0, 0, 0, 0]);
                continue;
            }
            for c in 0..3 {
                let s = src.0[c] as u32;
                let d = dst.0[c] as u32;
                dst.0[c] = ((s * sa + d * da * (255 - sa) / 255) / out_a) as u8;
            }
            dst.0[3] = out_a as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_length_matches_dimensions() {
        let c = PixelCanvas::new(37, 21);
        assert_eq!(c.image().as_raw().len(), 37 * 21 * 4);
    }

    #[test]
    fn new_canvas_is_white() {
        let c = PixelCanvas::new(4, 4);
        assert!(c.image().pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn region_outside_canvas_is_transparent() {
        let c = PixelCanvas::new(10, 10);
        let r = c.region(PixelRect::new(8, 8, 4, 4));
        assert_eq!(r.get_pixel(0, 0), &BACKGROUND);
        assert_eq!(r.get_pixel(3, 3), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn adopting_a_smaller_bitmap_pads_with_white() {
        let mut decoded = RgbaImage::new(2, 2);
        decoded.put_pixel(0, 0, Rgba([1, 2, 3, 255]));
        let c = PixelCanvas::from_image_sized(&decoded, 4, 4);
        assert_eq!((c.width(), c.height()), (4, 4));
        assert_eq!(c.pixel(0, 0), Rgba([1, 2, 3, 255]));
        assert_eq!(c.pixel(3, 3), BACKGROUND);
    }

    #[test]
    fn blit_over_opaque_replaces() {
        let mut c = PixelCanvas::new(4, 4);
        let mut patch = RgbaImage::new(2, 2);
        patch.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
        c.blit_over(&patch, 1, 1);
        assert_eq!(c.pixel(1, 1), Rgba([10, 20, 30, 255]));
        // Transparent patch pixels leave the destination alone
        assert_eq!(c.pixel(2, 2), BACKGROUND);
    }
}
