use image::{Rgba, RgbaImage};

use crate::canvas::{PixelCanvas, PixelRect, BACKGROUND};
use crate::ops::shapes::point_in_polygon;

/// A floating selection: captured pixels detached from the canvas, movable
/// as a rigid unit until committed back down.
///
/// Capture alone never alters the canvas. The source region is cleared to
/// background white lazily on the first move, so a selection that is drawn
/// and then dismissed leaves the artwork untouched.
#[derive(Clone)]
pub struct Selection {
    /// Current location of the floating content.
    rect: PixelRect,
    /// Captured pixels; transparent outside a free-form mask.
    content: RgbaImage,
    /// Where the content was lifted from.
    source_rect: PixelRect,
    /// Free-form capture keeps its mask so only masked source pixels clear.
    mask: Option<Vec<bool>>,
    moved: bool,
}

impl Selection {
    /// Lift a rectangular region off the canvas. Returns `None` when the
    /// rect does not intersect the canvas at all.
    pub fn capture_rect(canvas: &PixelCanvas, rect: PixelRect) -> Option<Self> {
        rect.clamped(canvas.width(), canvas.height())?;
        let content = canvas.region(rect);
        Some(Self {
            rect,
            content,
            source_rect: rect,
            mask: None,
            moved: false,
        })
    }

    /// Lift a free-form region bounded by a closed lasso path. The captured
    /// patch covers the path's bounding box; pixels outside the even-odd
    /// interior come out transparent and never move with the selection.
    pub fn capture_free(canvas: &PixelCanvas, path: &[(f32, f32)]) -> Option<Self> {
        if path.len() < 3 {
            return None;
        }
        let min_x = path.iter().map(|p| p.0).fold(f32::MAX, f32::min);
        let min_y = path.iter().map(|p| p.1).fold(f32::MAX, f32::min);
        let max_x = path.iter().map(|p| p.0).fold(f32::MIN, f32::max);
        let max_y = path.iter().map(|p| p.1).fold(f32::MIN, f32::max);
        let rect = PixelRect::from_corners((min_x, min_y), (max_x, max_y));
        rect.clamped(canvas.width(), canvas.height())?;

        let mut content = canvas.region(rect);
        let mut mask = vec![false; (rect.w * rect.h) as usize];
        for (px, py, pixel) in content.enumerate_pixels_mut() {
            let cx = rect.x as f32 + px as f32 + 0.5;
            let cy = rect.y as f32 + py as f32 + 0.5;
            if point_in_polygon(path, cx, cy) {
                mask[(py * rect.w + px) as usize] = true;
            } else {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        }
        if !mask.iter().any(|&m| m) {
            return None;
        }
        Some(Self {
            rect,
            content,
            source_rect: rect,
            mask: Some(mask),
            moved: false,
        })
    }

    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    pub fn content(&self) -> &RgbaImage {
        &self.content
    }

    pub fn has_moved(&self) -> bool {
        self.moved
    }

    /// Translate the floating content by a pixel delta. On the first move
    /// the source region is cleared to background white in the working
    /// image; later moves only relocate the content.
    pub fn translate(&mut self, dx: i32, dy: i32, working: &mut RgbaImage) {
        if dx == 0 && dy == 0 {
            return;
        }
        if !self.moved {
            self.clear_source(working);
            self.moved = true;
        }
        self.rect = self.rect.translated(dx, dy);
    }

    /// Paint the source region white. Rect captures clear the whole rect;
    /// free-form captures clear only the masked interior.
    fn clear_source(&self, working: &mut RgbaImage) {
        let Some((x0, y0, x1, y1)) =
            self.source_rect.clamped(working.width(), working.height())
        else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let keep = match &self.mask {
                    Some(mask) => {
                        let lx = (x as i32 - self.source_rect.x) as u32;
                        let ly = (y as i32 - self.source_rect.y) as u32;
                        !mask[(ly * self.source_rect.w + lx) as usize]
                    }
                    None => false,
                };
                if !keep {
                    working.put_pixel(x, y, BACKGROUND);
                }
            }
        }
    }

    /// Composite the floating content into an image at its current position
    /// with source-over blending. Used both for previews and for the final
    /// commit; transparent mask pixels leave the destination alone.
    pub fn composite(&self, target: &mut PixelCanvas) {
        target.blit_over(&self.content, self.rect.x, self.rect.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn canvas_with_red_block() -> PixelCanvas {
        let mut c = PixelCanvas::new(20, 20);
        c.fill_rect(PixelRect::new(2, 2, 4, 4), RED);
        c
    }

    #[test]
    fn capture_alone_leaves_canvas_untouched() {
        let c = canvas_with_red_block();
        let before = c.clone();
        let sel = Selection::capture_rect(&c, PixelRect::new(2, 2, 4, 4)).unwrap();
        assert!(c.same_pixels(&before));
        assert_eq!(sel.content().get_pixel(0, 0), &RED);
    }

    #[test]
    fn first_move_clears_source_to_white() {
        let c = canvas_with_red_block();
        let mut working = c.image().clone();
        let mut sel = Selection::capture_rect(&c, PixelRect::new(2, 2, 4, 4)).unwrap();
        sel.translate(5, 0, &mut working);
        assert_eq!(working.get_pixel(2, 2), &BACKGROUND);
        assert_eq!(sel.rect().x, 7);
        // Second move does not re-clear at the new position
        sel.translate(1, 0, &mut working);
        assert_eq!(working.get_pixel(7, 2), &BACKGROUND);
        assert_eq!(sel.rect().x, 8);
    }

    #[test]
    fn move_then_commit_relocates_pixels() {
        let c = canvas_with_red_block();
        let mut working = c.image().clone();
        let mut sel = Selection::capture_rect(&c, PixelRect::new(2, 2, 4, 4)).unwrap();
        sel.translate(10, 10, &mut working);
        let mut out = PixelCanvas::from_image(working);
        sel.composite(&mut out);
        assert_eq!(out.pixel(2, 2), BACKGROUND);
        assert_eq!(out.pixel(12, 12), RED);
    }

    #[test]
    fn free_form_capture_masks_outside_path() {
        let c = canvas_with_red_block();
        // Triangle over the top-left of the red block
        let path = [(1.0, 1.0), (8.0, 1.0), (1.0, 8.0)];
        let sel = Selection::capture_free(&c, &path).unwrap();
        // Inside the triangle and inside the red block
        let inside = sel.content().get_pixel(2, 2);
        assert_eq!(inside, &RED);
        // Bounding-box corner outside the triangle is transparent
        let corner = sel.content().get_pixel(sel.content().width() - 1, sel.content().height() - 1);
        assert_eq!(corner.0[3], 0);
    }

    #[test]
    fn free_form_clear_spares_unmasked_pixels() {
        let mut c = PixelCanvas::new(10, 10);
        c.fill_rect(PixelRect::new(0, 0, 10, 10), RED);
        let path = [(0.0, 0.0), (6.0, 0.0), (0.0, 6.0)];
        let mut sel = Selection::capture_free(&c, &path).unwrap();
        let mut working = c.image().clone();
        sel.translate(3, 3, &mut working);
        // Masked interior cleared, opposite corner of the bbox untouched
        assert_eq!(working.get_pixel(1, 1), &BACKGROUND);
        assert_eq!(working.get_pixel(5, 5), &RED);
    }

    #[test]
    fn degenerate_lasso_yields_no_selection() {
        let c = canvas_with_red_block();
        assert!(Selection::capture_free(&c, &[(1.0, 1.0), (2.0, 2.0)]).is_none());
    }
}
