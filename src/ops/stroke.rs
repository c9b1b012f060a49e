use image::{Rgba, RgbaImage};

use crate::tools::BrushTip;

/// Fixed interpolation step between recorded pointer positions. Fast drags
/// deliver sparse events; stepping at this distance keeps strokes continuous.
pub const PATH_STEP: f32 = 2.0;

/// Airbrush tick interval in milliseconds.
pub const AIRBRUSH_INTERVAL_MS: u64 = 40;

// ============================================================================
// STROKE PATH
// ============================================================================

/// Ordered pointer path accumulated while a button is held. Transient —
/// cleared after every commit or cancel, never persisted.
#[derive(Clone, Debug, Default)]
pub struct StrokePath {
    points: Vec<(f32, f32)>,
}

impl StrokePath {
    /// Start a new path at the pointer-down position.
    pub fn begin(&mut self, p: (f32, f32)) {
        self.points.clear();
        self.points.push(p);
    }

    /// Record a drag position, inserting intermediate points every
    /// [`PATH_STEP`] pixels between the last recorded point and `p`.
    pub fn extend_to(&mut self, p: (f32, f32)) {
        let Some(&(lx, ly)) = self.points.last() else {
            self.points.push(p);
            return;
        };
        let dx = p.0 - lx;
        let dy = p.1 - ly;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > PATH_STEP {
            let steps = (dist / PATH_STEP).floor() as usize;
            for i in 1..=steps {
                let t = i as f32 * PATH_STEP / dist;
                self.points.push((lx + dx * t, ly + dy * t));
            }
        }
        self.points.push(p);
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

// ============================================================================
// STAMP RASTERIZATION
// ============================================================================

/// Stamp a single brush tip centered at `(cx, cy)`.
pub fn stamp(img: &mut RgbaImage, cx: f32, cy: f32, diameter: f32, color: Rgba<u8>, tip: BrushTip) {
    let radius = (diameter * 0.5).max(0.5);
    let w = img.width();
    let h = img.height();
    let min_x = ((cx - radius).floor() as i32).max(0) as u32;
    let min_y = ((cy - radius).floor() as i32).max(0) as u32;
    let max_x = (((cx + radius).ceil() as i32).max(0) as u32).min(w.saturating_sub(1));
    let max_y = (((cy + radius).ceil() as i32).max(0) as u32).min(h.saturating_sub(1));
    if min_x > max_x || min_y > max_y {
        return;
    }

    // Slash tips are thin bars along a diagonal; thickness scales with size.
    let slash_half = (radius * 0.35).max(0.5);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let inside = match tip {
                BrushTip::Circle => dx * dx + dy * dy <= radius * radius,
                BrushTip::Square => dx.abs() <= radius && dy.abs() <= radius,
                // Distance from the 45° diagonal through the center
                BrushTip::SlashRight => {
                    (dx + dy).abs() * std::f32::consts::FRAC_1_SQRT_2 <= slash_half
                        && dx.abs() <= radius
                        && dy.abs() <= radius
                }
                BrushTip::SlashLeft => {
                    (dx - dy).abs() * std::f32::consts::FRAC_1_SQRT_2 <= slash_half
                        && dx.abs() <= radius
                        && dy.abs() <= radius
                }
            };
            if inside {
                img.put_pixel(x, y, color);
            }
        }
    }
}

/// Rasterize a full pointer path as a round-capped, round-joined polyline of
/// the given diameter. A single-point path draws one filled disc.
///
/// Dense sub-pixel stepping between consecutive points gives the round caps
/// and joins without explicit geometry.
pub fn rasterize_stroke(
    img: &mut RgbaImage,
    points: &[(f32, f32)],
    diameter: f32,
    color: Rgba<u8>,
    tip: BrushTip,
) {
    match points {
        [] => {}
        [p] => stamp(img, p.0, p.1, diameter, color, tip),
        _ => {
            for pair in points.windows(2) {
                let (x0, y0) = pair[0];
                let (x1, y1) = pair[1];
                let dx = x1 - x0;
                let dy = y1 - y0;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist < 0.1 {
                    stamp(img, x0, y0, diameter, color, tip);
                    continue;
                }
                let steps = dist.ceil() as usize;
                for i in 0..=steps {
                    let t = i as f32 / steps as f32;
                    stamp(img, x0 + dx * t, y0 + dy * t, diameter, color, tip);
                }
            }
        }
    }
}

// ============================================================================
// AIRBRUSH
// ============================================================================

/// Simple positional hash for pseudorandom airbrush dot placement.
/// Deterministic u32 from floating-point position + counter.
fn stamp_hash(x: f32, y: f32, counter: u32) -> u32 {
    let ix = (x * 100.0) as u32;
    let iy = (y * 100.0) as u32;
    let mut h = ix
        .wrapping_mul(374761393)
        .wrapping_add(iy.wrapping_mul(668265263))
        .wrapping_add(counter.wrapping_mul(1013904223));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

#[inline]
fn unit(h: u32) -> f32 {
    h as f32 / u32::MAX as f32
}

/// Periodic airbrush driver. The session starts it on pointer-down, calls
/// [`AirbrushTicker::tick`] every [`AIRBRUSH_INTERVAL_MS`] while the button
/// is held, and stops it synchronously before the commit runs so the final
/// tick's dots are part of the committed batch.
#[derive(Debug, Default)]
pub struct AirbrushTicker {
    counter: u32,
    running: bool,
}

impl AirbrushTicker {
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Cancel the ticker. Must happen before any commit logic runs.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stamp one batch of dots around `(cx, cy)`. Dot count scales with
    /// brush size; dots land uniformly over a disc of radius `2 * size`.
    /// Radial distance uses sqrt(u) so area coverage is uniform — a plain
    /// `u * radius` draw would cluster dots toward the center.
    pub fn tick(&mut self, img: &mut RgbaImage, cx: f32, cy: f32, size: f32, color: Rgba<u8>) {
        if !self.running {
            return;
        }
        let radius = size * 2.0;
        let dots = (size as usize).max(4);
        let w = img.width() as i32;
        let h = img.height() as i32;
        for _ in 0..dots {
            self.counter = self.counter.wrapping_add(1);
            let angle = unit(stamp_hash(cx, cy, self.counter)) * std::f32::consts::TAU;
            let r = unit(stamp_hash(cy, cx, self.counter ^ 0x9e3779b9)).sqrt() * radius;
            let x = (cx + angle.cos() * r).round() as i32;
            let y = (cy + angle.sin() * r).round() as i32;
            if x >= 0 && y >= 0 && x < w && y < h {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn fast_drag_produces_continuous_path() {
        let mut path = StrokePath::default();
        path.begin((0.0, 0.0));
        path.extend_to((20.0, 0.0));
        // Every gap between recorded points stays within the step distance
        for pair in path.points().windows(2) {
            let dx = pair[1].0 - pair[0].0;
            let dy = pair[1].1 - pair[0].1;
            assert!((dx * dx + dy * dy).sqrt() <= PATH_STEP + 0.01);
        }
        path.clear();
        assert!(path.is_empty());
    }

    #[test]
    fn single_point_draws_disc() {
        let mut img = RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255]));
        rasterize_stroke(&mut img, &[(10.0, 10.0)], 4.0, INK, BrushTip::Circle);
        assert_eq!(img.get_pixel(10, 10), &INK);
        // Corner of the bounding square stays untouched
        assert_eq!(img.get_pixel(7, 7), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn airbrush_dots_stay_inside_disc() {
        let mut img = RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255]));
        let mut ticker = AirbrushTicker::default();
        ticker.start();
        for _ in 0..50 {
            ticker.tick(&mut img, 32.0, 32.0, 5.0, INK);
        }
        let radius = 5.0 * 2.0;
        for (x, y, p) in img.enumerate_pixels() {
            if p == &INK {
                let dx = x as f32 - 32.0;
                let dy = y as f32 - 32.0;
                assert!((dx * dx + dy * dy).sqrt() <= radius + 1.0);
            }
        }
    }

    #[test]
    fn stopped_ticker_stamps_nothing() {
        let mut img = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255]));
        let mut ticker = AirbrushTicker::default();
        ticker.tick(&mut img, 8.0, 8.0, 4.0, INK);
        assert!(img.pixels().all(|p| p == &Rgba([255, 255, 255, 255])));
    }
}
