use image::{Rgba, RgbaImage};

/// Per-channel match threshold. Channels within this distance count as the
/// same color for fill purposes; 25/255 keeps dithered and anti-aliased
/// regions from leaking while still splitting visually distinct areas.
const CHANNEL_TOLERANCE: u8 = 25;

#[inline]
fn channels_match(a: &Rgba<u8>, b: &Rgba<u8>) -> bool {
    // Alpha is deliberately ignored; the canvas model is opaque paint.
    a.0[0].abs_diff(b.0[0]) <= CHANNEL_TOLERANCE
        && a.0[1].abs_diff(b.0[1]) <= CHANNEL_TOLERANCE
        && a.0[2].abs_diff(b.0[2]) <= CHANNEL_TOLERANCE
}

/// Stack-based 4-connected flood fill from `seed`, replacing the connected
/// region that matches the seed's color (within tolerance) with `fill`.
///
/// Returns `false` without touching the image when the seed is out of bounds
/// or the region already matches the fill color; callers skip the history
/// entry in that case.
///
/// The visited mask doubles as the membership test so already-filled pixels
/// are never re-pushed; the explicit stack of packed flat indices keeps deep
/// regions off the call stack.
pub fn flood_fill(img: &mut RgbaImage, seed: (u32, u32), fill: Rgba<u8>) -> bool {
    let w = img.width();
    let h = img.height();
    let (sx, sy) = seed;
    if sx >= w || sy >= h {
        return false;
    }

    let target = *img.get_pixel(sx, sy);
    if channels_match(&target, &fill) {
        return false;
    }

    let mut visited = vec![false; (w * h) as usize];
    let mut stack: Vec<u32> = Vec::with_capacity(1024);
    stack.push(sy * w + sx);
    visited[(sy * w + sx) as usize] = true;

    let mut changed = false;
    while let Some(idx) = stack.pop() {
        let x = idx % w;
        let y = idx / w;
        if !channels_match(img.get_pixel(x, y), &target) {
            continue;
        }
        img.put_pixel(x, y, fill);
        changed = true;

        let mut push = |nx: u32, ny: u32, visited: &mut Vec<bool>, stack: &mut Vec<u32>| {
            let nidx = (ny * w + nx) as usize;
            if !visited[nidx] {
                visited[nidx] = true;
                stack.push(nidx as u32);
            }
        };
        if x > 0 {
            push(x - 1, y, &mut visited, &mut stack);
        }
        if x + 1 < w {
            push(x + 1, y, &mut visited, &mut stack);
        }
        if y > 0 {
            push(x, y - 1, &mut visited, &mut stack);
        }
        if y + 1 < h {
            push(x, y + 1, &mut visited, &mut stack);
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn fills_entire_uniform_canvas() {
        let mut img = RgbaImage::from_pixel(100, 100, WHITE);
        assert!(flood_fill(&mut img, (0, 0), RED));
        assert!(img.pixels().all(|p| *p == RED));
    }

    #[test]
    fn refill_with_same_color_is_a_no_op() {
        let mut img = RgbaImage::from_pixel(100, 100, RED);
        assert!(!flood_fill(&mut img, (0, 0), RED));
    }

    #[test]
    fn diagonal_pixels_do_not_connect() {
        // Checkerboard corner: (0,0) and (1,1) are white, (1,0) and (0,1)
        // black. A fill at (0,0) must not reach (1,1).
        let mut img = RgbaImage::from_pixel(2, 2, BLACK);
        img.put_pixel(0, 0, WHITE);
        img.put_pixel(1, 1, WHITE);
        assert!(flood_fill(&mut img, (0, 0), RED));
        assert_eq!(img.get_pixel(0, 0), &RED);
        assert_eq!(img.get_pixel(1, 1), &WHITE);
        assert_eq!(img.get_pixel(1, 0), &BLACK);
    }

    #[test]
    fn fill_stops_at_distinct_boundary() {
        let mut img = RgbaImage::from_pixel(10, 10, WHITE);
        for y in 0..10 {
            img.put_pixel(5, y, BLACK);
        }
        assert!(flood_fill(&mut img, (0, 0), RED));
        assert_eq!(img.get_pixel(4, 5), &RED);
        assert_eq!(img.get_pixel(5, 5), &BLACK);
        assert_eq!(img.get_pixel(6, 5), &WHITE);
    }

    #[test]
    fn near_matching_pixels_are_absorbed() {
        let mut img = RgbaImage::from_pixel(4, 1, WHITE);
        // Within per-channel tolerance of white
        img.put_pixel(1, 0, Rgba([240, 240, 240, 255]));
        // Outside tolerance
        img.put_pixel(2, 0, Rgba([200, 200, 200, 255]));
        assert!(flood_fill(&mut img, (0, 0), RED));
        assert_eq!(img.get_pixel(1, 0), &RED);
        assert_eq!(img.get_pixel(2, 0), &Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn alpha_differences_are_ignored() {
        let mut img = RgbaImage::from_pixel(3, 1, WHITE);
        img.put_pixel(1, 0, Rgba([255, 255, 255, 0]));
        assert!(flood_fill(&mut img, (0, 0), RED));
        assert_eq!(img.get_pixel(1, 0), &RED);
        assert_eq!(img.get_pixel(2, 0), &RED);
    }

    #[test]
    fn out_of_bounds_seed_is_rejected() {
        let mut img = RgbaImage::from_pixel(4, 4, WHITE);
        assert!(!flood_fill(&mut img, (4, 0), RED));
        assert!(img.pixels().all(|p| *p == WHITE));
    }
}
