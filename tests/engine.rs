//! End-to-end engine behavior through the public API.

use image::Rgba;
use paintr::canvas::{PixelCanvas, PixelRect, BACKGROUND};
use paintr::document::Document;
use paintr::editor::{EditorSession, NullHost};
use paintr::ops::fill::flood_fill;
use paintr::ops::selection::Selection;
use paintr::tools::{Tool, ToolState};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn session(w: u32, h: u32) -> EditorSession<NullHost> {
    EditorSession::new(Document::new(w, h), ToolState::default(), NullHost)
}

// ---------------------------------------------------------------------------
// Resize
// ---------------------------------------------------------------------------

#[test]
fn resize_preserves_top_left_overlap_and_whitens_the_rest() {
    let mut canvas = PixelCanvas::new(10, 10);
    canvas.put_pixel(3, 3, RED);
    canvas.put_pixel(9, 9, BLACK);

    let grown = canvas.resized(20, 15);
    assert_eq!(grown.pixel(3, 3), RED);
    assert_eq!(grown.pixel(9, 9), BLACK);
    assert_eq!(grown.pixel(15, 12), BACKGROUND);

    let shrunk = canvas.resized(5, 5);
    assert_eq!(shrunk.pixel(3, 3), RED);
    assert_eq!((shrunk.width(), shrunk.height()), (5, 5));
}

// ---------------------------------------------------------------------------
// Flood fill
// ---------------------------------------------------------------------------

#[test]
fn flood_fill_is_idempotent() {
    let mut img = image::RgbaImage::from_pixel(50, 50, Rgba([255, 255, 255, 255]));
    assert!(flood_fill(&mut img, (10, 10), RED));
    let first = img.clone();
    // Same seed, same color: nothing left to change
    assert!(!flood_fill(&mut img, (10, 10), RED));
    assert_eq!(img.as_raw(), first.as_raw());
}

#[test]
fn flood_fill_respects_four_connectivity() {
    // Diagonal barrier of black pixels from corner to corner
    let mut img = image::RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255]));
    for i in 0..20 {
        img.put_pixel(i, i, BLACK);
        if i + 1 < 20 {
            img.put_pixel(i, i + 1, BLACK);
        }
    }
    assert!(flood_fill(&mut img, (19, 0), RED));
    // Above the barrier filled, below untouched
    assert_eq!(img.get_pixel(10, 2), &RED);
    assert_eq!(img.get_pixel(2, 10), &Rgba([255, 255, 255, 255]));
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[test]
fn selection_capture_move_commit_round_trip() {
    let mut canvas = PixelCanvas::new(30, 30);
    canvas.fill_rect(PixelRect::new(5, 5, 6, 6), RED);

    let mut working = canvas.image().clone();
    let mut sel = Selection::capture_rect(&canvas, PixelRect::new(5, 5, 6, 6)).unwrap();
    sel.translate(12, 0, &mut working);

    let mut out = PixelCanvas::from_image(working);
    sel.composite(&mut out);

    for y in 5..11 {
        for x in 5..11 {
            assert_eq!(out.pixel(x, y), BACKGROUND, "source not cleared at {x},{y}");
            assert_eq!(out.pixel(x + 12, y), RED, "content missing at {},{y}", x + 12);
        }
    }
}

// ---------------------------------------------------------------------------
// Undo / redo symmetry
// ---------------------------------------------------------------------------

#[test]
fn undo_redo_walks_edit_sequence_symmetrically() {
    let mut s = session(40, 40);
    // Three pencil dots at distinct spots
    for p in [(5.0, 5.0), (20.0, 20.0), (35.0, 35.0)] {
        s.pointer_down(p.0, p.1, false);
        s.pointer_up(p.0, p.1, false);
    }
    let final_state = s.document().canvas().image().clone();

    assert!(s.undo().is_some());
    assert!(s.undo().is_some());
    assert!(s.undo().is_some());
    assert!(s.undo().is_none(), "empty stack must be a clean no-op");
    assert!(s
        .document()
        .canvas()
        .image()
        .pixels()
        .all(|p| *p == BACKGROUND));

    assert!(s.redo().is_some());
    assert!(s.redo().is_some());
    assert!(s.redo().is_some());
    assert!(s.redo().is_none());
    assert_eq!(s.document().canvas().image().as_raw(), final_state.as_raw());
}

// ---------------------------------------------------------------------------
// Scenario tests
// ---------------------------------------------------------------------------

#[test]
fn single_point_pencil_stroke_then_undo() {
    let mut s = session(100, 100);
    s.pointer_down(10.0, 10.0, false);
    s.pointer_up(10.0, 10.0, false);

    // Default pencil: 4 px diameter disc centered on the click
    assert_eq!(s.document().canvas().pixel(10, 10), BLACK);
    assert_eq!(s.document().canvas().pixel(10, 11), BLACK);
    assert_eq!(s.document().canvas().pixel(10, 14), BACKGROUND);

    assert_eq!(s.undo().as_deref(), Some("Draw"));
    assert!(s
        .document()
        .canvas()
        .image()
        .pixels()
        .all(|p| *p == BACKGROUND));
}

#[test]
fn fill_white_canvas_red_then_refill_is_noop() {
    let mut s = session(100, 100);
    s.tools_mut().tool = Tool::Fill;
    s.tools_mut().foreground = [255, 0, 0, 255];

    s.pointer_down(0.0, 0.0, false);
    assert!(s.document().canvas().image().pixels().all(|p| *p == RED));
    assert!(s.document().history().can_undo());

    // Second fill with the same color: no change, no new undo entry
    let entries = s.document().history().len();
    s.pointer_down(0.0, 0.0, false);
    assert_eq!(s.document().history().len(), entries);
}
