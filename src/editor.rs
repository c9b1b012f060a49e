use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};

use crate::canvas::{PixelCanvas, PixelRect, MAX_CANVAS_DIM};
use crate::document::Document;
use crate::ops::fill::flood_fill;
use crate::ops::selection::Selection;
use crate::ops::shapes::{
    constrain_corner, flatten_cubic, flatten_quadratic, rasterize_drag_shape, rasterize_polygon,
    stroke_polyline, DragShape,
};
use crate::ops::stroke::{rasterize_stroke, AirbrushTicker, StrokePath};
use crate::ops::text::rasterize_text;
use crate::tools::{BrushTip, Tool, ToolState};

/// Bézier flattening resolution for curve previews and commits.
const CURVE_SEGMENTS: usize = 48;

// ============================================================================
// HOST CAPABILITIES
// ============================================================================

/// What the embedding layer lets the session do. The session never holds a
/// back-reference to its host; it reports through this trait instead.
pub trait EditorHost {
    /// An edit was committed to the document under the given label.
    fn canvas_committed(&mut self, _label: &str) {}
    /// The color-pick tool sampled a pixel.
    fn color_picked(&mut self, _color: [u8; 4]) {}
    /// The canvas dimensions changed.
    fn canvas_resized(&mut self, _width: u32, _height: u32) {}
}

/// Host that ignores every notification; useful headless.
pub struct NullHost;
impl EditorHost for NullHost {}

// ============================================================================
// TRANSIENT TOOL STATE
// ============================================================================

/// What the pointer is currently doing. One variant at a time; every commit
/// or cancel returns to `Idle`.
enum Interaction {
    Idle,
    /// Freehand stroke (pencil / brush / eraser) into the scratch buffer.
    Stroke { path: StrokePath },
    /// Airbrush hold; dots land on ticks, not on motion.
    Airbrush { pos: (f32, f32) },
    /// Two-corner shape drag (line / rect / ellipse / rounded rect).
    ShapeDrag { start: (f32, f32), end: (f32, f32) },
    /// Dragging out a curve segment. `base` marks the first drag, which
    /// draws the base line; later drags pull control points.
    CurveDrag { current: (f32, f32), base: bool },
    /// Rectangular selection marquee drag.
    SelectDrag { start: (f32, f32), end: (f32, f32) },
    /// Free-form lasso drag.
    LassoDrag { path: Vec<(f32, f32)> },
    /// Moving the floating selection.
    SelectionMove { last: (f32, f32) },
}

/// Curve tool progress across click-drag cycles: base line first, then one
/// control point (quadratic preview), then the second control commits a
/// cubic.
enum CurvePhase {
    Idle,
    BaseLine { p0: (f32, f32), p1: (f32, f32) },
    OneControl {
        p0: (f32, f32),
        p1: (f32, f32),
        c1: (f32, f32),
    },
}

// ============================================================================
// EDITOR SESSION
// ============================================================================

/// Drives every tool from pointer events against one document. Previews
/// render into a scratch copy of the canvas; a commit swaps the whole buffer
/// into the document and pushes one undo record.
pub struct EditorSession<H: EditorHost> {
    document: Document,
    tools: ToolState,
    host: H,
    font: Option<FontArc>,

    interaction: Interaction,
    /// Working copy the active interaction paints into.
    scratch: Option<RgbaImage>,
    airbrush: AirbrushTicker,
    curve: CurvePhase,
    /// Polygon-in-progress vertices; closed on double-click.
    polygon: Vec<(f32, f32)>,
    /// Floating selection plus the canvas copy holding its deferred
    /// source clear.
    selection: Option<(Selection, RgbaImage)>,
    /// Pending text insertion point.
    text_anchor: Option<(f32, f32)>,
}

impl<H: EditorHost> EditorSession<H> {
    pub fn new(document: Document, tools: ToolState, host: H) -> Self {
        Self {
            document,
            tools,
            host,
            font: None,
            interaction: Interaction::Idle,
            scratch: None,
            airbrush: AirbrushTicker::default(),
            curve: CurvePhase::Idle,
            polygon: Vec::new(),
            selection: None,
            text_anchor: None,
        }
    }

    /// Build a session that picks up the tool state persisted by the
    /// previous session, falling back to defaults.
    pub fn with_restored_tools(document: Document, host: H) -> Self {
        Self::new(document, crate::io::restore_tool_state(), host)
    }

    /// Persist the current tool state for the next session. Failures are
    /// logged and otherwise ignored; settings are not worth failing over.
    pub fn persist_tools(&self) {
        let Some(path) = crate::io::tool_state_path() else {
            return;
        };
        if let Err(e) = crate::io::save_tool_state(&path, &self.tools) {
            crate::log_warn!("failed to persist tool state: {}", e);
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolState {
        &mut self.tools
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Supply the font used by the text tool.
    pub fn set_font(&mut self, font: FontArc) {
        self.font = Some(font);
    }

    fn foreground(&self) -> Rgba<u8> {
        Rgba(self.tools.foreground)
    }

    fn background(&self) -> Rgba<u8> {
        Rgba(self.tools.background)
    }

    /// The image a display layer should show right now: the committed canvas
    /// overlaid with any in-progress interaction.
    pub fn preview(&self) -> RgbaImage {
        let mut base = match (&self.scratch, &self.selection) {
            (Some(s), _) => s.clone(),
            (None, Some((_, cleared))) => cleared.clone(),
            (None, None) => self.document.canvas().image().clone(),
        };
        if let Some((sel, _)) = &self.selection {
            let mut canvas = PixelCanvas::from_image(base);
            sel.composite(&mut canvas);
            base = canvas.into_image();
        }
        base
    }

    // ------------------------------------------------------------------
    // TOOL SWITCHING
    // ------------------------------------------------------------------

    /// Change the active tool. Any pending multi-step state (floating
    /// selection, curve in progress, open polygon) is resolved first:
    /// selections commit, curves and polygons are discarded.
    pub fn set_tool(&mut self, tool: Tool) {
        // The two select tools share selection state; switching between
        // them keeps the floating content alive.
        if !matches!(tool, Tool::SelectRect | Tool::SelectFree) {
            self.commit_selection();
        }
        self.curve = CurvePhase::Idle;
        self.polygon.clear();
        self.text_anchor = None;
        self.interaction = Interaction::Idle;
        self.scratch = None;
        self.tools.tool = tool;
    }

    // ------------------------------------------------------------------
    // POINTER EVENTS
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, x: f32, y: f32, modifier: bool) {
        match self.tools.tool {
            Tool::Pencil | Tool::Brush | Tool::Eraser => {
                self.scratch = Some(self.document.canvas().image().clone());
                let mut path = StrokePath::default();
                path.begin((x, y));
                self.stamp_path_tail(&path, 0);
                self.interaction = Interaction::Stroke { path };
            }
            Tool::Airbrush => {
                self.scratch = Some(self.document.canvas().image().clone());
                self.airbrush.start();
                self.interaction = Interaction::Airbrush { pos: (x, y) };
                self.airbrush_tick();
            }
            Tool::Fill => {
                // Clicks left of or above the canvas never fill; the engine
                // guard covers the right/bottom edges.
                let (cx, cy) = (x.floor() as i64, y.floor() as i64);
                if cx < 0 || cy < 0 {
                    return;
                }
                let mut after = self.document.canvas().image().clone();
                if flood_fill(&mut after, (cx as u32, cy as u32), self.foreground()) {
                    self.commit("Fill", after);
                }
            }
            Tool::ColorPick => {
                let (cx, cy) = (x.floor() as i64, y.floor() as i64);
                let canvas = self.document.canvas();
                if cx >= 0
                    && cy >= 0
                    && (cx as u32) < canvas.width()
                    && (cy as u32) < canvas.height()
                {
                    let picked = canvas.pixel(cx as u32, cy as u32).0;
                    self.tools.foreground = picked;
                    self.host.color_picked(picked);
                }
            }
            Tool::Zoom => {
                self.tools.step_zoom(if modifier { -1 } else { 1 });
            }
            Tool::Text => {
                self.text_anchor = Some((x, y));
            }
            Tool::Line | Tool::Rectangle | Tool::Ellipse | Tool::RoundedRect => {
                self.interaction = Interaction::ShapeDrag {
                    start: (x, y),
                    end: (x, y),
                };
                self.render_shape_preview(modifier);
            }
            Tool::Curve => {
                let base = matches!(self.curve, CurvePhase::Idle);
                if base {
                    self.curve = CurvePhase::BaseLine {
                        p0: (x, y),
                        p1: (x, y),
                    };
                }
                self.interaction = Interaction::CurveDrag {
                    current: (x, y),
                    base,
                };
                self.render_curve_preview((x, y));
            }
            Tool::Polygon => {
                self.polygon.push((x, y));
                self.render_polygon_preview(Some((x, y)));
            }
            Tool::SelectRect => {
                if self.try_start_selection_move(x, y) {
                    return;
                }
                self.interaction = Interaction::SelectDrag {
                    start: (x, y),
                    end: (x, y),
                };
            }
            Tool::SelectFree => {
                if self.try_start_selection_move(x, y) {
                    return;
                }
                self.interaction = Interaction::LassoDrag {
                    path: vec![(x, y)],
                };
            }
        }
    }

    pub fn pointer_drag(&mut self, x: f32, y: f32, modifier: bool) {
        match &mut self.interaction {
            Interaction::Idle => {}
            Interaction::Stroke { path } => {
                let before = path.points().len();
                path.extend_to((x, y));
                let path = std::mem::take(path);
                self.stamp_path_tail(&path, before.saturating_sub(1));
                self.interaction = Interaction::Stroke { path };
            }
            Interaction::Airbrush { pos } => {
                // Motion only relocates the nozzle; dots land on ticks
                *pos = (x, y);
            }
            Interaction::ShapeDrag { end, .. } => {
                *end = (x, y);
                self.render_shape_preview(modifier);
            }
            Interaction::CurveDrag { current, base } => {
                *current = (x, y);
                if *base {
                    if let CurvePhase::BaseLine { p1, .. } = &mut self.curve {
                        *p1 = (x, y);
                    }
                }
                self.render_curve_preview((x, y));
            }
            Interaction::SelectDrag { end, .. } => {
                *end = (x, y);
            }
            Interaction::LassoDrag { path } => {
                path.push((x, y));
            }
            Interaction::SelectionMove { last } => {
                let dx = (x - last.0).round() as i32;
                let dy = (y - last.1).round() as i32;
                if dx != 0 || dy != 0 {
                    last.0 += dx as f32;
                    last.1 += dy as f32;
                    if let Some((sel, cleared)) = &mut self.selection {
                        sel.translate(dx, dy, cleared);
                    }
                }
            }
        }
    }

    pub fn pointer_up(&mut self, x: f32, y: f32, modifier: bool) {
        let interaction = std::mem::replace(&mut self.interaction, Interaction::Idle);
        match interaction {
            Interaction::Idle => {}
            Interaction::Stroke { mut path } => {
                path.extend_to((x, y));
                let label = match self.tools.tool {
                    Tool::Eraser => "Erase",
                    _ => "Draw",
                };
                // Scratch already holds everything stamped so far; restamp
                // the full path so the final segment is included.
                if let Some(mut scratch) = self.scratch.take() {
                    let (diameter, color, tip) = self.stroke_params();
                    rasterize_stroke(&mut scratch, path.points(), diameter, color, tip);
                    self.commit(label, scratch);
                }
            }
            Interaction::Airbrush { pos } => {
                // Stop the ticker first so no tick lands after the commit
                self.interaction = Interaction::Airbrush { pos };
                self.airbrush_tick();
                self.airbrush.stop();
                self.interaction = Interaction::Idle;
                if let Some(scratch) = self.scratch.take() {
                    self.commit("Airbrush", scratch);
                }
            }
            Interaction::ShapeDrag { start, .. } => {
                let end = if modifier {
                    constrain_corner(start, (x, y))
                } else {
                    (x, y)
                };
                let mut after = self.document.canvas().image().clone();
                rasterize_drag_shape(
                    &mut after,
                    self.drag_shape(),
                    start,
                    end,
                    self.tools.shape_style,
                    self.tools.line_width,
                    self.foreground(),
                    self.background(),
                );
                self.scratch = None;
                self.commit(self.tools.tool.label(), after);
            }
            Interaction::CurveDrag { base, .. } => {
                self.scratch = None;
                self.curve = match std::mem::replace(&mut self.curve, CurvePhase::Idle) {
                    CurvePhase::Idle => CurvePhase::Idle,
                    CurvePhase::BaseLine { p0, p1 } if base => {
                        // The base-line drag just finished; a degenerate
                        // line resets the tool.
                        if p0 == p1 {
                            CurvePhase::Idle
                        } else {
                            CurvePhase::BaseLine { p0, p1 }
                        }
                    }
                    CurvePhase::BaseLine { p0, p1 } => {
                        // First control pull fixes c1
                        CurvePhase::OneControl { p0, p1, c1: (x, y) }
                    }
                    CurvePhase::OneControl { p0, p1, c1 } => {
                        // Second control point finishes the cubic
                        let mut after = self.document.canvas().image().clone();
                        let pts = flatten_cubic(p0, c1, (x, y), p1, CURVE_SEGMENTS);
                        stroke_polyline(
                            &mut after,
                            &pts,
                            self.tools.line_width,
                            self.foreground(),
                        );
                        self.commit("Curve", after);
                        CurvePhase::Idle
                    }
                };
            }
            Interaction::SelectDrag { start, .. } => {
                let rect = PixelRect::from_corners(start, (x, y));
                self.selection = Selection::capture_rect(self.document.canvas(), rect)
                    .map(|sel| (sel, self.document.canvas().image().clone()));
            }
            Interaction::LassoDrag { mut path } => {
                path.push((x, y));
                self.selection = Selection::capture_free(self.document.canvas(), &path)
                    .map(|sel| (sel, self.document.canvas().image().clone()));
            }
            Interaction::SelectionMove { .. } => {}
        }
    }

    /// Double-click closes the polygon (or is ignored by other tools).
    /// Fewer than two vertices discard silently.
    pub fn double_click(&mut self, _x: f32, _y: f32) {
        if self.tools.tool != Tool::Polygon {
            return;
        }
        let verts = std::mem::take(&mut self.polygon);
        self.scratch = None;
        self.interaction = Interaction::Idle;
        if verts.len() < 2 {
            return;
        }
        let mut after = self.document.canvas().image().clone();
        rasterize_polygon(
            &mut after,
            &verts,
            self.tools.shape_style,
            self.tools.line_width,
            self.foreground(),
            self.background(),
        );
        self.commit("Polygon", after);
    }

    // ------------------------------------------------------------------
    // AIRBRUSH
    // ------------------------------------------------------------------

    /// Advance the airbrush one tick. The embedding layer calls this every
    /// [`crate::ops::stroke::AIRBRUSH_INTERVAL_MS`] while the button is held.
    pub fn airbrush_tick(&mut self) {
        if !self.airbrush.is_running() {
            return;
        }
        let pos = match &self.interaction {
            Interaction::Airbrush { pos } => *pos,
            _ => return,
        };
        let color = self.foreground();
        let size = self.tools.brush_size;
        if let Some(scratch) = self.scratch.as_mut() {
            self.airbrush.tick(scratch, pos.0, pos.1, size, color);
        }
    }

    // ------------------------------------------------------------------
    // SELECTION
    // ------------------------------------------------------------------

    fn try_start_selection_move(&mut self, x: f32, y: f32) -> bool {
        let inside = self
            .selection
            .as_ref()
            .is_some_and(|(sel, _)| sel.rect().contains(x, y));
        if inside {
            self.interaction = Interaction::SelectionMove { last: (x, y) };
            true
        } else {
            // Click outside lands the floating content first
            self.commit_selection();
            false
        }
    }

    /// Land the floating selection, if any. A selection that never moved
    /// leaves the canvas untouched and produces no undo record.
    pub fn commit_selection(&mut self) {
        let Some((sel, cleared)) = self.selection.take() else {
            return;
        };
        if !sel.has_moved() {
            return;
        }
        let mut canvas = PixelCanvas::from_image(cleared);
        sel.composite(&mut canvas);
        self.commit("Move Selection", canvas.into_image());
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    // ------------------------------------------------------------------
    // TEXT
    // ------------------------------------------------------------------

    /// Rasterize and commit text at the pending insertion point.
    pub fn commit_text(&mut self, content: &str) {
        let Some(anchor) = self.text_anchor.take() else {
            return;
        };
        let Some(font) = self.font.clone() else {
            crate::log_warn!("text commit skipped: no font loaded");
            return;
        };
        let Some(patch) = rasterize_text(&font, content, &self.tools.text, anchor, self.foreground())
        else {
            return;
        };
        let mut canvas = self.document.canvas().clone();
        canvas.blit_over(&patch.image, patch.off_x, patch.off_y);
        self.commit("Text", canvas.into_image());
    }

    // ------------------------------------------------------------------
    // RESIZE / HISTORY
    // ------------------------------------------------------------------

    /// Resize the canvas, white-filling new area and keeping old content
    /// top-left anchored. Out-of-range dimensions are rejected silently.
    pub fn request_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
            crate::log_warn!("rejected resize to {}x{}", width, height);
            return;
        }
        if (width, height) == (self.document.canvas().width(), self.document.canvas().height()) {
            return;
        }
        self.commit_selection();
        let resized = self.document.canvas().resized(width, height);
        self.commit("Resize", resized.into_image());
        self.host.canvas_resized(width, height);
    }

    pub fn undo(&mut self) -> Option<String> {
        self.selection = None;
        self.scratch = None;
        self.interaction = Interaction::Idle;
        self.document.undo()
    }

    pub fn redo(&mut self) -> Option<String> {
        self.document.redo()
    }

    // ------------------------------------------------------------------
    // INTERNALS
    // ------------------------------------------------------------------

    fn commit(&mut self, label: &str, after: RgbaImage) {
        self.document.commit(label, after);
        self.host.canvas_committed(label);
    }

    fn stroke_params(&self) -> (f32, Rgba<u8>, BrushTip) {
        match self.tools.tool {
            Tool::Brush => (
                self.tools.stroke_diameter(),
                self.foreground(),
                self.tools.brush_tip,
            ),
            Tool::Eraser => (self.tools.stroke_diameter(), self.background(), BrushTip::Circle),
            _ => (self.tools.stroke_diameter(), self.foreground(), BrushTip::Circle),
        }
    }

    /// Stamp the not-yet-drawn tail of a stroke path into the scratch.
    fn stamp_path_tail(&mut self, path: &StrokePath, from: usize) {
        let (diameter, color, tip) = self.stroke_params();
        if let Some(scratch) = self.scratch.as_mut() {
            let pts = path.points();
            if pts.len() == 1 {
                rasterize_stroke(scratch, pts, diameter, color, tip);
            } else if from < pts.len() {
                rasterize_stroke(scratch, &pts[from..], diameter, color, tip);
            }
        }
    }

    fn drag_shape(&self) -> DragShape {
        match self.tools.tool {
            Tool::Line => DragShape::Line,
            Tool::Rectangle => DragShape::Rectangle,
            Tool::Ellipse => DragShape::Ellipse,
            _ => DragShape::RoundedRect,
        }
    }

    fn render_shape_preview(&mut self, modifier: bool) {
        let (start, end) = match &self.interaction {
            Interaction::ShapeDrag { start, end } => (*start, *end),
            _ => return,
        };
        let end = if modifier {
            constrain_corner(start, end)
        } else {
            end
        };
        let mut scratch = self.document.canvas().image().clone();
        rasterize_drag_shape(
            &mut scratch,
            self.drag_shape(),
            start,
            end,
            self.tools.shape_style,
            self.tools.line_width,
            self.foreground(),
            self.background(),
        );
        self.scratch = Some(scratch);
    }

    fn render_curve_preview(&mut self, pointer: (f32, f32)) {
        let mut scratch = self.document.canvas().image().clone();
        let width = self.tools.line_width;
        let color = self.foreground();
        let pulling = matches!(self.interaction, Interaction::CurveDrag { base: false, .. });
        match &self.curve {
            CurvePhase::Idle => {}
            CurvePhase::BaseLine { p0, p1 } if pulling => {
                // First control pull in flight: quadratic through the pointer
                let pts = flatten_quadratic(*p0, pointer, *p1, CURVE_SEGMENTS);
                stroke_polyline(&mut scratch, &pts, width, color);
            }
            CurvePhase::BaseLine { p0, p1 } => {
                stroke_polyline(&mut scratch, &[*p0, *p1], width, color);
            }
            CurvePhase::OneControl { p0, p1, c1 } => {
                // Second pull previews the full cubic
                let pts = flatten_cubic(*p0, *c1, pointer, *p1, CURVE_SEGMENTS);
                stroke_polyline(&mut scratch, &pts, width, color);
            }
        }
        self.scratch = Some(scratch);
    }

    fn render_polygon_preview(&mut self, pointer: Option<(f32, f32)>) {
        let mut scratch = self.document.canvas().image().clone();
        let mut pts = self.polygon.clone();
        if let Some(p) = pointer {
            if pts.last() != Some(&p) {
                pts.push(p);
            }
        }
        if pts.len() >= 2 {
            stroke_polyline(&mut scratch, &pts, self.tools.line_width, self.foreground());
        }
        self.scratch = Some(scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BACKGROUND;
    use crate::tools::ShapeStyle;

    #[derive(Default)]
    struct RecordingHost {
        commits: Vec<String>,
        picks: Vec<[u8; 4]>,
        resizes: Vec<(u32, u32)>,
    }

    impl EditorHost for RecordingHost {
        fn canvas_committed(&mut self, label: &str) {
            self.commits.push(label.to_string());
        }
        fn color_picked(&mut self, color: [u8; 4]) {
            self.picks.push(color);
        }
        fn canvas_resized(&mut self, w: u32, h: u32) {
            self.resizes.push((w, h));
        }
    }

    fn session(w: u32, h: u32) -> EditorSession<RecordingHost> {
        EditorSession::new(Document::new(w, h), ToolState::default(), RecordingHost::default())
    }

    #[test]
    fn pencil_click_commits_one_draw() {
        let mut s = session(32, 32);
        s.pointer_down(10.0, 10.0, false);
        s.pointer_up(10.0, 10.0, false);
        assert_eq!(s.host().commits, vec!["Draw"]);
        assert_eq!(s.document().canvas().pixel(10, 10), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn preview_never_touches_committed_canvas() {
        let mut s = session(32, 32);
        s.pointer_down(5.0, 5.0, false);
        s.pointer_drag(20.0, 20.0, false);
        assert_eq!(s.document().canvas().pixel(5, 5), BACKGROUND);
        let preview = s.preview();
        assert_eq!(preview.get_pixel(5, 5), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn eraser_paints_background() {
        let mut s = session(32, 32);
        s.tools_mut().foreground = [255, 0, 0, 255];
        s.pointer_down(10.0, 10.0, false);
        s.pointer_up(16.0, 10.0, false);
        assert_eq!(s.document().canvas().pixel(10, 10), Rgba([255, 0, 0, 255]));

        s.set_tool(Tool::Eraser);
        s.pointer_down(10.0, 10.0, false);
        s.pointer_up(16.0, 10.0, false);
        assert_eq!(s.host().commits, vec!["Draw", "Erase"]);
        assert_eq!(s.document().canvas().pixel(10, 10), BACKGROUND);
    }

    #[test]
    fn airbrush_stops_ticking_after_commit() {
        let mut s = session(64, 64);
        s.set_tool(Tool::Airbrush);
        s.pointer_down(32.0, 32.0, false);
        s.airbrush_tick();
        s.pointer_up(32.0, 32.0, false);
        assert_eq!(s.host().commits, vec!["Airbrush"]);
        let after = s.document().canvas().image().clone();
        // A stray tick after release must not change anything
        s.airbrush_tick();
        assert_eq!(s.preview().as_raw(), after.as_raw());
    }

    #[test]
    fn constrained_rectangle_commits_square() {
        let mut s = session(64, 64);
        s.set_tool(Tool::Rectangle);
        s.tools_mut().shape_style = ShapeStyle::Filled;
        s.pointer_down(10.0, 10.0, true);
        s.pointer_up(40.0, 20.0, true);
        // Constrained to 30x30: pixel at (35, 35) is inside the square
        assert_eq!(s.document().canvas().pixel(35, 35), Rgba([0, 0, 0, 255]));
        assert_eq!(s.host().commits, vec!["Rectangle"]);
    }

    #[test]
    fn fill_click_off_canvas_is_a_no_op() {
        let mut s = session(16, 16);
        s.set_tool(Tool::Fill);
        s.tools_mut().foreground = [255, 0, 0, 255];
        s.pointer_down(-5.0, 3.0, false);
        s.pointer_down(3.0, -5.0, false);
        s.pointer_down(16.0, 3.0, false);
        assert!(s.host().commits.is_empty());
        assert!(!s.document().history().can_undo());
        assert_eq!(s.document().canvas().pixel(0, 3), BACKGROUND);
    }

    #[test]
    fn color_pick_updates_foreground_and_reports() {
        let mut s = session(16, 16);
        s.document
            .canvas_mut()
            .put_pixel(4, 4, Rgba([9, 8, 7, 255]));
        s.set_tool(Tool::ColorPick);
        s.pointer_down(4.0, 4.0, false);
        assert_eq!(s.tools().foreground, [9, 8, 7, 255]);
        assert_eq!(s.host().picks, vec![[9, 8, 7, 255]]);
    }

    #[test]
    fn polygon_with_one_vertex_discards() {
        let mut s = session(32, 32);
        s.set_tool(Tool::Polygon);
        s.pointer_down(5.0, 5.0, false);
        s.pointer_up(5.0, 5.0, false);
        s.double_click(5.0, 5.0);
        assert!(s.host().commits.is_empty());
    }

    #[test]
    fn polygon_double_click_commits() {
        let mut s = session(32, 32);
        s.set_tool(Tool::Polygon);
        for p in [(5.0, 5.0), (25.0, 5.0), (15.0, 25.0)] {
            s.pointer_down(p.0, p.1, false);
            s.pointer_up(p.0, p.1, false);
        }
        s.double_click(15.0, 25.0);
        assert_eq!(s.host().commits, vec!["Polygon"]);
    }

    #[test]
    fn curve_three_phase_commit() {
        let mut s = session(64, 64);
        s.set_tool(Tool::Curve);
        // Base line
        s.pointer_down(5.0, 30.0, false);
        s.pointer_drag(55.0, 30.0, false);
        s.pointer_up(55.0, 30.0, false);
        assert!(s.host().commits.is_empty());
        // First control pull
        s.pointer_down(30.0, 5.0, false);
        s.pointer_up(30.0, 5.0, false);
        assert!(s.host().commits.is_empty());
        // Second control pull commits the cubic
        s.pointer_down(30.0, 55.0, false);
        s.pointer_up(30.0, 55.0, false);
        assert_eq!(s.host().commits, vec!["Curve"]);
    }

    #[test]
    fn selection_move_commits_once() {
        let mut s = session(32, 32);
        s.tools_mut().foreground = [255, 0, 0, 255];
        s.pointer_down(4.0, 4.0, false);
        s.pointer_up(4.0, 4.0, false);

        s.set_tool(Tool::SelectRect);
        s.pointer_down(2.0, 2.0, false);
        s.pointer_drag(7.0, 7.0, false);
        s.pointer_up(7.0, 7.0, false);
        assert!(s.has_selection());

        // Grab inside and move right by 10
        s.pointer_down(4.0, 4.0, false);
        s.pointer_drag(14.0, 4.0, false);
        s.pointer_up(14.0, 4.0, false);
        s.commit_selection();

        assert_eq!(s.host().commits.last().map(String::as_str), Some("Move Selection"));
        assert_eq!(s.document().canvas().pixel(14, 4), Rgba([255, 0, 0, 255]));
        assert_eq!(s.document().canvas().pixel(4, 4), BACKGROUND);
    }

    #[test]
    fn unmoved_selection_commits_nothing() {
        let mut s = session(32, 32);
        s.set_tool(Tool::SelectRect);
        s.pointer_down(2.0, 2.0, false);
        s.pointer_drag(10.0, 10.0, false);
        s.pointer_up(10.0, 10.0, false);
        s.set_tool(Tool::Pencil); // forces selection resolution
        assert!(s.host().commits.is_empty());
    }

    #[test]
    fn resize_validates_and_notifies() {
        let mut s = session(16, 16);
        s.request_resize(0, 10);
        s.request_resize(9000, 10);
        assert!(s.host().resizes.is_empty());
        s.request_resize(32, 8);
        assert_eq!(s.host().resizes, vec![(32, 8)]);
        assert_eq!(s.host().commits, vec!["Resize"]);
        assert_eq!(s.document().canvas().width(), 32);
        assert_eq!(s.undo().as_deref(), Some("Resize"));
        assert_eq!(s.document().canvas().width(), 16);
    }

    #[test]
    fn tool_state_survives_across_sessions() {
        if crate::io::tool_state_path().is_none() {
            return; // no data directory available
        }
        let mut s = session(8, 8);
        s.tools_mut().brush_size = 7.5;
        s.tools_mut().foreground = [20, 30, 40, 255];
        s.persist_tools();

        let restored = EditorSession::with_restored_tools(
            Document::new(8, 8),
            RecordingHost::default(),
        );
        assert_eq!(restored.tools().brush_size, 7.5);
        assert_eq!(restored.tools().foreground, [20, 30, 40, 255]);
    }

    #[test]
    fn text_commit_blits_glyphs() {
        let Some(font) = crate::ops::text::load_default_font() else {
            return; // no system font available
        };
        let mut s = session(64, 64);
        s.set_tool(Tool::Text);
        s.set_font(font);
        s.pointer_down(5.0, 5.0, false);
        s.commit_text("Hi");
        assert_eq!(s.host().commits, vec!["Text"]);
    }

    #[test]
    fn zoom_tool_steps_ladder() {
        let mut s = session(8, 8);
        s.set_tool(Tool::Zoom);
        s.pointer_down(1.0, 1.0, false);
        assert_eq!(s.tools().zoom(), 2.0);
        s.pointer_down(1.0, 1.0, true);
        assert_eq!(s.tools().zoom(), 1.0);
    }
}
