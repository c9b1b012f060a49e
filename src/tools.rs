use serde::{Deserialize, Serialize};

// ============================================================================
// TOOL SELECTION
// ============================================================================

/// The sixteen interaction modes of the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    SelectRect,
    SelectFree,
    Eraser,
    Fill,
    ColorPick,
    Zoom,
    Pencil,
    Brush,
    Airbrush,
    Text,
    Line,
    Curve,
    Rectangle,
    Polygon,
    Ellipse,
    RoundedRect,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::SelectRect => "Select",
            Tool::SelectFree => "Free-Form Select",
            Tool::Eraser => "Eraser",
            Tool::Fill => "Fill With Color",
            Tool::ColorPick => "Pick Color",
            Tool::Zoom => "Magnifier",
            Tool::Pencil => "Pencil",
            Tool::Brush => "Brush",
            Tool::Airbrush => "Airbrush",
            Tool::Text => "Text",
            Tool::Line => "Line",
            Tool::Curve => "Curve",
            Tool::Rectangle => "Rectangle",
            Tool::Polygon => "Polygon",
            Tool::Ellipse => "Ellipse",
            Tool::RoundedRect => "Rounded Rectangle",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::SelectRect,
            Tool::SelectFree,
            Tool::Eraser,
            Tool::Fill,
            Tool::ColorPick,
            Tool::Zoom,
            Tool::Pencil,
            Tool::Brush,
            Tool::Airbrush,
            Tool::Text,
            Tool::Line,
            Tool::Curve,
            Tool::Rectangle,
            Tool::Polygon,
            Tool::Ellipse,
            Tool::RoundedRect,
        ]
    }

    /// True for tools that accumulate a freehand path while dragging.
    pub fn is_stroke_tool(&self) -> bool {
        matches!(self, Tool::Pencil | Tool::Brush | Tool::Eraser)
    }

    /// True for the two-corner drag shapes (line included).
    pub fn is_drag_shape(&self) -> bool {
        matches!(
            self,
            Tool::Line | Tool::Rectangle | Tool::Ellipse | Tool::RoundedRect
        )
    }
}

// ============================================================================
// SHAPE STYLE / BRUSH TIP
// ============================================================================

/// How closed shapes are painted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeStyle {
    /// Stroke only, foreground color.
    Outline,
    /// Fill with the background color, stroke with the foreground color.
    FilledOutline,
    /// Fill with the foreground color, no stroke.
    Filled,
}

impl ShapeStyle {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeStyle::Outline => "Outline",
            ShapeStyle::FilledOutline => "Filled with Outline",
            ShapeStyle::Filled => "Filled",
        }
    }

    pub fn all() -> &'static [ShapeStyle] {
        &[
            ShapeStyle::Outline,
            ShapeStyle::FilledOutline,
            ShapeStyle::Filled,
        ]
    }
}

/// Brush tip geometry for the brush tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrushTip {
    Circle,
    Square,
    SlashRight,
    SlashLeft,
}

impl BrushTip {
    pub fn all() -> &'static [BrushTip] {
        &[
            BrushTip::Circle,
            BrushTip::Square,
            BrushTip::SlashRight,
            BrushTip::SlashLeft,
        ]
    }
}

// ============================================================================
// ZOOM LADDER
// ============================================================================

/// Discrete display zoom multipliers. Purely a view parameter; the canvas'
/// logical pixel size never depends on it.
pub const ZOOM_LADDER: &[f32] = &[0.25, 0.5, 1.0, 2.0, 4.0, 8.0];

// ============================================================================
// TEXT STYLE
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub family: String,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            family: "Helvetica".to_string(),
            size: 16.0,
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

// ============================================================================
// TOOL STATE
// ============================================================================

/// All live tool parameters, owned explicitly and passed by reference into
/// engine operations. Created once per session, mutated by user input, never
/// destroyed while the session lives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolState {
    pub tool: Tool,
    /// Foreground (primary) color, RGBA.
    pub foreground: [u8; 4],
    /// Background (secondary) color, RGBA.
    pub background: [u8; 4],
    /// Base brush size; each tool applies its own multiplier.
    pub brush_size: f32,
    /// Stroke width for shapes, lines and curves.
    pub line_width: f32,
    pub shape_style: ShapeStyle,
    pub brush_tip: BrushTip,
    /// Index into [`ZOOM_LADDER`].
    pub zoom_index: usize,
    pub text: TextStyle,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            tool: Tool::Pencil,
            foreground: [0, 0, 0, 255],
            background: [255, 255, 255, 255],
            brush_size: 4.0,
            line_width: 2.0,
            shape_style: ShapeStyle::Outline,
            brush_tip: BrushTip::Circle,
            zoom_index: 2, // 1.0x
            text: TextStyle::default(),
        }
    }
}

impl ToolState {
    pub fn zoom(&self) -> f32 {
        ZOOM_LADDER[self.zoom_index.min(ZOOM_LADDER.len() - 1)]
    }

    /// Step the zoom ladder up or down, saturating at the ends.
    pub fn step_zoom(&mut self, direction: i32) {
        if direction > 0 {
            self.zoom_index = (self.zoom_index + 1).min(ZOOM_LADDER.len() - 1);
        } else if self.zoom_index > 0 {
            self.zoom_index -= 1;
        }
    }

    /// Effective stroke diameter for the active freehand tool.
    /// Brush strokes are wider and the eraser wider still; the pencil uses
    /// the size unmodified.
    pub fn stroke_diameter(&self) -> f32 {
        match self.tool {
            Tool::Brush => self.brush_size * 2.5,
            Tool::Eraser => self.brush_size * 3.0,
            _ => self.brush_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_ladder_saturates() {
        let mut t = ToolState::default();
        for _ in 0..20 {
            t.step_zoom(1);
        }
        assert_eq!(t.zoom(), 8.0);
        for _ in 0..20 {
            t.step_zoom(-1);
        }
        assert_eq!(t.zoom(), 0.25);
    }

    #[test]
    fn tool_enumeration_is_complete() {
        assert_eq!(Tool::all().len(), 16);
        for t in Tool::all() {
            assert!(!t.label().is_empty());
        }
        assert!(Tool::Pencil.is_stroke_tool());
        assert!(!Tool::Line.is_stroke_tool());
        assert!(Tool::Line.is_drag_shape());
        assert_eq!(ShapeStyle::all().len(), 3);
        assert_eq!(BrushTip::all().len(), 4);
    }

    #[test]
    fn eraser_diameter_is_triple() {
        let t = ToolState {
            tool: Tool::Eraser,
            brush_size: 4.0,
            ..Default::default()
        };
        assert_eq!(t.stroke_diameter(), 12.0);
    }
}
