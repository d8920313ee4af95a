use serde::{Deserialize, Serialize};

/// Alpha applied to every highlighter stroke regardless of the brush opacity.
pub const HIGHLIGHTER_ALPHA: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Pen,
    Eraser,
    #[serde(alias = "highlight")]
    Highlighter,
    Line,
    Rect,
    Ellipse,
}

/// How a tool's pixels combine with what is already on the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    SourceOver,
    Clear,
    Lighten,
}

/// When a tool writes into the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStrategy {
    /// Every pointer move draws a segment straight into the overlay.
    Incremental,
    /// Only a preview is shown while dragging; geometry lands on release.
    OnRelease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolBehavior {
    pub blend: BlendMode,
    pub commit: CommitStrategy,
    pub smoothing: bool,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::Pen,
        Tool::Eraser,
        Tool::Highlighter,
        Tool::Line,
        Tool::Rect,
        Tool::Ellipse,
    ];

    pub const fn behavior(self) -> ToolBehavior {
        match self {
            Tool::Pen => ToolBehavior {
                blend: BlendMode::SourceOver,
                commit: CommitStrategy::Incremental,
                smoothing: true,
            },
            Tool::Eraser => ToolBehavior {
                blend: BlendMode::Clear,
                commit: CommitStrategy::Incremental,
                smoothing: false,
            },
            Tool::Highlighter => ToolBehavior {
                blend: BlendMode::Lighten,
                commit: CommitStrategy::Incremental,
                smoothing: true,
            },
            Tool::Line | Tool::Rect | Tool::Ellipse => ToolBehavior {
                blend: BlendMode::SourceOver,
                commit: CommitStrategy::OnRelease,
                smoothing: false,
            },
        }
    }

    pub const fn is_freehand(self) -> bool {
        matches!(self.behavior().commit, CommitStrategy::Incremental)
    }

    pub fn label(self) -> &'static str {
        match self {
            Tool::Pen => "pen",
            Tool::Eraser => "eraser",
            Tool::Highlighter => "highlighter",
            Tool::Line => "line",
            Tool::Rect => "rect",
            Tool::Ellipse => "ellipse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

/// Dash pattern used by pen strokes and by shape previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dash,
    Dot,
}

impl LineStyle {
    /// On/off lengths in multiples of the stroke width.
    pub fn pattern(self) -> Option<[f32; 2]> {
        match self {
            LineStyle::Solid => None,
            LineStyle::Dash => Some([4.0, 2.0]),
            LineStyle::Dot => Some([1.0, 2.0]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeStyle {
    pub width: u32,
    pub color: Color,
    pub line_style: LineStyle,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 4,
            color: Color::rgba(255, 0, 0, 255),
            line_style: LineStyle::Solid,
        }
    }
}

/// Rectangle spanned by two drag corners, independent of drag direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl NormalizedRect {
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        let x = a.0.min(b.0);
        let y = a.1.min(b.1);
        Self {
            x,
            y,
            width: a.0.max(b.0) - x,
            height: a.1.max(b.1) - y,
        }
    }

    pub fn top_left(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn bottom_right(&self) -> (i32, i32) {
        (self.x + self.width, self.y + self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Geometry {
    Freehand { points: Vec<(i32, i32)> },
    Line { start: (i32, i32), end: (i32, i32) },
    Rect(NormalizedRect),
    Ellipse(NormalizedRect),
}

/// A finalized stroke, reported back to the shell once it reaches the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stroke {
    pub tool: Tool,
    pub style: StrokeStyle,
    pub geometry: Geometry,
}

impl Stroke {
    pub fn is_zero_length(&self) -> bool {
        match &self.geometry {
            Geometry::Freehand { points } => points.windows(2).all(|pair| pair[0] == pair[1]),
            Geometry::Line { start, end } => start == end,
            Geometry::Rect(rect) | Geometry::Ellipse(rect) => rect.width == 0 && rect.height == 0,
        }
    }
}
