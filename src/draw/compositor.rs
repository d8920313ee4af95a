use crate::draw::composite::RgbaBuffer;
use crate::draw::model::{
    Color, CommitStrategy, Geometry, LineStyle, NormalizedRect, Stroke, StrokeStyle, Tool,
    HIGHLIGHTER_ALPHA,
};
use crate::draw::render::{self, Dash, DirtyRect, ShapePreview};
use std::ops::RangeInclusive;

pub const BRUSH_WIDTH_RANGE: RangeInclusive<u32> = 1..=50;
pub const ERASER_WIDTH_RANGE: RangeInclusive<u32> = 1..=50;
pub const SMOOTHING_FACTOR_MAX: u8 = 10;
const DEFAULT_SMOOTHING_FACTOR: u8 = 5;

fn clamp_to(value: i64, range: &RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start() as i64, *range.end() as i64) as u32
}

/// Low-pass filter pulling each pointer sample towards the last drawn point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Smoothing {
    enabled: bool,
    factor: u8,
    last_nonzero_factor: u8,
}

impl Default for Smoothing {
    fn default() -> Self {
        Self {
            enabled: false,
            factor: 0,
            last_nonzero_factor: DEFAULT_SMOOTHING_FACTOR,
        }
    }
}

impl Smoothing {
    pub fn new(enabled: bool, factor: i64) -> Self {
        let mut smoothing = Self::default();
        smoothing.set_factor(factor);
        smoothing.set_enabled(enabled);
        smoothing
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn factor(&self) -> u8 {
        self.factor
    }

    pub fn set_factor(&mut self, factor: i64) {
        self.factor = factor.clamp(0, SMOOTHING_FACTOR_MAX as i64) as u8;
        if self.factor > 0 {
            self.last_nonzero_factor = self.factor;
        }
    }

    /// Enabling with a zero factor restores the last non-zero factor.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled && self.factor == 0 {
            self.factor = self.last_nonzero_factor;
        }
    }

    pub fn is_active(&self) -> bool {
        self.enabled && self.factor > 0
    }

    /// `last_drawn + (raw - last_drawn) * (1 - factor / 10)`, truncated.
    pub fn apply(&self, last_drawn: (i32, i32), raw: (i32, i32)) -> (i32, i32) {
        if !self.is_active() {
            return raw;
        }
        let keep = 1.0 - self.factor as f64 / SMOOTHING_FACTOR_MAX as f64;
        let x = last_drawn.0 as f64 + (raw.0 - last_drawn.0) as f64 * keep;
        let y = last_drawn.1 as f64 + (raw.1 - last_drawn.1) as f64 * keep;
        (x.trunc() as i32, y.trunc() as i32)
    }
}

/// Tool and brush settings the toolbar mutates between strokes.
///
/// Every setter clamps to the supported range instead of trusting the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingSession {
    tool: Tool,
    color: Color,
    brush_width: u32,
    eraser_width: u32,
    opacity: u8,
    line_style: LineStyle,
    pub smoothing: Smoothing,
}

impl Default for DrawingSession {
    fn default() -> Self {
        Self {
            tool: Tool::Pen,
            color: Color::rgba(255, 0, 0, 255),
            brush_width: 4,
            eraser_width: 20,
            opacity: 255,
            line_style: LineStyle::Solid,
            smoothing: Smoothing::default(),
        }
    }
}

impl DrawingSession {
    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Base color; its alpha is replaced by the session opacity when drawing.
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn brush_width(&self) -> u32 {
        self.brush_width
    }

    pub fn set_brush_width(&mut self, width: i64) {
        self.brush_width = clamp_to(width, &BRUSH_WIDTH_RANGE);
    }

    pub fn eraser_width(&self) -> u32 {
        self.eraser_width
    }

    pub fn set_eraser_width(&mut self, width: i64) {
        self.eraser_width = clamp_to(width, &ERASER_WIDTH_RANGE);
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: i64) {
        self.opacity = opacity.clamp(0, 255) as u8;
    }

    pub fn line_style(&self) -> LineStyle {
        self.line_style
    }

    pub fn set_line_style(&mut self, style: LineStyle) {
        self.line_style = style;
    }

    pub fn stroke_style(&self, tool: Tool) -> StrokeStyle {
        match tool {
            Tool::Pen => StrokeStyle {
                width: self.brush_width,
                color: self.color.with_alpha(self.opacity),
                line_style: self.line_style,
            },
            Tool::Eraser => StrokeStyle {
                width: self.eraser_width,
                color: Color::TRANSPARENT,
                line_style: LineStyle::Solid,
            },
            Tool::Highlighter => StrokeStyle {
                width: self.brush_width,
                color: self.color.with_alpha(HIGHLIGHTER_ALPHA),
                line_style: LineStyle::Solid,
            },
            Tool::Line | Tool::Rect | Tool::Ellipse => StrokeStyle {
                width: self.brush_width,
                color: self.color.with_alpha(self.opacity),
                line_style: LineStyle::Solid,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveStroke {
    tool: Tool,
    style: StrokeStyle,
    points: Vec<(i32, i32)>,
    last_raw: (i32, i32),
    last_drawn: (i32, i32),
    dash_offset: f32,
}

impl ActiveStroke {
    fn start(&self) -> (i32, i32) {
        self.points[0]
    }
}

fn shape_geometry(tool: Tool, start: (i32, i32), end: (i32, i32)) -> Geometry {
    match tool {
        Tool::Rect => Geometry::Rect(NormalizedRect::from_corners(start, end)),
        Tool::Ellipse => Geometry::Ellipse(NormalizedRect::from_corners(start, end)),
        _ => Geometry::Line { start, end },
    }
}

/// Turns pointer events into overlay pixels for the session's current tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeCompositor {
    active: Option<ActiveStroke>,
}

impl StrokeCompositor {
    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Starts a stroke. A stroke still in progress (its release was never
    /// seen) is finalized first and returned.
    pub fn pointer_down(
        &mut self,
        session: &DrawingSession,
        overlay: &mut RgbaBuffer,
        point: (i32, i32),
    ) -> Option<Stroke> {
        let unfinished = self.finish(session, overlay);
        let tool = session.tool();
        tracing::debug!(tool = tool.label(), ?point, "stroke start");
        self.active = Some(ActiveStroke {
            tool,
            style: session.stroke_style(tool),
            points: vec![point],
            last_raw: point,
            last_drawn: point,
            dash_offset: 0.0,
        });
        unfinished
    }

    /// Freehand tools draw one segment into the overlay; shape tools only move
    /// their preview end point.
    pub fn pointer_move(
        &mut self,
        session: &DrawingSession,
        overlay: &mut RgbaBuffer,
        point: (i32, i32),
    ) -> Option<DirtyRect> {
        let stroke = self.active.as_mut()?;
        let behavior = stroke.tool.behavior();

        if behavior.commit == CommitStrategy::OnRelease {
            stroke.points.truncate(1);
            stroke.points.push(point);
            stroke.last_raw = point;
            return None;
        }

        let target = if behavior.smoothing {
            session.smoothing.apply(stroke.last_drawn, point)
        } else {
            point
        };
        stroke.last_raw = point;
        if target == stroke.last_drawn {
            return None;
        }

        let dash = Dash::for_style(stroke.style.line_style, stroke.style.width, stroke.dash_offset);
        let (dirty, length) = render::draw_segment(
            overlay,
            stroke.last_drawn,
            target,
            stroke.style.width,
            stroke.style.color,
            behavior.blend,
            dash,
        );
        stroke.dash_offset += length;
        stroke.last_drawn = target;
        stroke.points.push(target);
        dirty
    }

    /// Finalizes the stroke at `point`. Shape tools draw their geometry here
    /// using the session style as it is at release time.
    pub fn pointer_up(
        &mut self,
        session: &DrawingSession,
        overlay: &mut RgbaBuffer,
        point: (i32, i32),
    ) -> Option<Stroke> {
        let moved = self
            .active
            .as_ref()
            .is_some_and(|stroke| stroke.last_raw != point);
        if moved {
            let _ = self.pointer_move(session, overlay, point);
        }
        self.finish(session, overlay)
    }

    /// Finalizes whatever has been drawn so far without a new position. Used
    /// for focus loss, release outside the window and resizes mid-drag.
    pub fn finish(&mut self, session: &DrawingSession, overlay: &mut RgbaBuffer) -> Option<Stroke> {
        let stroke = self.active.take()?;
        let finished = if stroke.tool.is_freehand() {
            Stroke {
                tool: stroke.tool,
                style: stroke.style,
                geometry: Geometry::Freehand {
                    points: stroke.points,
                },
            }
        } else {
            let end = stroke.points.last().copied().unwrap_or(stroke.last_raw);
            let committed = Stroke {
                tool: stroke.tool,
                style: session.stroke_style(stroke.tool),
                geometry: shape_geometry(stroke.tool, stroke.start(), end),
            };
            if !committed.is_zero_length() {
                let _ = render::draw_geometry(
                    overlay,
                    &committed.geometry,
                    committed.style,
                    committed.tool.behavior().blend,
                    None,
                );
            }
            committed
        };
        tracing::debug!(
            tool = finished.tool.label(),
            zero_length = finished.is_zero_length(),
            "stroke finished"
        );
        Some(finished)
    }

    /// Dashed preview of the shape being dragged, drawn outside the overlay.
    pub fn preview(&self, session: &DrawingSession) -> Option<ShapePreview> {
        let stroke = self.active.as_ref()?;
        if stroke.tool.is_freehand() {
            return None;
        }
        let end = stroke.points.last().copied()?;
        Some(ShapePreview {
            geometry: shape_geometry(stroke.tool, stroke.start(), end),
            style: session.stroke_style(stroke.tool),
        })
    }
}
