use serde::{Deserialize, Serialize};

use crate::draw::compositor::{
    DrawingSession, Smoothing, BRUSH_WIDTH_RANGE, ERASER_WIDTH_RANGE, SMOOTHING_FACTOR_MAX,
};
use crate::draw::model::{Color, LineStyle, Tool};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrawSettings {
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default = "default_last_tool")]
    pub last_tool: Tool,
    #[serde(default = "default_last_color")]
    pub last_color: Color,
    #[serde(default = "default_quick_colors")]
    #[serde(alias = "pen_colors")]
    pub quick_colors: Vec<Color>,
    #[serde(default = "default_brush_width")]
    pub brush_width: u32,
    #[serde(default = "default_eraser_width")]
    #[serde(alias = "eraser_size")]
    pub eraser_width: u32,
    #[serde(default = "default_brush_opacity")]
    pub brush_opacity: u32,
    #[serde(default)]
    pub smoothing_enabled: bool,
    #[serde(default = "default_smoothing_factor")]
    #[serde(alias = "initial_smoothing_factor")]
    pub smoothing_factor: u32,
    #[serde(default)]
    pub line_style: LineStyle,
    #[serde(default = "default_canvas_background_color")]
    pub canvas_background_color: Color,
    #[serde(default = "default_autosave_enabled")]
    pub autosave_enabled: bool,
}

fn default_last_tool() -> Tool {
    Tool::Pen
}

fn default_last_color() -> Color {
    Color::rgba(255, 0, 0, 255)
}

fn default_quick_colors() -> Vec<Color> {
    vec![
        Color::rgba(255, 0, 0, 255),
        Color::rgba(0, 0, 255, 255),
        Color::rgba(0, 0, 0, 255),
        Color::rgba(0, 128, 0, 255),
        Color::rgba(128, 0, 128, 255),
        Color::rgba(255, 165, 0, 255),
    ]
}

fn default_brush_width() -> u32 {
    4
}

fn default_eraser_width() -> u32 {
    20
}

fn default_brush_opacity() -> u32 {
    255
}

fn default_smoothing_factor() -> u32 {
    5
}

fn default_canvas_background_color() -> Color {
    Color::rgba(245, 245, 245, 255)
}

fn default_autosave_enabled() -> bool {
    true
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            last_tool: default_last_tool(),
            last_color: default_last_color(),
            quick_colors: default_quick_colors(),
            brush_width: default_brush_width(),
            eraser_width: default_eraser_width(),
            brush_opacity: default_brush_opacity(),
            smoothing_enabled: false,
            smoothing_factor: default_smoothing_factor(),
            line_style: LineStyle::Solid,
            canvas_background_color: default_canvas_background_color(),
            autosave_enabled: default_autosave_enabled(),
        }
    }
}

fn clamp_field(value: &mut u32, min: u32, max: u32) -> bool {
    let next = (*value).clamp(min, max);
    let changed = next != *value;
    *value = next;
    changed
}

impl DrawSettings {
    /// Pulls every numeric field back into its supported range. Returns
    /// whether anything had to change.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;
        changed |= clamp_field(
            &mut self.brush_width,
            *BRUSH_WIDTH_RANGE.start(),
            *BRUSH_WIDTH_RANGE.end(),
        );
        changed |= clamp_field(
            &mut self.eraser_width,
            *ERASER_WIDTH_RANGE.start(),
            *ERASER_WIDTH_RANGE.end(),
        );
        changed |= clamp_field(&mut self.brush_opacity, 0, 255);
        changed |= clamp_field(&mut self.smoothing_factor, 0, SMOOTHING_FACTOR_MAX as u32);

        if self.quick_colors.is_empty() {
            self.quick_colors = default_quick_colors();
            changed = true;
        }

        if changed {
            tracing::warn!("draw settings contained out-of-range values; clamped");
        }
        changed
    }

    pub fn to_session(&self) -> DrawingSession {
        let mut session = DrawingSession::default();
        session.set_tool(self.last_tool);
        session.set_color(self.last_color);
        session.set_brush_width(self.brush_width as i64);
        session.set_eraser_width(self.eraser_width as i64);
        session.set_opacity(self.brush_opacity as i64);
        session.set_line_style(self.line_style);
        session.smoothing = Smoothing::new(self.smoothing_enabled, self.smoothing_factor as i64);
        session
    }

    /// Remembers the session's tool and brush so the next launch resumes them.
    pub fn remember_session(&mut self, session: &DrawingSession) {
        self.last_tool = session.tool();
        self.last_color = session.color();
        self.brush_width = session.brush_width();
        self.eraser_width = session.eraser_width();
        self.brush_opacity = session.opacity() as u32;
        self.line_style = session.line_style();
        self.smoothing_enabled = session.smoothing.enabled();
        if session.smoothing.factor() > 0 {
            self.smoothing_factor = session.smoothing.factor() as u32;
        }
    }
}
