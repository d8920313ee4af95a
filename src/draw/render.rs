use crate::draw::composite::RgbaBuffer;
use crate::draw::model::{BlendMode, Color, Geometry, LineStyle, NormalizedRect, StrokeStyle};

const MIN_ELLIPSE_STEPS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DirtyRect {
    pub fn from_points(a: (i32, i32), b: (i32, i32), pad: i32) -> Self {
        let min_x = a.0.min(b.0) - pad;
        let max_x = a.0.max(b.0) + pad;
        let min_y = a.1.min(b.1) - pad;
        let max_y = a.1.max(b.1) + pad;
        Self {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1).max(1),
            height: (max_y - min_y + 1).max(1),
        }
    }

    pub fn union(self, other: DirtyRect) -> DirtyRect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        DirtyRect {
            x: min_x,
            y: min_y,
            width: (max_x - min_x).max(1),
            height: (max_y - min_y).max(1),
        }
    }

    pub fn clamp(self, width: u32, height: u32) -> Option<DirtyRect> {
        let max_w = width as i32;
        let max_h = height as i32;
        let x0 = self.x.clamp(0, max_w);
        let y0 = self.y.clamp(0, max_h);
        let x1 = (self.x + self.width).clamp(0, max_w);
        let y1 = (self.y + self.height).clamp(0, max_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Dash pattern positioned along a path. `offset` is the path length already
/// consumed by earlier segments of the same stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dash {
    pub on: f32,
    pub off: f32,
    pub offset: f32,
}

impl Dash {
    pub fn for_style(style: LineStyle, stroke_width: u32, offset: f32) -> Option<Self> {
        let [on, off] = style.pattern()?;
        let unit = stroke_width.max(1) as f32;
        Some(Self {
            on: on * unit,
            off: off * unit,
            offset,
        })
    }

    fn is_on(&self, distance: f32) -> bool {
        let period = self.on + self.off;
        if period <= f32::EPSILON {
            return true;
        }
        (self.offset + distance).rem_euclid(period) < self.on
    }

    fn advanced(self, distance: f32) -> Self {
        Self {
            offset: self.offset + distance,
            ..self
        }
    }
}

/// Pixel footprint of a stroke, collected before blending so overlapping
/// pieces of one shape touch each pixel exactly once.
struct Coverage {
    bounds: DirtyRect,
    mask: Vec<bool>,
}

impl Coverage {
    fn new(bounds: DirtyRect) -> Self {
        Self {
            bounds,
            mask: vec![false; (bounds.width as usize) * (bounds.height as usize)],
        }
    }

    fn stamp_segment(&mut self, start: (f32, f32), end: (f32, f32), radius: f32, dash: Option<Dash>) {
        let pad = radius.ceil() as i32 + 1;
        let seg_bounds = DirtyRect::from_points(
            (start.0.floor() as i32, start.1.floor() as i32),
            (end.0.ceil() as i32, end.1.ceil() as i32),
            pad,
        );
        let Some(area) = intersect_dirty_rect(seg_bounds, self.bounds) else {
            return;
        };

        let vx = end.0 - start.0;
        let vy = end.1 - start.1;
        let len_sq = vx * vx + vy * vy;
        let len = len_sq.sqrt();
        let radius_sq = radius * radius;

        for y in area.y..(area.y + area.height) {
            for x in area.x..(area.x + area.width) {
                let wx = x as f32 - start.0;
                let wy = y as f32 - start.1;
                let t = if len_sq <= f32::EPSILON {
                    0.0
                } else {
                    ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0)
                };
                let dx = wx - vx * t;
                let dy = wy - vy * t;
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                if let Some(dash) = dash {
                    if !dash.is_on(t * len) {
                        continue;
                    }
                }
                let idx = ((y - self.bounds.y) * self.bounds.width + (x - self.bounds.x)) as usize;
                self.mask[idx] = true;
            }
        }
    }

    fn apply(&self, buffer: &mut RgbaBuffer, mode: BlendMode, color: Color) -> Option<DirtyRect> {
        // (min_x, min_y, max_x, max_y), inclusive
        let mut extent: Option<(i32, i32, i32, i32)> = None;
        for row in 0..self.bounds.height {
            for col in 0..self.bounds.width {
                if !self.mask[(row * self.bounds.width + col) as usize] {
                    continue;
                }
                let x = self.bounds.x + col;
                let y = self.bounds.y + row;
                buffer.blend_at(x, y, mode, color);
                extent = Some(match extent {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        extent.map(|(x0, y0, x1, y1)| DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        })
    }
}

fn intersect_dirty_rect(a: DirtyRect, b: DirtyRect) -> Option<DirtyRect> {
    let x0 = a.x.max(b.x);
    let y0 = a.y.max(b.y);
    let x1 = (a.x + a.width).min(b.x + b.width);
    let y1 = (a.y + a.height).min(b.y + b.height);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(DirtyRect {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    })
}

fn brush_radius(stroke_width: u32) -> f32 {
    (stroke_width.max(1) as f32 / 2.0).max(0.5)
}

fn path_bounds(points: &[(f32, f32)], radius: f32) -> Option<DirtyRect> {
    let pad = radius.ceil() as i32 + 1;
    let mut iter = points.iter();
    let first = iter.next()?;
    let mut rect = DirtyRect::from_points(
        (first.0.floor() as i32, first.1.floor() as i32),
        (first.0.ceil() as i32, first.1.ceil() as i32),
        pad,
    );
    for point in iter {
        rect = rect.union(DirtyRect::from_points(
            (point.0.floor() as i32, point.1.floor() as i32),
            (point.0.ceil() as i32, point.1.ceil() as i32),
            pad,
        ));
    }
    Some(rect)
}

fn segment_length(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}

/// Rasterizes a connected path with round caps and joins and blends it into
/// `buffer` once. Returns the pixels actually touched.
pub fn draw_path(
    buffer: &mut RgbaBuffer,
    points: &[(f32, f32)],
    stroke_width: u32,
    color: Color,
    mode: BlendMode,
    dash: Option<Dash>,
) -> Option<DirtyRect> {
    let radius = brush_radius(stroke_width);
    let bounds = path_bounds(points, radius)?.clamp(buffer.width, buffer.height)?;
    let mut coverage = Coverage::new(bounds);

    if points.len() == 1 {
        coverage.stamp_segment(points[0], points[0], radius, dash);
    }
    let mut dash = dash;
    for pair in points.windows(2) {
        coverage.stamp_segment(pair[0], pair[1], radius, dash);
        dash = dash.map(|d| d.advanced(segment_length(pair[0], pair[1])));
    }

    coverage.apply(buffer, mode, color)
}

/// Draws one freehand segment and reports its length so the caller can keep
/// the dash phase continuous across pointer moves.
pub fn draw_segment(
    buffer: &mut RgbaBuffer,
    start: (i32, i32),
    end: (i32, i32),
    stroke_width: u32,
    color: Color,
    mode: BlendMode,
    dash: Option<Dash>,
) -> (Option<DirtyRect>, f32) {
    let a = (start.0 as f32, start.1 as f32);
    let b = (end.0 as f32, end.1 as f32);
    let dirty = draw_path(buffer, &[a, b], stroke_width, color, mode, dash);
    (dirty, segment_length(a, b))
}

pub fn rect_outline(rect: NormalizedRect) -> Vec<(f32, f32)> {
    let (x0, y0) = (rect.x as f32, rect.y as f32);
    let (x1, y1) = (
        (rect.x + rect.width) as f32,
        (rect.y + rect.height) as f32,
    );
    vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]
}

pub fn ellipse_outline(rect: NormalizedRect) -> Vec<(f32, f32)> {
    let rx = rect.width as f32 * 0.5;
    let ry = rect.height as f32 * 0.5;
    let cx = rect.x as f32 + rx;
    let cy = rect.y as f32 + ry;

    let circumference = std::f32::consts::TAU * rx.max(ry);
    let steps = (circumference / 2.0).ceil().max(MIN_ELLIPSE_STEPS as f32) as usize;
    (0..=steps)
        .map(|step| {
            let t = (step as f32 / steps as f32) * std::f32::consts::TAU;
            (cx + rx * t.cos(), cy + ry * t.sin())
        })
        .collect()
}

pub fn geometry_path(geometry: &Geometry) -> Vec<(f32, f32)> {
    match geometry {
        Geometry::Freehand { points } => points
            .iter()
            .map(|&(x, y)| (x as f32, y as f32))
            .collect(),
        Geometry::Line { start, end } => vec![
            (start.0 as f32, start.1 as f32),
            (end.0 as f32, end.1 as f32),
        ],
        Geometry::Rect(rect) => rect_outline(*rect),
        Geometry::Ellipse(rect) => ellipse_outline(*rect),
    }
}

pub fn draw_geometry(
    buffer: &mut RgbaBuffer,
    geometry: &Geometry,
    style: StrokeStyle,
    mode: BlendMode,
    dash: Option<Dash>,
) -> Option<DirtyRect> {
    draw_path(
        buffer,
        &geometry_path(geometry),
        style.width,
        style.color,
        mode,
        dash,
    )
}

/// Uncommitted shape geometry shown while a shape tool is dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapePreview {
    pub geometry: Geometry,
    pub style: StrokeStyle,
}

impl ShapePreview {
    pub fn draw(&self, frame: &mut RgbaBuffer) -> Option<DirtyRect> {
        let dash = Dash::for_style(LineStyle::Dash, self.style.width, 0.0);
        draw_geometry(frame, &self.geometry, self.style, BlendMode::SourceOver, dash)
    }
}

/// Anything the shell can hand to `render` to receive a composed frame.
pub trait PaintTarget {
    fn present(&mut self, frame: &RgbaBuffer);
}

impl PaintTarget for RgbaBuffer {
    fn present(&mut self, frame: &RgbaBuffer) {
        self.clone_from(frame);
    }
}

/// BGRA frame as expected by DIB-section based window shells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BgraFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PaintTarget for BgraFrame {
    fn present(&mut self, frame: &RgbaBuffer) {
        self.width = frame.width;
        self.height = frame.height;
        self.pixels.resize(frame.pixels.len(), 0);
        convert_rgba_to_dib_bgra(&frame.pixels, &mut self.pixels);
    }
}

pub fn convert_rgba_to_dib_bgra(rgba: &[u8], dib_bgra: &mut [u8]) {
    assert_eq!(rgba.len(), dib_bgra.len());
    for (src, dst) in rgba.chunks_exact(4).zip(dib_bgra.chunks_exact_mut(4)) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
        dst[3] = src[3];
    }
}

/// Layers composed for one repaint, bottom to top.
pub struct FrameLayers<'a> {
    pub fill: Color,
    pub background: Option<(&'a RgbaBuffer, (i32, i32))>,
    pub overlay: &'a RgbaBuffer,
    pub preview: Option<&'a ShapePreview>,
}

pub fn compose_frame(layers: &FrameLayers<'_>) -> RgbaBuffer {
    let mut frame = RgbaBuffer::new(layers.overlay.width, layers.overlay.height, layers.fill);
    if let Some((background, offset)) = layers.background {
        frame.draw_over(background, offset);
    }
    frame.draw_over(layers.overlay, (0, 0));
    if let Some(preview) = layers.preview {
        let _ = preview.draw(&mut frame);
    }
    frame
}
