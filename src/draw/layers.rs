use crate::draw::composite::RgbaBuffer;
use crate::draw::model::Color;
use anyhow::{Context, Result};

pub const MIN_BACKGROUND_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundPlacement {
    /// Keep the captured size and center it in the window.
    #[default]
    Centered,
    /// Stretch to the window size, ignoring the aspect ratio.
    FillWindow,
}

/// Owns the background reference image and the transparent overlay.
///
/// Background moves and scales never touch the overlay: annotations live in
/// window coordinates.
#[derive(Debug, Clone)]
pub struct LayerStore {
    window_size: (u32, u32),
    background_source: RgbaBuffer,
    background: RgbaBuffer,
    background_offset: (i32, i32),
    placement: BackgroundPlacement,
    overlay: RgbaBuffer,
}

impl LayerStore {
    pub fn new(window_size: (u32, u32)) -> Self {
        let white = white_fallback(window_size);
        Self {
            window_size,
            background_source: white.clone(),
            background: white,
            background_offset: (0, 0),
            placement: BackgroundPlacement::FillWindow,
            overlay: RgbaBuffer::transparent(window_size.0, window_size.1),
        }
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    pub fn overlay(&self) -> &RgbaBuffer {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut RgbaBuffer {
        &mut self.overlay
    }

    pub fn background(&self) -> &RgbaBuffer {
        &self.background
    }

    pub fn background_offset(&self) -> (i32, i32) {
        self.background_offset
    }

    pub fn placement(&self) -> BackgroundPlacement {
        self.placement
    }

    /// Stores a copy of `image` as the background, or an opaque white buffer
    /// filling the window when there is none.
    pub fn load_background(&mut self, image: Option<&RgbaBuffer>, placement: BackgroundPlacement) {
        let (source, placement) = match image {
            Some(image) if image.width > 0 && image.height > 0 => (image.clone(), placement),
            Some(_) => {
                tracing::warn!("empty background image, using white fallback");
                (white_fallback(self.window_size), BackgroundPlacement::FillWindow)
            }
            None => (white_fallback(self.window_size), BackgroundPlacement::FillWindow),
        };
        self.placement = placement;

        self.background = match placement {
            BackgroundPlacement::Centered => source.clone(),
            BackgroundPlacement::FillWindow => source.scaled(self.window_size),
        };
        self.background_source = source;
        self.background_offset = match placement {
            BackgroundPlacement::Centered => centered_offset(self.window_size, self.background.size()),
            BackgroundPlacement::FillWindow => (0, 0),
        };
        tracing::debug!(
            width = self.background.width,
            height = self.background.height,
            offset = ?self.background_offset,
            "background loaded"
        );
    }

    /// Decodes an encoded image (PNG) as the background. Decoding failures
    /// fall back to white instead of failing the load.
    pub fn load_background_bytes(&mut self, bytes: &[u8], placement: BackgroundPlacement) {
        match decode_background(bytes) {
            Ok(image) => self.load_background(Some(&image), placement),
            Err(err) => {
                tracing::warn!(?err, "background decode failed, using white fallback");
                self.load_background(None, placement);
            }
        }
    }

    /// Replaces the overlay with a transparent buffer of `size` holding the old
    /// content at the origin, then re-applies the background placement.
    pub fn resize_overlay(&mut self, size: (u32, u32)) {
        let previous = self.window_size;
        if size != self.overlay.size() {
            self.overlay = self.overlay.resized_canvas(size);
            tracing::debug!(width = size.0, height = size.1, "overlay resized");
        }
        self.window_size = size;
        if size != previous {
            self.follow_window(previous);
        }
    }

    /// A stretched background is stretched again; a centered one shifts by
    /// the change in centering so any pan is kept.
    fn follow_window(&mut self, previous: (u32, u32)) {
        match self.placement {
            BackgroundPlacement::FillWindow => {
                self.background = self.background_source.scaled(self.window_size);
                self.background_offset = (0, 0);
            }
            BackgroundPlacement::Centered => {
                let image = self.background.size();
                let before = centered_offset(previous, image);
                let after = centered_offset(self.window_size, image);
                self.background_offset.0 += after.0 - before.0;
                self.background_offset.1 += after.1 - before.1;
            }
        }
    }

    pub fn replace_overlay(&mut self, overlay: RgbaBuffer) {
        self.overlay = if overlay.size() == self.window_size {
            overlay
        } else {
            overlay.resized_canvas(self.window_size)
        };
    }

    pub fn clear_overlay(&mut self) {
        self.overlay.fill(Color::TRANSPARENT);
    }

    pub fn move_background(&mut self, delta: (i32, i32)) {
        self.background_offset.0 += delta.0;
        self.background_offset.1 += delta.1;
    }

    /// Rescales the background from the originally loaded image so repeated
    /// resizes do not accumulate blur.
    pub fn resize_background(&mut self, size: (u32, u32), preserve_aspect_ratio: bool) {
        let requested = (
            size.0.max(MIN_BACKGROUND_SIZE),
            size.1.max(MIN_BACKGROUND_SIZE),
        );
        let target = if preserve_aspect_ratio {
            fit_preserving_aspect(self.background_source.size(), requested)
        } else {
            requested
        };
        self.background = self.background_source.scaled(target);
        tracing::debug!(width = target.0, height = target.1, "background resized");
    }
}

fn white_fallback(size: (u32, u32)) -> RgbaBuffer {
    RgbaBuffer::new(size.0, size.1, Color::WHITE)
}

fn centered_offset(window: (u32, u32), image: (u32, u32)) -> (i32, i32) {
    (
        (window.0 as i32 - image.0 as i32) / 2,
        (window.1 as i32 - image.1 as i32) / 2,
    )
}

/// Largest size with `source`'s aspect ratio that fits inside `bounds`.
pub fn fit_preserving_aspect(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    if source.0 == 0 || source.1 == 0 {
        return bounds;
    }
    let scale_w = bounds.0 as f64 / source.0 as f64;
    let scale_h = bounds.1 as f64 / source.1 as f64;
    let scale = scale_w.min(scale_h);
    (
        ((source.0 as f64 * scale).round() as u32).clamp(1, bounds.0.max(1)),
        ((source.1 as f64 * scale).round() as u32).clamp(1, bounds.1.max(1)),
    )
}

fn decode_background(bytes: &[u8]) -> Result<RgbaBuffer> {
    let image = image::load_from_memory(bytes).context("decode background image")?;
    Ok(RgbaBuffer::from_rgba_image(image.to_rgba8()))
}
