use crate::draw::model::{BlendMode, Color};
use anyhow::{anyhow, Result};
use image::imageops::FilterType;
use image::RgbaImage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaBuffer {
    pub fn new(width: u32, height: u32, fill: Color) -> Self {
        let mut pixels = vec![0u8; (width as usize) * (height as usize) * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[fill.r, fill.g, fill.b, fill.a]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn transparent(width: u32, height: u32) -> Self {
        Self::new(width, height, Color::TRANSPARENT)
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if pixels.len() != expected {
            return Err(anyhow!(
                "pixel buffer for {width}x{height} must hold {expected} bytes, got {}",
                pixels.len()
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("pixel buffer does not match {}x{}", self.width, self.height))
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn memory_bytes(&self) -> usize {
        self.pixels.len()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + x as usize) * 4
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let idx = self.index(x, y);
        Color {
            r: self.pixels[idx],
            g: self.pixels[idx + 1],
            b: self.pixels[idx + 2],
            a: self.pixels[idx + 3],
        }
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: Color) {
        let idx = self.index(x, y);
        self.pixels[idx..idx + 4].copy_from_slice(&[color.r, color.g, color.b, color.a]);
    }

    /// Combines `color` into the pixel at `(x, y)`; coordinates outside the
    /// buffer are ignored.
    pub fn blend_at(&mut self, x: i32, y: i32, mode: BlendMode, color: Color) {
        if !self.contains(x, y) {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        let blended = blend_pixel(mode, self.pixel(x, y), color);
        self.put_pixel(x, y, blended);
    }

    pub fn fill(&mut self, color: Color) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    /// New transparent buffer of `size` with this buffer's pixels copied at the
    /// origin. Pixels outside the new bounds are dropped.
    pub fn resized_canvas(&self, size: (u32, u32)) -> Self {
        let mut out = Self::transparent(size.0, size.1);
        let copy_w = self.width.min(size.0) as usize;
        let copy_h = self.height.min(size.1);
        for y in 0..copy_h {
            let src = self.index(0, y);
            let dst = out.index(0, y);
            out.pixels[dst..dst + copy_w * 4].copy_from_slice(&self.pixels[src..src + copy_w * 4]);
        }
        out
    }

    /// Smoothly resamples to exactly `size`, ignoring the aspect ratio.
    pub fn scaled(&self, size: (u32, u32)) -> Self {
        if size == self.size() {
            return self.clone();
        }
        if size.0 == 0 || size.1 == 0 || self.width == 0 || self.height == 0 {
            return Self::transparent(size.0, size.1);
        }
        match self.to_rgba_image() {
            Ok(image) => Self::from_rgba_image(image::imageops::resize(
                &image,
                size.0,
                size.1,
                FilterType::Triangle,
            )),
            Err(err) => {
                tracing::warn!(?err, "resample skipped for inconsistent buffer");
                Self::transparent(size.0, size.1)
            }
        }
    }

    /// Source-over draws `top` onto this buffer with its origin at `offset`.
    pub fn draw_over(&mut self, top: &RgbaBuffer, offset: (i32, i32)) {
        for ty in 0..top.height {
            let y = ty as i32 + offset.1;
            if y < 0 || y >= self.height as i32 {
                continue;
            }
            for tx in 0..top.width {
                let x = tx as i32 + offset.0;
                if x < 0 || x >= self.width as i32 {
                    continue;
                }
                let src = top.pixel(tx, ty);
                if src.a == 0 {
                    continue;
                }
                let dst = self.pixel(x as u32, y as u32);
                self.put_pixel(x as u32, y as u32, source_over(dst, src));
            }
        }
    }

    /// True when any pixel carries non-zero alpha.
    pub fn has_visible_content(&self) -> bool {
        self.pixels.chunks_exact(4).any(|px| px[3] != 0)
    }
}


pub fn blend_pixel(mode: BlendMode, bottom: Color, top: Color) -> Color {
    match mode {
        BlendMode::SourceOver => source_over(bottom, top),
        BlendMode::Clear => Color::TRANSPARENT,
        BlendMode::Lighten => Color {
            r: bottom.r.max(top.r),
            g: bottom.g.max(top.g),
            b: bottom.b.max(top.b),
            a: bottom.a.max(top.a),
        },
    }
}

fn source_over(bottom: Color, top: Color) -> Color {
    let sa = top.a as f32 / 255.0;
    let da = bottom.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= f32::EPSILON {
        return Color::TRANSPARENT;
    }

    let blend = |s: u8, d: u8| -> u8 {
        (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Color {
        r: blend(top.r, bottom.r),
        g: blend(top.g, bottom.g),
        b: blend(top.b, bottom.b),
        a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}
