// THEORY:
// `RasterImage` is the immutable input to the aggregation engine. Pixels are
// normalized to RGBA8 once at load time so every band worker walks the same
// flat byte layout. The buffer sits behind an `Arc` and is shared by every
// band worker.

use crate::core_modules::color::color::{CHANNELS, Color};
use image::{DynamicImage, RgbaImage};
use std::sync::Arc;

/// A read-only RGBA raster shared between band workers.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: Arc<RgbaImage>,
    /// Whether the decoded source carried an alpha channel.
    has_alpha: bool,
}

impl RasterImage {
    pub fn from_rgba(buffer: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(buffer),
            has_alpha: true,
        }
    }

    /// Normalizes any decoded image to RGBA8. Sources without alpha become
    /// fully opaque.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self {
            pixels: Arc::new(image.to_rgba8()),
            has_alpha: image.color().has_alpha(),
        }
    }

    /// Builds an image by evaluating `f` at every `(x, y)`.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> Color,
    {
        let buffer = RgbaImage::from_fn(width, height, |x, y| f(x, y).into());
        let has_alpha = buffer.pixels().any(|p| p.0[3] != u8::MAX);
        Self {
            pixels: Arc::new(buffer),
            has_alpha,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        Color::from(*self.pixels.get_pixel(x, y))
    }

    /// The raw bytes of rows `[top, bottom)`, `CHANNELS` bytes per pixel.
    pub fn row_bytes(&self, top: u32, bottom: u32) -> &[u8] {
        let stride = self.stride();
        let raw = self.pixels.as_raw();
        &raw[top as usize * stride..bottom as usize * stride]
    }

    /// Number of bytes in one row.
    pub fn stride(&self) -> usize {
        self.width() as usize * CHANNELS
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Copies rows `[top, bottom)` into a new image of the same width.
    pub fn crop_rows(&self, top: u32, bottom: u32) -> RasterImage {
        let bottom = bottom.min(self.height());
        let top = top.min(bottom);
        let cropped = image::imageops::crop_imm(&*self.pixels, 0, top, self.width(), bottom - top).to_image();
        Self {
            pixels: Arc::new(cropped),
            has_alpha: self.has_alpha,
        }
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        let rgba = DynamicImage::ImageRgba8((*self.pixels).clone());
        if self.has_alpha {
            rgba
        } else {
            DynamicImage::ImageRgb8(rgba.to_rgb8())
        }
    }
}
