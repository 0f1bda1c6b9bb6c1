use std::fmt;
use std::sync::Arc;

use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::{LightboxError, Result};
use crate::layout::Size;

/// A decoded RGBA image ready for display.
///
/// Pixels are shared, so clones are cheap and two clones compare equal by
/// identity via [`Bitmap::same_pixels`].
#[derive(Clone)]
pub struct Bitmap {
    pixels: Arc<RgbaImage>,
}

impl Bitmap {
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(image),
        }
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::from_rgba_image(image.into_rgba8())
    }

    /// Wrap a tightly packed RGBA8 buffer.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let len = data.len();
        RgbaImage::from_raw(width, height, data)
            .map(Self::from_rgba_image)
            .ok_or(LightboxError::InvalidBitmap { width, height, len })
    }

    /// A bitmap of `width`x`height` filled with one colour.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self::from_rgba_image(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Natural size in view points (one point per pixel).
    pub fn size(&self) -> Size {
        Size::new(self.width() as f64, self.height() as f64)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.size().aspect_ratio()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Estimated memory usage in bytes.
    pub fn byte_len(&self) -> usize {
        self.pixels.as_raw().len()
    }

    pub fn same_pixels(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl From<DynamicImage> for Bitmap {
    fn from(image: DynamicImage) -> Self {
        Self::from_dynamic(image)
    }
}
