#![forbid(unsafe_code)]

//! RGBA source rasters.
//!
//! A [`Raster`] is the decoded pixel data the field builder samples. It is
//! dropped as soon as the field is built; nothing downstream keeps pixels.
//!
//! Browser hosts hand over `ImageData` bytes directly through
//! [`Raster::from_rgba`]. Native callers decode PNG/GIF/JPEG with the
//! `image` feature.

#[cfg(feature = "image")]
use crate::error::LoadError;

/// Row-major, 8-bit straight-alpha RGBA pixels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// Wrap raw RGBA bytes.
    ///
    /// The buffer is not checked here; a buffer shorter than
    /// `width * height * 4` makes the raster [`is_readable`](Self::is_readable)
    /// `false`, and the builder then produces an empty field.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Build a raster by evaluating `f(x, y) -> [r, g, b, a]` for every pixel.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Self::from_rgba(width, height, pixels)
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Number of bytes a complete buffer for these dimensions needs.
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Non-zero dimensions and a complete pixel buffer.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.width > 0 && self.height > 0 && self.pixels.len() >= self.expected_len()
    }

    /// RGBA at `(x, y)`, or `None` outside the raster or past a short buffer.
    #[inline]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.pixels.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Decode PNG/GIF/JPEG bytes.
    #[cfg(feature = "image")]
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadError> {
        let img = image::load_from_memory(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
        Ok(Self::from(img.to_rgba8()))
    }

    /// Read and decode an image file.
    #[cfg(feature = "image")]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| LoadError::Io(format!("{}: {e}", path.display())))?;
        Self::decode(&bytes)
    }

    /// Convert into an `image` buffer, e.g. for PNG export.
    ///
    /// Returns `None` when the pixel buffer is incomplete.
    #[cfg(feature = "image")]
    #[must_use]
    pub fn into_rgba_image(self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels)
    }
}

#[cfg(feature = "image")]
impl From<image::RgbaImage> for Raster {
    fn from(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_rgba(width, height, img.into_raw())
    }
}

/// Dimensions and buffer fill, for log lines.
pub(crate) fn describe(raster: &Raster) -> String {
    format!(
        "{}x{} ({} of {} bytes)",
        raster.width,
        raster.height,
        raster.pixels.len(),
        raster.expected_len()
    )
}
