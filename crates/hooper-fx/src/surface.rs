#![forbid(unsafe_code)]

//! Canvas geometry and an in-memory RGBA surface.
//!
//! [`CanvasGeometry`] decides how wide the drawing surface must be so that
//! travelling particles are never clipped, and where the undisplaced image
//! sits inside it. [`PixelSurface`] is a software framebuffer the renderer
//! can draw into off-screen (tests, the demo harness, checksums).

use crate::color::PackedRgba;
use crate::config::{DissolveConfig, PaddingMode};
use crate::kernel::VISIBILITY_FLOOR;
use crate::raster::Raster;

const FNV64_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3;
const SURFACE_HASH_ALGO: &str = "fnv1a64";

// ---------------------------------------------------------------------------
// CanvasGeometry
// ---------------------------------------------------------------------------

/// Surface size and image placement for one source image and config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasGeometry {
    pub image_width: u32,
    pub image_height: u32,
    pub pad_left: u32,
    pub pad_right: u32,
}

impl CanvasGeometry {
    /// Lay out the surface for an image of `image_width x image_height`.
    ///
    /// The side particles travel toward always gets at least
    /// [`min_travel_padding`](Self::min_travel_padding) px.
    #[must_use]
    pub fn for_config(image_width: u32, image_height: u32, config: &DissolveConfig) -> Self {
        let budget = config.canvas_padding_x;
        let (travel, trailing) = match config.padding_mode {
            PaddingMode::Directional => (budget, 0),
            PaddingMode::Symmetric => {
                let half = budget / 2;
                (budget - half, half)
            }
        };
        let travel = travel.max(Self::min_travel_padding(config));
        let (pad_left, pad_right) = if config.travels_right() {
            (trailing, travel)
        } else {
            (travel, trailing)
        };
        Self {
            image_width,
            image_height,
            pad_left,
            pad_right,
        }
    }

    /// Padding the travel side needs so no visible particle is clipped.
    ///
    /// A particle stops being drawn once its opacity drops under
    /// [`VISIBILITY_FLOOR`], which happens at local progress
    /// `(1 - floor) / fade`. Past that point its reach no longer matters.
    #[must_use]
    pub fn min_travel_padding(config: &DissolveConfig) -> u32 {
        let last_visible_local = if config.fade_intensity > 0.0 {
            ((1.0 - VISIBILITY_FLOOR) / config.fade_intensity).min(1.0)
        } else {
            1.0
        };
        let eased = last_visible_local.powf(config.acceleration_power);
        let travel = (eased * config.max_travel()).ceil();
        let travel = if travel >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            travel as u32
        };
        travel.saturating_add(config.particle_draw_size)
    }

    /// Full surface width.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image_width
            .saturating_add(self.pad_left)
            .saturating_add(self.pad_right)
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image_height
    }

    /// Surface x of image column 0.
    #[inline]
    #[must_use]
    pub fn origin_x(&self) -> u32 {
        self.pad_left
    }

    /// CSS `left` offset that keeps the undisplaced image in place.
    #[inline]
    #[must_use]
    pub fn css_offset_x(&self) -> f64 {
        -f64::from(self.pad_left)
    }

    /// Zero-sized surfaces cannot be laid out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

// ---------------------------------------------------------------------------
// PixelSurface
// ---------------------------------------------------------------------------

/// Row-major straight-alpha framebuffer, cleared to transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<PackedRgba>,
}

impl PixelSurface {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![PackedRgba::TRANSPARENT; width as usize * height as usize],
        }
    }

    /// A surface sized for `geometry`.
    #[must_use]
    pub fn for_geometry(geometry: &CanvasGeometry) -> Self {
        Self::new(geometry.width(), geometry.height())
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
    pub fn pixels(&self) -> &[PackedRgba] {
        &self.pixels
    }

    /// Resize and clear to transparent.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            self.clear();
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels
            .resize(width as usize * height as usize, PackedRgba::TRANSPARENT);
    }

    pub fn clear(&mut self) {
        self.pixels.fill(PackedRgba::TRANSPARENT);
    }

    #[inline]
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Pixel at `(x, y)`, transparent outside the surface.
    #[inline]
    #[must_use]
    pub fn get_pixel(&self, x: i64, y: i64) -> PackedRgba {
        self.index(x, y)
            .map_or(PackedRgba::TRANSPARENT, |i| self.pixels[i])
    }

    /// Overwrite one pixel; out-of-bounds writes are dropped.
    #[inline]
    pub fn set_pixel(&mut self, x: i64, y: i64, color: PackedRgba) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Source-over one pixel.
    #[inline]
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: PackedRgba) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color.over(self.pixels[i]);
        }
    }

    /// Source-over a `size x size` square with its top-left at `(x, y)`,
    /// clipped to the surface.
    pub fn fill_rect(&mut self, x: i64, y: i64, size: u32, color: PackedRgba) {
        if color.a() == 0 || size == 0 {
            return;
        }
        let size = i64::from(size);
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + size).min(i64::from(self.width));
        let y1 = (y + size).min(i64::from(self.height));
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, color);
            }
        }
    }

    /// Number of pixels with non-zero alpha.
    #[must_use]
    pub fn painted_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| p.a() != 0).count()
    }

    /// Flatten to `[r, g, b, a]` bytes in row-major order.
    #[must_use]
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            out.extend_from_slice(&[p.r(), p.g(), p.b(), p.a()]);
        }
        out
    }

    /// Copy into a [`Raster`], e.g. for PNG export.
    #[must_use]
    pub fn to_raster(&self) -> Raster {
        Raster::from_rgba(self.width, self.height, self.to_rgba_bytes())
    }

    /// Stable content hash: `"fnv1a64:<16 hex digits>"`.
    ///
    /// Covers the dimensions and every pixel, so identical image, config and
    /// progress always hash the same.
    #[must_use]
    pub fn checksum(&self) -> String {
        let mut hash = FNV64_OFFSET_BASIS;
        hash = fnv1a64_extend(hash, &self.width.to_le_bytes());
        hash = fnv1a64_extend(hash, &self.height.to_le_bytes());
        for p in &self.pixels {
            hash = fnv1a64_extend(hash, &p.0.to_le_bytes());
        }
        format!("{SURFACE_HASH_ALGO}:{hash:016x}")
    }
}

#[must_use]
fn fnv1a64_extend(mut hash: u64, bytes: &[u8]) -> u64 {
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV64_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directional_padding_goes_on_travel_side() {
        let cfg = DissolveConfig::default();
        let g = CanvasGeometry::for_config(300, 200, &cfg);
        assert_eq!((g.pad_left, g.pad_right), (0, 500));
        assert_eq!(g.width(), 800);
        assert_eq!(g.css_offset_x(), 0.0);

        let cfg = cfg.with_max_displacement(-150.0);
        let g = CanvasGeometry::for_config(300, 200, &cfg);
        assert_eq!((g.pad_left, g.pad_right), (500, 0));
        assert_eq!(g.origin_x(), 500);
        assert_eq!(g.css_offset_x(), -500.0);
    }

    #[test]
    fn symmetric_padding_splits_budget() {
        let cfg = DissolveConfig::default()
            .with_max_displacement(-10.0)
            .with_padding(101, PaddingMode::Symmetric);
        let g = CanvasGeometry::for_config(10, 10, &cfg);
        assert_eq!((g.pad_left, g.pad_right), (51, 50));
    }

    #[test]
    fn travel_side_grows_to_fit_reach() {
        let cfg = DissolveConfig::hero_portrait();
        let g = CanvasGeometry::for_config(400, 600, &cfg);
        // Hero particles are invisible long before their full reach.
        assert_eq!(g.pad_right, 1000);
        assert_eq!(g.pad_left, 0);
        assert!(CanvasGeometry::min_travel_padding(&cfg) < 1000);

        let cfg = DissolveConfig::default()
            .with_max_displacement(99.5)
            .with_draw_size(3)
            .with_fade_intensity(0.0)
            .with_padding(0, PaddingMode::Directional);
        assert_eq!(CanvasGeometry::min_travel_padding(&cfg), 103);
        let g = CanvasGeometry::for_config(10, 10, &cfg);
        assert_eq!((g.pad_left, g.pad_right), (0, 103));

        let cfg = cfg.with_spread_factor(1.0);
        assert_eq!(CanvasGeometry::min_travel_padding(&cfg), 202);
    }

    #[test]
    fn empty_geometry() {
        let cfg = DissolveConfig::default();
        assert!(CanvasGeometry::for_config(10, 0, &cfg).is_empty());
        assert!(!CanvasGeometry::for_config(0, 10, &cfg).is_empty());
    }

    #[test]
    fn fill_rect_clips_and_blends() {
        let mut s = PixelSurface::new(4, 4);
        s.fill_rect(-1, -1, 2, PackedRgba::WHITE);
        assert_eq!(s.get_pixel(0, 0), PackedRgba::WHITE);
        assert_eq!(s.painted_pixels(), 1);
        s.fill_rect(3, 3, 5, PackedRgba::rgba(255, 0, 0, 255));
        assert_eq!(s.painted_pixels(), 2);
        s.fill_rect(100, 100, 2, PackedRgba::WHITE);
        assert_eq!(s.painted_pixels(), 2);
    }

    #[test]
    fn out_of_bounds_reads_are_transparent() {
        let s = PixelSurface::new(2, 2);
        assert_eq!(s.get_pixel(-1, 0), PackedRgba::TRANSPARENT);
        assert_eq!(s.get_pixel(2, 0), PackedRgba::TRANSPARENT);
    }

    #[test]
    fn checksum_tracks_content_and_size() {
        let mut a = PixelSurface::new(3, 3);
        let b = PixelSurface::new(3, 3);
        assert_eq!(a.checksum(), b.checksum());
        assert!(a.checksum().starts_with("fnv1a64:"));
        assert_eq!(a.checksum().len(), "fnv1a64:".len() + 16);
        a.set_pixel(1, 1, PackedRgba::WHITE);
        assert_ne!(a.checksum(), b.checksum());
        assert_ne!(PixelSurface::new(1, 9).checksum(), b.checksum());
    }

    #[test]
    fn resize_clears() {
        let mut s = PixelSurface::new(2, 2);
        s.set_pixel(0, 0, PackedRgba::WHITE);
        s.resize(2, 2);
        assert_eq!(s.painted_pixels(), 0);
        s.resize(5, 1);
        assert_eq!(s.pixels().len(), 5);
    }

    #[test]
    fn raster_export_matches_pixels() {
        let mut s = PixelSurface::new(2, 1);
        s.set_pixel(1, 0, PackedRgba::rgba(1, 2, 3, 4));
        let r = s.to_raster();
        assert_eq!(r.pixel(1, 0), Some([1, 2, 3, 4]));
        assert_eq!(r.pixel(0, 0), Some([0, 0, 0, 0]));
    }
}
