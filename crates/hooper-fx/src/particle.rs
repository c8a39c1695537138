#![forbid(unsafe_code)]

//! Particle field builder.
//!
//! Sampling walks the raster on a `density`-pixel grid in raster-scan order
//! and promotes every pixel that is both bright enough and opaque enough.
//! Each particle gets a move threshold from its horizontal position, so the
//! activation order is a deterministic sweep across the image rather than
//! noise.

use tracing::debug;

use crate::config::{BrightnessChannel, DissolveConfig};
use crate::kernel::{self, FrameSummary};
use crate::raster::{self, Raster};

/// A sampled pixel must have alpha strictly above this to become a particle.
pub const ALPHA_FLOOR: u8 = 128;

/// One sampled source pixel, animated independently.
///
/// The origin and move threshold are fixed at build time. Position and
/// opacity are rewritten every frame from `(origin, config, progress)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    origin_x: f64,
    origin_y: f64,
    x: f64,
    y: f64,
    opacity: f64,
    move_threshold: f64,
}

impl Particle {
    fn at_rest(origin_x: u32, origin_y: u32, move_threshold: f64) -> Self {
        let (ox, oy) = (f64::from(origin_x), f64::from(origin_y));
        Self {
            origin_x: ox,
            origin_y: oy,
            x: ox,
            y: oy,
            opacity: 1.0,
            move_threshold,
        }
    }

    /// Source-pixel coordinate.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> (f64, f64) {
        (self.origin_x, self.origin_y)
    }

    /// Displayed position as of the last applied frame (image space).
    #[inline]
    #[must_use]
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    #[inline]
    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Scroll progress at which this particle starts to move.
    #[inline]
    #[must_use]
    pub fn move_threshold(&self) -> f64 {
        self.move_threshold
    }
}

/// Brightness of an RGBA pixel per the configured channel.
#[inline]
#[must_use]
pub fn brightness(px: [u8; 4], channel: BrightnessChannel) -> u8 {
    match channel {
        BrightnessChannel::Red => px[0],
        BrightnessChannel::Luma => {
            let luma = 299 * u32::from(px[0]) + 587 * u32::from(px[1]) + 114 * u32::from(px[2]);
            ((luma + 500) / 1000) as u8
        }
    }
}

/// Move threshold for a particle at column `x` of an image `width` wide.
///
/// The leading edge (the side particles travel toward) gets threshold 0 and
/// the trailing edge approaches 1. `curve_power > 1` pushes thresholds toward
/// 0, so more of the image starts early and the trailing edge holds out.
#[inline]
#[must_use]
pub fn move_threshold(x: u32, width: u32, travels_right: bool, curve_power: f64) -> f64 {
    if width == 0 {
        return 0.0;
    }
    let nx = f64::from(x) / f64::from(width);
    let base = if travels_right { 1.0 - nx } else { nx };
    base.powf(curve_power).clamp(0.0, 1.0)
}

/// The sparse set of particles sampled from one source raster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleField {
    particles: Vec<Particle>,
    image_width: u32,
    image_height: u32,
}

impl ParticleField {
    /// A field with nothing to draw.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sample `raster` into particles.
    ///
    /// An unreadable raster (zero-sized, or a short buffer) yields an empty
    /// field instead of an error.
    #[must_use]
    pub fn build(raster: &Raster, config: &DissolveConfig) -> Self {
        if !raster.is_readable() {
            debug!(raster = %raster::describe(raster), "raster unreadable, empty particle field");
            return Self::empty();
        }

        let width = raster.width();
        let height = raster.height();
        let stride = config.particle_sampling_density.max(1) as usize;
        let travels_right = config.travels_right();
        let threshold = config.brightness_threshold;

        let mut particles = Vec::new();
        for y in (0..height).step_by(stride) {
            for x in (0..width).step_by(stride) {
                let Some(px) = raster.pixel(x, y) else {
                    continue;
                };
                if brightness(px, config.brightness_channel) > threshold && px[3] > ALPHA_FLOOR {
                    let t = move_threshold(x, width, travels_right, config.move_threshold_curve_power);
                    particles.push(Particle::at_rest(x, y, t));
                }
            }
        }

        debug!(
            particles = particles.len(),
            width,
            height,
            stride,
            "particle field built"
        );

        Self {
            particles,
            image_width: width,
            image_height: height,
        }
    }

    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Source image width (0 for an empty field built from nothing).
    #[must_use]
    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    #[must_use]
    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    /// Recompute every particle's position and opacity for `progress`.
    ///
    /// Origins are never touched, so calling this with any progress value
    /// (in any order) gives the same result as a fresh field would.
    pub fn apply_progress(&mut self, config: &DissolveConfig, progress: f64) -> FrameSummary {
        let mut summary = FrameSummary::new(progress);
        for p in &mut self.particles {
            let state = kernel::particle_state(p, config, progress);
            p.x = state.x;
            p.y = state.y;
            p.opacity = state.opacity;
            summary.record(&state);
        }
        summary
    }
}
