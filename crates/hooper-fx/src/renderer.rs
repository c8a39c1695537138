#![forbid(unsafe_code)]

//! Frame drawing.
//!
//! [`DissolveRenderer`] owns a built field and its canvas geometry, maps the
//! kernel over every particle for a given progress, and paints the visible
//! ones into any [`DrawTarget`]. The browser runner implements `DrawTarget`
//! over a 2D canvas context; everything else draws into a [`PixelSurface`].

use std::time::Duration;

use web_time::Instant;

use crate::color::PackedRgba;
use crate::config::DissolveConfig;
use crate::kernel::{FrameSummary, VISIBILITY_FLOOR};
use crate::particle::ParticleField;
use crate::surface::{CanvasGeometry, PixelSurface};

/// Anything particles can be painted onto.
pub trait DrawTarget {
    /// Reset to fully transparent.
    fn clear(&mut self);

    /// Paint a `size x size` square with its top-left at surface `(x, y)`,
    /// source-over.
    fn fill_rect(&mut self, x: i64, y: i64, size: u32, color: PackedRgba);
}

impl DrawTarget for PixelSurface {
    fn clear(&mut self) {
        PixelSurface::clear(self);
    }

    fn fill_rect(&mut self, x: i64, y: i64, size: u32, color: PackedRgba) {
        PixelSurface::fill_rect(self, x, y, size, color);
    }
}

/// Outcome of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    pub summary: FrameSummary,
    /// Squares actually painted.
    pub drawn: usize,
    pub elapsed: Duration,
}

impl FrameStats {
    #[must_use]
    pub fn needs_another_frame(&self) -> bool {
        self.summary.needs_another_frame()
    }
}

/// A ready-to-draw dissolve: field, config and surface layout.
#[derive(Debug, Clone)]
pub struct DissolveRenderer {
    field: ParticleField,
    config: DissolveConfig,
    geometry: CanvasGeometry,
}

impl DissolveRenderer {
    /// Lay out a surface for `field` and take ownership of it.
    #[must_use]
    pub fn new(field: ParticleField, config: DissolveConfig) -> Self {
        let geometry = CanvasGeometry::for_config(field.image_width(), field.image_height(), &config);
        Self {
            field,
            config,
            geometry,
        }
    }

    #[must_use]
    pub fn geometry(&self) -> CanvasGeometry {
        self.geometry
    }

    #[must_use]
    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    #[must_use]
    pub fn config(&self) -> &DissolveConfig {
        &self.config
    }

    /// An off-screen surface of the right size for this renderer.
    #[must_use]
    pub fn new_surface(&self) -> PixelSurface {
        PixelSurface::for_geometry(&self.geometry)
    }

    /// Clear `target` and draw the field at `progress`.
    pub fn render(&mut self, progress: f64, target: &mut dyn DrawTarget) -> FrameStats {
        let start = Instant::now();
        let _span = tracing::debug_span!(
            "dissolve_frame",
            progress,
            particles = self.field.len(),
            width = self.geometry.width(),
            height = self.geometry.height()
        )
        .entered();

        target.clear();
        let summary = self.field.apply_progress(&self.config, progress);

        let origin_x = i64::from(self.geometry.origin_x());
        let size = self.config.particle_draw_size;
        let color = self.config.particle_color;
        let mut drawn = 0;
        for p in self.field.particles() {
            if p.opacity() < VISIBILITY_FLOOR {
                continue;
            }
            let (x, y) = p.position();
            target.fill_rect(
                x.floor() as i64 + origin_x,
                y as i64,
                size,
                color.with_opacity(p.opacity()),
            );
            drawn += 1;
        }

        FrameStats {
            summary,
            drawn,
            elapsed: start.elapsed(),
        }
    }
}
