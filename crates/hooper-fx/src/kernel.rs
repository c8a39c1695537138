#![forbid(unsafe_code)]

//! Per-particle frame kernel.
//!
//! `particle_state(particle, config, progress)` is a pure function: the same
//! inputs always give the same position and opacity, no matter which frames
//! came before. Rendering a frame is this kernel mapped over the field.
//!
//! ```text
//! local   = 1                              if progress >= 1
//!         = min(1, (progress - t)/(1 - t)) if progress > t
//!         = 0                              otherwise
//! eased   = local ^ acceleration_power
//! reach   = max_displacement_x * (1 + (1 - t) * spread_factor)
//! x       = origin.x + eased * reach
//! opacity = max(0, 1 - local * fade_intensity)
//! ```

use crate::config::DissolveConfig;
use crate::particle::Particle;

/// Particles with opacity below this are skipped when drawing.
pub const VISIBILITY_FLOOR: f64 = 0.01;

/// Everything the renderer needs to know about one particle for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleState {
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
    /// Progress through this particle's own window, in `[0, 1]`.
    pub local_progress: f64,
    /// Opacity is at or above [`VISIBILITY_FLOOR`].
    pub visible: bool,
    /// Strictly between rest and done, and still visible.
    pub transitioning: bool,
}

/// Local progress of a particle with threshold `t` at global `progress`.
#[inline]
#[must_use]
pub fn local_progress(progress: f64, t: f64) -> f64 {
    if progress >= 1.0 {
        1.0
    } else if progress > t {
        ((progress - t) / (1.0 - t)).min(1.0)
    } else {
        0.0
    }
}

/// Signed travel distance reached at `local == 1` for threshold `t`.
#[inline]
#[must_use]
pub fn effective_max(config: &DissolveConfig, t: f64) -> f64 {
    config.max_displacement_x * (1.0 + (1.0 - t) * config.spread_factor)
}

/// Evaluate one particle at `progress`.
#[must_use]
pub fn particle_state(particle: &Particle, config: &DissolveConfig, progress: f64) -> ParticleState {
    let t = particle.move_threshold();
    let (ox, oy) = particle.origin();
    let local = local_progress(progress, t);
    let eased = local.powf(config.acceleration_power);
    let x = ox + eased * effective_max(config, t);
    let opacity = (1.0 - local * config.fade_intensity).max(0.0);
    let visible = opacity >= VISIBILITY_FLOOR;
    ParticleState {
        x,
        y: oy,
        opacity,
        local_progress: local,
        visible,
        transitioning: visible && local > 0.0 && local < 1.0,
    }
}

/// Aggregate of one evaluated frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameSummary {
    pub progress: f64,
    pub particles: usize,
    pub visible: usize,
    pub transitioning: usize,
}

impl FrameSummary {
    #[must_use]
    pub fn new(progress: f64) -> Self {
        Self {
            progress,
            ..Self::default()
        }
    }

    #[inline]
    pub fn record(&mut self, state: &ParticleState) {
        self.particles += 1;
        self.visible += usize::from(state.visible);
        self.transitioning += usize::from(state.transitioning);
    }

    /// Whether the loop should schedule another frame after this one.
    ///
    /// Continues while any particle is mid-flight or progress sits strictly
    /// inside the window. At exactly 0 or 1 the frame just drawn is final.
    #[must_use]
    pub fn needs_another_frame(&self) -> bool {
        self.transitioning > 0 || (self.progress > 0.0 && self.progress < 1.0)
    }
}
