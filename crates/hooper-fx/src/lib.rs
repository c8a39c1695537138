#![forbid(unsafe_code)]

//! Scroll-driven particle disintegration for the Hooper landing page.
//!
//! A static raster (the hero portrait) is sampled into a sparse
//! [`ParticleField`]. As the page scrolls past the component, every particle
//! drifts sideways and fades according to a pure per-frame kernel, giving a
//! "dissolve" that is locked to scroll position rather than wall-clock time.
//!
//! # Layers
//!
//! - [`config`]: one immutable [`DissolveConfig`] record, validated once.
//! - [`raster`]: RGBA input (decoded with the `image` feature, or handed over
//!   by a browser host as `ImageData` bytes).
//! - [`particle`]: the field builder.
//! - [`progress`]: scroll offset → normalized progress.
//! - [`kernel`]: `(particle, config, progress) → (position, opacity)`.
//! - [`surface`] / [`renderer`]: drawing into an RGBA surface or any
//!   [`DrawTarget`].
//! - [`component`]: the mounted lifecycle (listeners, frame loop, teardown)
//!   over a [`FrameHost`].
//! - [`frame_harness`]: per-frame timing and checksum reports.

pub mod color;
pub mod component;
pub mod config;
pub mod error;
pub mod frame_harness;
pub mod kernel;
pub mod particle;
pub mod progress;
pub mod raster;
pub mod renderer;
pub mod surface;

pub use color::{PackedRgba, ParticleColor};
pub use component::{
    Dissolve, FrameHost, FrameToken, HostEvent, LayoutSample, LoadState, RecordingHost,
};
pub use config::{BrightnessChannel, DissolveConfig, PaddingMode, ProgressMode};
pub use error::{ConfigError, LoadError};
pub use kernel::{FrameSummary, ParticleState, VISIBILITY_FLOOR, particle_state};
pub use particle::{ALPHA_FLOOR, Particle, ParticleField};
pub use progress::{PROGRESS_EPSILON, ScrollProgressTracker, viewport_progress};
pub use raster::Raster;
pub use renderer::{DrawTarget, DissolveRenderer, FrameStats};
pub use surface::{CanvasGeometry, PixelSurface};
