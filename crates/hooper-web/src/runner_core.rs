#![forbid(unsafe_code)]

//! Platform-independent runner core wrapping a [`Dissolve`].
//!
//! This module holds the logic shared between the wasm-bindgen exports and
//! the native test harness: option parsing, layout math, canvas sizing and
//! fill-state caching. No JS/WASM types here.

use hooper_fx::frame_harness::{FrameRecord, FrameTimeCollector};
use hooper_fx::{
    CanvasGeometry, ConfigError, Dissolve, DissolveConfig, DrawTarget, FrameHost, FrameStats,
    LayoutSample, LoadError, LoadState, PackedRgba, Raster,
};

/// Parse the JSON options object a page passes in. Blank input means
/// defaults.
pub fn parse_options(json: &str) -> Result<DissolveConfig, ConfigError> {
    if json.trim().is_empty() {
        let config = DissolveConfig::default();
        config.validate()?;
        return Ok(config);
    }
    DissolveConfig::from_json(json)
}

/// Turn a viewport-relative bounding rect into a [`LayoutSample`].
///
/// A rect with neither width nor height means the element is not rendered
/// yet (e.g. `display: none`), so no document top can be derived.
#[must_use]
pub fn layout_from_rect(
    top: f64,
    bottom: f64,
    width: f64,
    height: f64,
    scroll_y: f64,
    viewport_height: f64,
) -> LayoutSample {
    let sample = if width <= 0.0 && height <= 0.0 {
        LayoutSample::unavailable(scroll_y)
    } else {
        LayoutSample::at(top + scroll_y, scroll_y)
    };
    sample.with_viewport(bottom, height, viewport_height)
}

/// Canvas attributes and inline style for a geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasStyle {
    pub width: u32,
    pub height: u32,
    /// Value for the CSS `left` property.
    pub left: String,
}

impl From<CanvasGeometry> for CanvasStyle {
    fn from(g: CanvasGeometry) -> Self {
        Self {
            width: g.width(),
            height: g.height(),
            left: format!("{}px", -i64::from(g.origin_x())),
        }
    }
}

/// Changes to apply to a 2D context before the next `fillRect`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FillChange {
    pub fill_style: Option<String>,
    pub global_alpha: Option<f64>,
}

/// Last fill style and alpha written to the context, so a frame with one
/// particle color only sets `fillStyle` once and `globalAlpha` when the
/// quantized opacity actually changes.
#[derive(Debug, Clone, Default)]
pub struct FillState {
    rgb: Option<(u8, u8, u8)>,
    alpha: Option<u8>,
}

impl FillState {
    /// Forget cached state (the context was cleared or resized).
    pub fn reset(&mut self) {
        self.rgb = None;
        self.alpha = None;
    }

    pub fn update(&mut self, color: PackedRgba) -> FillChange {
        let mut change = FillChange::default();
        let rgb = (color.r(), color.g(), color.b());
        if self.rgb != Some(rgb) {
            self.rgb = Some(rgb);
            change.fill_style = Some(format!("rgb({}, {}, {})", rgb.0, rgb.1, rgb.2));
        }
        if self.alpha != Some(color.a()) {
            self.alpha = Some(color.a());
            change.global_alpha = Some(f64::from(color.a()) / 255.0);
        }
        change
    }
}

/// Platform-independent dissolve runner.
pub struct RunnerCore<H: FrameHost> {
    dissolve: Dissolve<H>,
    applied_geometry: Option<CanvasGeometry>,
    last_stats: Option<FrameStats>,
    capture: Option<FrameTimeCollector>,
}

impl<H: FrameHost> RunnerCore<H> {
    pub fn new(config: DissolveConfig, host: H) -> Result<Self, ConfigError> {
        Ok(Self {
            dissolve: Dissolve::new(config, host)?,
            applied_geometry: None,
            last_stats: None,
            capture: None,
        })
    }

    #[must_use]
    pub fn src(&self) -> &str {
        &self.dissolve.config().src
    }

    #[must_use]
    pub fn progress(&self) -> f64 {
        self.dissolve.progress()
    }

    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.dissolve.particle_count()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.dissolve.is_mounted()
    }

    /// `"pending"`, `"ready"` or `"failed"`.
    #[must_use]
    pub fn load_state(&self) -> &'static str {
        match self.dissolve.load_state() {
            LoadState::Pending => "pending",
            LoadState::Ready => "ready",
            LoadState::Failed(_) => "failed",
        }
    }

    pub fn mount(&mut self, layout: LayoutSample) {
        self.dissolve.mount(layout);
    }

    pub fn scroll(&mut self, layout: LayoutSample) {
        self.dissolve.on_scroll(layout);
    }

    pub fn resize(&mut self, layout: LayoutSample) {
        self.dissolve.on_resize(layout);
    }

    /// Hand over decoded `ImageData` bytes.
    pub fn load_rgba(&mut self, width: u32, height: u32, pixels: Vec<u8>) {
        self.dissolve
            .load_raster(Raster::from_rgba(width, height, pixels));
    }

    /// The browser could not fetch the image or read its pixels.
    pub fn load_failed(&mut self, message: impl Into<String>) {
        self.dissolve.load_failed(LoadError::Fetch(message.into()));
    }

    /// New canvas layout to apply, if it changed since the last call.
    pub fn take_geometry_change(&mut self) -> Option<CanvasStyle> {
        let current = self.dissolve.geometry();
        if current == self.applied_geometry {
            return None;
        }
        self.applied_geometry = current;
        current.map(CanvasStyle::from)
    }

    /// Run the pending animation frame, if any, into `target`.
    pub fn frame(&mut self, target: &mut dyn DrawTarget) -> Option<FrameStats> {
        let token = self.dissolve.pending_frame()?;
        let stats = self.dissolve.on_frame(token, target)?;
        if let Some(collector) = self.capture.as_mut() {
            collector.record_frame(FrameRecord::from_stats(&stats, None));
        }
        self.last_stats = Some(stats);
        Some(stats)
    }

    /// Start recording per-frame timings under `run_id`.
    pub fn start_capture(&mut self, run_id: &str) {
        let (width, height) = self
            .dissolve
            .geometry()
            .map_or((0, 0), |g| (g.width(), g.height()));
        self.capture = Some(FrameTimeCollector::new(run_id, width, height));
    }

    /// Stop recording and return the session report as JSON.
    pub fn finish_capture(&mut self) -> Option<String> {
        self.capture.take().map(|c| c.report().to_json())
    }

    /// `{ progress, drawn, transitioning, elapsed_us }` of the last frame, or
    /// `null`.
    #[must_use]
    pub fn last_stats_json(&self) -> String {
        match self.last_stats {
            Some(stats) => serde_json::json!({
                "progress": stats.summary.progress,
                "drawn": stats.drawn,
                "transitioning": stats.summary.transitioning,
                "elapsed_us": stats.elapsed.as_micros() as u64,
            })
            .to_string(),
            None => "null".to_string(),
        }
    }

    pub fn unmount(&mut self) {
        self.dissolve.unmount();
    }
}
