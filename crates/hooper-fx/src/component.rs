#![forbid(unsafe_code)]

//! The mounted dissolve component.
//!
//! [`Dissolve`] ties the pieces together for one on-page instance: it owns
//! its [`FrameHost`] (listener registration and animation-frame requests),
//! the scroll tracker, and once the source raster arrives, the renderer.
//!
//! # Lifecycle
//!
//! ```text
//! new ──mount──▶ Mounted ──unmount / drop──▶ Unmounted
//!                  │ on_resize: recapture top, redraw
//!                  │ on_scroll: progress changed? request frame
//!                  │ on_frame:  draw, request another while animating
//! ```
//!
//! Loading is independent of mounting: `load_raster` / `load_failed` may
//! arrive before or after `mount`. Nothing is drawn until the component is
//! mounted, laid out, and its field is ready.
//!
//! At most one frame request is outstanding at a time. Once progress settles
//! on 0 or 1 and the final frame is drawn, no further frames are requested
//! until progress changes again.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::config::{DissolveConfig, ProgressMode};
use crate::error::{ConfigError, LoadError};
use crate::particle::ParticleField;
use crate::progress::{ScrollProgressTracker, viewport_progress};
use crate::raster::Raster;
use crate::renderer::{DissolveRenderer, DrawTarget, FrameStats};
use crate::surface::CanvasGeometry;

// ---------------------------------------------------------------------------
// Host boundary
// ---------------------------------------------------------------------------

/// Page events a component listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    Scroll,
    Resize,
}

/// Handle for one outstanding animation-frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// What the component needs from its environment.
///
/// The browser runner implements this over `window` listeners and
/// `requestAnimationFrame`. Event delivery goes the other way: the host calls
/// [`Dissolve::on_scroll`], [`Dissolve::on_resize`] and [`Dissolve::on_frame`].
pub trait FrameHost {
    fn subscribe(&mut self, event: HostEvent);
    fn unsubscribe(&mut self, event: HostEvent);
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Measurements the host takes when an event fires.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutSample {
    /// Document-space top of the drawing surface. `None` when the surface is
    /// missing or has no size yet.
    pub document_top: Option<f64>,
    /// Current vertical scroll offset of the page.
    pub scroll_y: f64,
    /// Viewport-relative bounding rect bottom of the component.
    pub rect_bottom: f64,
    pub rect_height: f64,
    pub viewport_height: f64,
}

impl LayoutSample {
    /// A laid-out surface at `document_top`, page scrolled to `scroll_y`.
    #[must_use]
    pub fn at(document_top: f64, scroll_y: f64) -> Self {
        Self {
            document_top: Some(document_top),
            scroll_y,
            ..Self::default()
        }
    }

    /// The surface cannot be measured yet.
    #[must_use]
    pub fn unavailable(scroll_y: f64) -> Self {
        Self {
            document_top: None,
            scroll_y,
            ..Self::default()
        }
    }

    /// Attach the bounding-rect metrics used by [`ProgressMode::Viewport`].
    #[must_use]
    pub fn with_viewport(mut self, rect_bottom: f64, rect_height: f64, viewport_height: f64) -> Self {
        self.rect_bottom = rect_bottom;
        self.rect_height = rect_height;
        self.viewport_height = viewport_height;
        self
    }
}

// ---------------------------------------------------------------------------
// Dissolve
// ---------------------------------------------------------------------------

/// Where the source raster stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    Failed(LoadError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Mounted,
    Unmounted,
}

/// One scroll-driven dissolve instance bound to a host.
pub struct Dissolve<H: FrameHost> {
    host: H,
    config: DissolveConfig,
    tracker: ScrollProgressTracker,
    phase: Phase,
    load: LoadState,
    renderer: Option<DissolveRenderer>,
    pending_frame: Option<FrameToken>,
    frames_drawn: u64,
}

impl<H: FrameHost> Dissolve<H> {
    /// Validate `config` and bind to `host`. Nothing is registered until
    /// [`mount`](Self::mount).
    pub fn new(config: DissolveConfig, host: H) -> Result<Self, ConfigError> {
        config.validate()?;
        let tracker =
            ScrollProgressTracker::new(config.scroll_trigger_offset, config.scroll_effect_duration);
        Ok(Self {
            host,
            config,
            tracker,
            phase: Phase::Created,
            load: LoadState::Pending,
            renderer: None,
            pending_frame: None,
            frames_drawn: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &DissolveConfig {
        &self.config
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.phase == Phase::Mounted
    }

    /// A document top has been captured and not invalidated since.
    #[must_use]
    pub fn is_laid_out(&self) -> bool {
        self.tracker.top().is_some()
    }

    /// Current scroll progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.tracker.progress()
    }

    /// Surface layout, once the field is ready.
    #[must_use]
    pub fn geometry(&self) -> Option<CanvasGeometry> {
        self.renderer.as_ref().map(DissolveRenderer::geometry)
    }

    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.renderer.as_ref().map_or(0, |r| r.field().len())
    }

    #[must_use]
    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending_frame
    }

    #[must_use]
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Register the scroll and resize listeners and take the first layout
    /// sample. Mounting twice, or after unmount, does nothing.
    pub fn mount(&mut self, layout: LayoutSample) {
        if self.phase != Phase::Created {
            debug!(phase = ?self.phase, "dissolve mount ignored");
            return;
        }
        self.host.subscribe(HostEvent::Scroll);
        self.host.subscribe(HostEvent::Resize);
        self.phase = Phase::Mounted;
        debug!(src = %self.config.src, "dissolve mounted");
        self.relayout(layout);
    }

    /// Build the field from a decoded source. The raster is dropped once
    /// sampled. Replaces any previous field.
    pub fn load_raster(&mut self, raster: Raster) {
        if self.phase == Phase::Unmounted {
            return;
        }
        let field = ParticleField::build(&raster, &self.config);
        drop(raster);
        debug!(
            src = %self.config.src,
            particles = field.len(),
            "dissolve source ready"
        );
        self.renderer = Some(DissolveRenderer::new(field, self.config.clone()));
        self.load = LoadState::Ready;
        self.schedule_frame();
    }

    /// Record a terminal load failure. Logged once per failure; the component
    /// draws nothing until a new raster is loaded. Ignored after unmount.
    pub fn load_failed(&mut self, error: LoadError) {
        if self.phase == Phase::Unmounted || self.load == LoadState::Failed(error.clone()) {
            return;
        }
        warn!(src = %self.config.src, error = %error, "dissolve source failed to load");
        self.renderer = None;
        self.load = LoadState::Failed(error);
        if let Some(token) = self.pending_frame.take() {
            self.host.cancel_frame(token);
        }
    }

    /// Resize: recapture the surface top and redraw.
    pub fn on_resize(&mut self, layout: LayoutSample) {
        if self.phase != Phase::Mounted {
            return;
        }
        self.relayout(layout);
    }

    /// Scroll: recompute progress and request a frame if it moved.
    pub fn on_scroll(&mut self, sample: LayoutSample) {
        if self.phase != Phase::Mounted {
            return;
        }
        if self.sample_progress(&sample).is_some() {
            self.schedule_frame();
        }
    }

    /// Animation-frame callback for `token`. Draws into `target` and
    /// requests the next frame while the dissolve is still moving.
    ///
    /// Stale tokens, and any callback after unmount, are ignored.
    pub fn on_frame(&mut self, token: FrameToken, target: &mut dyn DrawTarget) -> Option<FrameStats> {
        if self.phase != Phase::Mounted || self.pending_frame != Some(token) {
            return None;
        }
        self.pending_frame = None;
        if !self.is_laid_out() {
            return None;
        }
        let progress = self.tracker.progress();
        let renderer = self.renderer.as_mut()?;
        let stats = renderer.render(progress, target);
        self.frames_drawn += 1;
        if stats.needs_another_frame() {
            self.schedule_frame();
        }
        Some(stats)
    }

    /// Remove both listeners, then cancel any pending frame. Idempotent.
    pub fn unmount(&mut self) {
        if self.phase == Phase::Unmounted {
            return;
        }
        if self.phase == Phase::Mounted {
            self.host.unsubscribe(HostEvent::Scroll);
            self.host.unsubscribe(HostEvent::Resize);
        }
        if let Some(token) = self.pending_frame.take() {
            self.host.cancel_frame(token);
        }
        self.phase = Phase::Unmounted;
        self.renderer = None;
        debug!(src = %self.config.src, frames = self.frames_drawn, "dissolve unmounted");
    }

    fn relayout(&mut self, layout: LayoutSample) {
        match layout.document_top {
            Some(top) => {
                self.tracker.set_top(top);
                self.sample_progress(&layout);
                self.schedule_frame();
            }
            None => {
                debug!("dissolve surface not measurable, waiting for resize");
                self.tracker.clear_top();
            }
        }
    }

    fn sample_progress(&mut self, sample: &LayoutSample) -> Option<f64> {
        match self.config.progress_mode {
            ProgressMode::Trigger => self.tracker.sample(sample.scroll_y),
            ProgressMode::Viewport => {
                self.tracker.top()?;
                let value =
                    viewport_progress(sample.rect_bottom, sample.rect_height, sample.viewport_height);
                self.tracker.offer(value)
            }
        }
    }

    fn schedule_frame(&mut self) {
        if self.phase != Phase::Mounted
            || self.pending_frame.is_some()
            || self.renderer.is_none()
            || !self.is_laid_out()
        {
            return;
        }
        self.pending_frame = Some(self.host.request_frame());
    }
}

impl<H: FrameHost> Drop for Dissolve<H> {
    fn drop(&mut self) {
        self.unmount();
    }
}

// ---------------------------------------------------------------------------
// RecordingHost
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct HostLog {
    subscriptions: Vec<HostEvent>,
    pending: Option<FrameToken>,
    next_token: u64,
    requested: usize,
    cancelled: usize,
    unsubscribed: Vec<HostEvent>,
}

/// In-memory [`FrameHost`] for tests and headless runs.
///
/// Clones share one log, so a test can keep a handle after moving the host
/// into a [`Dissolve`] and still inspect it once the component is dropped.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    log: Rc<RefCell<HostLog>>,
}

impl RecordingHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_subscribed(&self, event: HostEvent) -> bool {
        self.log.borrow().subscriptions.contains(&event)
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.log.borrow().subscriptions.len()
    }

    /// Events unsubscribed so far, in order.
    #[must_use]
    pub fn unsubscribed(&self) -> Vec<HostEvent> {
        self.log.borrow().unsubscribed.clone()
    }

    #[must_use]
    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.log.borrow().pending
    }

    #[must_use]
    pub fn frames_requested(&self) -> usize {
        self.log.borrow().requested
    }

    #[must_use]
    pub fn frames_cancelled(&self) -> usize {
        self.log.borrow().cancelled
    }

    /// Hand out the pending frame as if the browser were about to run it.
    pub fn fire_pending(&self) -> Option<FrameToken> {
        self.log.borrow_mut().pending.take()
    }
}

impl FrameHost for RecordingHost {
    fn subscribe(&mut self, event: HostEvent) {
        let mut log = self.log.borrow_mut();
        if !log.subscriptions.contains(&event) {
            log.subscriptions.push(event);
        }
    }

    fn unsubscribe(&mut self, event: HostEvent) {
        let mut log = self.log.borrow_mut();
        log.subscriptions.retain(|e| *e != event);
        log.unsubscribed.push(event);
    }

    fn request_frame(&mut self) -> FrameToken {
        let mut log = self.log.borrow_mut();
        log.next_token += 1;
        log.requested += 1;
        let token = FrameToken(log.next_token);
        log.pending = Some(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        let mut log = self.log.borrow_mut();
        if log.pending == Some(token) {
            log.pending = None;
        }
        log.cancelled += 1;
    }
}
