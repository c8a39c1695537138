#![forbid(unsafe_code)]

//! Scroll offset to normalized progress.
//!
//! Two sources are supported:
//!
//! - **Trigger** ([`ScrollProgressTracker`]): progress leaves 0 once the page
//!   has scrolled `trigger_offset` px past the component's resting document
//!   top, and reaches 1 after a further `duration` px.
//! - **Viewport** ([`viewport_progress`]): the fraction of the element that
//!   has scrolled out above the viewport, from its bounding rect.
//!
//! Both feed the same change filter, so sub-epsilon jitter never wakes the
//! frame loop.

/// Minimum progress change that counts as an update.
pub const PROGRESS_EPSILON: f64 = 0.001;

/// Tracks the component's document top and filters progress changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollProgressTracker {
    trigger_offset: f64,
    duration: f64,
    top: Option<f64>,
    progress: f64,
}

impl ScrollProgressTracker {
    /// A tracker for the given window. `duration` must be positive; the
    /// component guarantees that by validating its config first.
    #[must_use]
    pub fn new(trigger_offset: f64, duration: f64) -> Self {
        Self {
            trigger_offset,
            duration,
            top: None,
            progress: 0.0,
        }
    }

    /// Record the component's document-space top (at mount or resize).
    pub fn set_top(&mut self, top: f64) {
        self.top = Some(top);
    }

    /// Forget the top; scroll samples are ignored until it is set again.
    pub fn clear_top(&mut self) {
        self.top = None;
    }

    #[must_use]
    pub fn top(&self) -> Option<f64> {
        self.top
    }

    /// Last emitted progress.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Unfiltered progress at `scroll_y`, or `None` before a top is known.
    #[must_use]
    pub fn compute(&self, scroll_y: f64) -> Option<f64> {
        let top = self.top?;
        let raw = (scroll_y - (top + self.trigger_offset)) / self.duration;
        Some(if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) })
    }

    /// Sample at `scroll_y`. Returns the new progress only when it changed
    /// enough to be worth a frame.
    pub fn sample(&mut self, scroll_y: f64) -> Option<f64> {
        let value = self.compute(scroll_y)?;
        self.offer(value)
    }

    /// Apply the change filter to a progress computed elsewhere.
    ///
    /// Emits when the value moved by more than [`PROGRESS_EPSILON`], or when
    /// it lands exactly on 0 or 1 from somewhere else, so the endpoints are
    /// always reached even through small final steps.
    pub fn offer(&mut self, value: f64) -> Option<f64> {
        let old = self.progress;
        let crossed_endpoint = (value == 0.0 || value == 1.0) && value != old;
        if (value - old).abs() > PROGRESS_EPSILON || crossed_endpoint {
            self.progress = value;
            Some(value)
        } else {
            None
        }
    }
}

/// Viewport-relative progress from an element's bounding rect.
///
/// `1 - rect_bottom / (rect_height + viewport_height)`, clamped. 0 while
/// `rect_bottom >= rect_height + viewport_height` (the element is still a
/// full element-height below the fold), 1 once the element has scrolled
/// entirely above the viewport top. A non-positive viewport height is
/// treated as 1 px.
#[must_use]
pub fn viewport_progress(rect_bottom: f64, rect_height: f64, viewport_height: f64) -> f64 {
    let viewport = if viewport_height > 0.0 { viewport_height } else { 1.0 };
    let value = 1.0 - rect_bottom / (rect_height + viewport);
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
