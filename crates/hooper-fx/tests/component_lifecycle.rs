//! End-to-end lifecycle tests for a mounted dissolve over a recording host.
//!
//! Covers the frame-loop contract:
//!
//! - a settled component (progress 0 or 1) schedules nothing, however many
//!   idle ticks pass
//! - a full scroll-through animates, then stops at the dissolved state
//! - unmounting mid-animation releases listeners before the pending frame,
//!   and later events draw nothing
//! - a failed load is reported once and never draws

use std::io;
use std::sync::{Arc, Mutex};

use hooper_fx::*;

const TOP: f64 = 200.0;

fn stipple() -> Raster {
    // Bright dots on a transparent background, like the hero portrait.
    Raster::from_fn(120, 60, |x, y| {
        if (x + y) % 3 == 0 {
            [240, 240, 240, 255]
        } else {
            [0, 0, 0, 0]
        }
    })
}

fn mounted(config: DissolveConfig) -> (Dissolve<RecordingHost>, RecordingHost, PixelSurface) {
    let host = RecordingHost::new();
    let mut dissolve = Dissolve::new(config, host.clone()).expect("valid config");
    dissolve.mount(LayoutSample::at(TOP, 0.0));
    dissolve.load_raster(stipple());
    let surface = PixelSurface::for_geometry(&dissolve.geometry().expect("ready"));
    (dissolve, host, surface)
}

/// Run the host's pending frame, as the browser would on the next vsync.
fn tick(dissolve: &mut Dissolve<RecordingHost>, host: &RecordingHost, surface: &mut PixelSurface) -> bool {
    match host.fire_pending() {
        Some(token) => {
            dissolve.on_frame(token, surface);
            true
        }
        None => false,
    }
}

fn settle(dissolve: &mut Dissolve<RecordingHost>, host: &RecordingHost, surface: &mut PixelSurface) -> usize {
    let mut frames = 0;
    while tick(dissolve, host, surface) {
        frames += 1;
        assert!(frames < 10_000, "frame loop never settled");
    }
    frames
}

#[test]
fn idle_at_rest_schedules_nothing() {
    let (mut d, host, mut surface) = mounted(DissolveConfig::default());
    assert_eq!(settle(&mut d, &host, &mut surface), 1);
    let requested = host.frames_requested();

    for _ in 0..100 {
        assert!(!tick(&mut d, &host, &mut surface));
    }
    assert_eq!(host.frames_requested(), requested);
    assert_eq!(d.frames_drawn(), 1);
}

#[test]
fn idle_when_fully_dissolved_schedules_nothing() {
    let config = DissolveConfig::default().with_fade_intensity(1.0);
    let (mut d, host, mut surface) = mounted(config);
    settle(&mut d, &host, &mut surface);

    d.on_scroll(LayoutSample::at(TOP, 5_000.0));
    assert_eq!(d.progress(), 1.0);
    assert_eq!(settle(&mut d, &host, &mut surface), 1);
    assert_eq!(surface.painted_pixels(), 0);

    let requested = host.frames_requested();
    for _ in 0..50 {
        d.on_scroll(LayoutSample::at(TOP, 5_000.0 + 1.0));
        assert!(!tick(&mut d, &host, &mut surface));
    }
    assert_eq!(host.frames_requested(), requested);
}

#[test]
fn scroll_through_animates_then_stops() {
    let config = DissolveConfig::hero_portrait();
    let (mut d, host, mut surface) = mounted(config.clone());
    settle(&mut d, &host, &mut surface);
    let rest = surface.checksum();

    let mut checksums = vec![rest.clone()];
    for step in 1..=20 {
        let scroll = TOP + config.scroll_trigger_offset + config.scroll_effect_duration * f64::from(step) / 20.0;
        d.on_scroll(LayoutSample::at(TOP, scroll));
        assert!(tick(&mut d, &host, &mut surface), "step {step} should draw");
        checksums.push(surface.checksum());
    }
    assert_eq!(d.progress(), 1.0);
    settle(&mut d, &host, &mut surface);
    assert_eq!(host.pending_frame(), None);
    assert_ne!(checksums[10], rest);

    // Scrolling back to the top restores the rest frame exactly.
    d.on_scroll(LayoutSample::at(TOP, 0.0));
    settle(&mut d, &host, &mut surface);
    assert_eq!(surface.checksum(), rest);
}

#[test]
fn unmount_mid_animation_releases_everything() {
    let (mut d, host, mut surface) = mounted(DissolveConfig::default());
    settle(&mut d, &host, &mut surface);

    d.on_scroll(LayoutSample::at(TOP, TOP + 50.0 + 250.0));
    assert!(tick(&mut d, &host, &mut surface));
    let pending = host.pending_frame();
    assert!(pending.is_some(), "mid-animation frame should be pending");

    d.unmount();
    assert!(!host.is_subscribed(HostEvent::Scroll));
    assert!(!host.is_subscribed(HostEvent::Resize));
    assert_eq!(host.unsubscribed(), vec![HostEvent::Scroll, HostEvent::Resize]);
    assert_eq!(host.pending_frame(), None);
    assert_eq!(host.frames_cancelled(), 1);

    let drawn = d.frames_drawn();
    let requested = host.frames_requested();
    surface.clear();
    d.on_scroll(LayoutSample::at(TOP, TOP + 400.0));
    d.on_resize(LayoutSample::at(TOP, TOP + 400.0));
    // A callback that raced the cancel must not draw either.
    assert!(d.on_frame(pending.unwrap(), &mut surface).is_none());
    assert_eq!(d.frames_drawn(), drawn);
    assert_eq!(host.frames_requested(), requested);
    assert_eq!(surface.painted_pixels(), 0);
}

#[test]
fn dropping_a_mounted_component_tears_down() {
    let (mut d, host, mut surface) = mounted(DissolveConfig::default());
    settle(&mut d, &host, &mut surface);
    d.on_scroll(LayoutSample::at(TOP, TOP + 300.0));
    assert!(host.pending_frame().is_some());

    drop(d);
    assert_eq!(host.subscription_count(), 0);
    assert_eq!(host.pending_frame(), None);
    assert_eq!(host.frames_cancelled(), 1);
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn load_failure_warns_once_and_never_draws() {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let host = RecordingHost::new();
    tracing::subscriber::with_default(subscriber, || {
        let mut d = Dissolve::new(
            DissolveConfig::default().with_src("/missing.png"),
            host.clone(),
        )
        .expect("valid config");
        d.mount(LayoutSample::at(TOP, 0.0));
        let err = LoadError::Fetch("404 Not Found".into());
        d.load_failed(err.clone());
        d.load_failed(err);
        d.on_scroll(LayoutSample::at(TOP, TOP + 300.0));
        assert!(matches!(d.load_state(), LoadState::Failed(_)));
    });

    assert_eq!(host.frames_requested(), 0);
    let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
    assert_eq!(output.matches("failed to load").count(), 1, "log was: {output}");
    assert!(output.contains("/missing.png"));
    assert!(output.contains("404 Not Found"));
}
