#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the dissolve runner.
//!
//! This module wraps [`super::runner_core::RunnerCore`] over a browser
//! [`FrameHost`]: `window` scroll/resize listeners and
//! `requestAnimationFrame`. Only compiled on `wasm32` targets.
//!
//! Every JS callback holds a `Weak` to the shared state, so dropping the
//! exported object releases everything even if a callback is still queued.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use hooper_fx::{DrawTarget, FrameHost, FrameToken, HostEvent, LayoutSample, PackedRgba};
use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Event, HtmlCanvasElement, HtmlImageElement, Window};

use super::runner_core::{
    CanvasStyle, FillState, RunnerCore, layout_from_rect, parse_options,
};

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn js_message(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

// ---------------------------------------------------------------------------
// Browser host
// ---------------------------------------------------------------------------

struct WebHost {
    window: Window,
    on_scroll: Closure<dyn FnMut(Event)>,
    on_resize: Closure<dyn FnMut(Event)>,
    on_frame: Closure<dyn FnMut(f64)>,
}

impl WebHost {
    fn new(window: Window, shared: Weak<RefCell<Shared>>) -> Self {
        let scroll_ref = shared.clone();
        let on_scroll = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            with_shared(&scroll_ref, Shared::handle_scroll);
        });
        let resize_ref = shared.clone();
        let on_resize = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            with_shared(&resize_ref, Shared::handle_resize);
        });
        let on_frame = Closure::<dyn FnMut(f64)>::new(move |_: f64| {
            with_shared(&shared, Shared::handle_frame);
        });
        Self {
            window,
            on_scroll,
            on_resize,
            on_frame,
        }
    }

    fn listener(&self, event: HostEvent) -> (&'static str, &js_sys::Function) {
        match event {
            HostEvent::Scroll => ("scroll", self.on_scroll.as_ref().unchecked_ref()),
            HostEvent::Resize => ("resize", self.on_resize.as_ref().unchecked_ref()),
        }
    }
}

impl FrameHost for WebHost {
    fn subscribe(&mut self, event: HostEvent) {
        let (name, callback) = self.listener(event);
        if let Err(err) = self.window.add_event_listener_with_callback(name, callback) {
            console_error(&format!("hooper: addEventListener({name}) failed: {}", js_message(&err)));
        }
    }

    fn unsubscribe(&mut self, event: HostEvent) {
        let (name, callback) = self.listener(event);
        if let Err(err) = self.window.remove_event_listener_with_callback(name, callback) {
            console_error(&format!("hooper: removeEventListener({name}) failed: {}", js_message(&err)));
        }
    }

    fn request_frame(&mut self) -> FrameToken {
        match self
            .window
            .request_animation_frame(self.on_frame.as_ref().unchecked_ref())
        {
            Ok(id) => FrameToken(u64::from(id as u32)),
            Err(err) => {
                console_error(&format!("hooper: requestAnimationFrame failed: {}", js_message(&err)));
                FrameToken(0)
            }
        }
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if let Err(err) = self.window.cancel_animation_frame(token.0 as u32 as i32) {
            console_error(&format!("hooper: cancelAnimationFrame failed: {}", js_message(&err)));
        }
    }
}

// ---------------------------------------------------------------------------
// Canvas target
// ---------------------------------------------------------------------------

struct CanvasTarget<'a> {
    ctx: &'a CanvasRenderingContext2d,
    fill: &'a mut FillState,
    width: f64,
    height: f64,
}

impl DrawTarget for CanvasTarget<'_> {
    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
        self.fill.reset();
    }

    fn fill_rect(&mut self, x: i64, y: i64, size: u32, color: PackedRgba) {
        let change = self.fill.update(color);
        if let Some(style) = change.fill_style {
            self.ctx.set_fill_style_str(&style);
        }
        if let Some(alpha) = change.global_alpha {
            self.ctx.set_global_alpha(alpha);
        }
        let size = f64::from(size);
        self.ctx.fill_rect(x as f64, y as f64, size, size);
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

struct Shared {
    core: Option<RunnerCore<WebHost>>,
    window: Window,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    fill: FillState,
    image: Option<HtmlImageElement>,
    on_image_load: Option<Closure<dyn FnMut()>>,
    on_image_error: Option<Closure<dyn FnMut()>>,
}

fn with_shared(shared: &Weak<RefCell<Shared>>, f: impl FnOnce(&mut Shared)) {
    let Some(rc) = shared.upgrade() else {
        return;
    };
    let Ok(mut state) = rc.try_borrow_mut() else {
        return;
    };
    f(&mut state);
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("2d context has unexpected type"))
}

impl Shared {
    fn measure(&self) -> LayoutSample {
        let rect = self.canvas.get_bounding_client_rect();
        let scroll_y = self.window.scroll_y().unwrap_or(0.0);
        let viewport_height = self
            .window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        layout_from_rect(
            rect.top(),
            rect.bottom(),
            rect.width(),
            rect.height(),
            scroll_y,
            viewport_height,
        )
    }

    fn handle_scroll(&mut self) {
        let layout = self.measure();
        if let Some(core) = self.core.as_mut() {
            core.scroll(layout);
        }
    }

    fn handle_resize(&mut self) {
        let layout = self.measure();
        if let Some(core) = self.core.as_mut() {
            core.resize(layout);
        }
    }

    fn handle_frame(&mut self) {
        let Self {
            core,
            canvas,
            ctx,
            fill,
            ..
        } = self;
        let Some(core) = core.as_mut() else {
            return;
        };
        let mut target = CanvasTarget {
            ctx,
            fill,
            width: f64::from(canvas.width()),
            height: f64::from(canvas.height()),
        };
        core.frame(&mut target);
    }

    fn apply_canvas_style(&mut self, style: &CanvasStyle) {
        self.canvas.set_width(style.width);
        self.canvas.set_height(style.height);
        self.fill.reset();
        let css = self.canvas.style();
        for (property, value) in [
            ("position", "relative"),
            ("left", style.left.as_str()),
            ("max-width", "none"),
        ] {
            if let Err(err) = css.set_property(property, value) {
                console_error(&format!("hooper: style.{property} failed: {}", js_message(&err)));
            }
        }
    }

    fn sync_geometry(&mut self) {
        let change = self.core.as_mut().and_then(RunnerCore::take_geometry_change);
        if let Some(style) = change {
            self.apply_canvas_style(&style);
        }
        // The canvas may have moved; recapture the top.
        let layout = self.measure();
        if let Some(core) = self.core.as_mut() {
            core.resize(layout);
        }
    }

    fn load_pixels(&mut self, width: u32, height: u32, pixels: Vec<u8>) {
        if let Some(core) = self.core.as_mut() {
            core.load_rgba(width, height, pixels);
        }
        self.sync_geometry();
    }

    fn fail_load(&mut self, message: String) {
        if let Some(core) = self.core.as_mut() {
            core.load_failed(message);
        }
    }

    /// Rasterize the loaded `<img>` through an offscreen canvas.
    fn finish_image_load(&mut self) {
        let Some(image) = self.image.take() else {
            return;
        };
        let width = image.natural_width();
        let height = image.natural_height();
        if width == 0 || height == 0 {
            self.load_pixels(width, height, Vec::new());
            return;
        }
        match read_image_pixels(&self.window, &image, width, height) {
            Ok(pixels) => self.load_pixels(width, height, pixels),
            Err(err) => self.fail_load(format!("pixel access denied: {}", js_message(&err))),
        }
    }

    fn release_image(&mut self) {
        if let Some(image) = self.image.take() {
            image.set_onload(None);
            image.set_onerror(None);
        }
        self.on_image_load = None;
        self.on_image_error = None;
    }
}

fn read_image_pixels(
    window: &Window,
    image: &HtmlImageElement,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, JsValue> {
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let scratch = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("canvas element has unexpected type"))?;
    scratch.set_width(width);
    scratch.set_height(height);
    let ctx = context_2d(&scratch)?;
    ctx.draw_image_with_html_image_element(image, 0.0, 0.0)?;
    let data = ctx.get_image_data(0.0, 0.0, f64::from(width), f64::from(height))?;
    Ok(data.data().0)
}

fn start_image_load(shared: &Rc<RefCell<Shared>>) -> Result<(), JsValue> {
    let src = {
        let state = shared.borrow();
        match state.core.as_ref() {
            Some(core) if !core.src().is_empty() => core.src().to_string(),
            _ => return Ok(()),
        }
    };

    let image = HtmlImageElement::new()?;
    image.set_cross_origin(Some("anonymous"));

    let load_ref = Rc::downgrade(shared);
    let on_load = Closure::<dyn FnMut()>::new(move || {
        with_shared(&load_ref, Shared::finish_image_load);
    });
    let error_ref = Rc::downgrade(shared);
    let error_src = src.clone();
    let on_error = Closure::<dyn FnMut()>::new(move || {
        let message = format!("could not load {error_src}");
        with_shared(&error_ref, move |state| {
            state.image = None;
            state.fail_load(message);
        });
    });
    image.set_onload(Some(on_load.as_ref().unchecked_ref()));
    image.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    image.set_src(&src);

    let mut state = shared.borrow_mut();
    state.image = Some(image);
    state.on_image_load = Some(on_load);
    state.on_image_error = Some(on_error);
    Ok(())
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

/// Scroll-driven disintegrating image bound to one `<canvas>`.
///
/// ```js
/// const fx = new DisintegratingImage(canvas, JSON.stringify({ src: "/hero.png" }));
/// fx.mount();
/// // ...
/// fx.destroy();
/// ```
#[wasm_bindgen]
pub struct DisintegratingImage {
    shared: Rc<RefCell<Shared>>,
}

#[wasm_bindgen]
impl DisintegratingImage {
    /// Bind to `canvas` with camelCase JSON options. Throws on invalid
    /// options.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, options_json: &str) -> Result<DisintegratingImage, JsValue> {
        install_panic_hook();
        let config = parse_options(options_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let ctx = context_2d(&canvas)?;

        let shared = Rc::new(RefCell::new(Shared {
            core: None,
            window: window.clone(),
            canvas,
            ctx,
            fill: FillState::default(),
            image: None,
            on_image_load: None,
            on_image_error: None,
        }));
        let host = WebHost::new(window, Rc::downgrade(&shared));
        let core = RunnerCore::new(config, host).map_err(|e| JsValue::from_str(&e.to_string()))?;
        shared.borrow_mut().core = Some(core);
        Ok(Self { shared })
    }

    /// Register listeners, take the first layout sample, and start loading
    /// `src` (if one was given).
    pub fn mount(&self) -> Result<(), JsValue> {
        {
            let mut state = self.shared.borrow_mut();
            let layout = state.measure();
            if let Some(core) = state.core.as_mut() {
                core.mount(layout);
            }
        }
        start_image_load(&self.shared)
    }

    /// Feed already-decoded RGBA pixels instead of loading `src`.
    #[wasm_bindgen(js_name = loadImageData)]
    pub fn load_image_data(&self, width: u32, height: u32, data: Vec<u8>) {
        let mut state = self.shared.borrow_mut();
        state.release_image();
        state.load_pixels(width, height, data);
    }

    /// Remove listeners, then cancel any pending frame.
    pub fn unmount(&self) {
        let mut state = self.shared.borrow_mut();
        state.release_image();
        if let Some(core) = state.core.as_mut() {
            core.unmount();
        }
    }

    /// Current scroll progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.shared
            .borrow()
            .core
            .as_ref()
            .map_or(0.0, RunnerCore::progress)
    }

    #[wasm_bindgen(js_name = particleCount)]
    pub fn particle_count(&self) -> usize {
        self.shared
            .borrow()
            .core
            .as_ref()
            .map_or(0, RunnerCore::particle_count)
    }

    /// `"pending"`, `"ready"` or `"failed"`.
    #[wasm_bindgen(js_name = loadState)]
    pub fn load_state(&self) -> String {
        self.shared
            .borrow()
            .core
            .as_ref()
            .map_or("failed", RunnerCore::load_state)
            .to_string()
    }

    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.shared
            .borrow()
            .core
            .as_ref()
            .is_some_and(RunnerCore::is_mounted)
    }

    /// JSON stats of the last drawn frame, or `"null"`.
    #[wasm_bindgen(js_name = lastFrameStats)]
    pub fn last_frame_stats(&self) -> String {
        self.shared
            .borrow()
            .core
            .as_ref()
            .map_or_else(|| "null".to_string(), RunnerCore::last_stats_json)
    }

    /// Start recording frame timings.
    #[wasm_bindgen(js_name = startCapture)]
    pub fn start_capture(&self, run_id: &str) {
        if let Some(core) = self.shared.borrow_mut().core.as_mut() {
            core.start_capture(run_id);
        }
    }

    /// Stop recording; returns the session report JSON, or `undefined`.
    #[wasm_bindgen(js_name = finishCapture)]
    pub fn finish_capture(&self) -> Option<String> {
        self.shared
            .borrow_mut()
            .core
            .as_mut()
            .and_then(RunnerCore::finish_capture)
    }

    /// Unmount and release all resources.
    pub fn destroy(&mut self) {
        let core = {
            let mut state = self.shared.borrow_mut();
            state.release_image();
            state.core.take()
        };
        // Dropping the core unmounts it and frees the JS callbacks.
        drop(core);
    }
}
