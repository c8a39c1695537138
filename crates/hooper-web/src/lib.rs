#![forbid(unsafe_code)]

//! Browser runner for the Hooper disintegrating image.
//!
//! This crate provides [`DisintegratingImage`], a `wasm-bindgen`-exported
//! struct that binds a [`hooper_fx::Dissolve`] to a `<canvas>` element,
//! `window` scroll/resize listeners and `requestAnimationFrame`.
//!
//! ```js
//! import init, { DisintegratingImage } from "./pkg/hooper_web.js";
//! await init();
//! const fx = new DisintegratingImage(canvas, JSON.stringify({
//!   src: "/hero-portrait-stipple.png",
//!   maxDisplacementX: 1000,
//!   fadeIntensity: 5.5,
//! }));
//! fx.mount();
//! ```

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::DisintegratingImage;

// Runner core is used by the wasm module and by native tests.
#[cfg(any(target_arch = "wasm32", test))]
mod runner_core;
