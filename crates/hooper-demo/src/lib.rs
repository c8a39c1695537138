#![forbid(unsafe_code)]

//! Offline renderer for the Hooper dissolve.
//!
//! Renders a source image through [`hooper_fx`] at a list of scroll progress
//! values, writing PNG frames and a JSONL frame log. Useful for tuning a
//! configuration without a browser, and for pinning surface checksums in CI.

pub mod cli;
pub mod render;
