#![forbid(unsafe_code)]

//! Error types for configuration and source loading.

use std::fmt;

/// A configuration value outside its documented domain.
///
/// Returned once by [`DissolveConfig::validate`](crate::DissolveConfig::validate);
/// per-frame code assumes a validated config and never re-checks.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `particle_sampling_density` must be at least 1.
    ZeroSamplingDensity,
    /// `particle_draw_size` must be at least 1.
    ZeroDrawSize,
    /// `scroll_effect_duration` must be finite and strictly positive.
    NonPositiveDuration(f64),
    /// A curve exponent must be finite and strictly positive.
    NonPositivePower { field: &'static str, value: f64 },
    /// A multiplier must be finite and non-negative.
    NegativeFactor { field: &'static str, value: f64 },
    /// A pixel offset or distance must be finite.
    NonFinite { field: &'static str, value: f64 },
    /// `particle_color` is not an `"R, G, B"` triplet of 0..=255 values.
    InvalidColor(String),
    /// JSON configuration could not be parsed.
    Json(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSamplingDensity => write!(f, "particle sampling density must be >= 1"),
            Self::ZeroDrawSize => write!(f, "particle draw size must be >= 1"),
            Self::NonPositiveDuration(v) => {
                write!(f, "scroll effect duration must be > 0 (got {v})")
            }
            Self::NonPositivePower { field, value } => {
                write!(f, "{field} must be a finite value > 0 (got {value})")
            }
            Self::NegativeFactor { field, value } => {
                write!(f, "{field} must be a finite value >= 0 (got {value})")
            }
            Self::NonFinite { field, value } => write!(f, "{field} must be finite (got {value})"),
            Self::InvalidColor(raw) => write!(f, "invalid particle color {raw:?}, expected \"R, G, B\""),
            Self::Json(msg) => write!(f, "config JSON error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure to obtain a raster for a source.
///
/// Terminal for that source: the component logs it once, draws nothing, and
/// does not retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The bytes could not be decoded as an image.
    Decode(String),
    /// The source file could not be read.
    Io(String),
    /// The host could not fetch the source or was denied pixel access
    /// (e.g. a cross-origin image without CORS headers).
    Fetch(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(msg) => write!(f, "image decode error: {msg}"),
            Self::Io(msg) => write!(f, "image read error: {msg}"),
            Self::Fetch(msg) => write!(f, "image fetch error: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {}
