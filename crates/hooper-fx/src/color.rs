#![forbid(unsafe_code)]

//! Packed colors and the `"R, G, B"` particle color triplet.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// PackedRgba
// ---------------------------------------------------------------------------

/// Straight-alpha RGBA color packed into a `u32` (R in the high byte, A in the
/// low byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedRgba(pub u32);

impl PackedRgba {
    pub const TRANSPARENT: Self = Self(0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    #[inline]
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32)
    }

    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    #[inline]
    #[must_use]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    #[must_use]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    #[must_use]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    #[must_use]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    /// Composite `self` over `dst` (source-over, straight alpha).
    #[must_use]
    pub fn over(self, dst: Self) -> Self {
        let sa = f32::from(self.a()) / 255.0;
        if sa >= 1.0 {
            return self;
        }
        if sa <= 0.0 {
            return dst;
        }
        let da = f32::from(dst.a()) / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return Self::TRANSPARENT;
        }
        let channel = |s: u8, d: u8| -> u8 {
            let c = (f32::from(s) * sa + f32::from(d) * da * (1.0 - sa)) / out_a;
            c.round().clamp(0.0, 255.0) as u8
        };
        Self::rgba(
            channel(self.r(), dst.r()),
            channel(self.g(), dst.g()),
            channel(self.b(), dst.b()),
            (out_a * 255.0).round() as u8,
        )
    }
}

// ---------------------------------------------------------------------------
// ParticleColor
// ---------------------------------------------------------------------------

/// Opaque draw color for particles, written as an `"R, G, B"` triplet.
///
/// The triplet form matches the CSS `rgba(R, G, B, a)` the page composes per
/// particle, so the same string is accepted by both the web runner and the
/// demo harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ParticleColor {
    pub const WHITE: Self = Self::new(255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The color at the given opacity, quantized to 8-bit alpha.
    #[inline]
    #[must_use]
    pub fn with_opacity(self, opacity: f64) -> PackedRgba {
        let a = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        PackedRgba::rgba(self.r, self.g, self.b, a)
    }

    /// CSS `fillStyle` string for a 2D canvas context.
    #[must_use]
    pub fn css_rgba(self, opacity: f64) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, opacity.clamp(0.0, 1.0))
    }
}

impl Default for ParticleColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for ParticleColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.r, self.g, self.b)
    }
}

impl FromStr for ParticleColor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let mut parts = s.split(',').map(str::trim);
        let mut channel = || -> Result<u8, ConfigError> {
            parts
                .next()
                .filter(|p| !p.is_empty())
                .and_then(|p| p.parse::<u8>().ok())
                .ok_or_else(|| ConfigError::InvalidColor(s.to_string()))
        };
        let r = channel()?;
        let g = channel()?;
        let b = channel()?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { r, g, b })
    }
}

impl Serialize for ParticleColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ParticleColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
