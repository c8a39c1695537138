#![forbid(unsafe_code)]

//! The single immutable configuration record for a dissolve instance.
//!
//! Every tunable knob of the effect lives in [`DissolveConfig`]. It is
//! validated once, at construction of a [`Dissolve`](crate::Dissolve); the
//! per-frame kernel reads it without re-checking anything.
//!
//! # Sign convention
//!
//! A positive [`max_displacement_x`](DissolveConfig::max_displacement_x)
//! moves particles to the right, and the right edge of the image starts
//! moving first. A negative value mirrors both: particles travel left and the
//! left edge leads. Canvas padding follows the direction of travel.

use serde::{Deserialize, Serialize};

use crate::color::ParticleColor;
use crate::error::ConfigError;

/// Which value of a sampled pixel is compared against the brightness threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BrightnessChannel {
    /// The red channel alone. Matches white-on-transparent stipple art.
    #[default]
    Red,
    /// Rec. 601 luma of the RGB triple.
    Luma,
}

/// How the horizontal padding budget is split around the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaddingMode {
    /// The whole budget goes on the side particles travel toward.
    #[default]
    Directional,
    /// The budget is split evenly left and right.
    Symmetric,
}

/// Where scroll progress comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgressMode {
    /// Trigger offset + duration past the component's document top.
    #[default]
    Trigger,
    /// Fraction of the element scrolled out of the viewport.
    Viewport,
}

/// Construction-time options for the disintegration effect.
///
/// Field names serialize in camelCase so the web host can pass its component
/// props through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DissolveConfig {
    /// Image URL (web) or file path (demo harness).
    pub src: String,
    /// Pixel stride between sampled positions on both axes.
    pub particle_sampling_density: u32,
    /// Side length, in pixels, of each drawn particle square.
    pub particle_draw_size: u32,
    /// A sampled pixel must be strictly brighter than this to become a particle.
    pub brightness_threshold: u8,
    pub brightness_channel: BrightnessChannel,
    pub particle_color: ParticleColor,
    /// Pixels past the component's resting top before progress leaves 0.
    pub scroll_trigger_offset: f64,
    /// Scroll pixels over which progress goes from 0 to 1.
    pub scroll_effect_duration: f64,
    /// Signed maximum horizontal travel; the sign sets the direction.
    pub max_displacement_x: f64,
    /// Fade-rate multiplier. At `>= 1`, a finished particle is invisible.
    pub fade_intensity: f64,
    /// Extra canvas width reserved for travel.
    pub canvas_padding_x: u32,
    pub padding_mode: PaddingMode,
    /// Easing exponent on local progress (`> 1` accelerates).
    pub acceleration_power: f64,
    /// Fan-out multiplier: early starters travel up to `1 + spread` times further.
    pub spread_factor: f64,
    /// Exponent shaping the per-particle start-time distribution.
    pub move_threshold_curve_power: f64,
    pub progress_mode: ProgressMode,
}

impl Default for DissolveConfig {
    fn default() -> Self {
        Self {
            src: String::new(),
            particle_sampling_density: 2,
            particle_draw_size: 1,
            brightness_threshold: 180,
            brightness_channel: BrightnessChannel::Red,
            particle_color: ParticleColor::WHITE,
            scroll_trigger_offset: 50.0,
            scroll_effect_duration: 500.0,
            max_displacement_x: 150.0,
            fade_intensity: 1.5,
            canvas_padding_x: 500,
            padding_mode: PaddingMode::Directional,
            acceleration_power: 1.0,
            spread_factor: 0.0,
            move_threshold_curve_power: 1.0,
            progress_mode: ProgressMode::Trigger,
        }
    }
}

impl DissolveConfig {
    /// Tuning used by the landing page hero portrait.
    #[must_use]
    pub fn hero_portrait() -> Self {
        Self {
            src: "/hero-portrait-stipple.png".into(),
            particle_sampling_density: 2,
            particle_draw_size: 1,
            brightness_threshold: 180,
            scroll_trigger_offset: 0.0,
            scroll_effect_duration: 380.0,
            max_displacement_x: 1000.0,
            fade_intensity: 5.5,
            canvas_padding_x: 1000,
            acceleration_power: 3.0,
            spread_factor: 50.0,
            move_threshold_curve_power: 2.0,
            ..Self::default()
        }
    }

    /// Parse camelCase JSON (missing keys take defaults) and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = src.into();
        self
    }

    #[must_use]
    pub fn with_sampling_density(mut self, density: u32) -> Self {
        self.particle_sampling_density = density;
        self
    }

    #[must_use]
    pub fn with_draw_size(mut self, size: u32) -> Self {
        self.particle_draw_size = size;
        self
    }

    #[must_use]
    pub fn with_brightness_threshold(mut self, threshold: u8) -> Self {
        self.brightness_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_brightness_channel(mut self, channel: BrightnessChannel) -> Self {
        self.brightness_channel = channel;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: ParticleColor) -> Self {
        self.particle_color = color;
        self
    }

    #[must_use]
    pub fn with_scroll_window(mut self, trigger_offset: f64, duration: f64) -> Self {
        self.scroll_trigger_offset = trigger_offset;
        self.scroll_effect_duration = duration;
        self
    }

    #[must_use]
    pub fn with_max_displacement(mut self, max_displacement_x: f64) -> Self {
        self.max_displacement_x = max_displacement_x;
        self
    }

    #[must_use]
    pub fn with_fade_intensity(mut self, fade: f64) -> Self {
        self.fade_intensity = fade;
        self
    }

    #[must_use]
    pub fn with_padding(mut self, padding_x: u32, mode: PaddingMode) -> Self {
        self.canvas_padding_x = padding_x;
        self.padding_mode = mode;
        self
    }

    #[must_use]
    pub fn with_acceleration_power(mut self, power: f64) -> Self {
        self.acceleration_power = power;
        self
    }

    #[must_use]
    pub fn with_spread_factor(mut self, spread: f64) -> Self {
        self.spread_factor = spread;
        self
    }

    #[must_use]
    pub fn with_curve_power(mut self, power: f64) -> Self {
        self.move_threshold_curve_power = power;
        self
    }

    #[must_use]
    pub fn with_progress_mode(mut self, mode: ProgressMode) -> Self {
        self.progress_mode = mode;
        self
    }

    /// Check every numeric option against its domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_sampling_density == 0 {
            return Err(ConfigError::ZeroSamplingDensity);
        }
        if self.particle_draw_size == 0 {
            return Err(ConfigError::ZeroDrawSize);
        }
        if !(self.scroll_effect_duration.is_finite() && self.scroll_effect_duration > 0.0) {
            return Err(ConfigError::NonPositiveDuration(self.scroll_effect_duration));
        }
        for (field, value) in [
            ("acceleration_power", self.acceleration_power),
            ("move_threshold_curve_power", self.move_threshold_curve_power),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositivePower { field, value });
            }
        }
        for (field, value) in [
            ("fade_intensity", self.fade_intensity),
            ("spread_factor", self.spread_factor),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::NegativeFactor { field, value });
            }
        }
        for (field, value) in [
            ("scroll_trigger_offset", self.scroll_trigger_offset),
            ("max_displacement_x", self.max_displacement_x),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }
        Ok(())
    }

    /// `true` when particles travel right (zero counts as right).
    #[inline]
    #[must_use]
    pub fn travels_right(&self) -> bool {
        self.max_displacement_x >= 0.0
    }

    /// Largest distance any particle can travel: `|max| * (1 + spread)`.
    #[inline]
    #[must_use]
    pub fn max_travel(&self) -> f64 {
        self.max_displacement_x.abs() * (1.0 + self.spread_factor)
    }
}
