#![forbid(unsafe_code)]

//! Offline frame rendering: one PNG and one JSONL record per progress step.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use hooper_fx::frame_harness::{FrameRecord, FrameTimeCollector, SessionReport};
use hooper_fx::{
    ConfigError, DissolveConfig, DissolveRenderer, LoadError, ParticleField, PixelSurface, Raster,
};
use tracing::{debug, info, warn};

use crate::cli::{Opts, Preset};

/// Errors from a render run.
#[derive(Debug)]
pub enum DemoError {
    Config(ConfigError),
    Load(LoadError),
    /// No progress steps to render.
    NoFrames,
    /// An output file could not be written.
    Write { path: PathBuf, message: String },
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Load(e) => write!(f, "could not load source: {e}"),
            Self::NoFrames => write!(f, "nothing to render (0 frames)"),
            Self::Write { path, message } => write!(f, "could not write {}: {message}", path.display()),
        }
    }
}

impl std::error::Error for DemoError {}

impl From<ConfigError> for DemoError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<LoadError> for DemoError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

fn write_error(path: &Path, err: impl fmt::Display) -> DemoError {
    DemoError::Write {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Resolve the configuration: a JSON file if given, else the preset.
pub fn load_config(opts: &Opts) -> Result<DissolveConfig, DemoError> {
    let config = match &opts.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| DemoError::Load(LoadError::Io(format!("{path}: {e}"))))?;
            DissolveConfig::from_json(&json)?
        }
        None => match opts.preset {
            Preset::Default => DissolveConfig::default(),
            Preset::Hero => DissolveConfig::hero_portrait(),
        },
    };
    config.validate()?;
    Ok(config)
}

/// Load the source image, or the built-in pattern when none is given.
pub fn load_source(opts: &Opts) -> Result<Raster, DemoError> {
    match &opts.image {
        Some(path) => Ok(Raster::open(path)?),
        None => Ok(stipple_pattern(240, 160)),
    }
}

/// Bright stipple dots inside an ellipse on a transparent background, a
/// stand-in for the hero portrait.
#[must_use]
pub fn stipple_pattern(width: u32, height: u32) -> Raster {
    let (cx, cy) = (f64::from(width) / 2.0, f64::from(height) / 2.0);
    Raster::from_fn(width, height, |x, y| {
        let dx = (f64::from(x) - cx) / cx.max(1.0);
        let dy = (f64::from(y) - cy) / cy.max(1.0);
        let inside = dx * dx + dy * dy <= 1.0;
        // Cheap hash for an irregular dot pattern.
        let h = x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663);
        if inside && h % 3 == 0 {
            let shade = 200 + (h % 56) as u8;
            [shade, shade, shade, 255]
        } else {
            [0, 0, 0, 0]
        }
    })
}

/// Outcome of a render run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub particles: usize,
    pub width: u32,
    pub height: u32,
    /// `(progress, surface checksum)` per rendered frame.
    pub checksums: Vec<(f64, String)>,
    pub pngs: Vec<PathBuf>,
    pub report: SessionReport,
    pub jsonl: String,
}

/// Render every progress step of `opts` into a fresh surface.
pub fn run(opts: &Opts, config: DissolveConfig, raster: &Raster) -> Result<RunSummary, DemoError> {
    let steps = opts.progress_steps();
    if steps.is_empty() {
        return Err(DemoError::NoFrames);
    }

    let field = ParticleField::build(raster, &config);
    if field.is_empty() {
        warn!(
            threshold = config.brightness_threshold,
            "source produced no particles; frames will be blank"
        );
    }
    let particles = field.len();
    let mut renderer = DissolveRenderer::new(field, config);
    let geometry = renderer.geometry();
    let mut surface = renderer.new_surface();
    info!(
        particles,
        width = geometry.width(),
        height = geometry.height(),
        frames = steps.len(),
        "rendering dissolve"
    );

    let out_dir = opts.out_dir.as_deref().map(Path::new);
    if let Some(dir) = out_dir {
        fs::create_dir_all(dir).map_err(|e| write_error(dir, e))?;
    }

    let mut collector = FrameTimeCollector::new(&opts.run_id, geometry.width(), geometry.height());
    let mut checksums = Vec::with_capacity(steps.len());
    let mut pngs = Vec::new();
    for (idx, &progress) in steps.iter().enumerate() {
        let stats = renderer.render(progress, &mut surface);
        let checksum = surface.checksum();
        debug!(
            frame = idx,
            progress,
            drawn = stats.drawn,
            transitioning = stats.summary.transitioning,
            checksum = %checksum,
            "frame rendered"
        );
        collector.record_frame(FrameRecord::from_stats(&stats, Some(checksum.clone())));
        checksums.push((progress, checksum));

        if let Some(dir) = out_dir {
            let path = dir.join(format!("frame_{idx:04}.png"));
            write_png(&surface, &path)?;
            pngs.push(path);
        }
    }

    let jsonl = collector.to_jsonl();
    if let Some(target) = opts.jsonl.as_deref() {
        write_jsonl(target, &jsonl)?;
    }

    Ok(RunSummary {
        particles,
        width: geometry.width(),
        height: geometry.height(),
        checksums,
        pngs,
        report: collector.report(),
        jsonl,
    })
}

fn write_png(surface: &PixelSurface, path: &Path) -> Result<(), DemoError> {
    let image = surface
        .to_raster()
        .into_rgba_image()
        .ok_or_else(|| write_error(path, "surface buffer is incomplete"))?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| write_error(path, e))
}

fn write_jsonl(target: &str, jsonl: &str) -> Result<(), DemoError> {
    if target == "-" {
        let mut stdout = io::stdout().lock();
        return stdout
            .write_all(jsonl.as_bytes())
            .map_err(|e| write_error(Path::new("<stdout>"), e));
    }
    let path = Path::new(target);
    fs::write(path, jsonl).map_err(|e| write_error(path, e))
}
