#![forbid(unsafe_code)]

//! Hooper offline renderer binary entry point.

use hooper_demo::cli;
use hooper_demo::render::{self, DemoError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(opts: &cli::Opts) -> Result<(), DemoError> {
    let config = render::load_config(opts)?;
    let raster = render::load_source(opts)?;
    let summary = render::run(opts, config, &raster)?;
    info!(
        run_id = %summary.report.run_id,
        particles = summary.particles,
        frames = summary.checksums.len(),
        width = summary.width,
        height = summary.height,
        p50_us = summary.report.frame_time.p50_us,
        p99_us = summary.report.frame_time.p99_us,
        pngs = summary.pngs.len(),
        "render complete"
    );
    Ok(())
}

fn main() {
    let opts = cli::Opts::parse();
    init_logging(opts.log_json);

    if let Err(e) = run(&opts) {
        error!(error = %e, "render failed");
        eprintln!("hooper-demo: {e}");
        std::process::exit(1);
    }
}
