//! Frame-time measurement harness for dissolve renders.
//!
//! Collects per-frame timing and particle counts, summarises them into a
//! percentile histogram, and exports JSON / JSONL. Platform-agnostic: it
//! only sees `Duration`s and counts, so the same collector runs natively and
//! in the browser.
//!
//! # Usage
//!
//! ```ignore
//! let mut collector = FrameTimeCollector::new("hero", width, height);
//!
//! for progress in [0.0, 0.25, 0.5, 0.75, 1.0] {
//!     let stats = renderer.render(progress, &mut surface);
//!     collector.record_frame(FrameRecord::from_stats(&stats, Some(surface.checksum())));
//! }
//!
//! println!("{}", collector.report().to_json());
//! ```

use serde::Serialize;
use std::time::Duration;

use crate::renderer::FrameStats;

const JSONL_SCHEMA_VERSION: &str = "hooper-frame-v1";

/// A single frame's measurements.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    /// Wall-clock time for the frame (kernel + draw).
    pub elapsed: Duration,
    pub progress: f64,
    pub particles_drawn: usize,
    pub particles_transitioning: usize,
    /// Surface hash, when the caller drew into a [`PixelSurface`](crate::PixelSurface).
    pub checksum: Option<String>,
}

impl FrameRecord {
    #[must_use]
    pub fn from_stats(stats: &FrameStats, checksum: Option<String>) -> Self {
        Self {
            elapsed: stats.elapsed,
            progress: stats.summary.progress,
            particles_drawn: stats.drawn,
            particles_transitioning: stats.summary.transitioning,
            checksum,
        }
    }
}

/// Collects per-frame records and produces summary statistics.
pub struct FrameTimeCollector {
    run_id: String,
    width: u32,
    height: u32,
    records: Vec<FrameRecord>,
}

impl FrameTimeCollector {
    /// Create a new collector for a run over a `width x height` surface.
    #[must_use]
    pub fn new(run_id: &str, width: u32, height: u32) -> Self {
        Self {
            run_id: run_id.to_string(),
            width,
            height,
            records: Vec::with_capacity(256),
        }
    }

    pub fn record_frame(&mut self, record: FrameRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    /// Produce a summary report from all recorded frames.
    #[must_use]
    pub fn report(&self) -> SessionReport {
        let mut times_us: Vec<u64> = self
            .records
            .iter()
            .map(|r| r.elapsed.as_micros() as u64)
            .collect();
        times_us.sort_unstable();

        let n = self.records.len();
        let total_drawn: u64 = self.records.iter().map(|r| r.particles_drawn as u64).sum();
        let peak_transitioning = self
            .records
            .iter()
            .map(|r| r.particles_transitioning)
            .max()
            .unwrap_or(0);

        SessionReport {
            run_id: self.run_id.clone(),
            width: self.width,
            height: self.height,
            frame_time: histogram_or_default(&times_us),
            particle_stats: ParticleStats {
                total_drawn,
                avg_drawn_per_frame: if n > 0 {
                    total_drawn as f64 / n as f64
                } else {
                    0.0
                },
                peak_transitioning,
            },
        }
    }

    /// One JSON object per frame, newline-terminated.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = String::new();
        for (i, r) in self.records.iter().enumerate() {
            let row = JsonlFrameRecord {
                schema_version: JSONL_SCHEMA_VERSION,
                run_id: &self.run_id,
                width: self.width,
                height: self.height,
                frame_idx: i,
                progress: r.progress,
                elapsed_us: r.elapsed.as_micros() as u64,
                particles_drawn: r.particles_drawn,
                particles_transitioning: r.particles_transitioning,
                frame_hash: r.checksum.as_deref(),
            };
            if let Ok(line) = serde_json::to_string(&row) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }
}

#[derive(Debug, Serialize)]
struct JsonlFrameRecord<'a> {
    schema_version: &'static str,
    run_id: &'a str,
    width: u32,
    height: u32,
    frame_idx: usize,
    progress: f64,
    elapsed_us: u64,
    particles_drawn: usize,
    particles_transitioning: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame_hash: Option<&'a str>,
}

/// Percentile histogram of frame times.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FrameTimeHistogram {
    pub count: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub mean_us: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ParticleStats {
    pub total_drawn: u64,
    pub avg_drawn_per_frame: f64,
    pub peak_transitioning: usize,
}

/// Complete session report.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub run_id: String,
    pub width: u32,
    pub height: u32,
    pub frame_time: FrameTimeHistogram,
    pub particle_stats: ParticleStats,
}

impl SessionReport {
    /// Serialize to a pretty JSON string.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((sorted.len() as f64 * p) as usize).min(sorted.len() - 1);
    sorted[idx]
}

fn histogram_or_default(samples: &[u64]) -> FrameTimeHistogram {
    if samples.is_empty() {
        return FrameTimeHistogram::default();
    }
    FrameTimeHistogram {
        count: samples.len() as u64,
        min_us: samples[0],
        max_us: samples[samples.len() - 1],
        p50_us: percentile(samples, 0.50),
        p95_us: percentile(samples, 0.95),
        p99_us: percentile(samples, 0.99),
        mean_us: samples.iter().sum::<u64>() / samples.len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(us: u64, drawn: usize) -> FrameRecord {
        FrameRecord {
            elapsed: Duration::from_micros(us),
            progress: 0.5,
            particles_drawn: drawn,
            particles_transitioning: drawn / 2,
            checksum: None,
        }
    }

    #[test]
    fn empty_collector_produces_zero_report() {
        let c = FrameTimeCollector::new("test", 10, 10);
        let r = c.report();
        assert_eq!(r.frame_time.count, 0);
        assert_eq!(r.particle_stats.total_drawn, 0);
        assert_eq!(r.particle_stats.avg_drawn_per_frame, 0.0);
    }

    #[test]
    fn histogram_percentiles() {
        let mut c = FrameTimeCollector::new("test", 10, 10);
        for i in 1..=100u64 {
            c.record_frame(frame(i, 4));
        }
        let r = c.report();
        assert_eq!(r.frame_time.count, 100);
        assert_eq!(r.frame_time.min_us, 1);
        assert_eq!(r.frame_time.max_us, 100);
        assert!(r.frame_time.p50_us >= 49 && r.frame_time.p50_us <= 51);
        assert!(r.frame_time.p95_us >= 94 && r.frame_time.p95_us <= 96);
        assert!(r.frame_time.p99_us >= 98 && r.frame_time.p99_us <= 100);
        assert_eq!(r.particle_stats.total_drawn, 400);
        assert_eq!(r.particle_stats.peak_transitioning, 2);
    }

    #[test]
    fn jsonl_has_one_line_per_frame() {
        let mut c = FrameTimeCollector::new("test", 10, 10);
        for i in 0..5 {
            let mut f = frame(100, i);
            if i % 2 == 0 {
                f.checksum = Some(format!("fnv1a64:{i:016x}"));
            }
            c.record_frame(f);
        }
        let jsonl = c.to_jsonl();
        let lines: Vec<&str> = jsonl.lines().collect();
        assert_eq!(lines.len(), 5);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["schema_version"], JSONL_SCHEMA_VERSION);
        assert_eq!(first["frame_hash"], "fnv1a64:0000000000000000");
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert!(second.get("frame_hash").is_none());
        assert_eq!(second["particles_drawn"], 1);
    }

    #[test]
    fn report_json_is_valid() {
        let mut c = FrameTimeCollector::new("hero", 1400, 600);
        c.record_frame(frame(123, 10));
        let json = c.report().to_json();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["run_id"], "hero");
        assert_eq!(v["width"], 1400);
        assert_eq!(v["frame_time"]["p50_us"], 123);
    }

    #[test]
    fn jsonl_escapes_run_id() {
        let mut c = FrameTimeCollector::new("run \"quoted\"", 1, 1);
        c.record_frame(frame(1, 0));
        let line = c.to_jsonl();
        let v: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(v["run_id"], "run \"quoted\"");
    }
}
