#![forbid(unsafe_code)]

//! Command-line argument parsing for the offline renderer.
//!
//! Parses args manually to keep the binary lean.
//! Supports environment variable overrides via `HOOPER_DEMO_*` prefix.

use std::env;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
Hooper Dissolve Renderer: render the scroll dissolve offline

USAGE:
    hooper-demo [OPTIONS] [IMAGE]

ARGS:
    IMAGE                PNG/GIF/JPEG source (default: built-in stipple pattern)

OPTIONS:
    --preset=NAME        Base configuration: 'default' or 'hero' (default: hero)
    --config=PATH        JSON configuration file (camelCase keys, replaces the preset)
    --frames=N           Render N evenly spaced progress steps from 0 to 1 (default: 9)
    --progress=LIST      Explicit comma-separated progress values, e.g. 0,0.5,1
    --out=DIR            Write one PNG per frame into DIR
    --jsonl=PATH         Write per-frame JSONL records to PATH (or '-' for stdout)
    --run-id=ID          Run id for JSONL records (default: hooper-demo)
    --log-json           Emit logs as JSON lines
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    HOOPER_DEMO_PRESET        Override --preset
    HOOPER_DEMO_CONFIG        Override --config
    HOOPER_DEMO_FRAMES        Override --frames
    HOOPER_DEMO_OUT           Override --out
    HOOPER_DEMO_JSONL         Override --jsonl
    HOOPER_DEMO_RUN_ID        Override --run-id
    HOOPER_DEMO_LOG_JSON      Emit JSON logs (1/true)
    RUST_LOG                  Log filter (default: info)";

/// Base configuration to start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Default,
    Hero,
}

impl Preset {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Self::Default),
            "hero" => Some(Self::Hero),
            _ => None,
        }
    }
}

/// Parsed command-line options.
#[derive(Debug, Clone)]
pub struct Opts {
    /// Source image path; `None` renders the built-in pattern.
    pub image: Option<String>,
    pub preset: Preset,
    /// JSON config file; missing keys take library defaults, not the preset.
    pub config: Option<String>,
    /// Number of evenly spaced progress steps.
    pub frames: u32,
    /// Explicit progress values (overrides `frames`).
    pub progress: Option<Vec<f64>>,
    /// PNG output directory.
    pub out_dir: Option<String>,
    /// JSONL output path, `-` for stdout.
    pub jsonl: Option<String>,
    pub run_id: String,
    pub log_json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseError {
    Help,
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArg(String),
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            image: None,
            preset: Preset::Hero,
            config: None,
            frames: 9,
            progress: None,
            out_dir: None,
            jsonl: None,
            run_id: "hooper-demo".into(),
            log_json: false,
        }
    }
}

impl Opts {
    /// Parse command-line arguments and environment variables.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("hooper-demo {VERSION}");
                process::exit(0);
            }
            Err(ParseError::InvalidValue { flag, value }) => {
                eprintln!("Invalid {flag} value: {value}");
                process::exit(1);
            }
            Err(ParseError::UnknownArg(arg)) => {
                eprintln!("Unknown argument: {arg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Progress values to render, in order.
    #[must_use]
    pub fn progress_steps(&self) -> Vec<f64> {
        if let Some(list) = &self.progress {
            return list.clone();
        }
        match self.frames {
            0 => Vec::new(),
            1 => vec![0.0],
            n => {
                let last = f64::from(n - 1);
                (0..n).map(|i| f64::from(i) / last).collect()
            }
        }
    }

    fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Apply environment variable defaults first
        if let Some(val) = get_env("HOOPER_DEMO_PRESET")
            && let Some(preset) = Preset::parse(&val)
        {
            opts.preset = preset;
        }
        if let Some(val) = get_env("HOOPER_DEMO_CONFIG")
            && !val.trim().is_empty()
        {
            opts.config = Some(val);
        }
        if let Some(val) = get_env("HOOPER_DEMO_FRAMES")
            && let Ok(n) = val.parse()
        {
            opts.frames = n;
        }
        if let Some(val) = get_env("HOOPER_DEMO_OUT")
            && !val.trim().is_empty()
        {
            opts.out_dir = Some(val);
        }
        if let Some(val) = get_env("HOOPER_DEMO_JSONL")
            && !val.trim().is_empty()
        {
            opts.jsonl = Some(val);
        }
        if let Some(val) = get_env("HOOPER_DEMO_RUN_ID")
            && !val.trim().is_empty()
        {
            opts.run_id = val;
        }
        if let Some(val) = get_env("HOOPER_DEMO_LOG_JSON") {
            opts.log_json = val == "1" || val.eq_ignore_ascii_case("true");
        }

        // Parse command-line args (override env vars)
        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                "--log-json" => opts.log_json = true,
                other => {
                    if let Some(val) = other.strip_prefix("--preset=") {
                        opts.preset = Preset::parse(val).ok_or_else(|| ParseError::InvalidValue {
                            flag: "--preset",
                            value: val.to_string(),
                        })?;
                    } else if let Some(val) = other.strip_prefix("--config=") {
                        opts.config = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--frames=") {
                        match val.parse::<u32>() {
                            Ok(n) if n > 0 => opts.frames = n,
                            _ => {
                                return Err(ParseError::InvalidValue {
                                    flag: "--frames",
                                    value: val.to_string(),
                                });
                            }
                        }
                    } else if let Some(val) = other.strip_prefix("--progress=") {
                        match parse_progress_list(val) {
                            Some(list) => opts.progress = Some(list),
                            None => {
                                return Err(ParseError::InvalidValue {
                                    flag: "--progress",
                                    value: val.to_string(),
                                });
                            }
                        }
                    } else if let Some(val) = other.strip_prefix("--out=") {
                        opts.out_dir = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--jsonl=") {
                        opts.jsonl = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--run-id=") {
                        opts.run_id = val.to_string();
                    } else if !other.starts_with('-') && opts.image.is_none() {
                        opts.image = Some(other.to_string());
                    } else {
                        return Err(ParseError::UnknownArg(other.to_string()));
                    }
                }
            }
        }

        Ok(opts)
    }
}

/// Parse `0,0.25,1` into progress values, each in `[0, 1]`.
fn parse_progress_list(raw: &str) -> Option<Vec<f64>> {
    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    if values.is_empty() || values.iter().any(|v| !(0.0..=1.0).contains(v)) {
        return None;
    }
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_with_env<I, S>(
        args: I,
        env_pairs: &[(&'static str, &'static str)],
    ) -> Result<Opts, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = std::collections::HashMap::new();
        for (key, value) in env_pairs {
            map.insert(*key, *value);
        }
        Opts::parse_from_env_and_args(args, |key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn default_opts() {
        let opts = Opts::default();
        assert!(opts.image.is_none());
        assert_eq!(opts.preset, Preset::Hero);
        assert!(opts.config.is_none());
        assert_eq!(opts.frames, 9);
        assert!(opts.progress.is_none());
        assert!(opts.out_dir.is_none());
        assert!(opts.jsonl.is_none());
        assert_eq!(opts.run_id, "hooper-demo");
        assert!(!opts.log_json);
    }

    #[test]
    fn version_string_nonempty() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn help_text_contains_env_vars() {
        for key in [
            "HOOPER_DEMO_PRESET",
            "HOOPER_DEMO_CONFIG",
            "HOOPER_DEMO_FRAMES",
            "HOOPER_DEMO_OUT",
            "HOOPER_DEMO_JSONL",
            "HOOPER_DEMO_RUN_ID",
            "HOOPER_DEMO_LOG_JSON",
        ] {
            assert!(HELP_TEXT.contains(key), "missing {key}");
        }
    }

    #[test]
    fn help_and_version_flags() {
        assert_eq!(parse_with_env(["--help"], &[]).unwrap_err(), ParseError::Help);
        assert_eq!(parse_with_env(["-h"], &[]).unwrap_err(), ParseError::Help);
        assert_eq!(parse_with_env(["--version"], &[]).unwrap_err(), ParseError::Version);
        assert_eq!(parse_with_env(["-V"], &[]).unwrap_err(), ParseError::Version);
    }

    #[test]
    fn flags_parse() {
        let opts = parse_with_env(
            [
                "portrait.png",
                "--preset=default",
                "--frames=4",
                "--out=frames",
                "--jsonl=-",
                "--run-id=ci",
                "--log-json",
            ],
            &[],
        )
        .unwrap();
        assert_eq!(opts.image.as_deref(), Some("portrait.png"));
        assert_eq!(opts.preset, Preset::Default);
        assert_eq!(opts.frames, 4);
        assert_eq!(opts.out_dir.as_deref(), Some("frames"));
        assert_eq!(opts.jsonl.as_deref(), Some("-"));
        assert_eq!(opts.run_id, "ci");
        assert!(opts.log_json);
    }

    #[test]
    fn env_overrides_apply() {
        let env = [
            ("HOOPER_DEMO_PRESET", "default"),
            ("HOOPER_DEMO_FRAMES", "3"),
            ("HOOPER_DEMO_OUT", "out"),
            ("HOOPER_DEMO_RUN_ID", "env-run"),
            ("HOOPER_DEMO_LOG_JSON", "true"),
        ];
        let opts = parse_with_env(Vec::<String>::new(), &env).unwrap();
        assert_eq!(opts.preset, Preset::Default);
        assert_eq!(opts.frames, 3);
        assert_eq!(opts.out_dir.as_deref(), Some("out"));
        assert_eq!(opts.run_id, "env-run");
        assert!(opts.log_json);
    }

    #[test]
    fn args_override_env() {
        let env = [("HOOPER_DEMO_FRAMES", "3"), ("HOOPER_DEMO_PRESET", "default")];
        let opts = parse_with_env(["--frames=12", "--preset=hero"], &env).unwrap();
        assert_eq!(opts.frames, 12);
        assert_eq!(opts.preset, Preset::Hero);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let env = [("HOOPER_DEMO_FRAMES", "lots"), ("HOOPER_DEMO_PRESET", "neon")];
        let opts = parse_with_env(Vec::<String>::new(), &env).unwrap();
        assert_eq!(opts.frames, 9);
        assert_eq!(opts.preset, Preset::Hero);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(
            parse_with_env(["--frames=0"], &[]).unwrap_err(),
            ParseError::InvalidValue {
                flag: "--frames",
                value: "0".into()
            }
        );
        assert_eq!(
            parse_with_env(["--preset=neon"], &[]).unwrap_err(),
            ParseError::InvalidValue {
                flag: "--preset",
                value: "neon".into()
            }
        );
        assert!(parse_with_env(["--progress=0,1.5"], &[]).is_err());
        assert!(parse_with_env(["--progress=0,,1"], &[]).is_err());
    }

    #[test]
    fn unknown_and_extra_args_are_rejected() {
        assert_eq!(
            parse_with_env(["--wat"], &[]).unwrap_err(),
            ParseError::UnknownArg("--wat".into())
        );
        assert_eq!(
            parse_with_env(["a.png", "b.png"], &[]).unwrap_err(),
            ParseError::UnknownArg("b.png".into())
        );
    }

    #[test]
    fn progress_steps_are_evenly_spaced() {
        let opts = Opts {
            frames: 5,
            ..Opts::default()
        };
        assert_eq!(opts.progress_steps(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);

        let single = Opts {
            frames: 1,
            ..Opts::default()
        };
        assert_eq!(single.progress_steps(), vec![0.0]);
    }

    #[test]
    fn explicit_progress_wins_over_frames() {
        let opts = parse_with_env(["--frames=20", "--progress=0, 0.3 ,1"], &[]).unwrap();
        assert_eq!(opts.progress_steps(), vec![0.0, 0.3, 1.0]);
    }
}
