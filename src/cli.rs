//! CLI argument surface (§6 "CLI (for the engine entry point)"), grounded
//! on the corpus's renderer front-ends (e.g. `ashivaram23-renderer` wires
//! `clap::Parser` directly onto a render-settings struct the same way).
//!
//! Parsing itself only produces [`Args`] and the merged plugin-path list;
//! turning that into a running render ([`crate::render::RenderContext`],
//! scene loading) is the binary's job, not this module's.

use crate::config::{CropRect, RenderSettings};
use crate::error::{PearRayError, Result};
use clap::Parser;
use std::path::PathBuf;

/// Process exit codes (§6 "Exit codes").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    InvalidScene = 1,
    MissingPlugin = 2,
    IoFailure = 3,
    Cancelled = 4,
}

impl ExitCode {
    /// Maps an engine [`PearRayError`] onto its §6 exit code.
    #[must_use]
    pub fn from_error(err: &PearRayError) -> Self {
        match err {
            PearRayError::UnresolvedReference(_) | PearRayError::InvalidParameter { .. } => Self::InvalidScene,
            PearRayError::UnknownFactory(_) => Self::MissingPlugin,
            PearRayError::CachePath(_) | PearRayError::UpsamplerTable(_) | PearRayError::Io(_) => Self::IoFailure,
            PearRayError::Cancelled => Self::Cancelled,
            PearRayError::Invariant(_) => Self::InvalidScene,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "pearray", about = "Offline physically-based spectral renderer")]
pub struct Args {
    /// Input scene file.
    pub scene: PathBuf,

    /// Additional plugin search directories, consulted before `PR_PLUGIN_PATH`.
    #[arg(long = "plugin-path")]
    pub plugin_path: Vec<PathBuf>,

    /// Working directory for caches and relative outputs.
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// Worker thread count; 0 selects the available parallelism.
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// RNG seed for deterministic replay.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Crop rectangle as `xmin,xmax,ymin,ymax`, each in `[0, 1]`.
    #[arg(long, value_parser = parse_crop)]
    pub crop: Option<CropRect>,
}

fn parse_crop(s: &str) -> std::result::Result<CropRect, String> {
    let parts: Vec<&str> = s.split(',').collect();
    let [xmin, xmax, ymin, ymax] = parts.as_slice() else {
        return Err(format!("expected 4 comma-separated values, got '{s}'"));
    };
    let parse = |v: &str| v.trim().parse::<f32>().map_err(|e| format!("'{v}' is not a number: {e}"));
    Ok(CropRect { xmin: parse(xmin)?, xmax: parse(xmax)?, ymin: parse(ymin)?, ymax: parse(ymax)? })
}

impl Args {
    /// Merges `--plugin-path` (first) with `PR_PLUGIN_PATH` (`:`-separated,
    /// consulted after), per §6 "Environment variables".
    #[must_use]
    pub fn resolved_plugin_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.plugin_path.clone();
        if let Ok(env_value) = std::env::var("PR_PLUGIN_PATH") {
            paths.extend(env_value.split(':').filter(|s| !s.is_empty()).map(PathBuf::from));
        }
        paths
    }

    /// Folds the parsed CLI flags onto a base [`RenderSettings`], validating
    /// the result (§7.1: a bad setting is a configuration error).
    pub fn apply_to_settings(&self, mut settings: RenderSettings) -> Result<RenderSettings> {
        settings = settings.with_seed(self.seed).with_thread_count(self.threads);
        if let Some(crop) = self.crop {
            settings = settings.with_crop(crop);
        }
        settings.validate()?;
        Ok(settings)
    }
}
