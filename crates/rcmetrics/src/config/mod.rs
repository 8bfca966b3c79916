pub mod options;
pub mod resolve;
pub mod template;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::compare::{CompareError, ComparisonResult};

pub use self::options::{BatchOptions, CompareOptions, ThresholdOptions};
pub use self::resolve::{CliOverrides, ResolvedRunConfig};
pub use self::template::write_template;

pub const CONFIG_FILE: &str = "rcmetrics.toml";

/// Which pixels take part in scoring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompareMode {
    #[default]
    Standard,
    /// Skip pixels where the render is fully transparent.
    ExcludeTransparent,
    /// Only a band along the image border.
    EdgesOnly,
}

/// Channel policy for SSIM.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SsimMode {
    #[default]
    Gray,
    Color,
    Weighted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffViewMode {
    #[default]
    Heatmap,
    Grayscale,
    Colorized,
}

/// Everything a single comparison needs to know.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonConfig {
    pub mode: CompareMode,
    /// Border band width in pixels, used by [`CompareMode::EdgesOnly`].
    pub edge_thickness: u32,
    pub ssim_mode: SsimMode,
    /// R, G, B weights for [`SsimMode::Weighted`]. Not normalized.
    pub ssim_weights: [f64; 3],
    pub diff_view_mode: DiffViewMode,
    /// Contrast gain applied to the diff image, >= 1.
    pub diff_multiplier: f64,
}

pub const DEFAULT_EDGE_THICKNESS: u32 = 10;
pub const DEFAULT_SSIM_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            mode: CompareMode::default(),
            edge_thickness: DEFAULT_EDGE_THICKNESS,
            ssim_mode: SsimMode::default(),
            ssim_weights: DEFAULT_SSIM_WEIGHTS,
            diff_view_mode: DiffViewMode::default(),
            diff_multiplier: 1.0,
        }
    }
}

impl ComparisonConfig {
    pub fn validate(&self) -> Result<(), CompareError> {
        validate_edge_thickness(self.edge_thickness)
            .and_then(|_| validate_weights(self.ssim_weights))
            .and_then(|_| validate_multiplier(self.diff_multiplier))
            .map(|_| ())
            .map_err(CompareError::InvalidConfig)
    }
}

pub fn validate_edge_thickness(v: u32) -> Result<u32, String> {
    if v == 0 {
        return Err("edge_thickness must be at least 1 pixel".to_string());
    }
    Ok(v)
}

pub fn validate_multiplier(v: f64) -> Result<f64, String> {
    if !v.is_finite() || v < 1.0 {
        return Err(format!("diff_multiplier must be >= 1.0, got {v}"));
    }
    Ok(v)
}

pub fn validate_weights(w: [f64; 3]) -> Result<[f64; 3], String> {
    if w.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(format!(
            "ssim_weights must be non-negative, got {}, {}, {}",
            w[0], w[1], w[2]
        ));
    }
    Ok(w)
}

/// Limits below which a camera is flagged for review.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub psnr: f64,
    pub ssim: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            psnr: 30.0,
            ssim: 0.9,
        }
    }
}

impl Thresholds {
    /// Degenerate results always count as problematic.
    pub fn is_problematic(&self, result: &ComparisonResult) -> bool {
        result.is_degenerate() || result.psnr < self.psnr || result.ssim < self.ssim
    }
}

pub fn validate_psnr_threshold(v: f64) -> Result<f64, String> {
    if !v.is_finite() || v < 0.0 {
        return Err(format!("psnr threshold must be a non-negative dB value, got {v}"));
    }
    Ok(v)
}

pub fn validate_ssim_threshold(v: f64) -> Result<f64, String> {
    if !(-1.0..=1.0).contains(&v) {
        return Err(format!("ssim threshold must be between -1.0 and 1.0, got {v}"));
    }
    Ok(v)
}

/// On-disk shape of `rcmetrics.toml`. Every key is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub compare: CompareOptions,
    #[serde(default)]
    pub thresholds: ThresholdOptions,
    #[serde(default)]
    pub batch: BatchOptions,
}

/// Load the config file.
///
/// An explicit `path` must exist. Without one, `rcmetrics.toml` in the
/// working directory is used when present and defaults otherwise.
pub fn load(path: Option<&Path>) -> Result<FileConfig> {
    let path = match path {
        Some(p) => p,
        None => {
            let default = Path::new(CONFIG_FILE);
            if !default.exists() {
                return Ok(FileConfig::default());
            }
            default
        }
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse(content: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(content)?;
    Ok(config)
}
