use serde::{Deserialize, Serialize};

use super::{
    CompareMode, ComparisonConfig, DiffViewMode, SsimMode, Thresholds, validate_edge_thickness,
    validate_multiplier, validate_psnr_threshold, validate_ssim_threshold, validate_weights,
};

fn parse_edge_thickness(s: &str) -> Result<u32, String> {
    let v: u32 = s.parse().map_err(|e| format!("{e}"))?;
    validate_edge_thickness(v)
}

fn parse_multiplier(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    validate_multiplier(v)
}

/// `R,G,B`, e.g. `0.299,0.587,0.114`.
fn parse_weights(s: &str) -> Result<[f64; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected three comma-separated weights, got {s:?}"));
    };
    let parse = |p: &str| p.parse::<f64>().map_err(|e| format!("{p:?}: {e}"));
    validate_weights([parse(*r)?, parse(*g)?, parse(*b)?])
}

fn parse_psnr_threshold(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    validate_psnr_threshold(v)
}

fn parse_ssim_threshold(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    validate_ssim_threshold(v)
}

/// Comparison settings.
///
/// Fields are `Option` so the same struct serves the `[compare]` TOML section
/// and the CLI flags; `None` means "not set at this layer".
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompareOptions {
    /// Which pixels are scored
    #[arg(long, value_enum)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<CompareMode>,

    /// Border band width in pixels (edges-only mode)
    #[arg(long, value_parser = parse_edge_thickness)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_thickness: Option<u32>,

    /// Channel policy for SSIM
    #[arg(long, value_enum)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssim_mode: Option<SsimMode>,

    /// R,G,B weights for weighted SSIM
    #[arg(long, value_parser = parse_weights)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssim_weights: Option<[f64; 3]>,

    /// Diff image style
    #[arg(long = "diff-view", value_enum)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_view_mode: Option<DiffViewMode>,

    /// Contrast gain for the diff image (>= 1.0)
    #[arg(long, value_parser = parse_multiplier)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_multiplier: Option<f64>,
}

impl CompareOptions {
    /// Overlay non-None fields from `other` onto self.
    pub fn merge(&mut self, other: &CompareOptions) {
        if other.mode.is_some() {
            self.mode = other.mode;
        }
        if other.edge_thickness.is_some() {
            self.edge_thickness = other.edge_thickness;
        }
        if other.ssim_mode.is_some() {
            self.ssim_mode = other.ssim_mode;
        }
        if other.ssim_weights.is_some() {
            self.ssim_weights = other.ssim_weights;
        }
        if other.diff_view_mode.is_some() {
            self.diff_view_mode = other.diff_view_mode;
        }
        if other.diff_multiplier.is_some() {
            self.diff_multiplier = other.diff_multiplier;
        }
    }

    pub fn to_config(&self) -> ComparisonConfig {
        let defaults = ComparisonConfig::default();
        ComparisonConfig {
            mode: self.mode.unwrap_or(defaults.mode),
            edge_thickness: self.edge_thickness.unwrap_or(defaults.edge_thickness),
            ssim_mode: self.ssim_mode.unwrap_or(defaults.ssim_mode),
            ssim_weights: self.ssim_weights.unwrap_or(defaults.ssim_weights),
            diff_view_mode: self.diff_view_mode.unwrap_or(defaults.diff_view_mode),
            diff_multiplier: self.diff_multiplier.unwrap_or(defaults.diff_multiplier),
        }
    }
}

#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdOptions {
    /// Flag cameras whose PSNR is below this (dB)
    #[arg(long, value_parser = parse_psnr_threshold)]
    #[serde(default, rename = "psnr", skip_serializing_if = "Option::is_none")]
    pub psnr_threshold: Option<f64>,

    /// Flag cameras whose SSIM is below this
    #[arg(long, value_parser = parse_ssim_threshold)]
    #[serde(default, rename = "ssim", skip_serializing_if = "Option::is_none")]
    pub ssim_threshold: Option<f64>,
}

impl ThresholdOptions {
    pub fn merge(&mut self, other: &ThresholdOptions) {
        if other.psnr_threshold.is_some() {
            self.psnr_threshold = other.psnr_threshold;
        }
        if other.ssim_threshold.is_some() {
            self.ssim_threshold = other.ssim_threshold;
        }
    }

    pub fn to_thresholds(&self) -> Thresholds {
        let defaults = Thresholds::default();
        Thresholds {
            psnr: self.psnr_threshold.unwrap_or(defaults.psnr),
            ssim: self.ssim_threshold.unwrap_or(defaults.ssim),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchOptions {
    /// Concurrent comparisons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<usize>,
}

impl BatchOptions {
    pub fn parallel(&self) -> usize {
        self.parallel.unwrap_or(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_parse_from_csv() {
        assert_eq!(parse_weights("0.2, 0.5,0.3").unwrap(), [0.2, 0.5, 0.3]);
        assert!(parse_weights("0.2,0.5").is_err());
        assert!(parse_weights("a,b,c").is_err());
        assert!(parse_weights("1,-1,0").is_err());
    }

    #[test]
    fn merge_overlays_only_set_fields() {
        let mut base = CompareOptions {
            mode: Some(CompareMode::EdgesOnly),
            edge_thickness: Some(3),
            ..CompareOptions::default()
        };
        base.merge(&CompareOptions {
            edge_thickness: Some(9),
            diff_multiplier: Some(2.0),
            ..CompareOptions::default()
        });
        let config = base.to_config();
        assert_eq!(config.mode, CompareMode::EdgesOnly);
        assert_eq!(config.edge_thickness, 9);
        assert_eq!(config.diff_multiplier, 2.0);
        assert_eq!(config.ssim_mode, SsimMode::Gray);
    }

    #[test]
    fn thresholds_default_when_unset() {
        let t = ThresholdOptions {
            ssim_threshold: Some(0.8),
            ..ThresholdOptions::default()
        }
        .to_thresholds();
        assert_eq!(t.psnr, 30.0);
        assert_eq!(t.ssim, 0.8);
    }
}
