use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use super::options::{CompareOptions, ThresholdOptions};
use super::{ComparisonConfig, FileConfig, Thresholds, load};

pub const ENV_PSNR_THRESHOLD: &str = "RCMETRICS_PSNR_THRESHOLD";
pub const ENV_SSIM_THRESHOLD: &str = "RCMETRICS_SSIM_THRESHOLD";
pub const ENV_PARALLEL: &str = "RCMETRICS_PARALLEL";

/// Values extracted from the CLI that participate in the merge.
#[derive(Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub compare: CompareOptions,
    pub thresholds: ThresholdOptions,
    pub parallel: Option<usize>,
}

/// Fully resolved config after CLI > env > file > defaults merge.
#[derive(Debug)]
pub struct ResolvedRunConfig {
    pub comparison: ComparisonConfig,
    pub thresholds: Thresholds,
    pub parallel: usize,
}

impl ResolvedRunConfig {
    pub fn new(cli: CliOverrides) -> Result<Self> {
        let file_config = load(cli.config_path.as_deref())?;
        Self::from_layers(file_config, |key| std::env::var(key).ok(), cli)
    }

    /// Merge explicit layers; `env` looks up a variable by name.
    pub fn from_layers(
        file_config: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        cli: CliOverrides,
    ) -> Result<Self> {
        let env_f64 = |key: &str| -> Result<Option<f64>> {
            env(key)
                .map(|v| v.parse::<f64>())
                .transpose()
                .with_context(|| format!("{key} must be a valid float"))
        };
        let env_thresholds = ThresholdOptions {
            psnr_threshold: env_f64(ENV_PSNR_THRESHOLD)?,
            ssim_threshold: env_f64(ENV_SSIM_THRESHOLD)?,
        };
        let env_parallel: Option<usize> = env(ENV_PARALLEL)
            .map(|v| v.parse::<usize>())
            .transpose()
            .with_context(|| format!("{ENV_PARALLEL} must be a positive integer"))?;

        let mut compare = file_config.compare;
        compare.merge(&cli.compare);
        let comparison = compare.to_config();
        comparison.validate()?;

        let mut thresholds = file_config.thresholds;
        thresholds.merge(&env_thresholds);
        thresholds.merge(&cli.thresholds);
        let thresholds = thresholds.to_thresholds();
        super::validate_psnr_threshold(thresholds.psnr).map_err(|e| anyhow!("{e}"))?;
        super::validate_ssim_threshold(thresholds.ssim).map_err(|e| anyhow!("{e}"))?;

        let parallel = cli
            .parallel
            .or(env_parallel)
            .unwrap_or_else(|| file_config.batch.parallel());
        if parallel == 0 {
            return Err(anyhow!("parallel must be at least 1"));
        }

        Ok(Self {
            comparison,
            thresholds,
            parallel,
        })
    }
}
