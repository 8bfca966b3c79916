pub mod diff;
pub mod mask;
pub mod metrics;
pub mod normalize;
mod ssim;

use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ComparisonConfig;

pub use self::mask::RegionMask;
pub use self::metrics::PSNR_PERFECT_MATCH;
pub use self::normalize::{ImagePair, ImageRole, normalize};

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("invalid {role} image: {reason}")]
    InvalidImage { role: ImageRole, reason: String },

    #[error("invalid comparison config: {0}")]
    InvalidConfig(String),
}

/// Metrics for one rendered/reference pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// dB, or [`PSNR_PERFECT_MATCH`] when the masked pixels are identical.
    pub psnr: f64,
    pub ssim: f64,
    pub valid_pixel_count: u64,
    pub total_pixel_count: u64,
}

impl ComparisonResult {
    /// No pixel survived masking; `psnr` and `ssim` are zero placeholders,
    /// not scores.
    pub fn is_degenerate(&self) -> bool {
        self.valid_pixel_count == 0
    }
}

/// Score `rendered` against `reference`.
///
/// `reference` is resized onto the rendered image's grid when their
/// dimensions differ.
pub fn compare(
    rendered: &DynamicImage,
    reference: &DynamicImage,
    config: &ComparisonConfig,
) -> Result<ComparisonResult, CompareError> {
    let (pair, mask) = prepare(rendered, reference, config)?;
    Ok(score(&pair, &mask, config))
}

/// [`compare`], plus the visual diff described by `config.diff_view_mode`.
pub fn compare_with_diff(
    rendered: &DynamicImage,
    reference: &DynamicImage,
    config: &ComparisonConfig,
) -> Result<(ComparisonResult, RgbaImage), CompareError> {
    let (pair, mask) = prepare(rendered, reference, config)?;
    let result = score(&pair, &mask, config);
    let diff_image = diff::render(&pair, &mask, config.diff_view_mode, config.diff_multiplier);
    Ok((result, diff_image))
}

fn prepare(
    rendered: &DynamicImage,
    reference: &DynamicImage,
    config: &ComparisonConfig,
) -> Result<(ImagePair, RegionMask), CompareError> {
    config.validate()?;
    let pair = normalize(rendered, reference)?;
    let mask = RegionMask::build(&pair, config.mode, config.edge_thickness);
    let (w, h) = pair.dimensions();
    debug!(
        w,
        h,
        channels = pair.channels(),
        mode = ?config.mode,
        valid = mask.valid_count(),
        "prepared pair"
    );
    Ok((pair, mask))
}

fn score(pair: &ImagePair, mask: &RegionMask, config: &ComparisonConfig) -> ComparisonResult {
    let total_pixel_count = mask.total_count();
    if mask.valid_count() == 0 {
        warn!(
            mode = ?config.mode,
            "no eligible pixels after masking, reporting zero metrics"
        );
        return ComparisonResult {
            psnr: 0.0,
            ssim: 0.0,
            valid_pixel_count: 0,
            total_pixel_count,
        };
    }

    ComparisonResult {
        psnr: metrics::psnr(pair, mask),
        ssim: metrics::ssim(pair, mask, config.ssim_mode, config.ssim_weights),
        valid_pixel_count: mask.valid_count(),
        total_pixel_count,
    }
}
