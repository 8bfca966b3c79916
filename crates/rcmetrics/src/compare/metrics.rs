use image::{Rgba, RgbaImage};

use super::ssim::mean_ssim;
use super::{ImagePair, RegionMask};
use crate::config::SsimMode;

/// PSNR reported when the masked MSE is zero.
///
/// Finite so that averages, thresholds and JSON stay usable. Any non-zero
/// MSE gets the plain formula value, which can exceed this on large images.
pub const PSNR_PERFECT_MATCH: f64 = 100.0;

const MAX_VALUE: f64 = 255.0;

/// ITU-R BT.601 luma on 0..=255 samples.
pub(crate) fn luma(r: f64, g: f64, b: f64) -> f64 {
    0.299 * r + 0.587 * g + 0.114 * b
}

fn assert_mask(pair: &ImagePair, mask: &RegionMask) {
    assert_eq!(
        pair.dimensions(),
        mask.dimensions(),
        "mask does not match the normalized pair"
    );
}

/// Mean of squared RGB differences over masked pixels.
pub fn mean_squared_error(pair: &ImagePair, mask: &RegionMask) -> f64 {
    assert_mask(pair, mask);
    if mask.valid_count() == 0 {
        return 0.0;
    }

    let mut sum = 0.0;
    for ((a, b), keep) in pair
        .rendered()
        .pixels()
        .zip(pair.reference().pixels())
        .zip(mask.bits())
    {
        if !keep {
            continue;
        }
        for c in 0..3 {
            let d = f64::from(a[c]) - f64::from(b[c]);
            sum += d * d;
        }
    }
    sum / (mask.valid_count() as f64 * 3.0)
}

/// PSNR in dB over the masked pixels; [`PSNR_PERFECT_MATCH`] when they are identical.
pub fn psnr(pair: &ImagePair, mask: &RegionMask) -> f64 {
    let mse = mean_squared_error(pair, mask);
    if mse == 0.0 {
        return PSNR_PERFECT_MATCH;
    }
    10.0 * (MAX_VALUE * MAX_VALUE / mse).log10()
}

/// SSIM under the given channel policy.
///
/// With a partial mask, pixels outside it are zeroed in both images before
/// the windowed statistic runs. Windows straddling the mask boundary still
/// see those zeros, so this approximates a masked SSIM rather than computing
/// one exactly.
pub fn ssim(pair: &ImagePair, mask: &RegionMask, mode: SsimMode, weights: [f64; 3]) -> f64 {
    assert_mask(pair, mask);
    match mode {
        SsimMode::Gray => {
            let gray = |p: &Rgba<u8>| {
                luma(f64::from(p[0]), f64::from(p[1]), f64::from(p[2])).round()
            };
            plane_ssim(pair, mask, gray)
        }
        SsimMode::Color => channel_ssim(pair, mask).iter().sum::<f64>() / 3.0,
        SsimMode::Weighted => channel_ssim(pair, mask)
            .iter()
            .zip(weights)
            .map(|(s, w)| s * w)
            .sum(),
    }
}

fn channel_ssim(pair: &ImagePair, mask: &RegionMask) -> [f64; 3] {
    [0, 1, 2].map(|c| plane_ssim(pair, mask, |p: &Rgba<u8>| f64::from(p[c])))
}

fn plane_ssim(pair: &ImagePair, mask: &RegionMask, sample: impl Fn(&Rgba<u8>) -> f64) -> f64 {
    let (w, h) = pair.dimensions();
    let a = extract_plane(pair.rendered(), mask, &sample);
    let b = extract_plane(pair.reference(), mask, &sample);
    mean_ssim(&a, &b, w as usize, h as usize)
}

fn extract_plane(
    image: &RgbaImage,
    mask: &RegionMask,
    sample: &impl Fn(&Rgba<u8>) -> f64,
) -> Vec<f64> {
    image
        .pixels()
        .zip(mask.bits())
        .map(|(p, keep)| if *keep { sample(p) } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::normalize::normalize;
    use image::{DynamicImage, Rgb, RgbImage};

    fn flat(w: u32, h: u32, v: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(v)))
    }

    fn textured(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            let v = ((x * 37 + y * 11) % 200) as u8;
            Rgb([v, v.wrapping_add(20), 255 - v])
        }))
    }

    #[test]
    fn mse_of_constant_offset() {
        let pair = normalize(&flat(8, 8, [100; 3]), &flat(8, 8, [110; 3])).unwrap();
        let mask = RegionMask::full(8, 8);
        assert_eq!(mean_squared_error(&pair, &mask), 100.0);
        let expected = 10.0 * (65025.0f64 / 100.0).log10();
        assert!((psnr(&pair, &mask) - expected).abs() < 1e-12);
    }

    #[test]
    fn mse_averages_rgb_channels_only() {
        let a = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 30, 255])));
        let b = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 1])));
        let pair = normalize(&a, &b).unwrap();
        let mask = RegionMask::full(4, 4);
        assert_eq!(mean_squared_error(&pair, &mask), 300.0);
    }

    #[test]
    fn perfect_match_uses_sentinel() {
        let img = textured(16, 16);
        let pair = normalize(&img, &img).unwrap();
        assert_eq!(psnr(&pair, &RegionMask::full(16, 16)), PSNR_PERFECT_MATCH);
    }

    #[test]
    fn tiny_error_scores_above_sentinel() {
        let a = RgbImage::from_pixel(2000, 2000, Rgb([50, 50, 50]));
        let mut b = a.clone();
        b.put_pixel(0, 0, Rgb([51, 50, 50]));
        let pair = normalize(&DynamicImage::ImageRgb8(a), &DynamicImage::ImageRgb8(b)).unwrap();
        let mask = RegionMask::full(2000, 2000);
        let mse = mean_squared_error(&pair, &mask);
        assert!((mse - 1.0 / 12_000_000.0).abs() < 1e-15);
        let expected = 10.0 * (255.0f64 * 255.0 / mse).log10();
        let got = psnr(&pair, &mask);
        assert_eq!(got, expected);
        assert!(got > PSNR_PERFECT_MATCH, "psnr = {got}");
    }

    #[test]
    fn psnr_ignores_unmasked_pixels() {
        let a = flat(10, 10, [0; 3]);
        let mut b = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        b.put_pixel(5, 5, Rgb([255, 255, 255]));
        let pair = normalize(&a, &DynamicImage::ImageRgb8(b)).unwrap();
        let band = RegionMask::edge_band(10, 10, 2);
        assert_eq!(psnr(&pair, &band), PSNR_PERFECT_MATCH);
        assert!(psnr(&pair, &RegionMask::full(10, 10)) < PSNR_PERFECT_MATCH);
    }

    #[test]
    fn color_and_gray_agree_on_gray_content() {
        let a = DynamicImage::ImageRgb8(RgbImage::from_fn(24, 24, |x, y| {
            let v = ((x * 13 + y * 7) % 256) as u8;
            Rgb([v, v, v])
        }));
        let b = flat(24, 24, [90; 3]);
        let pair = normalize(&a, &b).unwrap();
        let mask = RegionMask::full(24, 24);
        let gray = ssim(&pair, &mask, SsimMode::Gray, [0.0; 3]);
        let color = ssim(&pair, &mask, SsimMode::Color, [0.0; 3]);
        assert!((gray - color).abs() < 1e-9);
    }

    #[test]
    fn weighted_selects_channels() {
        let a = textured(20, 20);
        // Only the red channel differs.
        let b = DynamicImage::ImageRgb8(RgbImage::from_fn(20, 20, |x, y| {
            let v = ((x * 37 + y * 11) % 200) as u8;
            Rgb([0, v.wrapping_add(20), 255 - v])
        }));
        let pair = normalize(&a, &b).unwrap();
        let mask = RegionMask::full(20, 20);
        let green_only = ssim(&pair, &mask, SsimMode::Weighted, [0.0, 1.0, 0.0]);
        let red_only = ssim(&pair, &mask, SsimMode::Weighted, [1.0, 0.0, 0.0]);
        assert!((green_only - 1.0).abs() < 1e-9);
        assert!(red_only < 0.5);
        let unnormalized = ssim(&pair, &mask, SsimMode::Weighted, [0.0, 2.0, 0.0]);
        assert!((unnormalized - 2.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_with_equal_thirds_matches_color() {
        let pair = normalize(&textured(16, 16), &flat(16, 16, [40, 80, 120])).unwrap();
        let mask = RegionMask::full(16, 16);
        let color = ssim(&pair, &mask, SsimMode::Color, [0.0; 3]);
        let third = 1.0 / 3.0;
        let weighted = ssim(&pair, &mask, SsimMode::Weighted, [third; 3]);
        assert!((color - weighted).abs() < 1e-9);
    }

    #[test]
    fn masked_out_differences_do_not_affect_ssim() {
        let a = textured(30, 30);
        let mut b = match textured(30, 30) {
            DynamicImage::ImageRgb8(img) => img,
            _ => unreachable!(),
        };
        for y in 10..20 {
            for x in 10..20 {
                b.put_pixel(x, y, Rgb([255, 0, 0]));
            }
        }
        let pair = normalize(&a, &DynamicImage::ImageRgb8(b)).unwrap();
        let band = RegionMask::edge_band(30, 30, 5);
        let s = ssim(&pair, &band, SsimMode::Gray, [0.0; 3]);
        assert!((s - 1.0).abs() < 1e-9, "ssim = {s}");
    }
}
