use image::{Rgba, RgbaImage};

use super::metrics::luma;
use super::{ImagePair, RegionMask};
use crate::config::DiffViewMode;

/// Visual difference between the two images of `pair`.
///
/// Pixels outside `mask` are fully transparent black; inside it alpha is 255
/// and the colour follows `view`.
pub fn render(
    pair: &ImagePair,
    mask: &RegionMask,
    view: DiffViewMode,
    multiplier: f64,
) -> RgbaImage {
    let (w, h) = pair.dimensions();
    assert_eq!((w, h), mask.dimensions(), "mask does not match the pair");

    let mut out = RgbaImage::new(w, h);
    for (((dst, a), b), keep) in out
        .pixels_mut()
        .zip(pair.rendered().pixels())
        .zip(pair.reference().pixels())
        .zip(mask.bits())
    {
        if !keep {
            continue;
        }
        let d = [0, 1, 2].map(|c| a[c].abs_diff(b[c]));
        let [r, g, b] = match view {
            DiffViewMode::Colorized => d.map(|v| gain(f64::from(v), multiplier)),
            DiffViewMode::Grayscale => [gain(diff_luma(d), multiplier); 3],
            DiffViewMode::Heatmap => jet(gain(diff_luma(d), multiplier)),
        };
        *dst = Rgba([r, g, b, u8::MAX]);
    }
    out
}

fn diff_luma(d: [u8; 3]) -> f64 {
    luma(f64::from(d[0]), f64::from(d[1]), f64::from(d[2]))
}

fn gain(v: f64, multiplier: f64) -> u8 {
    (v * multiplier).round().clamp(0.0, 255.0) as u8
}

/// Blue → cyan → yellow → red ramp.
fn jet(v: u8) -> [u8; 3] {
    let t = f64::from(v) / 255.0;
    let ramp = |center: f64| {
        let c = (1.5 - (4.0 * t - center).abs()).clamp(0.0, 1.0);
        (c * 255.0).round() as u8
    };
    [ramp(3.0), ramp(2.0), ramp(1.0)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::normalize::normalize;
    use image::{DynamicImage, Rgb, RgbImage};

    fn pair_of(a: RgbImage, b: RgbImage) -> ImagePair {
        normalize(&DynamicImage::ImageRgb8(a), &DynamicImage::ImageRgb8(b)).unwrap()
    }

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| Rgb([(x * 20) as u8, (y * 20) as u8, 200]))
    }

    #[test]
    fn colorized_is_absolute_difference() {
        let a = gradient(10, 10);
        let b = RgbImage::from_pixel(10, 10, Rgb([90, 90, 90]));
        let pair = pair_of(a.clone(), b.clone());
        let mask = RegionMask::edge_band(10, 10, 3);
        let diff = render(&pair, &mask, DiffViewMode::Colorized, 1.0);

        for (x, y, px) in diff.enumerate_pixels() {
            if mask.contains(x, y) {
                let (pa, pb) = (a.get_pixel(x, y), b.get_pixel(x, y));
                for c in 0..3 {
                    assert_eq!(px[c], pa[c].abs_diff(pb[c]), "({x},{y}) channel {c}");
                }
                assert_eq!(px[3], 255);
            } else {
                assert_eq!(px, &Rgba([0, 0, 0, 0]));
            }
        }
    }

    #[test]
    fn multiplier_scales_and_clips() {
        let a = RgbImage::from_pixel(2, 2, Rgb([10, 100, 0]));
        let b = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let pair = pair_of(a, b);
        let diff = render(&pair, &RegionMask::full(2, 2), DiffViewMode::Colorized, 4.0);
        assert_eq!(diff.get_pixel(0, 0), &Rgba([40, 255, 0, 255]));
    }

    #[test]
    fn grayscale_broadcasts_luma() {
        let a = RgbImage::from_pixel(3, 3, Rgb([100, 50, 200]));
        let b = RgbImage::from_pixel(3, 3, Rgb([0, 0, 0]));
        let pair = pair_of(a, b);
        let diff = render(&pair, &RegionMask::full(3, 3), DiffViewMode::Grayscale, 1.0);
        // 0.299*100 + 0.587*50 + 0.114*200 = 82.05
        assert_eq!(diff.get_pixel(1, 1), &Rgba([82, 82, 82, 255]));
    }

    #[test]
    fn heatmap_runs_blue_to_red() {
        assert_eq!(jet(0), [0, 0, 128]);
        assert_eq!(jet(255), [128, 0, 0]);
        let mid = jet(128);
        assert!(mid[1] > 200, "mid ramp should be green-ish: {mid:?}");
    }

    #[test]
    fn heatmap_identical_pixels_are_cold() {
        let a = gradient(4, 4);
        let pair = pair_of(a.clone(), a);
        let diff = render(&pair, &RegionMask::full(4, 4), DiffViewMode::Heatmap, 8.0);
        assert!(diff.pixels().all(|p| *p == Rgba([0, 0, 128, 255])));
    }

    #[test]
    fn alpha_mirrors_mask_in_every_view() {
        let a = gradient(8, 8);
        let b = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        let pair = pair_of(a, b);
        let mask = RegionMask::edge_band(8, 8, 2);
        for view in [
            DiffViewMode::Heatmap,
            DiffViewMode::Grayscale,
            DiffViewMode::Colorized,
        ] {
            let diff = render(&pair, &mask, view, 2.0);
            for (x, y, px) in diff.enumerate_pixels() {
                let expected = if mask.contains(x, y) { 255 } else { 0 };
                assert_eq!(px[3], expected, "{view:?} at ({x},{y})");
            }
        }
    }
}
