//! File decoding at the host boundary.
//!
//! The comparator only accepts 8-bit RGB or RGBA. Renders are often 16-bit
//! and references may be grayscale, so decoded files are converted here
//! before they reach [`crate::compare`].

use std::path::Path;

use anyhow::{Context, Result};
use image::{ColorType, DynamicImage};
use tracing::debug;

/// Decode `path` into an 8-bit RGB or RGBA image.
pub fn open(path: &Path) -> Result<DynamicImage> {
    let image =
        image::open(path).with_context(|| format!("Failed to decode {}", path.display()))?;
    Ok(to_8bit_color(image))
}

/// Convert any layout to `Rgb8`, or to `Rgba8` when the source has alpha.
pub fn to_8bit_color(image: DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::Rgb8 | ColorType::Rgba8 => image,
        other if other.has_alpha() => {
            debug!(from = ?other, "converting to rgba8");
            DynamicImage::ImageRgba8(image.to_rgba8())
        }
        other => {
            debug!(from = ?other, "converting to rgb8");
            DynamicImage::ImageRgb8(image.to_rgb8())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, LumaA, Rgba};

    #[test]
    fn eight_bit_color_is_untouched() {
        let rgb = DynamicImage::ImageRgb8(image::RgbImage::new(3, 3));
        assert_eq!(to_8bit_color(rgb).color(), ColorType::Rgb8);
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::new(3, 3));
        assert_eq!(to_8bit_color(rgba).color(), ColorType::Rgba8);
    }

    #[test]
    fn sixteen_bit_keeps_alpha() {
        let img: ImageBuffer<Rgba<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(4, 4, Rgba([65535, 0, 32896, 0]));
        let out = to_8bit_color(DynamicImage::ImageRgba16(img));
        assert_eq!(out.color(), ColorType::Rgba8);
        assert_eq!(out.to_rgba8().get_pixel(0, 0), &Rgba([255, 0, 128, 0]));
    }

    #[test]
    fn gray_becomes_rgb() {
        let gray: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_pixel(2, 2, Luma([77]));
        let out = to_8bit_color(DynamicImage::ImageLuma8(gray));
        assert_eq!(out.color(), ColorType::Rgb8);
        assert_eq!(out.to_rgb8().get_pixel(1, 1).0, [77, 77, 77]);

        let gray_alpha: ImageBuffer<LumaA<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(2, 2, LumaA([10, 200]));
        assert_eq!(
            to_8bit_color(DynamicImage::ImageLumaA8(gray_alpha)).color(),
            ColorType::Rgba8
        );
    }

    #[test]
    fn open_converts_sixteen_bit_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.png");
        let img: ImageBuffer<Rgba<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(5, 5, Rgba([0, 65535, 0, 65535]));
        img.save(&path).unwrap();
        let decoded = open(&path).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgba8);
        assert_eq!(decoded.to_rgba8().get_pixel(2, 2), &Rgba([0, 255, 0, 255]));
    }
}
