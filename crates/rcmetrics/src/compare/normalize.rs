use std::fmt;

use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, RgbaImage};
use tracing::debug;

use super::CompareError;

/// Triangle support grows with the scale factor, so a downscale averages
/// every source pixel under the destination footprint.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Which side of a comparison an image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Rendered,
    Reference,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rendered => f.write_str("rendered"),
            Self::Reference => f.write_str("reference"),
        }
    }
}

/// A rendered/reference pair with identical dimensions and channel layout.
///
/// Pixels are held as RGBA whatever the source layout was. When the pair
/// has no alpha channel every alpha sample is 255 and carries no meaning.
pub struct ImagePair {
    rendered: RgbaImage,
    reference: RgbaImage,
    has_alpha: bool,
}

impl ImagePair {
    pub fn rendered(&self) -> &RgbaImage {
        &self.rendered
    }

    pub fn reference(&self) -> &RgbaImage {
        &self.reference
    }

    /// `true` when the rendered image carried an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub fn channels(&self) -> u8 {
        if self.has_alpha { 4 } else { 3 }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rendered.dimensions()
    }
}

/// Bring `reference` onto the rendered image's grid and channel layout.
pub fn normalize(
    rendered: &DynamicImage,
    reference: &DynamicImage,
) -> Result<ImagePair, CompareError> {
    let has_alpha = check(rendered, ImageRole::Rendered)?;
    check(reference, ImageRole::Reference)?;

    let (w, h) = (rendered.width(), rendered.height());
    let rendered = rendered.to_rgba8();

    // RGB sources gain an opaque alpha here.
    let mut reference = reference.to_rgba8();
    if reference.dimensions() != (w, h) {
        debug!(
            from_w = reference.width(),
            from_h = reference.height(),
            to_w = w,
            to_h = h,
            "resizing reference to rendered dimensions"
        );
        reference = imageops::resize(&reference, w, h, RESIZE_FILTER);
    }

    if !has_alpha {
        for px in reference.pixels_mut() {
            px[3] = u8::MAX;
        }
    }

    Ok(ImagePair {
        rendered,
        reference,
        has_alpha,
    })
}

/// Returns whether the image has an alpha channel.
fn check(image: &DynamicImage, role: ImageRole) -> Result<bool, CompareError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(CompareError::InvalidImage {
            role,
            reason: format!("empty image ({}x{})", image.width(), image.height()),
        });
    }
    match image.color() {
        ColorType::Rgb8 => Ok(false),
        ColorType::Rgba8 => Ok(true),
        other => Err(CompareError::InvalidImage {
            role,
            reason: format!("unsupported pixel layout {other:?}, expected 8-bit RGB or RGBA"),
        }),
    }
}
