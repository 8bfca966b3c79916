use tracing::debug;

use super::ImagePair;
use crate::config::CompareMode;

/// Per-pixel eligibility for scoring, in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
    valid: u64,
}

impl RegionMask {
    /// Mask for `mode` over a normalized pair.
    ///
    /// `EdgesOnly` falls back to the transparency mask when the border band
    /// is fully transparent, so a comparison only ends up with zero eligible
    /// pixels when the whole render is transparent.
    pub fn build(pair: &ImagePair, mode: CompareMode, edge_thickness: u32) -> Self {
        let (w, h) = pair.dimensions();
        match mode {
            CompareMode::Standard => Self::full(w, h),
            CompareMode::ExcludeTransparent => Self::opaque(pair),
            CompareMode::EdgesOnly => {
                let band = Self::edge_band(w, h, edge_thickness);
                if !pair.has_alpha() {
                    return band;
                }
                let opaque = Self::opaque(pair);
                let both = band.intersect(&opaque);
                if both.valid == 0 {
                    debug!(
                        edge_thickness,
                        "edge band fully transparent, using transparency mask"
                    );
                    opaque
                } else {
                    both
                }
            }
        }
    }

    pub fn full(width: u32, height: u32) -> Self {
        Self::from_fn(width, height, |_, _| true)
    }

    /// Pixels whose rendered alpha is non-zero; every pixel when the pair
    /// has no alpha channel.
    pub fn opaque(pair: &ImagePair) -> Self {
        let (w, h) = pair.dimensions();
        if !pair.has_alpha() {
            return Self::full(w, h);
        }
        let bits: Vec<bool> = pair.rendered().pixels().map(|p| p[3] > 0).collect();
        Self::from_bits(w, h, bits)
    }

    /// Frame of `thickness` pixels along all four borders.
    pub fn edge_band(width: u32, height: u32, thickness: u32) -> Self {
        Self::from_fn(width, height, |x, y| {
            x < thickness
                || y < thickness
                || x >= width.saturating_sub(thickness)
                || y >= height.saturating_sub(thickness)
        })
    }

    pub fn intersect(&self, other: &RegionMask) -> Self {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "mask dimensions differ"
        );
        let bits = self
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(a, b)| *a && *b)
            .collect();
        Self::from_bits(self.width, self.height, bits)
    }

    fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                bits.push(f(x, y));
            }
        }
        Self::from_bits(width, height, bits)
    }

    fn from_bits(width: u32, height: u32, bits: Vec<bool>) -> Self {
        let valid = bits.iter().filter(|b| **b).count() as u64;
        Self {
            width,
            height,
            bits,
            valid,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.bits[y as usize * self.width as usize + x as usize]
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn valid_count(&self) -> u64 {
        self.valid
    }

    pub fn total_count(&self) -> u64 {
        self.bits.len() as u64
    }

    pub fn is_full(&self) -> bool {
        self.valid == self.total_count()
    }
}
