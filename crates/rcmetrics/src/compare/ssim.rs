//! Gaussian-windowed SSIM over a single plane of 0..=255 samples.
//!
//! Window statistics use population (not sample) covariance and the mean is
//! taken over every window that fits entirely inside the plane.

const WINDOW: usize = 11;
const SIGMA: f64 = 1.5;
const DATA_RANGE: f64 = 255.0;
const C1: f64 = (0.01 * DATA_RANGE) * (0.01 * DATA_RANGE);
const C2: f64 = (0.03 * DATA_RANGE) * (0.03 * DATA_RANGE);

/// Mean SSIM of two `width`×`height` planes.
pub(crate) fn mean_ssim(a: &[f64], b: &[f64], width: usize, height: usize) -> f64 {
    assert_eq!(a.len(), width * height, "plane size mismatch");
    assert_eq!(b.len(), width * height, "plane size mismatch");

    let kernel = gaussian_kernel(window_size(width.min(height)));

    let aa: Vec<f64> = a.iter().map(|v| v * v).collect();
    let bb: Vec<f64> = b.iter().map(|v| v * v).collect();
    let ab: Vec<f64> = a.iter().zip(b).map(|(x, y)| x * y).collect();

    let mu_a = filter_valid(a, width, height, &kernel);
    let mu_b = filter_valid(b, width, height, &kernel);
    let e_aa = filter_valid(&aa, width, height, &kernel);
    let e_bb = filter_valid(&bb, width, height, &kernel);
    let e_ab = filter_valid(&ab, width, height, &kernel);

    let mut sum = 0.0;
    for i in 0..mu_a.len() {
        let (ma, mb) = (mu_a[i], mu_b[i]);
        let var_a = e_aa[i] - ma * ma;
        let var_b = e_bb[i] - mb * mb;
        let cov = e_ab[i] - ma * mb;
        let num = (2.0 * ma * mb + C1) * (2.0 * cov + C2);
        let den = (ma * ma + mb * mb + C1) * (var_a + var_b + C2);
        sum += num / den;
    }
    sum / mu_a.len() as f64
}

/// Largest odd window no wider than `min_side`, capped at 11.
fn window_size(min_side: usize) -> usize {
    if min_side >= WINDOW {
        WINDOW
    } else if min_side % 2 == 1 {
        min_side
    } else {
        min_side.saturating_sub(1).max(1)
    }
}

fn gaussian_kernel(size: usize) -> Vec<f64> {
    let center = (size / 2) as f64;
    let raw: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * SIGMA * SIGMA)).exp()
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// Separable convolution keeping only fully-covered output positions.
fn filter_valid(src: &[f64], width: usize, height: usize, kernel: &[f64]) -> Vec<f64> {
    let k = kernel.len();
    let out_w = width + 1 - k;
    let out_h = height + 1 - k;

    let mut rows = vec![0.0; out_w * height];
    for y in 0..height {
        let line = &src[y * width..(y + 1) * width];
        for x in 0..out_w {
            rows[y * out_w + x] = kernel.iter().zip(&line[x..x + k]).map(|(w, v)| w * v).sum();
        }
    }

    let mut out = vec![0.0; out_w * out_h];
    for y in 0..out_h {
        for x in 0..out_w {
            out[y * out_w + x] = kernel
                .iter()
                .enumerate()
                .map(|(i, w)| w * rows[(y + i) * out_w + x])
                .sum();
        }
    }
    out
}
