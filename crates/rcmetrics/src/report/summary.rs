use tracing::warn;

use super::{CameraMetrics, MetricsReport};
use crate::compare::ComparisonResult;

/// Running aggregate over the scored cameras of one subject.
#[derive(Debug, Default)]
pub struct MetricsSummary {
    cameras: Vec<CameraMetrics>,
    skipped: usize,
}

impl MetricsSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a camera's result. Degenerate results carry no score and are
    /// skipped; returns whether the camera was counted.
    pub fn push(&mut self, camera: &str, result: &ComparisonResult) -> bool {
        if result.is_degenerate() {
            warn!(camera, "no comparable pixels, left out of the summary");
            self.skipped += 1;
            return false;
        }
        self.cameras.push(CameraMetrics {
            camera: camera.to_string(),
            psnr: result.psnr,
            ssim: result.ssim,
        });
        true
    }

    /// Count a camera that produced no result at all.
    pub fn skip(&mut self, camera: &str, reason: &str) {
        warn!(camera, reason, "left out of the summary");
        self.skipped += 1;
    }

    pub fn counted(&self) -> usize {
        self.cameras.len()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// `None` when no camera was counted. Cameras are ordered by name.
    pub fn finish(mut self, mesh_name: &str) -> Option<MetricsReport> {
        if self.cameras.is_empty() {
            return None;
        }
        self.cameras.sort_by(|a, b| a.camera.cmp(&b.camera));

        let n = self.cameras.len() as f64;
        let psnr = self.cameras.iter().map(|c| c.psnr);
        let ssim = self.cameras.iter().map(|c| c.ssim);
        let average_psnr = psnr.clone().sum::<f64>() / n;
        let average_ssim = ssim.clone().sum::<f64>() / n;
        let min_psnr = psnr.clone().fold(f64::INFINITY, f64::min);
        let max_psnr = psnr.fold(f64::NEG_INFINITY, f64::max);
        let min_ssim = ssim.clone().fold(f64::INFINITY, f64::min);
        let max_ssim = ssim.fold(f64::NEG_INFINITY, f64::max);

        Some(MetricsReport {
            mesh_name: mesh_name.to_string(),
            cameras: self.cameras,
            average_psnr,
            average_ssim,
            min_psnr,
            min_ssim,
            max_psnr,
            max_ssim,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(psnr: f64, ssim: f64) -> ComparisonResult {
        ComparisonResult {
            psnr,
            ssim,
            valid_pixel_count: 100,
            total_pixel_count: 100,
        }
    }

    #[test]
    fn aggregates_min_max_average() {
        let mut summary = MetricsSummary::new();
        assert!(summary.push("cam_b", &scored(30.0, 0.8)));
        assert!(summary.push("cam_a", &scored(40.0, 0.9)));
        assert!(summary.push("cam_c", &scored(20.0, 1.0)));

        let report = summary.finish("Bust").unwrap();
        assert_eq!(report.mesh_name, "Bust");
        assert_eq!(report.average_psnr, 30.0);
        assert!((report.average_ssim - 0.9).abs() < 1e-12);
        assert_eq!((report.min_psnr, report.max_psnr), (20.0, 40.0));
        assert_eq!((report.min_ssim, report.max_ssim), (0.8, 1.0));
        let names: Vec<_> = report.cameras.iter().map(|c| c.camera.as_str()).collect();
        assert_eq!(names, ["cam_a", "cam_b", "cam_c"]);
    }

    #[test]
    fn degenerate_and_failed_are_skipped() {
        let mut summary = MetricsSummary::new();
        summary.push("good", &scored(35.0, 0.95));
        let degenerate = ComparisonResult {
            psnr: 0.0,
            ssim: 0.0,
            valid_pixel_count: 0,
            total_pixel_count: 100,
        };
        assert!(!summary.push("empty", &degenerate));
        summary.skip("broken", "decode failed");

        assert_eq!(summary.counted(), 1);
        assert_eq!(summary.skipped(), 2);
        let report = summary.finish("Bust").unwrap();
        assert_eq!(report.cameras.len(), 1);
        assert_eq!(report.min_psnr, 35.0);
        assert_eq!(report.average_ssim, 0.95);
    }

    #[test]
    fn nothing_counted_means_no_report() {
        let mut summary = MetricsSummary::new();
        summary.skip("broken", "missing render");
        assert!(summary.finish("Bust").is_none());
    }
}
