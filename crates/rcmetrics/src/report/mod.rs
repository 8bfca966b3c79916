pub mod html;
mod summary;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use self::summary::MetricsSummary;

/// Scores for one camera in a [`MetricsReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraMetrics {
    pub camera: String,
    pub psnr: f64,
    pub ssim: f64,
}

/// Per-subject record persisted as `metrics_<mesh_name>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub mesh_name: String,
    pub cameras: Vec<CameraMetrics>,
    pub average_psnr: f64,
    pub average_ssim: f64,
    pub min_psnr: f64,
    pub min_ssim: f64,
    pub max_psnr: f64,
    pub max_ssim: f64,
}

pub fn report_file_name(mesh_name: &str) -> String {
    format!("metrics_{mesh_name}.json")
}

/// `<camera without extension>_diff.png`
pub fn diff_file_name(camera: &str) -> String {
    let stem = Path::new(camera)
        .file_stem()
        .map_or_else(|| camera.into(), |s| s.to_string_lossy());
    format!("{stem}_diff.png")
}

impl MetricsReport {
    /// Pretty JSON with a 4-space indent.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)
            .context("Failed to serialize metrics report")?;
        out.push(b'\n');
        Ok(out)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_slice(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}
