use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbaImage;
use rcmetrics::report::html::DIFF_DIR;
use rcmetrics::report::{MetricsReport, diff_file_name, report_file_name};

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

/// `<output>/diffs/<camera without extension>_diff.png`
pub fn diff_path(output: &Path, camera: &str) -> PathBuf {
    output.join(DIFF_DIR).join(diff_file_name(camera))
}

pub fn report_path(output: &Path, mesh_name: &str) -> PathBuf {
    output.join(report_file_name(mesh_name))
}

pub fn write_diff_image(path: &Path, diff: &RgbaImage) -> Result<()> {
    ensure_parent(path)?;
    diff.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub fn write_report(output: &Path, report: &MetricsReport) -> Result<PathBuf> {
    let path = report_path(output, &report.mesh_name);
    ensure_parent(&path)?;
    report.write(&path)?;
    Ok(path)
}

/// Remove diffs left over from an earlier run of these cameras.
pub fn clean_diffs<'a>(output: &Path, cameras: impl IntoIterator<Item = &'a str>) {
    for camera in cameras {
        let _ = std::fs::remove_file(diff_path(output, camera));
    }
}
