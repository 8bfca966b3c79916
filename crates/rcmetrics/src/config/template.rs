use std::path::Path;

use anyhow::{Context, Result};

/// Hand-written template so every knob is visible but commented out.
const CONFIG_TEMPLATE: &str = r#"# rcmetrics configuration. Every key is optional.
# Precedence: CLI flags > RCMETRICS_* environment > this file > defaults.

# ─────────────────────────────────────────────────────────
# Comparison
# ─────────────────────────────────────────────────────────
[compare]
# mode = "standard"                 # "standard" | "exclude-transparent" | "edges-only"
# edge_thickness = 10               # border band width in pixels (edges-only)
# ssim_mode = "gray"                # "gray" | "color" | "weighted"
# ssim_weights = [0.299, 0.587, 0.114]  # R, G, B (weighted)
# diff_view_mode = "heatmap"        # "heatmap" | "grayscale" | "colorized"
# diff_multiplier = 1.0             # diff contrast gain, >= 1.0

# ─────────────────────────────────────────────────────────
# Review thresholds: cameras below either one are flagged.
# ─────────────────────────────────────────────────────────
[thresholds]
# psnr = 30.0                       # dB
# ssim = 0.9

[batch]
# parallel = 4                      # concurrent comparisons
"#;

/// Write the template to `path`. Returns `false` when the file already exists
/// and `force` is not set.
pub fn write_template(path: &Path, force: bool) -> Result<bool> {
    if !force && path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    std::fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}
