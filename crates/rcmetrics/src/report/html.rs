use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use super::{CameraMetrics, MetricsReport, diff_file_name};
use crate::config::Thresholds;

pub const OUTPUT_FILE: &str = "report.html";

/// Directory of diff images relative to the report.
pub const DIFF_DIR: &str = "diffs";

struct RowClasses {
    row: &'static str,
    psnr: &'static str,
    ssim: &'static str,
    status: &'static str,
}

fn classify(camera: &CameraMetrics, thresholds: &Thresholds) -> RowClasses {
    let psnr_low = camera.psnr < thresholds.psnr;
    let ssim_low = camera.ssim < thresholds.ssim;
    let problem = psnr_low || ssim_low;
    RowClasses {
        row: if problem { "problematic" } else { "good" },
        psnr: if psnr_low { "psnr-low" } else { "psnr-good" },
        ssim: if ssim_low { "ssim-low" } else { "ssim-good" },
        status: if problem { "Problem" } else { "Good" },
    }
}

/// Summary plus one row per camera, styled against `thresholds`.
/// With `with_diffs`, each row links to `diffs/<camera>_diff.png`.
pub fn render(
    report: &MetricsReport,
    thresholds: &Thresholds,
    with_diffs: bool,
    created_at: &str,
) -> String {
    let mut rows = String::new();
    let mut problems = 0usize;
    for camera in &report.cameras {
        let c = classify(camera, thresholds);
        if c.status == "Problem" {
            problems += 1;
        }
        let diff = if with_diffs {
            let file = url_encode(&diff_file_name(&camera.camera));
            format!(
                r#"<td><a href="{DIFF_DIR}/{file}"><img src="{DIFF_DIR}/{file}" alt="diff" loading="lazy" /></a></td>"#
            )
        } else {
            String::new()
        };
        let _ = write!(
            rows,
            r#"        <tr class="{row}">
          <td class="name">{name}</td>
          <td class="{psnr_class}">{psnr:.2}</td>
          <td class="{ssim_class}">{ssim:.4}</td>
          <td>{status}</td>
          {diff}
        </tr>
"#,
            row = c.row,
            name = html_escape(&camera.camera),
            psnr_class = c.psnr,
            psnr = camera.psnr,
            ssim_class = c.ssim,
            ssim = camera.ssim,
            status = c.status,
        );
    }
    let diff_header = if with_diffs { "<th>Difference</th>" } else { "" };

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>rcmetrics: {mesh}</title>
  <style>
    body {{
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
      margin: 0; padding: 24px;
      background: #f6f7f9; color: #1f2933;
    }}
    h1 {{ margin: 0 0 8px; font-size: 22px; }}
    h2 {{ font-size: 17px; }}
    .summary {{ background: #fff; padding: 12px 16px; border-radius: 5px; font-size: 14px; }}
    table {{ width: 100%; border-collapse: collapse; background: #fff; }}
    th, td {{ border-bottom: 1px solid #e4e7eb; padding: 8px; text-align: left; vertical-align: top; }}
    th {{ background: #f0f4f8; font-weight: 600; font-size: 14px; }}
    td.name {{ font-size: 13px; word-break: break-word; }}
    td img {{ max-width: 240px; height: auto; display: block; }}
    tr.problematic {{ background: #ffeeee; }}
    tr.good {{ background: #eeffee; }}
    .psnr-low, .ssim-low {{ color: #c81e1e; font-weight: 600; }}
    .psnr-good, .ssim-good {{ color: #0e7c3a; }}
  </style>
</head>
<body>
  <h1>Metrics report</h1>
  <div class="summary">
    <p><strong>Mesh:</strong> {mesh}</p>
    <p><strong>Average PSNR:</strong> {avg_psnr:.2} dB (min {min_psnr:.2}, max {max_psnr:.2})</p>
    <p><strong>Average SSIM:</strong> {avg_ssim:.4} (min {min_ssim:.4}, max {max_ssim:.4})</p>
    <p><strong>Thresholds:</strong> PSNR {t_psnr:.2} dB, SSIM {t_ssim:.4} &middot; {problems} of {count} camera(s) flagged</p>
    <p><strong>Generated:</strong> {created_at}</p>
  </div>
  <h2>Camera results</h2>
  <table>
    <thead>
      <tr>
        <th>Camera</th>
        <th>PSNR</th>
        <th>SSIM</th>
        <th>Status</th>
        {diff_header}
      </tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
</body>
</html>
"##,
        mesh = html_escape(&report.mesh_name),
        avg_psnr = report.average_psnr,
        min_psnr = report.min_psnr,
        max_psnr = report.max_psnr,
        avg_ssim = report.average_ssim,
        min_ssim = report.min_ssim,
        max_ssim = report.max_ssim,
        t_psnr = thresholds.psnr,
        t_ssim = thresholds.ssim,
        count = report.cameras.len(),
    )
}

/// Write `<output>/report.html` and return its path.
pub fn write(
    output: &Path,
    report: &MetricsReport,
    thresholds: &Thresholds,
    with_diffs: bool,
) -> Result<std::path::PathBuf> {
    let html = render(report, thresholds, with_diffs, &utc_now());
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let path = output.join(OUTPUT_FILE);
    std::fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn url_encode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

fn utc_now() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let (s, m, h) = (secs % 60, (secs / 60) % 60, (secs / 3600) % 24);
    let (y, mo, d) = civil_from_days(secs / 86400);
    format!("{y:04}-{mo:02}-{d:02} {h:02}:{m:02}:{s:02} UTC")
}

/// Days since the Unix epoch to (year, month, day), Hinnant's algorithm.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe + era * 400 + u64::from(m <= 2);
    (y, m, d)
}
