use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use rcmetrics::config::ResolvedRunConfig;
use rcmetrics::{compare, decode};
use tracing::debug;

use crate::{store, terminal};

/// `rcmetrics compare`: score one pair.
/// Returns exit code: 0 = within thresholds, 1 = problematic or degenerate.
pub fn compare(
    config: ResolvedRunConfig,
    rendered: &Path,
    reference: &Path,
    diff: Option<&Path>,
) -> Result<i32> {
    let started = Instant::now();
    let rendered_img = decode::open(rendered)?;
    let reference_img = decode::open(reference)?;

    let result = match diff {
        Some(path) => {
            let (result, diff_image) =
                compare::compare_with_diff(&rendered_img, &reference_img, &config.comparison)?;
            store::write_diff_image(path, &diff_image)?;
            println!("Wrote diff to {}", path.display());
            result
        }
        None => compare::compare(&rendered_img, &reference_img, &config.comparison)?,
    };
    debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "compare finished"
    );

    let problematic = config.thresholds.is_problematic(&result);
    terminal::print_single(&result, problematic);
    Ok(if problematic { 1 } else { 0 })
}
