use std::io::Write;
use std::time::Duration;

use rcmetrics::compare::ComparisonResult;
use rcmetrics::report::MetricsReport;

/// How a camera's score reads against the thresholds.
pub enum Verdict {
    Pass,
    Warn,
    Degenerate,
}

/// Clear the current terminal line (wipes progress indicator).
pub fn clear_line() {
    print!("\r\x1b[2K");
}

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

/// Print a single camera result line.
pub fn print_line(camera: &str, verdict: &Verdict, result: &ComparisonResult, elapsed: Duration) {
    clear_line();
    let time_suffix = format!("  \x1b[2m{}\x1b[0m", format_duration(elapsed));
    let scores = format!("PSNR {:.2} dB, SSIM {:.4}", result.psnr, result.ssim);
    match verdict {
        Verdict::Pass => println!("  \x1b[32mPASS\x1b[0m  {camera}  ({scores}){time_suffix}"),
        Verdict::Warn => println!("  \x1b[33mWARN\x1b[0m  {camera}  ({scores}){time_suffix}"),
        Verdict::Degenerate => println!(
            "  \x1b[33mDEGN\x1b[0m  {camera}  (no comparable pixels of {}){time_suffix}",
            result.total_pixel_count
        ),
    }
}

pub fn print_error_line(camera: &str, msg: &str) {
    clear_line();
    println!("  \x1b[31m ERR\x1b[0m  {camera}  ({msg})");
}

pub fn print_missing_line(camera: &str) {
    clear_line();
    println!("  \x1b[2mMISS\x1b[0m  \x1b[2m{camera}  (no render)\x1b[0m");
}

pub fn show_progress(done: usize, total: usize) {
    if done < total {
        print!("  Comparing  [{done}/{total}]");
        let _ = std::io::stdout().flush();
    }
}

/// Detailed output for a single `compare` run.
pub fn print_single(result: &ComparisonResult, problematic: bool) {
    println!("PSNR:    {:.4} dB", result.psnr);
    println!("SSIM:    {:.6}", result.ssim);
    println!(
        "Pixels:  {} of {} compared",
        result.valid_pixel_count, result.total_pixel_count
    );
    if result.is_degenerate() {
        println!("\x1b[33mNo comparable pixels: the mask selected nothing.\x1b[0m");
    } else if problematic {
        println!("\x1b[33mBelow threshold: review this render.\x1b[0m");
    } else {
        println!("\x1b[32mWithin thresholds.\x1b[0m");
    }
}

/// Cameras grouped by what needs attention. Only prints non-empty groups.
pub fn print_actionable_summary(warned: &[String], degenerate: &[String], errored: &[String]) {
    if warned.is_empty() && degenerate.is_empty() && errored.is_empty() {
        return;
    }

    clear_line();
    println!();
    println!("Cameras to review:");

    for (label, names) in [
        ("Below threshold", warned),
        ("No comparable pixels", degenerate),
        ("Errored", errored),
    ] {
        if !names.is_empty() {
            println!();
            println!("  {label} ({}):", names.len());
            for name in names {
                println!("    {name}");
            }
        }
    }
}

pub struct Counts {
    pub total: usize,
    pub passed: usize,
    pub warned: usize,
    pub degenerate: usize,
    pub errored: usize,
    pub missing: usize,
    pub cancelled: usize,
}

pub fn print_summary(counts: &Counts, report: Option<&MetricsReport>, elapsed: Duration) {
    clear_line();
    println!();
    print!(
        "Cameras:    {} total, \x1b[32m{} passed\x1b[0m, \x1b[33m{} below threshold\x1b[0m",
        counts.total, counts.passed, counts.warned
    );
    if counts.degenerate > 0 {
        print!(", \x1b[33m{} degenerate\x1b[0m", counts.degenerate);
    }
    if counts.errored > 0 {
        print!(", \x1b[31m{} errored\x1b[0m", counts.errored);
    }
    if counts.missing > 0 {
        print!(", \x1b[2m{} missing\x1b[0m", counts.missing);
    }
    if counts.cancelled > 0 {
        print!(", \x1b[2m{} cancelled\x1b[0m", counts.cancelled);
    }
    println!();
    if let Some(r) = report {
        println!(
            "PSNR:       avg {:.2} dB  (min {:.2}, max {:.2})",
            r.average_psnr, r.min_psnr, r.max_psnr
        );
        println!(
            "SSIM:       avg {:.4}  (min {:.4}, max {:.4})",
            r.average_ssim, r.min_ssim, r.max_ssim
        );
    }
    println!("Time:       {}", format_duration(elapsed));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_switch_to_seconds() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
    }
}
