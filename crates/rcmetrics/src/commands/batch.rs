use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use rcmetrics::batch::{self, CancelToken, PairOutcome};
use rcmetrics::config::ResolvedRunConfig;
use rcmetrics::report::{MetricsSummary, html};
use tracing::{debug, warn};

use crate::store;
use crate::terminal::{self, Counts, Verdict};

pub struct BatchArgs<'a> {
    pub references: &'a Path,
    pub renders: &'a Path,
    pub mesh: &'a str,
    pub output: &'a Path,
    pub filter: Option<&'a str>,
    pub save_diffs: bool,
}

/// `rcmetrics batch`: score every camera and write the mesh report.
/// Returns exit code: 0 = all pass, 1 = any below threshold, degenerate or errored.
pub async fn batch(config: ResolvedRunConfig, args: BatchArgs<'_>) -> Result<i32> {
    let plan = batch::plan(args.references, args.renders, args.filter)?;
    let total = plan.total() + plan.missing.len();
    if total == 0 {
        println!("No reference photos found in {}", args.references.display());
        return Ok(0);
    }
    println!(
        "Found {} camera(s), {} with renders",
        total,
        plan.total()
    );
    println!();

    for job in &plan.missing {
        terminal::print_missing_line(&job.camera);
    }
    let missing = plan.missing.len();
    if args.save_diffs {
        store::clean_diffs(args.output, plan.jobs.iter().map(|j| j.camera.as_str()));
    }

    let cancel = CancelToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, finishing in-flight comparisons");
                cancel.cancel();
            }
        })
    };

    let run_start = Instant::now();
    let jobs = plan.jobs.len();
    let mut rx = batch::run(
        plan.jobs,
        config.comparison.clone(),
        config.parallel,
        args.save_diffs,
        cancel,
    );

    let mut summary = MetricsSummary::new();
    let mut done = 0usize;
    let mut passed = 0usize;
    let mut cancelled = 0usize;
    let mut warned_names: Vec<String> = Vec::new();
    let mut degenerate_names: Vec<String> = Vec::new();
    let mut errored_names: Vec<String> = Vec::new();

    debug!(jobs, "waiting for comparison results");
    while let Some((job, outcome)) = rx.recv().await {
        done += 1;
        match outcome {
            PairOutcome::Scored {
                result,
                diff_image,
                elapsed,
            } => {
                if let Some(diff) = diff_image {
                    let path = store::diff_path(args.output, &job.camera);
                    if let Err(e) = store::write_diff_image(&path, &diff) {
                        warn!(
                            camera = %job.camera,
                            error = %format!("{e:#}"),
                            "failed to save diff"
                        );
                    }
                }
                let verdict = if result.is_degenerate() {
                    degenerate_names.push(job.camera.clone());
                    Verdict::Degenerate
                } else if config.thresholds.is_problematic(&result) {
                    warned_names.push(job.camera.clone());
                    Verdict::Warn
                } else {
                    passed += 1;
                    Verdict::Pass
                };
                summary.push(&job.camera, &result);
                terminal::print_line(&job.camera, &verdict, &result, elapsed);
            }
            PairOutcome::Failed(msg) => {
                summary.skip(&job.camera, &msg);
                terminal::print_error_line(&job.camera, &msg);
                errored_names.push(job.camera);
            }
            PairOutcome::Cancelled => {
                cancelled += 1;
            }
        }
        terminal::show_progress(done, jobs);
    }
    ctrl_c.abort();

    if cancelled > 0 {
        terminal::clear_line();
        println!();
        println!("Interrupted: {cancelled} camera(s) not compared, no report written.");
    }

    errored_names.sort();
    warned_names.sort();
    degenerate_names.sort();
    terminal::print_actionable_summary(&warned_names, &degenerate_names, &errored_names);

    let report = if cancelled == 0 {
        summary.finish(args.mesh)
    } else {
        None
    };
    terminal::print_summary(
        &Counts {
            total,
            passed,
            warned: warned_names.len(),
            degenerate: degenerate_names.len(),
            errored: errored_names.len(),
            missing,
            cancelled,
        },
        report.as_ref(),
        run_start.elapsed(),
    );

    match &report {
        Some(report) => {
            let path = store::write_report(args.output, report)?;
            println!("Report:     {}", path.display());
            let html = html::write(args.output, report, &config.thresholds, args.save_diffs)?;
            println!("HTML:       {}", html.display());
        }
        None if cancelled == 0 => {
            println!();
            println!("No camera produced a score, no report written.");
        }
        None => {}
    }

    let clean = warned_names.is_empty()
        && degenerate_names.is_empty()
        && errored_names.is_empty()
        && cancelled == 0;
    Ok(if clean { 0 } else { 1 })
}
