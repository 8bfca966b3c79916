use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rcmetrics::config::{CompareOptions, ThresholdOptions};

fn parse_parallel(s: &str) -> Result<usize, String> {
    let v: usize = s.parse().map_err(|e| format!("{e}"))?;
    if v == 0 {
        return Err("parallel must be at least 1".to_string());
    }
    Ok(v)
}

#[derive(Parser)]
#[command(
    name = "rcmetrics",
    about = "PSNR/SSIM fidelity metrics for renders against reference photos"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every scoring command.
#[derive(Args)]
pub struct ScoringArgs {
    /// Config file (default: ./rcmetrics.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub compare: CompareOptions,
    #[command(flatten)]
    pub thresholds: ThresholdOptions,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create rcmetrics.toml with every setting commented out
    Init {
        /// Overwrite an existing rcmetrics.toml
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Score one rendered image against its reference (exit 0/1)
    Compare {
        /// Rendered image
        #[arg(long)]
        rendered: PathBuf,
        /// Reference photo
        #[arg(long)]
        reference: PathBuf,
        /// Write the diff image to this PNG
        #[arg(long)]
        diff: Option<PathBuf>,
        #[command(flatten)]
        scoring: ScoringArgs,
    },

    /// Score every camera of a mesh and write metrics_<MESH>.json and report.html (exit 0/1)
    Batch {
        /// Directory of reference photos (*.png)
        #[arg(long)]
        references: PathBuf,
        /// Directory of <camera>_render.png files
        #[arg(long)]
        renders: PathBuf,
        /// Mesh name used in the report
        #[arg(long)]
        mesh: String,
        /// Output directory for the reports and diffs
        #[arg(long, default_value = "metrics_output")]
        output: PathBuf,
        /// Only score cameras whose name contains PATTERN (case-insensitive)
        #[arg(long)]
        filter: Option<String>,
        /// Concurrent comparisons (overrides config)
        #[arg(long, value_parser = parse_parallel)]
        parallel: Option<usize>,
        /// Also write a diff image per camera under <OUTPUT>/diffs
        #[arg(long)]
        save_diffs: bool,
        #[command(flatten)]
        scoring: ScoringArgs,
    },
}
