mod cli;
mod commands;
mod store;
mod terminal;

use clap::Parser;
use rcmetrics::config::{CliOverrides, ResolvedRunConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::ScoringArgs;

fn overrides(scoring: ScoringArgs, parallel: Option<usize>) -> CliOverrides {
    CliOverrides {
        config_path: scoring.config,
        compare: scoring.compare,
        thresholds: scoring.thresholds,
        parallel,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rcmetrics=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Init { force } => {
            commands::init(force)?;
        }
        cli::Command::Compare {
            rendered,
            reference,
            diff,
            scoring,
        } => {
            let config = ResolvedRunConfig::new(overrides(scoring, None))?;
            let code = commands::compare(config, &rendered, &reference, diff.as_deref())?;
            std::process::exit(code);
        }
        cli::Command::Batch {
            references,
            renders,
            mesh,
            output,
            filter,
            parallel,
            save_diffs,
            scoring,
        } => {
            let config = ResolvedRunConfig::new(overrides(scoring, parallel))?;
            let args = commands::BatchArgs {
                references: &references,
                renders: &renders,
                mesh: &mesh,
                output: &output,
                filter: filter.as_deref(),
                save_diffs,
            };
            let code = commands::batch(config, args).await?;
            std::process::exit(code);
        }
    }

    Ok(())
}
