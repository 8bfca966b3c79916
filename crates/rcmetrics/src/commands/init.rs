use std::path::Path;

use anyhow::{Result, bail};
use rcmetrics::config::{self, CONFIG_FILE};

/// `rcmetrics init`: create rcmetrics.toml.
pub fn init(force: bool) -> Result<()> {
    if !config::write_template(Path::new(CONFIG_FILE), force)? {
        bail!("{CONFIG_FILE} already exists (use --force to overwrite)");
    }
    let verb = if force { "Regenerated" } else { "Created" };
    println!("{verb} {CONFIG_FILE}");
    Ok(())
}
