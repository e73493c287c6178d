//! Write a default configuration file.

use anyhow::{bail, Context, Result};
use nbscan_core::Config;
use std::path::Path;

/// Writes `nbscan.toml` (or the given path) with default settings.
pub fn run(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = super::config_path(config_path);
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let config = Config::default();
    config
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote {}", path.display());
    println!();
    println!("Audit table:   {}", config.source.audit_log_table);
    println!(
        "Export file:   {}/{}.jsonl",
        config.source.exports_dir.display(),
        config.source.audit_log_table
    );
    println!("Lookback:      {} days", config.source.lookback_days);
    println!("Language:      {}", config.extraction.language);
    println!("Code tree:     {}", config.code_root().display());

    Ok(())
}
