//! Rebuild the code tree from the audit log.

use anyhow::{Context, Result};
use nbscan_core::{PipelineContext, RunLock};
use std::path::Path;
use std::time::Instant;

/// Runs load, sessionize, aggregate and materialize.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;
    let _lock = RunLock::acquire(&config.output.scanner_root)?;

    let ctx = PipelineContext::from_config(config)?;

    let pb = super::spinner("Extracting session code...")?;
    let report = ctx.extract();
    pb.finish_and_clear();
    let report = report.context("Extraction failed")?;

    super::print_extract_report(ctx.config(), &report);
    println!("Done in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}
