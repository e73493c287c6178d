//! Full batch job: extract, then analyze.

use anyhow::{Context, Result};
use nbscan_core::{PipelineContext, ProcessAnalysisRunner, ProcessTriageRunner, RunLock};
use std::path::Path;
use std::time::Instant;

/// Runs every stage under the run lock.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;
    let _lock = RunLock::acquire(&config.output.scanner_root)?;

    let analysis = ProcessAnalysisRunner::new(config.analysis.program.clone());
    let triage = ProcessTriageRunner::new(
        config.triage.program.clone(),
        config.triage.database_name.clone(),
    );
    let ctx = PipelineContext::from_config(config)?;

    let pb = super::spinner("Extracting session code...")?;
    let extract = ctx.extract();
    pb.finish_and_clear();
    let extract = extract.context("Extraction failed")?;
    super::print_extract_report(ctx.config(), &extract);

    println!();
    let report = nbscan_core::run_analysis(ctx.config(), &analysis, &triage)?;
    super::print_analysis_report(&report);

    println!("Done in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}
