//! Hand the existing code tree to the analysis engine and triage store.

use anyhow::{bail, Result};
use nbscan_core::{run_analysis, ProcessAnalysisRunner, ProcessTriageRunner, RunLock};
use std::path::Path;

/// Writes the engine configuration and runs the enabled tools.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let _lock = RunLock::acquire(&config.output.scanner_root)?;

    if !config.code_root().is_dir() {
        bail!(
            "No code tree at {}. Run 'nbscan extract' first.",
            config.code_root().display()
        );
    }

    let analysis = ProcessAnalysisRunner::new(config.analysis.program.clone());
    let triage = ProcessTriageRunner::new(
        config.triage.program.clone(),
        config.triage.database_name.clone(),
    );

    let report = run_analysis(&config, &analysis, &triage)?;
    super::print_analysis_report(&report);
    Ok(())
}
