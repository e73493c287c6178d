//! CLI commands.

pub mod analyze;
pub mod extract;
pub mod init;
pub mod run;
pub mod sessions;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use nbscan_core::{AnalysisReport, Config, ExtractReport, SkipReason, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Resolves the configuration path, defaulting to `./nbscan.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Loads the configuration, falling back to defaults if the file is missing.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = config_path(explicit);
    debug!(path = %path.display(), "loading configuration");
    Config::load(&path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Spinner shown while a stage runs.
pub fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Prints the extraction summary.
pub fn print_extract_report(config: &Config, report: &ExtractReport) {
    let load = &report.load;
    println!("Audit records:");
    println!("  Read: {}", load.records_read);
    println!("  Kept: {}", load.events_kept);
    println!(
        "  Dropped: {} other service, {} other action, {} outside window, {} magic/empty, {} unpartitionable",
        load.wrong_service,
        load.irrelevant_action,
        load.outside_window,
        load.magic_or_empty,
        load.unpartitionable
    );

    if report.empty_input {
        println!(
            "{} No commands found in audit logs!",
            style("⚠").yellow().bold()
        );
    }

    println!("Sessions:");
    println!("  Reconstructed: {}", report.sessions);
    println!("  Unresolved: {}", report.unresolved_sessions);
    println!("  Code buffers: {}", report.buffers);

    let materialize = &report.materialize;
    println!(
        "{} Wrote {} file(s) to {}",
        style("✓").green(),
        materialize.artifacts.len(),
        config.code_root().display()
    );
    for skipped in &materialize.skipped {
        let reason = match &skipped.reason {
            SkipReason::ParseFailure { .. } => format!("not valid {}", config.extraction.language),
            SkipReason::UnsafePath => "unsafe document path".to_string(),
        };
        println!(
            "  {} Skipping {} {} ({})",
            style("✗").red(),
            skipped.document_path,
            skipped.session_id,
            reason
        );
    }
    println!("  Tree digest: {}", materialize.tree_digest);
}

/// Prints the analysis hand-off summary.
pub fn print_analysis_report(report: &AnalysisReport) {
    println!("Engine configuration: {}", report.config_path.display());
    for outcome in report.analysis.iter().chain(report.triage.iter()) {
        if outcome.success() {
            println!(
                "{} {} finished: {}",
                style("✓").green(),
                outcome.tool,
                outcome.artifact.display()
            );
        } else {
            let detail = match (&outcome.error, outcome.exit_code) {
                (Some(error), _) => error.clone(),
                (None, Some(code)) => format!("exit status {}", code),
                (None, None) => "terminated by signal".to_string(),
            };
            println!(
                "{} {} failed ({}), please review the logs for issues!",
                style("✗").red(),
                outcome.tool,
                detail
            );
        }
    }
}
