//! Hand-off to the static-analysis engine and the triage store.
//!
//! Both tools are external. This module writes the engine configuration,
//! invokes the tools synchronously and reports their exit status. A failing
//! tool never rolls back the materialized tree.

use crate::config::Config;
use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Engine configuration file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfigFile {
    /// How third-party packages are located.
    pub site_package_search_strategy: String,
    /// Source directories, relative to the scanner root.
    pub source_directories: Vec<String>,
    /// Taint model directories.
    pub taint_models_path: Vec<PathBuf>,
    /// Module search paths.
    pub search_path: Vec<PathBuf>,
    /// Worker count.
    pub workers: u32,
}

impl EngineConfigFile {
    /// Builds the engine configuration from the run configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            site_package_search_strategy: config.analysis.search_strategy.clone(),
            source_directories: vec![config.output.code_dir.clone()],
            taint_models_path: config.analysis.taint_model_paths.clone(),
            search_path: config.analysis.search_paths.clone(),
            workers: config.analysis.worker_count,
        }
    }

    /// Writes the file as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ScanError::Serialization(e.to_string()))?;
        fs::write(path, json).map_err(|e| ScanError::fs(path, e))
    }
}

/// Exit status of one external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    /// Tool name.
    pub tool: String,
    /// Process exit code; `None` if it was killed or never started.
    pub exit_code: Option<i32>,
    /// Why the tool could not run, if it could not.
    pub error: Option<String>,
    /// Artifact the tool was asked to produce.
    pub artifact: PathBuf,
}

impl ToolOutcome {
    /// True if the tool ran and exited with status 0.
    pub fn success(&self) -> bool {
        self.error.is_none() && self.exit_code == Some(0)
    }
}

/// Runs the static-analysis engine over the materialized tree.
pub trait AnalysisRunner {
    /// Analyzes the sources configured under `scanner_root`, writing findings to `findings_dir`.
    fn analyze(&self, scanner_root: &Path, findings_dir: &Path) -> Result<ToolOutcome>;
}

/// Loads findings into the triage store.
pub trait TriageRunner {
    /// Produces a database from `findings_dir`.
    fn load_findings(&self, scanner_root: &Path, findings_dir: &Path) -> Result<ToolOutcome>;
}

/// Invokes the analysis engine as a child process.
#[derive(Debug, Clone)]
pub struct ProcessAnalysisRunner {
    program: String,
}

impl ProcessAnalysisRunner {
    /// Creates a runner for the given executable.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl AnalysisRunner for ProcessAnalysisRunner {
    fn analyze(&self, scanner_root: &Path, findings_dir: &Path) -> Result<ToolOutcome> {
        match fs::remove_dir_all(findings_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ScanError::fs(findings_dir, e)),
        }

        let status = Command::new(&self.program)
            .args(["-n", "--output", "json", "analyze", "--no-verify"])
            .arg("--save-results-to")
            .arg(findings_dir)
            .current_dir(scanner_root)
            .status()
            .map_err(|e| ScanError::ToolSpawnFailed {
                tool: self.program.clone(),
                reason: e.to_string(),
            })?;

        Ok(ToolOutcome {
            tool: self.program.clone(),
            exit_code: status.code(),
            error: None,
            artifact: findings_dir.to_path_buf(),
        })
    }
}

/// Invokes the triage store as a child process.
#[derive(Debug, Clone)]
pub struct ProcessTriageRunner {
    program: String,
    database_name: String,
}

impl ProcessTriageRunner {
    /// Creates a runner for the given executable and database file name.
    pub fn new(program: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            database_name: database_name.into(),
        }
    }
}

impl TriageRunner for ProcessTriageRunner {
    fn load_findings(&self, scanner_root: &Path, findings_dir: &Path) -> Result<ToolOutcome> {
        let status = Command::new(&self.program)
            .arg("--database-name")
            .arg(&self.database_name)
            .arg("analyze")
            .arg(findings_dir)
            .current_dir(scanner_root)
            .status()
            .map_err(|e| ScanError::ToolSpawnFailed {
                tool: self.program.clone(),
                reason: e.to_string(),
            })?;

        Ok(ToolOutcome {
            tool: self.program.clone(),
            exit_code: status.code(),
            error: None,
            artifact: scanner_root.join(&self.database_name),
        })
    }
}

/// Result of the analysis hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    /// Where the engine configuration was written.
    pub config_path: PathBuf,
    /// Engine outcome, `None` if analysis is disabled.
    pub analysis: Option<ToolOutcome>,
    /// Triage outcome, `None` if disabled or skipped after a failed analysis.
    pub triage: Option<ToolOutcome>,
}

impl AnalysisReport {
    /// Tools that ran and failed, or could not be started.
    pub fn failures(&self) -> Vec<&ToolOutcome> {
        self.analysis
            .iter()
            .chain(self.triage.iter())
            .filter(|o| !o.success())
            .collect()
    }
}

/// Writes the engine configuration and runs the enabled tools.
///
/// Tool failures are reported in the result; only filesystem errors while
/// preparing the engine configuration are returned as errors.
pub fn run_analysis(
    config: &Config,
    analysis: &dyn AnalysisRunner,
    triage: &dyn TriageRunner,
) -> Result<AnalysisReport> {
    let scanner_root = &config.output.scanner_root;
    fs::create_dir_all(scanner_root).map_err(|e| ScanError::fs(scanner_root, e))?;

    let config_path = scanner_root.join(&config.analysis.config_file);
    EngineConfigFile::from_config(config).write(&config_path)?;

    let findings = config.findings_root();
    let mut report = AnalysisReport {
        config_path,
        analysis: None,
        triage: None,
    };

    if config.analysis.enabled {
        let outcome = settle(&config.analysis.program, &findings, || {
            analysis.analyze(scanner_root, &findings)
        });
        if outcome.success() {
            info!(findings = %findings.display(), "analysis finished");
        } else {
            warn!(
                tool = %outcome.tool,
                exit_code = ?outcome.exit_code,
                error = ?outcome.error,
                "analysis failed, please review the engine logs"
            );
        }
        report.analysis = Some(outcome);
    }

    let analysis_ok = report.analysis.as_ref().map_or(true, ToolOutcome::success);
    if config.triage.enabled && analysis_ok {
        let database = scanner_root.join(&config.triage.database_name);
        let outcome = settle(&config.triage.program, &database, || {
            triage.load_findings(scanner_root, &findings)
        });
        if outcome.success() {
            info!(database = %outcome.artifact.display(), "findings loaded into triage store");
        } else {
            warn!(
                tool = %outcome.tool,
                exit_code = ?outcome.exit_code,
                error = ?outcome.error,
                "triage import failed"
            );
        }
        report.triage = Some(outcome);
    } else if config.triage.enabled {
        warn!("skipping triage import because analysis did not succeed");
    }

    Ok(report)
}

/// Turns a tool error into a failed outcome so it is reported, not propagated.
fn settle(tool: &str, artifact: &Path, run: impl FnOnce() -> Result<ToolOutcome>) -> ToolOutcome {
    run().unwrap_or_else(|e| ToolOutcome {
        tool: tool.to_string(),
        exit_code: None,
        error: Some(e.to_string()),
        artifact: artifact.to_path_buf(),
    })
}
