//! Configuration types for nbscan runs.

use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "nbscan.toml";

/// Comprehensive configuration for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Where audit records come from and which of them are kept.
    #[serde(default)]
    pub source: SourceConfig,

    /// Which commands are extracted and how they are validated.
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Layout of the materialized tree.
    #[serde(default)]
    pub output: OutputConfig,

    /// Static-analysis engine settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Triage store settings.
    #[serde(default)]
    pub triage: TriageConfig,
}

impl Config {
    /// Load configuration from a file, falling back to defaults if it is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| ScanError::ConfigError(format!("failed to read config: {}", e)))?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| ScanError::ConfigError(format!("failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ScanError::ConfigError(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| ScanError::ConfigError(format!("failed to write config: {}", e)))?;
        Ok(())
    }

    /// Checks values that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.source.audit_log_table.trim().is_empty() {
            return Err(ScanError::ConfigError(
                "source.audit_log_table must not be empty".into(),
            ));
        }
        if self.source.magic_prefix.chars().count() != 1 {
            return Err(ScanError::ConfigError(format!(
                "source.magic_prefix must be a single character, got {:?}",
                self.source.magic_prefix
            )));
        }
        if self.extraction.language.trim().is_empty() {
            return Err(ScanError::ConfigError(
                "extraction.language must not be empty".into(),
            ));
        }
        let ext = &self.extraction.file_extension;
        if ext.is_empty() || ext.contains(['/', '\\', '.']) {
            return Err(ScanError::ConfigError(format!(
                "extraction.file_extension is invalid: {:?}",
                ext
            )));
        }
        if self.extraction.validator_command.is_empty() {
            return Err(ScanError::ConfigError(
                "extraction.validator_command must name a program".into(),
            ));
        }
        let code_dir = &self.output.code_dir;
        let mut components = Path::new(code_dir).components();
        let single_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_name || code_dir.contains(['/', '\\']) {
            return Err(ScanError::ConfigError(format!(
                "output.code_dir must be a single directory name, got {:?}",
                code_dir
            )));
        }
        if self.analysis.worker_count == 0 {
            return Err(ScanError::ConfigError(
                "analysis.worker_count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Directory the code tree is materialized into.
    pub fn code_root(&self) -> PathBuf {
        self.output.scanner_root.join(&self.output.code_dir)
    }

    /// Directory the analysis engine writes its findings to.
    pub fn findings_root(&self) -> PathBuf {
        self.output.scanner_root.join(&self.analysis.findings_dir)
    }
}

/// Audit source configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Lookback window in days (default: 90).
    pub lookback_days: u32,

    /// Audit table identifier (default: `system.access.audit`).
    pub audit_log_table: String,

    /// Directory holding table exports as `<table>.jsonl` (default: `audit`).
    pub exports_dir: PathBuf,

    /// Service name of the document editor in the audit source (default: `notebook`).
    pub service_name: String,

    /// Prefix marking magic/control commands (default: `%`).
    pub magic_prefix: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            audit_log_table: "system.access.audit".to_string(),
            exports_dir: PathBuf::from("audit"),
            service_name: "notebook".to_string(),
            magic_prefix: "%".to_string(),
        }
    }
}

impl SourceConfig {
    /// Returns the magic prefix as a character.
    pub fn magic_char(&self) -> char {
        self.magic_prefix.chars().next().unwrap_or('%')
    }
}

/// Extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Language tag of commands to extract (default: `python`).
    pub language: String,

    /// Extension of materialized files (default: `py`).
    pub file_extension: String,

    /// Parser invoked with the buffer on stdin; exit status 0 means valid.
    pub validator_command: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            language: "python".to_string(),
            file_extension: "py".to_string(),
            validator_command: vec![
                "python3".to_string(),
                "-c".to_string(),
                "import ast, sys; ast.parse(sys.stdin.read())".to_string(),
            ],
        }
    }
}

/// Output tree configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Working directory shared with the analysis engine (default: `/tmp/code-scanning`).
    pub scanner_root: PathBuf,

    /// Name of the code tree below `scanner_root` (default: `code`).
    pub code_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            scanner_root: PathBuf::from("/tmp/code-scanning"),
            code_dir: "code".to_string(),
        }
    }
}

/// Static-analysis engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Run the engine after materialization (default: true).
    pub enabled: bool,

    /// Engine executable (default: `pyre`).
    pub program: String,

    /// Site-package search strategy (default: `pep561`).
    pub search_strategy: String,

    /// Directories holding taint models.
    pub taint_model_paths: Vec<PathBuf>,

    /// Extra module search paths (stubs, runtime libraries).
    pub search_paths: Vec<PathBuf>,

    /// Worker count handed to the engine (default: 4).
    pub worker_count: u32,

    /// Findings directory below `scanner_root` (default: `pysa-output`).
    pub findings_dir: String,

    /// Engine configuration file below `scanner_root` (default: `.pyre_configuration`).
    pub config_file: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "pyre".to_string(),
            search_strategy: "pep561".to_string(),
            taint_model_paths: vec![PathBuf::from("conf")],
            search_paths: vec![PathBuf::from("conf/stubs")],
            worker_count: 4,
            findings_dir: "pysa-output".to_string(),
            config_file: ".pyre_configuration".to_string(),
        }
    }
}

/// Triage store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TriageConfig {
    /// Load findings into the triage store (default: true).
    pub enabled: bool,

    /// Triage executable (default: `sapp`).
    pub program: String,

    /// Database file below `scanner_root` (default: `sapp.db`).
    pub database_name: String,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "sapp".to_string(),
            database_name: "sapp.db".to_string(),
        }
    }
}
