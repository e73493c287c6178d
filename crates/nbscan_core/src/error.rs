//! Error types for nbscan_core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for nbscan_core operations.
///
/// Only conditions that abort a run are represented here. Per-buffer problems
/// (parse failures, unresolved sessions, unsafe paths) are recorded in the
/// stage reports instead.
#[derive(Error, Debug)]
pub enum ScanError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Filesystem operation failed while materializing the output tree.
    #[error("filesystem error at {}: {}", path.display(), source)]
    Filesystem {
        /// Path the operation was applied to
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The audit export for the configured table does not exist.
    #[error("audit table not found: {table} (looked for {})", path.display())]
    TableNotFound {
        /// Table identifier from the configuration
        table: String,
        /// Export file that was expected
        path: PathBuf,
    },

    /// An audit record could not be decoded.
    #[error("malformed audit record at {}:{}: {}", path.display(), line, reason)]
    MalformedRecord {
        /// Export file containing the record
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Decoder message
        reason: String,
    },

    /// Configuration error (loading, parsing, invalid values).
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// The external parser used for validation could not be started.
    #[error("validator unavailable: {program}: {reason}")]
    ValidatorUnavailable {
        /// Program that failed to start
        program: String,
        /// Spawn error message
        reason: String,
    },

    /// An external tool (analysis engine, triage store) could not be started.
    #[error("failed to start {tool}: {reason}")]
    ToolSpawnFailed {
        /// Tool name
        tool: String,
        /// Spawn error message
        reason: String,
    },

    /// Serialization error while writing generated files.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Another run holds the lock on the scanner root.
    #[error("scanner root locked by another run (PID: {pid})")]
    RunLocked {
        /// Process ID holding the lock, 0 if unknown
        pid: u32,
    },
}

impl ScanError {
    /// Wraps an I/O error with the path it occurred on.
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Returns a user-friendly recovery suggestion for the error, if available.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::TableNotFound { .. } => Some(
                "Export the audit table as JSON lines into the configured exports_dir, or fix source.audit_log_table.",
            ),
            Self::MalformedRecord { .. } => {
                Some("Re-export the audit table; each line must be a single JSON audit record.")
            }
            Self::ValidatorUnavailable { .. } => Some(
                "Install the parser used for validation or point extraction.validator_command at one.",
            ),
            Self::ToolSpawnFailed { .. } => {
                Some("Check that the analysis and triage programs are installed and on PATH.")
            }
            Self::RunLocked { .. } => Some(
                "Wait for the other run to finish, or remove .nbscan.lock if that process is dead.",
            ),
            Self::ConfigError(_) => Some("Run 'nbscan init' to write a default nbscan.toml."),
            Self::Filesystem { .. } => {
                Some("The previous output tree was left in place unless a failed restore was logged. Check permissions and free space.")
            }
            _ => None,
        }
    }
}

/// Convenience Result type for nbscan_core operations.
pub type Result<T> = std::result::Result<T, ScanError>;
