//! nbscan Core Library
//!
//! Reconstructs per-user, per-document coding sessions from document-editor
//! audit events and materializes the code written in each session as a
//! source tree for a static-analysis engine:
//! - Event loading with a lookback window
//! - Session reconstruction at attach boundaries
//! - Per-author code buffers in chronological order
//! - Validation and a transactional, idempotent output tree
//!
//! # Quick Start
//!
//! ```
//! use nbscan_core::{AcceptAll, Config, MemorySource, PipelineContext};
//! use tempfile::TempDir;
//!
//! let tmp = TempDir::new().unwrap();
//! let mut config = Config::default();
//! config.output.scanner_root = tmp.path().to_path_buf();
//!
//! let ctx = PipelineContext::new(config, MemorySource::default(), AcceptAll);
//! let report = ctx.extract().unwrap();
//!
//! assert!(report.empty_input);
//! assert!(tmp.path().join("code").is_dir());
//! ```
//!
//! # Stages
//!
//! Each stage is also usable on its own:
//!
//! ```
//! use nbscan_core::{aggregate, annotate, Action, AuditEvent};
//! use chrono::{NaiveDate, TimeZone, Utc};
//!
//! let base = AuditEvent {
//!     offset: 0,
//!     timestamp: Utc.timestamp_opt(1, 0).unwrap(),
//!     event_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
//!     service: "notebook".into(),
//!     action: Action::Attach,
//!     author: "a@example.com".into(),
//!     document_id: "D1".into(),
//!     document_path: Some("/a".into()),
//!     command_id: None,
//!     command_text: None,
//!     language: None,
//! };
//! let command = AuditEvent {
//!     offset: 1,
//!     timestamp: Utc.timestamp_opt(2, 0).unwrap(),
//!     action: Action::RunCommand,
//!     document_path: None,
//!     command_id: Some("c1".into()),
//!     command_text: Some("x=1".into()),
//!     language: Some("python".into()),
//!     ..base.clone()
//! };
//!
//! let annotated = annotate(vec![command, base]);
//! let buffers = aggregate(&annotated, "python").buffers;
//! assert_eq!(buffers[0].render(), "## command_id: c1\nx=1\n\n");
//! ```

mod aggregate;
mod analysis;
mod config;
mod error;
mod lock;
mod materialize;
mod pipeline;
mod sessionize;
mod source;
mod types;
mod validate;

pub use aggregate::{aggregate, AggregateReport};
pub use analysis::{
    run_analysis, AnalysisReport, AnalysisRunner, EngineConfigFile, ProcessAnalysisRunner,
    ProcessTriageRunner, ToolOutcome, TriageRunner,
};
pub use config::{
    AnalysisConfig, Config, ExtractionConfig, OutputConfig, SourceConfig, TriageConfig,
    CONFIG_FILE_NAME,
};
pub use error::{Result, ScanError};
pub use lock::{RunLock, LOCK_FILE_NAME};
pub use materialize::{
    artifact_path, digest_tree, Artifact, MaterializePlan, MaterializeReport, Materializer,
    SkipReason, SkippedBuffer, ARTIFACT_STEM,
};
pub use pipeline::{ExtractReport, PipelineContext, RunReport};
pub use sessionize::{
    annotate, annotate_partition, group_sessions, partition_by_document, reconstruct_sessions,
};
pub use source::{
    load_events, window_start, EventSource, JsonLinesSource, LoadReport, MemorySource,
};
pub use types::*;
pub use validate::{AcceptAll, CommandValidator, SourceValidator, Validation};

/// Time provider trait for testing.
///
/// Allows pinning "today" so the lookback window is deterministic.
/// Only used when explicitly set via `PipelineContext::with_time_provider()`.
pub trait TimeProvider: Send + Sync {
    /// Returns the current Unix timestamp in seconds.
    fn now(&self) -> i64;
}

impl<F> TimeProvider for F
where
    F: Fn() -> i64 + Send + Sync,
{
    fn now(&self) -> i64 {
        self()
    }
}
