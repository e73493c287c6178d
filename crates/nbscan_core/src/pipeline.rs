//! The extraction pipeline: load → sessionize → aggregate → materialize.
//!
//! All stages receive their inputs from an explicit [`PipelineContext`].

use crate::aggregate::aggregate;
use crate::analysis::{run_analysis, AnalysisReport, AnalysisRunner, TriageRunner};
use crate::config::Config;
use crate::error::Result;
use crate::materialize::{MaterializeReport, Materializer};
use crate::sessionize::{annotate, reconstruct_sessions};
use crate::source::{load_events, EventSource, JsonLinesSource, LoadReport};
use crate::types::{AuditEvent, Session};
use crate::validate::{CommandValidator, SourceValidator};
use crate::TimeProvider;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Summary of an extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    /// Loading counts.
    pub load: LoadReport,
    /// True if no events survived loading.
    pub empty_input: bool,
    /// Distinct (document, session) pairs.
    pub sessions: usize,
    /// Sessions without a document path.
    pub unresolved_sessions: usize,
    /// Code buffers built from resolved sessions.
    pub buffers: usize,
    /// Code-bearing groups dropped for lack of a document path.
    pub unresolved_groups: usize,
    /// What was written and skipped.
    pub materialize: MaterializeReport,
}

/// Summary of a full run including the analysis hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Extraction summary.
    pub extract: ExtractReport,
    /// Analysis and triage outcomes.
    pub analysis: AnalysisReport,
}

/// Configuration plus the collaborators every stage needs.
pub struct PipelineContext {
    config: Config,
    source: Box<dyn EventSource>,
    validator: Box<dyn SourceValidator>,
    time_provider: Option<Arc<dyn TimeProvider>>,
}

impl PipelineContext {
    /// Creates a context from explicit collaborators.
    pub fn new(
        config: Config,
        source: impl EventSource + 'static,
        validator: impl SourceValidator + 'static,
    ) -> Self {
        Self {
            config,
            source: Box::new(source),
            validator: Box::new(validator),
            time_provider: None,
        }
    }

    /// Creates a context reading JSON-lines exports and validating with the configured parser.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let source = JsonLinesSource::new(&config.source.exports_dir);
        let validator = CommandValidator::from_argv(&config.extraction.validator_command)?;
        Ok(Self::new(config, source, validator))
    }

    /// Replaces the system clock, e.g. to pin the lookback window in tests.
    pub fn with_time_provider(mut self, provider: impl TimeProvider + 'static) -> Self {
        self.time_provider = Some(Arc::new(provider));
        self
    }

    /// The run configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current date according to the time provider.
    pub fn today(&self) -> NaiveDate {
        let secs = match &self.time_provider {
            Some(provider) => provider.now(),
            None => Utc::now().timestamp(),
        };
        DateTime::<Utc>::from_timestamp(secs, 0)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
            .date_naive()
    }

    /// Stage 1: relevant events inside the lookback window.
    pub fn load(&self) -> Result<(Vec<AuditEvent>, LoadReport)> {
        load_events(self.source.as_ref(), &self.config.source, self.today())
    }

    /// Stages 1–2: reconstructed sessions, for inspection.
    pub fn sessions(&self) -> Result<Vec<Session>> {
        let (events, _) = self.load()?;
        Ok(reconstruct_sessions(events))
    }

    /// Stages 1–4: rebuilds the code tree.
    pub fn extract(&self) -> Result<ExtractReport> {
        let (events, load) = self.load()?;
        let empty_input = events.is_empty();
        if empty_input {
            warn!(
                table = %self.config.source.audit_log_table,
                "no commands found in audit logs, output tree will be empty"
            );
        }

        let annotated = annotate(events);
        let mut sessions = BTreeSet::new();
        let mut unresolved = BTreeSet::new();
        for item in &annotated {
            let key = (item.event.document_id.as_str(), item.session_id);
            sessions.insert(key);
            if item.session_path.is_none() {
                unresolved.insert(key);
            }
        }

        let aggregated = aggregate(&annotated, &self.config.extraction.language);
        let materializer =
            Materializer::new(self.config.code_root(), &self.config.extraction.file_extension);
        let materialize = materializer.materialize(&aggregated.buffers, self.validator.as_ref())?;

        info!(
            sessions = sessions.len(),
            unresolved = unresolved.len(),
            buffers = aggregated.buffers.len(),
            written = materialize.artifacts.len(),
            skipped = materialize.skipped.len(),
            "extraction finished"
        );

        Ok(ExtractReport {
            load,
            empty_input,
            sessions: sessions.len(),
            unresolved_sessions: unresolved.len(),
            buffers: aggregated.buffers.len(),
            unresolved_groups: aggregated.unresolved_groups,
            materialize,
        })
    }

    /// Stages 1–6: extraction followed by the analysis hand-off.
    pub fn run(
        &self,
        analysis: &dyn AnalysisRunner,
        triage: &dyn TriageRunner,
    ) -> Result<RunReport> {
        let extract = self.extract()?;
        let analysis = run_analysis(&self.config, analysis, triage)?;
        Ok(RunReport { extract, analysis })
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("config", &self.config)
            .field("has_time_provider", &self.time_provider.is_some())
            .finish()
    }
}
