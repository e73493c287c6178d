use anyhow::Result;
use nbscan_core::ExtractReport;
use std::path::Path;

/// Declarative assertions on the scanner root and the last run's reports.
///
/// Artifact paths are relative to the code tree root.
pub enum Assertion {
    // Code tree
    ArtifactExists {
        path: String,
    },
    ArtifactAbsent {
        path: String,
    },
    ArtifactContent {
        path: String,
        content: String,
    },
    ArtifactContains {
        path: String,
        text: String,
    },
    ArtifactCommandIds {
        path: String,
        ids: Vec<String>,
    },
    ArtifactCount(usize),
    NoStagingLeftovers,

    // Extraction report
    EventsKept(usize),
    OutsideWindow(usize),
    SessionCount(usize),
    UnresolvedSessions(usize),
    UnresolvedGroups(usize),
    SkippedCount(usize),
    ParseFailures(usize),
    EmptyInput,

    // Digest
    TreeDigestMatchesDisk,
    TreeDigestUnchanged,
    TreeDigestChanged,

    // Analysis hand-off
    EngineConfigWritten,
    AnalysisSucceeded,
    FindingsLoaded,
    TriageSkipped,

    // Custom (receives the code root and the last extraction report)
    Custom(Box<dyn Fn(&Path, &ExtractReport) -> Result<()> + Send + Sync>),
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArtifactExists { path } => write!(f, "ArtifactExists {{ path: {:?} }}", path),
            Self::ArtifactAbsent { path } => write!(f, "ArtifactAbsent {{ path: {:?} }}", path),
            Self::ArtifactContent { path, content } => {
                write!(f, "ArtifactContent {{ path: {:?}, content: {:?} }}", path, content)
            }
            Self::ArtifactContains { path, text } => {
                write!(f, "ArtifactContains {{ path: {:?}, text: {:?} }}", path, text)
            }
            Self::ArtifactCommandIds { path, ids } => {
                write!(f, "ArtifactCommandIds {{ path: {:?}, ids: {:?} }}", path, ids)
            }
            Self::ArtifactCount(n) => write!(f, "ArtifactCount({})", n),
            Self::NoStagingLeftovers => write!(f, "NoStagingLeftovers"),
            Self::EventsKept(n) => write!(f, "EventsKept({})", n),
            Self::OutsideWindow(n) => write!(f, "OutsideWindow({})", n),
            Self::SessionCount(n) => write!(f, "SessionCount({})", n),
            Self::UnresolvedSessions(n) => write!(f, "UnresolvedSessions({})", n),
            Self::UnresolvedGroups(n) => write!(f, "UnresolvedGroups({})", n),
            Self::SkippedCount(n) => write!(f, "SkippedCount({})", n),
            Self::ParseFailures(n) => write!(f, "ParseFailures({})", n),
            Self::EmptyInput => write!(f, "EmptyInput"),
            Self::TreeDigestMatchesDisk => write!(f, "TreeDigestMatchesDisk"),
            Self::TreeDigestUnchanged => write!(f, "TreeDigestUnchanged"),
            Self::TreeDigestChanged => write!(f, "TreeDigestChanged"),
            Self::EngineConfigWritten => write!(f, "EngineConfigWritten"),
            Self::AnalysisSucceeded => write!(f, "AnalysisSucceeded"),
            Self::FindingsLoaded => write!(f, "FindingsLoaded"),
            Self::TriageSkipped => write!(f, "TriageSkipped"),
            Self::Custom(_) => write!(f, "Custom(<fn>)"),
        }
    }
}
