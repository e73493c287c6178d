//! Core data types for nbscan.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of the header line introducing each command in a code buffer.
pub const COMMAND_HEADER: &str = "## command_id: ";

/// Audit record in the audit source's native schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Emitting service.
    pub service_name: String,
    /// Action performed.
    pub action_name: String,
    /// Partition date of the record; derived from `event_time` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<NaiveDate>,
    /// Event timestamp.
    pub event_time: DateTime<Utc>,
    /// Who performed the action.
    #[serde(default)]
    pub user_identity: UserIdentity,
    /// Action parameters.
    #[serde(default)]
    pub request_params: RequestParams,
}

/// Identity block of an audit record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Author email.
    #[serde(default)]
    pub email: Option<String>,
}

/// Request parameters of a document-editor audit record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
    /// Document path, carried by attach events.
    #[serde(default)]
    pub path: Option<String>,
    /// Document identifier.
    #[serde(default)]
    pub notebook_id: Option<String>,
    /// Command identifier, carried by command events.
    #[serde(default)]
    pub command_id: Option<String>,
    /// Command source text.
    #[serde(default)]
    pub command_text: Option<String>,
    /// Language tag of the command.
    #[serde(default)]
    pub command_language: Option<String>,
}

/// Document-editor actions relevant to session reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// A command was executed.
    RunCommand,
    /// The document was attached to a compute context. Opens a session.
    Attach,
    /// The document was detached.
    Detach,
    /// A run started.
    RunStart,
    /// A run failed.
    RunFailed,
    /// A run succeeded.
    RunSucceeded,
}

impl Action {
    /// Parses an action name in either the audit source's spelling or kebab-case.
    ///
    /// Returns `None` for actions the pipeline does not care about.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "runCommand" | "run-command" => Some(Self::RunCommand),
            "attachNotebook" | "attach" => Some(Self::Attach),
            "detachNotebook" | "detach" => Some(Self::Detach),
            "runStart" | "run-start" => Some(Self::RunStart),
            "runFailed" | "run-failed" => Some(Self::RunFailed),
            "runSucceeded" | "run-succeeded" => Some(Self::RunSucceeded),
            _ => None,
        }
    }

    /// True for events that open a new session.
    pub fn is_session_boundary(self) -> bool {
        matches!(self, Self::Attach)
    }

    /// Kebab-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RunCommand => "run-command",
            Self::Attach => "attach",
            Self::Detach => "detach",
            Self::RunStart => "run-start",
            Self::RunFailed => "run-failed",
            Self::RunSucceeded => "run-succeeded",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relevant, well-formed audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Position of the record in the source stream. Tie-break for equal timestamps.
    pub offset: u64,
    /// Event timestamp.
    pub timestamp: DateTime<Utc>,
    /// Partition date.
    pub event_date: NaiveDate,
    /// Emitting service.
    pub service: String,
    /// Action performed.
    pub action: Action,
    /// Author email.
    pub author: String,
    /// Document identifier.
    pub document_id: String,
    /// Document path, if the event carried one.
    pub document_path: Option<String>,
    /// Command identifier.
    pub command_id: Option<String>,
    /// Command source text.
    pub command_text: Option<String>,
    /// Command language tag.
    pub language: Option<String>,
}

impl AuditEvent {
    /// Total order within a partition: timestamp, then ingestion offset, then command id.
    pub fn chronological_key(&self) -> (DateTime<Utc>, u64, Option<&str>) {
        (self.timestamp, self.offset, self.command_id.as_deref())
    }

    /// True if this event carries code in the given language.
    pub fn is_code_in(&self, language: &str) -> bool {
        self.command_id.is_some() && self.language.as_deref() == Some(language)
    }
}

/// An event annotated with its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedEvent {
    /// The underlying event.
    pub event: AuditEvent,
    /// Session number within the document; 0 before the first boundary.
    pub session_id: u32,
    /// Path carried by the boundary that opened the session.
    pub session_path: Option<String>,
}

/// A reconstructed session of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Document identifier.
    pub document_id: String,
    /// Session number within the document.
    pub session_id: u32,
    /// Resolved document path, `None` if unresolved.
    pub document_path: Option<String>,
    /// Events of the session in chronological order.
    pub events: Vec<AuditEvent>,
}

impl Session {
    /// True if the session has a document path and can be materialized.
    pub fn is_resolved(&self) -> bool {
        self.document_path.is_some()
    }

    /// Events carrying code in the given language.
    pub fn code_events<'a>(&'a self, language: &'a str) -> impl Iterator<Item = &'a AuditEvent> + 'a {
        self.events.iter().filter(move |e| e.is_code_in(language))
    }

    /// Distinct authors active in the session, sorted.
    pub fn authors(&self) -> Vec<&str> {
        let mut authors: Vec<&str> = self.events.iter().map(|e| e.author.as_str()).collect();
        authors.sort_unstable();
        authors.dedup();
        authors
    }
}

/// One command inside a code buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSegment {
    /// Command identifier.
    pub command_id: String,
    /// Command source text.
    pub text: String,
}

/// The code one author produced in one session of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBuffer {
    /// Document identifier.
    pub document_id: String,
    /// Resolved document path.
    pub document_path: String,
    /// Session number.
    pub session_id: u32,
    /// Author email.
    pub author: String,
    /// Commands in chronological order.
    pub segments: Vec<CodeSegment>,
}

impl CodeBuffer {
    /// Renders the labeled buffer text.
    ///
    /// Each command becomes a header line followed by its text; commands are
    /// separated by a newline and the buffer ends with a blank line.
    pub fn render(&self) -> String {
        let mut text = self
            .segments
            .iter()
            .map(|s| format!("{}{}\n{}", COMMAND_HEADER, s.command_id, s.text))
            .collect::<Vec<_>>()
            .join("\n");
        text.push_str("\n\n");
        text
    }

    /// Command ids in buffer order.
    pub fn command_ids(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.command_id.as_str()).collect()
    }
}

/// Recovers the command ids from rendered buffer text, in order.
///
/// Every line starting with [`COMMAND_HEADER`] counts as a header, so a
/// command whose own text contains such a line (for example code pasted back
/// from a materialized file) contributes extra ids. Use
/// [`CodeBuffer::command_ids`] when the buffer itself is at hand.
pub fn parse_command_ids(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.strip_prefix(COMMAND_HEADER))
        .map(str::to_string)
        .collect()
}
