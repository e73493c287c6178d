//! Session reconstruction.
//!
//! Events are partitioned by document and put in chronological order
//! (timestamp, then ingestion offset, then command id). A running counter per
//! document is bumped at every attach event; the counter value is the session
//! id of that event and of everything after it until the next attach. The
//! session's path is the path carried by the attach that opened it.
//!
//! Events before the first attach belong to session 0, which never has a path.
//! Detach events do not close a session.

use crate::types::{AnnotatedEvent, AuditEvent, Session};
use std::collections::BTreeMap;
use tracing::debug;

/// Partitions events by document id. Partitions are keyed in ascending order.
pub fn partition_by_document(events: Vec<AuditEvent>) -> BTreeMap<String, Vec<AuditEvent>> {
    let mut partitions: BTreeMap<String, Vec<AuditEvent>> = BTreeMap::new();
    for event in events {
        partitions
            .entry(event.document_id.clone())
            .or_default()
            .push(event);
    }
    partitions
}

/// Annotates the events of a single document with their session.
///
/// The input may be in any order; the output is in chronological order.
pub fn annotate_partition(mut events: Vec<AuditEvent>) -> Vec<AnnotatedEvent> {
    events.sort_by(|a, b| a.chronological_key().cmp(&b.chronological_key()));

    let mut session_id = 0u32;
    let mut session_path: Option<String> = None;

    events
        .into_iter()
        .map(|event| {
            if event.action.is_session_boundary() {
                session_id += 1;
                session_path = event.document_path.clone();
            }
            AnnotatedEvent {
                session_id,
                session_path: session_path.clone(),
                event,
            }
        })
        .collect()
}

/// Annotates every event with its session.
///
/// Output is ordered by document id, then chronologically within a document.
pub fn annotate(events: Vec<AuditEvent>) -> Vec<AnnotatedEvent> {
    let partitions = partition_by_document(events);
    let documents = partitions.len();

    let annotated: Vec<AnnotatedEvent> = partitions
        .into_values()
        .flat_map(annotate_partition)
        .collect();

    debug!(documents, events = annotated.len(), "annotated sessions");
    annotated
}

/// Groups annotated events into sessions, ordered by document id and session id.
pub fn group_sessions(annotated: Vec<AnnotatedEvent>) -> Vec<Session> {
    let mut sessions: BTreeMap<(String, u32), Session> = BTreeMap::new();
    for item in annotated {
        let key = (item.event.document_id.clone(), item.session_id);
        sessions
            .entry(key)
            .or_insert_with(|| Session {
                document_id: item.event.document_id.clone(),
                session_id: item.session_id,
                document_path: item.session_path.clone(),
                events: Vec::new(),
            })
            .events
            .push(item.event);
    }
    sessions.into_values().collect()
}

/// Reconstructs the sessions of all documents.
pub fn reconstruct_sessions(events: Vec<AuditEvent>) -> Vec<Session> {
    group_sessions(annotate(events))
}
