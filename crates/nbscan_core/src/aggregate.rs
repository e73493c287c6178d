//! Code aggregation: one labeled buffer per (document, path, author, session).

use crate::types::{AnnotatedEvent, CodeBuffer, CodeSegment};
use std::collections::BTreeMap;
use tracing::debug;

/// Buffers produced by aggregation plus what was left out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AggregateReport {
    /// Buffers of resolved sessions, ordered by path, session, document, author.
    pub buffers: Vec<CodeBuffer>,
    /// Code-bearing groups dropped because their session has no path.
    pub unresolved_groups: usize,
    /// Code-bearing events in those groups.
    pub unresolved_commands: usize,
}

type GroupKey = (String, Option<String>, String, u32);

/// Groups code-bearing events into buffers.
///
/// Only events with a command id and a language tag equal to `language` are
/// considered. Segments inside a buffer are in chronological order, with the
/// same tie-break as session reconstruction.
pub fn aggregate(annotated: &[AnnotatedEvent], language: &str) -> AggregateReport {
    let mut groups: BTreeMap<GroupKey, Vec<&AnnotatedEvent>> = BTreeMap::new();
    for item in annotated.iter().filter(|a| a.event.is_code_in(language)) {
        let key = (
            item.event.document_id.clone(),
            item.session_path.clone(),
            item.event.author.clone(),
            item.session_id,
        );
        groups.entry(key).or_default().push(item);
    }

    let mut report = AggregateReport::default();
    for ((document_id, path, author, session_id), mut items) in groups {
        let Some(document_path) = path else {
            report.unresolved_groups += 1;
            report.unresolved_commands += items.len();
            continue;
        };

        items.sort_by(|a, b| a.event.chronological_key().cmp(&b.event.chronological_key()));
        let segments = items
            .into_iter()
            .filter_map(|item| {
                let command_id = item.event.command_id.clone()?;
                Some(CodeSegment {
                    command_id,
                    text: item.event.command_text.clone().unwrap_or_default(),
                })
            })
            .collect();

        report.buffers.push(CodeBuffer {
            document_id,
            document_path,
            session_id,
            author,
            segments,
        });
    }

    report.buffers.sort_by(|a, b| {
        (&a.document_path, a.session_id, &a.document_id, &a.author).cmp(&(
            &b.document_path,
            b.session_id,
            &b.document_id,
            &b.author,
        ))
    });

    debug!(
        buffers = report.buffers.len(),
        unresolved = report.unresolved_groups,
        "aggregated code buffers"
    );
    report
}
