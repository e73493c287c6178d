//! Show reconstructed sessions.

use anyhow::Result;
use console::style;
use nbscan_core::PipelineContext;
use std::path::Path;

/// Prints one line per session, followed by its commands.
pub fn run(config_path: Option<&Path>, document: Option<&str>, all: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let ctx = PipelineContext::from_config(config)?;
    let language = ctx.config().extraction.language.clone();

    let sessions: Vec<_> = ctx
        .sessions()?
        .into_iter()
        .filter(|s| document.map_or(true, |d| s.document_id == d))
        .filter(|s| all || s.is_resolved())
        .collect();

    if sessions.is_empty() {
        println!("No sessions found");
        return Ok(());
    }

    for session in &sessions {
        let path = match &session.document_path {
            Some(p) => style(p.clone()).cyan(),
            None => style("<unresolved>".to_string()).dim(),
        };
        let first = session.events.first().map(|e| e.timestamp.to_rfc3339());
        println!(
            "{} #{} {} ({} events, since {})",
            session.document_id,
            session.session_id,
            path,
            session.events.len(),
            first.unwrap_or_default()
        );
        for author in session.authors() {
            let ids: Vec<&str> = session
                .code_events(&language)
                .filter(|e| e.author == author)
                .filter_map(|e| e.command_id.as_deref())
                .collect();
            if !ids.is_empty() {
                println!("    {}: {}", author, ids.join(", "));
            }
        }
    }

    println!();
    println!("{} session(s)", sessions.len());
    Ok(())
}
