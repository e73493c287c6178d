//! Event stream loading: reads audit records and keeps the relevant ones.

use crate::config::SourceConfig;
use crate::error::{Result, ScanError};
use crate::types::{Action, AuditEvent, AuditRecord};
use chrono::{Days, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A read-only supplier of audit records.
pub trait EventSource {
    /// Returns every record of the given table, in ingestion order.
    fn read_records(&self, table: &str) -> Result<Vec<AuditRecord>>;
}

/// Reads table exports stored as `<dir>/<table>.jsonl`, one record per line.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    dir: PathBuf,
}

impl JsonLinesSource {
    /// Creates a source over the given exports directory.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the export file for a table.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", table))
    }
}

impl EventSource for JsonLinesSource {
    fn read_records(&self, table: &str) -> Result<Vec<AuditRecord>> {
        let path = self.table_path(table);
        if !path.exists() {
            return Err(ScanError::TableNotFound {
                table: table.to_string(),
                path,
            });
        }

        let content = fs::read_to_string(&path)?;
        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record =
                serde_json::from_str(line).map_err(|e| ScanError::MalformedRecord {
                    path: path.clone(),
                    line: idx + 1,
                    reason: e.to_string(),
                })?;
            records.push(record);
        }

        debug!(table, records = records.len(), "read audit export");
        Ok(records)
    }
}

/// In-memory records, served for any table name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<AuditRecord>,
}

impl MemorySource {
    /// Creates a source over the given records.
    pub fn new(records: Vec<AuditRecord>) -> Self {
        Self { records }
    }
}

impl EventSource for MemorySource {
    fn read_records(&self, _table: &str) -> Result<Vec<AuditRecord>> {
        Ok(self.records.clone())
    }
}

/// Counts from the loading stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Records read from the source.
    pub records_read: usize,
    /// Records kept as events.
    pub events_kept: usize,
    /// Dropped: other service.
    pub wrong_service: usize,
    /// Dropped: irrelevant action.
    pub irrelevant_action: usize,
    /// Dropped: older than the lookback window.
    pub outside_window: usize,
    /// Dropped: magic command, or neither path nor command text.
    pub magic_or_empty: usize,
    /// Dropped: no document id or author.
    pub unpartitionable: usize,
}

/// First date inside the lookback window.
pub fn window_start(today: NaiveDate, lookback_days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(lookback_days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Reads the configured table and keeps the relevant events.
///
/// The result is unordered; ordering is established by the session
/// reconstructor. Each event's `offset` is its position in the source.
pub fn load_events(
    source: &dyn EventSource,
    config: &SourceConfig,
    today: NaiveDate,
) -> Result<(Vec<AuditEvent>, LoadReport)> {
    let records = source.read_records(&config.audit_log_table)?;
    let start = window_start(today, config.lookback_days);
    let magic = config.magic_char();

    let mut report = LoadReport {
        records_read: records.len(),
        ..LoadReport::default()
    };

    let mut events = Vec::new();
    for (offset, record) in records.into_iter().enumerate() {
        match filter_record(offset as u64, record, config, start, magic) {
            Ok(event) => events.push(event),
            Err(reason) => match reason {
                Rejection::WrongService => report.wrong_service += 1,
                Rejection::IrrelevantAction => report.irrelevant_action += 1,
                Rejection::OutsideWindow => report.outside_window += 1,
                Rejection::MagicOrEmpty => report.magic_or_empty += 1,
                Rejection::Unpartitionable => report.unpartitionable += 1,
            },
        }
    }
    report.events_kept = events.len();

    info!(
        table = %config.audit_log_table,
        read = report.records_read,
        kept = report.events_kept,
        since = %start,
        "loaded audit events"
    );
    Ok((events, report))
}

enum Rejection {
    WrongService,
    IrrelevantAction,
    OutsideWindow,
    MagicOrEmpty,
    Unpartitionable,
}

fn filter_record(
    offset: u64,
    record: AuditRecord,
    config: &SourceConfig,
    window_start: NaiveDate,
    magic: char,
) -> std::result::Result<AuditEvent, Rejection> {
    if record.service_name != config.service_name {
        return Err(Rejection::WrongService);
    }
    let action = Action::parse(&record.action_name).ok_or(Rejection::IrrelevantAction)?;

    let event_date = record
        .event_date
        .unwrap_or_else(|| record.event_time.date_naive());
    if event_date < window_start {
        return Err(Rejection::OutsideWindow);
    }

    let params = record.request_params;
    // A missing command text never satisfies "does not start with the prefix".
    let plain_command = params
        .command_text
        .as_deref()
        .is_some_and(|text| !text.starts_with(magic));
    if params.path.is_none() && !plain_command {
        return Err(Rejection::MagicOrEmpty);
    }

    let (Some(document_id), Some(author)) = (params.notebook_id, record.user_identity.email)
    else {
        return Err(Rejection::Unpartitionable);
    };

    Ok(AuditEvent {
        offset,
        timestamp: record.event_time,
        event_date,
        service: record.service_name,
        action,
        author,
        document_id,
        document_path: params.path,
        command_id: params.command_id,
        command_text: params.command_text,
        language: params.command_language,
    })
}
