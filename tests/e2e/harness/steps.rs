use std::time::Duration;

use super::assertions::Assertion;

/// One audit record to append to the export
#[derive(Debug, Clone)]
pub struct RecordSpec {
    pub service: String,
    pub action: String,
    pub author: Option<String>,
    pub document_id: Option<String>,
    pub path: Option<String>,
    pub command_id: Option<String>,
    pub command_text: Option<String>,
    pub language: Option<String>,
}

/// All possible actions in a test scenario
#[derive(Debug)]
pub enum ScenarioStep {
    // Audit log
    Record(RecordSpec),
    CorruptExport,
    RemoveExport,

    // Configuration
    LookbackDays {
        days: u32,
    },
    Language {
        language: String,
        extension: String,
    },

    // Time control
    Wait {
        duration: Duration,
    },
    WaitDays {
        days: u64,
    },

    // Pipeline
    Extract,
    ExtractFails {
        contains: String,
    },
    Analyze {
        engine_succeeds: bool,
    },

    // Failure simulation
    LeaveStaleStaging,

    // Assertions (can be interspersed)
    Assert {
        assertion: Assertion,
    },
}
