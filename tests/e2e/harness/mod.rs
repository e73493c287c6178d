//! E2E test harness for nbscan.
//!
//! Scenarios record audit events into a JSON-lines export, run the pipeline
//! against a temporary scanner root and assert on the resulting code tree.
//! Some builders and assertions are only used by a subset of scenarios.

#![allow(dead_code)]

pub mod assertions;
pub mod clock;
pub mod steps;
pub mod workspace;

// Re-export commonly used types
pub use assertions::Assertion;
pub use scenario::Scenario;
