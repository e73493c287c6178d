use crate::harness::{Assertion, Scenario};
use nbscan_core::ExtractReport;
use std::path::Path;

#[test]
fn test_authors_share_a_session_file() {
    Scenario::new("shared_session")
        .attach("D1", "/team/analysis")
        .by("bob@example.com")
        .run_command("D1", "b1", "b = load()")
        .by("alice@example.com")
        .run_command("D1", "a1", "a = load()")
        .by("bob@example.com")
        .run_command("D1", "b2", "b.describe()")
        .extract()
        .assert_artifact_count(1)
        // Grouped per author, authors in order, chronological within each.
        .assert_command_ids("team/analysis/1/code.py", &["a1", "b1", "b2"])
        .run()
        .unwrap();
}

#[test]
fn test_invalid_author_buffer_does_not_hide_others() {
    Scenario::new("per_author_validation")
        .attach("D1", "/team/broken")
        .run_command("D1", "a1", "ok = compute(1)")
        .by("bob@example.com")
        .run_command("D1", "b1", "broken = compute(")
        .extract()
        .assert_skipped(1)
        .assert(Assertion::ParseFailures(1))
        .assert_command_ids("team/broken/1/code.py", &["a1"])
        .run()
        .unwrap();
}

#[test]
fn test_anonymous_commands_are_dropped() {
    Scenario::new("anonymous_commands")
        .attach("D1", "/anon")
        .anonymously()
        .run_command("D1", "x1", "secret = 1")
        .by("alice@example.com")
        .run_command("D1", "a1", "visible = 2")
        .extract()
        .assert_command_ids("anon/1/code.py", &["a1"])
        .assert(Assertion::Custom(Box::new(|_: &Path, report: &ExtractReport| {
            anyhow::ensure!(
                report.load.unpartitionable == 1,
                "expected one unpartitionable record, got {}",
                report.load.unpartitionable
            );
            Ok(())
        })))
        .run()
        .unwrap();
}
