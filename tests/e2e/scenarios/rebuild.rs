use crate::harness::{Assertion, Scenario};

#[test]
fn test_rerun_is_idempotent() {
    Scenario::new("idempotent_rerun")
        .from_fixture("default")
        .extract()
        .extract()
        .assert(Assertion::TreeDigestUnchanged)
        .assert(Assertion::TreeDigestMatchesDisk)
        .assert_artifact_count(2)
        .assert(Assertion::NoStagingLeftovers)
        .run()
        .unwrap();
}

#[test]
fn test_new_commands_change_the_tree() {
    Scenario::new("new_commands")
        .attach("D1", "/live")
        .run_command("D1", "c1", "x = 1")
        .extract()
        .run_command("D1", "c2", "y = 2")
        .extract()
        .assert(Assertion::TreeDigestChanged)
        .assert_command_ids("live/1/code.py", &["c1", "c2"])
        .run()
        .unwrap();
}

#[test]
fn test_expired_sessions_are_removed() {
    Scenario::new("expired_sessions")
        .lookback_days(7)
        .attach("D1", "/stale")
        .run_command("D1", "c1", "x = 1")
        .extract()
        .assert_artifact("stale/1/code.py")
        .wait_days(10)
        .attach("D2", "/fresh")
        .run_command("D2", "c2", "y = 1")
        .extract()
        .assert_no_artifact("stale/1/code.py")
        .assert_artifact("fresh/1/code.py")
        .assert_artifact_count(1)
        .run()
        .unwrap();
}

#[test]
fn test_empty_input_clears_tree() {
    Scenario::new("empty_input")
        .attach("D1", "/gone")
        .run_command("D1", "c1", "x = 1")
        .extract()
        .assert_artifact_count(1)
        .lookback_days(1)
        .wait_days(5)
        .extract()
        .assert(Assertion::EmptyInput)
        .assert_artifact_count(0)
        .assert(Assertion::TreeDigestMatchesDisk)
        .run()
        .unwrap();
}

#[test]
fn test_stale_staging_does_not_leak_into_tree() {
    Scenario::new("stale_staging")
        .attach("D1", "/real")
        .run_command("D1", "c1", "x = 1")
        .leave_stale_staging()
        .extract()
        .assert_artifact_count(1)
        .assert_no_artifact("Users/ghost/nb/1/code.py")
        .assert(Assertion::TreeDigestMatchesDisk)
        .run()
        .unwrap();
}
