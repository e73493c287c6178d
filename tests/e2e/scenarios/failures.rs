use crate::harness::Scenario;

#[test]
fn test_malformed_export_aborts_before_writing() {
    Scenario::new("malformed_export")
        .attach("D1", "/kept")
        .run_command("D1", "c1", "x = 1")
        .extract()
        .corrupt_export()
        .extract_fails_with("malformed audit record")
        // The previous tree is untouched.
        .assert_artifact("kept/1/code.py")
        .run()
        .unwrap();
}

#[test]
fn test_missing_table() {
    Scenario::new("missing_table")
        .remove_export()
        .extract_fails_with("audit table not found")
        .run()
        .unwrap();
}
