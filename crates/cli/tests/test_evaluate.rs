//! Test the `weave evaluate` subcommand

mod common;

use serde_json::Value;

#[test]
fn test_evaluate_arithmetic_expression() {
    let output = common::weave()
        .args(["evaluate", "2 + 3 * 4"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["value"], 14);
    assert!(json["errors"].as_array().unwrap().is_empty());
}

#[test]
fn test_evaluate_against_seeded_variables() {
    let output = common::weave()
        .args(["evaluate", "$gold gte 10"])
        .write_stdin(r#"{"gold": 15}"#)
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["value"], true);
}

#[test]
fn test_evaluate_respects_prefixed_scope() {
    let output = common::weave()
        .args(["--scope", "prefixed:alice", "evaluate", "$gold"])
        .write_stdin(r#"{"gold": 7}"#)
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["value"], 7);
}

#[test]
fn test_evaluate_rejects_invalid_scope_flag() {
    common::weave()
        .args(["--scope", "bogus", "evaluate", "1"])
        .assert()
        .failure();
}
