//! Test the `weave render` subcommand

mod common;

use serde_json::Value;

#[test]
fn test_render_start_passage_with_seeded_variables() {
    let output = common::weave()
        .args(["render"])
        .arg(common::story_path())
        .arg("Start")
        .write_stdin(r#"{"Health": 12}"#)
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["text"], "You have 12 health.\nGo north\n\n");
    let links = json["links"].as_array().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["display"], "Go north");
    assert_eq!(links[0]["target"], "Woods");
    assert!(json["errors"].as_array().unwrap().is_empty());
}

#[test]
fn test_render_tracks_compound_assignment_in_woods() {
    let output = common::weave()
        .args(["render"])
        .arg(common::story_path())
        .arg("Woods")
        .write_stdin(r#"{"Health": 3, "Visited": 0}"#)
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["variables"]["VISITED"], 1);
    assert!(json["text"].as_str().unwrap().contains("should rest"));
}

#[test]
fn test_render_missing_passage_reports_error_not_failure() {
    let output = common::weave()
        .args(["render"])
        .arg(common::story_path())
        .arg("Nowhere")
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["errors"].as_array().unwrap().len(), 1);
}
