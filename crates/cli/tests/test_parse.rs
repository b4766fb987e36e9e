//! Test the `weave parse` subcommand

mod common;

use serde_json::Value;

#[test]
fn test_parse_reports_passages_and_title() {
    let output = common::weave()
        .args(["parse"])
        .arg(common::story_path())
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["story_title"], "Thornwood Hollow");
    assert!(json["errors"].as_array().unwrap().is_empty());

    let passages = json["passages"].as_object().unwrap();
    assert!(passages.contains_key("Start"));
    assert!(passages.contains_key("Woods"));
    assert!(passages.contains_key("StoryInit"));

    assert_eq!(passages["Woods"]["tags"], serde_json::json!(["outdoors"]));
    assert_eq!(json["story_init_vars"]["HEALTH"], 10);
    assert_eq!(json["story_init_vars"]["VISITED"], 0);
}

#[test]
fn test_parse_missing_file_fails() {
    common::weave()
        .args(["parse", "/no/such/file.weave"])
        .assert()
        .failure();
}
