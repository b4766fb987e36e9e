//! Test the `weave info` subcommand

mod common;

use serde_json::Value;

#[test]
fn test_info_summarizes_story() {
    let output = common::weave()
        .args(["info"])
        .arg(common::story_path())
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["story_title"], "Thornwood Hollow");
    assert!(json["errors"].as_array().unwrap().is_empty());

    let passages = json["passages"].as_array().unwrap();
    assert_eq!(json["passage_count"], passages.len() as u64);

    let woods = passages
        .iter()
        .find(|passage| passage["name"] == "Woods")
        .unwrap();
    assert_eq!(woods["tags"], serde_json::json!(["outdoors"]));
}
