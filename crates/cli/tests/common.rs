#![allow(unused)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};

/// Get a command to run `weave`, pointed at the bundled fixture story.
pub fn weave() -> Command {
    Command::cargo_bin("weave_cli").unwrap()
}

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn story_path() -> PathBuf {
    fixture("story.weave")
}
