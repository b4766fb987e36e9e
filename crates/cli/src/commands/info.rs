use crate::{GlobalArgs, Subcommand, util};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use weave_core::Diagnostic;

/// Print a summary of a story document: passage names and tags, the story
/// title (if any), and any parse diagnostics
#[derive(Clone, Debug, Parser)]
pub struct InfoCommand {
    /// Path to the story's DSL source file
    file: PathBuf,
}

#[derive(Serialize)]
struct PassageSummary {
    name: String,
    tags: Vec<String>,
}

#[derive(Serialize)]
struct InfoOutput {
    story_title: Option<String>,
    passage_count: usize,
    passages: Vec<PassageSummary>,
    errors: Vec<Diagnostic>,
}

impl Subcommand for InfoCommand {
    fn execute(self, global: &GlobalArgs) -> anyhow::Result<()> {
        let source = util::read_source(&self.file)?;
        let config = global.story_config()?;
        let result = weave_core::parse(&source, &config);

        let passages = result
            .passages
            .values()
            .map(|passage| PassageSummary {
                name: passage.name.clone(),
                tags: passage.tags.clone(),
            })
            .collect::<Vec<_>>();

        util::print_json(&InfoOutput {
            story_title: result.story_title,
            passage_count: result.passages.len(),
            passages,
            errors: result.errors,
        })
    }
}
