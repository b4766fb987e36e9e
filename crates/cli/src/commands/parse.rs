use crate::{GlobalArgs, Subcommand, util};
use clap::Parser;
use std::path::PathBuf;

/// Parse a story document and print its structural representation as JSON
#[derive(Clone, Debug, Parser)]
pub struct ParseCommand {
    /// Path to the story's DSL source file
    file: PathBuf,
}

impl Subcommand for ParseCommand {
    fn execute(self, global: &GlobalArgs) -> anyhow::Result<()> {
        let source = util::read_source(&self.file)?;
        let config = global.story_config()?;
        let result = weave_core::parse(&source, &config);
        util::print_json(&result)
    }
}
