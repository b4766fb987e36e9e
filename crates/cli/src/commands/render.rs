use crate::{GlobalArgs, Subcommand, util};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use weave_core::{ExecutionMode, RenderResult, VariableStore};

/// Render a single passage and print the result as JSON
#[derive(Clone, Debug, Parser)]
pub struct RenderCommand {
    /// Path to the story's DSL source file
    file: PathBuf,
    /// Name of the passage to render
    passage: String,
}

/// The render result plus the variable store's final state, which the
/// spec's `RenderResult` doesn't carry in full (only the deltas written
/// during this call) but which a CLI caller scripting multiple renders
/// will usually want.
#[derive(Serialize)]
struct RenderOutput<'a> {
    #[serde(flatten)]
    result: &'a RenderResult,
    variables: &'a VariableStore,
}

impl Subcommand for RenderCommand {
    fn execute(self, global: &GlobalArgs) -> anyhow::Result<()> {
        let source = util::read_source(&self.file)?;
        let config = global.story_config()?;
        let parsed = weave_core::parse(&source, &config);
        let mut variables = util::read_variables(&config)?;

        let result = weave_core::render(
            &self.passage,
            &mut variables,
            &parsed.passages,
            &config,
            ExecutionMode::Runtime,
        );
        util::print_json(&RenderOutput {
            result: &result,
            variables: &variables,
        })
    }
}
