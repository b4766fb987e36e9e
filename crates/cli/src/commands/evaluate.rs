use crate::{GlobalArgs, Subcommand, util};
use clap::Parser;
use serde::Serialize;
use weave_core::Diagnostic;
use weave_template::Value;

/// Evaluate a standalone expression against an optional variable mapping
/// read from stdin, and print the result as JSON
#[derive(Clone, Debug, Parser)]
pub struct EvaluateCommand {
    /// The expression source text
    expr: String,
}

#[derive(Serialize)]
struct EvaluateOutput {
    value: Value,
    errors: Vec<Diagnostic>,
}

impl Subcommand for EvaluateCommand {
    fn execute(self, global: &GlobalArgs) -> anyhow::Result<()> {
        let config = global.story_config()?;
        let variables = util::read_variables(&config)?;
        let (value, errors) = weave_core::evaluate_expression(&self.expr, &variables, &config);
        util::print_json(&EvaluateOutput { value, errors })
    }
}
