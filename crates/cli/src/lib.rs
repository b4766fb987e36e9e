#![forbid(unsafe_code)]
#![deny(clippy::all)]

//! Command line interface for weave.
//!
//! **This crate is not semver compliant**. The version is locked to the
//! root `weave` crate version. If you choose to depend directly on this
//! crate, you do so at your own risk of breakage.

mod commands;
mod util;

use crate::commands::{
    evaluate::EvaluateCommand, info::InfoCommand, parse::ParseCommand,
    render::RenderCommand,
};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{filter::EnvFilter, prelude::*};
use weave_core::{ScopeMode, StoryConfig};
use weave_util::{Entropy, SeededEntropy, ThreadEntropy};

const COMMAND_NAME: &str = "weave";

/// Parser, evaluator and renderer for weave story documents.
///
/// https://github.com/weave-fiction/weave
#[derive(Debug, Parser)]
#[clap(author, version, about, name = COMMAND_NAME)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub subcommand: CliCommand,
}

/// Arguments available to every subcommand
#[derive(Clone, Debug, Parser)]
pub struct GlobalArgs {
    /// Variable scope adapter (§4.7): `global`, or `prefixed:USERNAME`
    #[clap(long, default_value = "global", global = true)]
    pub scope: String,
    /// Seed the `either()`/`random()` entropy source for reproducible runs.
    /// Omit for process entropy.
    #[clap(long, global = true)]
    pub seed: Option<u64>,
    /// Raise the tracing log level (stacks: `-v`, `-vv`)
    #[clap(long, short, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl GlobalArgs {
    /// Build the `StoryConfig` this invocation's flags describe.
    pub fn story_config(&self) -> anyhow::Result<StoryConfig> {
        let scope_mode = parse_scope(&self.scope)?;
        let entropy: Arc<dyn Entropy> = match self.seed {
            Some(seed) => Arc::new(SeededEntropy::new(seed)),
            None => Arc::new(ThreadEntropy),
        };
        Ok(StoryConfig::new(scope_mode, entropy))
    }

    /// The tracing level this invocation's `-v` flags select, absent an
    /// explicit `RUST_LOG` override.
    fn default_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Parse the `--scope` flag into a [ScopeMode]: either `global` or
/// `prefixed:USERNAME`.
fn parse_scope(raw: &str) -> anyhow::Result<ScopeMode> {
    if raw.eq_ignore_ascii_case("global") {
        return Ok(ScopeMode::Global);
    }
    if let Some(username) = raw.strip_prefix("prefixed:") {
        if username.is_empty() {
            anyhow::bail!("`--scope prefixed:USERNAME` requires a non-empty username");
        }
        return Ok(ScopeMode::Prefixed {
            username: username.to_owned(),
        });
    }
    anyhow::bail!("invalid `--scope` value `{raw}`; expected `global` or `prefixed:USERNAME`")
}

/// A CLI subcommand (§6's CLI surface: `parse`, `render`, `evaluate`,
/// `info`).
#[derive(Clone, Debug, clap::Subcommand)]
pub enum CliCommand {
    Parse(ParseCommand),
    Render(RenderCommand),
    Evaluate(EvaluateCommand),
    Info(InfoCommand),
}

impl CliCommand {
    fn execute(self, global: &GlobalArgs) -> anyhow::Result<()> {
        match self {
            Self::Parse(command) => command.execute(global),
            Self::Render(command) => command.execute(global),
            Self::Evaluate(command) => command.execute(global),
            Self::Info(command) => command.execute(global),
        }
    }
}

/// An executable subcommand. Static dispatch happens via [CliCommand], but
/// the trait keeps every subcommand's interface consistent.
trait Subcommand {
    fn execute(self, global: &GlobalArgs) -> anyhow::Result<()>;
}

/// Parse CLI arguments, initialize tracing, and dispatch to the selected
/// subcommand. This is the process's sole entry point; `main.rs` just
/// forwards the exit code.
///
/// ## Errors
///
/// Returns an error only on I/O failure or invalid invocation (§6): a
/// document's own recoverable parse/render errors are surfaced in the
/// emitted JSON's `errors` array instead, with the process still exiting
/// successfully.
pub fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    initialize_tracing(&args.global);
    args.subcommand.execute(&args.global)
}

fn initialize_tracing(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(global.default_log_level()));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scope_global() {
        assert!(matches!(parse_scope("global").unwrap(), ScopeMode::Global));
        assert!(matches!(parse_scope("GLOBAL").unwrap(), ScopeMode::Global));
    }

    #[test]
    fn test_parse_scope_prefixed() {
        let mode = parse_scope("prefixed:lucas").unwrap();
        assert!(matches!(mode, ScopeMode::Prefixed { username } if username == "lucas"));
    }

    #[test]
    fn test_parse_scope_rejects_unknown() {
        assert!(parse_scope("bogus").is_err());
        assert!(parse_scope("prefixed:").is_err());
    }
}
