//! Shared helpers for the subcommands: reading a document off disk and
//! reading the initial variable mapping off stdin, per §6's CLI surface
//! ("Variables arrive on standard input as a JSON mapping").

use anyhow::Context;
use indexmap::IndexMap;
use std::{
    io::{self, IsTerminal, Read},
    path::Path,
};
use weave_core::{ScopeAdapter, StoryConfig, VariableStore};
use weave_template::Value;

/// Read a document's full source off disk.
pub fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("error reading story file `{}`", path.display()))
}

/// Read the initial variable mapping off stdin as JSON (`{"NAME": value,
/// ...}`), translating each bare name to its canonical store key via the
/// scope adapter implied by `config`. An empty or absent stdin (e.g. a
/// terminal with nothing piped in) yields an empty store rather than an
/// error, since most invocations don't need to seed any variables.
pub fn read_variables(config: &StoryConfig) -> anyhow::Result<VariableStore> {
    let mut input = String::new();
    if !io::stdin().is_terminal() {
        io::stdin()
            .read_to_string(&mut input)
            .context("error reading variables from stdin")?;
    }
    if input.trim().is_empty() {
        return Ok(VariableStore::new());
    }

    let raw: IndexMap<String, Value> =
        serde_json::from_str(&input).context("error parsing variables JSON from stdin")?;
    let scope = ScopeAdapter::new(config.scope_mode.clone());
    let mut store = VariableStore::new();
    for (name, value) in raw {
        store.insert(scope.key_for(&name), value);
    }
    Ok(store)
}

/// Serialize `value` as pretty JSON to stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("error serializing result to JSON")?;
    println!("{json}");
    Ok(())
}
