//! Binary entry point. All real logic lives in `weave_cli`; this crate just
//! wires up the process exit code.

fn main() -> anyhow::Result<()> {
    weave_cli::run()
}
