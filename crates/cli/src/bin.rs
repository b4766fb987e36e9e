//! Test-only binary. `assert_cmd::Command::cargo_bin` only resolves
//! binaries that belong to the crate under test, so integration tests in
//! `tests/` need a real `[[bin]]` target here rather than depending on the
//! workspace root's `weave` binary.

fn main() -> std::process::ExitCode {
    weave_cli::run().map_or_else(
        |error| {
            eprintln!("{error}");
            error
                .chain()
                .skip(1)
                .for_each(|cause| eprintln!("  {cause}"));
            std::process::ExitCode::FAILURE
        },
        |()| std::process::ExitCode::SUCCESS,
    )
}
