/// Cadence CLI
///
/// Runs, evaluates and parses Cadence scripts from the command line.

fn main() -> anyhow::Result<()> {
    cadence_core::cli::run_cli()
}
