//! joblock: operational CLI for job locks.
//!
//! This is the main entry point for the `joblock` CLI. It parses arguments,
//! dispatches to the appropriate command handler, and handles errors with
//! proper exit codes.

mod cli;
mod commands;

use cli::Cli;
use joblock::exit_codes;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(e) = joblock::observability::init(cli.verbose) {
        eprintln!("Warning: diagnostic logging unavailable: {}", e);
    }

    let stdout = std::io::stdout();
    match commands::dispatch(cli, &mut stdout.lock()) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
