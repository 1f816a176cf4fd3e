//! CLI command implementations

mod campaign;
mod results;
mod sweep;

use crate::cli::LogLevel;
use crate::config::{Cli, Command};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);

    match cli.command {
        Command::Sweep(args) => sweep::run_sweep(args, log_level),
        Command::Campaign(args) => campaign::run_campaign(args, log_level),
        Command::Results(args) => results::run_results(args),
    }
}
