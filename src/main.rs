//! Barrido CLI
//!
//! Resumable hyperparameter sweep entry point.
//!
//! # Usage
//!
//! ```bash
//! # Sweep one encoded event log
//! barrido sweep datasets/lending_log_high.json --log-type lending --addendum high
//!
//! # Run the full nine-dataset campaign
//! barrido campaign --datasets-dir datasets --results-dir results
//!
//! # Inspect a results file
//! barrido results results/lending_high_hyperparameter_tuning_results.csv --best 5
//! ```

use barrido::cli::run_command;
use barrido::config::Cli;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
