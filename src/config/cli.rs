//! CLI types - Cli, Command, and per-command argument structs

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::eval::Device;

/// Barrido: resumable hyperparameter grid sweeps
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "barrido")]
#[command(version)]
#[command(
    about = "Exhaustive, resumable hyperparameter sweeps for sequential event-log classifiers"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run one sweep over an encoded event log
    Sweep(SweepArgs),

    /// Run the full nine-dataset tuning campaign
    Campaign(CampaignArgs),

    /// Inspect a persisted results file
    Results(ResultsArgs),
}

/// Arguments for the sweep command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct SweepArgs {
    /// Path to the encoded dataset file
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// Log type (selects preprocessing, names the results file)
    #[arg(short, long)]
    pub log_type: String,

    /// Run identifier appended to the results file name
    #[arg(short, long)]
    pub addendum: String,

    /// Maximum prefix length to train on
    #[arg(short, long, default_value_t = 6)]
    pub max_prefix_len: usize,

    /// Directory holding result stores
    #[arg(short, long, default_value = "results")]
    pub results_dir: PathBuf,

    /// Epoch cap per combination
    #[arg(long, default_value_t = 300)]
    pub max_epochs: usize,

    /// Early-stopping patience per combination
    #[arg(long, default_value_t = 20)]
    pub patience: usize,

    /// Compute device for evaluation
    #[arg(long, value_enum, default_value_t = Device::Cpu)]
    pub device: Device,

    /// Attempts per combination before a transient failure halts the sweep
    #[arg(long, default_value_t = 2)]
    pub train_attempts: usize,

    /// Base seed for reservoir initialization
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Arguments for the campaign command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct CampaignArgs {
    /// Directory containing the encoded campaign datasets
    #[arg(short, long, default_value = "datasets")]
    pub datasets_dir: PathBuf,

    /// Directory holding result stores
    #[arg(short, long, default_value = "results")]
    pub results_dir: PathBuf,

    /// Compute device for evaluation
    #[arg(long, value_enum, default_value_t = Device::Cpu)]
    pub device: Device,

    /// Base seed for reservoir initialization
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Arguments for the results command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ResultsArgs {
    /// Path to a persisted results file
    #[arg(value_name = "RESULTS")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Show only the best-scoring records, sorted by AUC
    #[arg(long)]
    pub best: Option<usize>,
}

/// Output format for the results command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON array of records
    Json,
}
