//! CLI configuration types

mod cli;

pub use cli::{CampaignArgs, Cli, Command, OutputFormat, ResultsArgs, SweepArgs};
