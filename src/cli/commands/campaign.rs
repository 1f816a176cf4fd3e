//! Campaign command: the full nine-dataset tuning run

use crate::cli::logging::{log, LogLevel};
use crate::config::{CampaignArgs, SweepArgs};

/// Log types crossed with label severities, swept at a fixed prefix length.
const LOG_TYPES: [&str; 3] = ["lending", "hiring", "renting"];
const SEVERITIES: [&str; 3] = ["high", "medium", "low"];
const CAMPAIGN_PREFIX_LEN: usize = 6;

pub fn run_campaign(args: CampaignArgs, log_level: LogLevel) -> Result<(), String> {
    for log_type in LOG_TYPES {
        for severity in SEVERITIES {
            let dataset = args
                .datasets_dir
                .join(format!("{log_type}_log_{severity}.json"));
            log(
                log_level,
                LogLevel::Normal,
                &format!("Campaign sweep: {log_type}/{severity}"),
            );
            super::sweep::run_sweep(
                SweepArgs {
                    dataset,
                    log_type: log_type.to_string(),
                    addendum: severity.to_string(),
                    max_prefix_len: CAMPAIGN_PREFIX_LEN,
                    results_dir: args.results_dir.clone(),
                    max_epochs: 300,
                    patience: 20,
                    device: args.device,
                    train_attempts: 2,
                    seed: args.seed,
                },
                log_level,
            )?;
        }
    }
    Ok(())
}
