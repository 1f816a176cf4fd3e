//! Sweep command implementation

use crate::cli::logging::{log, LogLevel};
use crate::config::SweepArgs;
use crate::data::EncodedLogPreparer;
use crate::store::ResultRecord;
use crate::sweep::{SweepConfig, SweepIdentity, SweepRunner};
use crate::train::EsnTrainer;

pub fn run_sweep(args: SweepArgs, log_level: LogLevel) -> Result<(), String> {
    let identity = SweepIdentity {
        dataset: args.dataset,
        log_type: args.log_type,
        addendum: args.addendum,
    };
    let mut config = SweepConfig::new(identity, args.max_prefix_len, args.results_dir);
    config.max_epochs = args.max_epochs;
    config.patience = args.patience;
    config.device = args.device;
    config.max_train_attempts = args.train_attempts;

    log(
        log_level,
        LogLevel::Normal,
        &format!(
            "Sweeping {} combinations for {}/{} -> {}",
            config.grid.len(),
            config.identity.log_type,
            config.identity.addendum,
            config.store_path().display()
        ),
    );

    let mut runner = SweepRunner::new(EsnTrainer::new(args.seed), EncodedLogPreparer, config)
        .with_progress(|done, total, combination, auc| {
            log(
                log_level,
                LogLevel::Normal,
                &format!("[{done}/{total}] {combination}: AUC {auc:.4}"),
            );
        });

    let records = runner
        .run()
        .map_err(|e| format!("Sweep failed: {e}"))?;

    log(
        log_level,
        LogLevel::Normal,
        &format!("Sweep complete: {} recorded combinations", records.len()),
    );
    if let Some(best) = best_record(&records) {
        log(
            log_level,
            LogLevel::Normal,
            &format!("Best: {} (AUC {:.4})", best.combination(), best.auc_score),
        );
    }
    Ok(())
}

/// Highest-AUC record, ties broken by store order.
fn best_record(records: &[ResultRecord]) -> Option<&ResultRecord> {
    records.iter().reduce(|best, r| {
        if r.auc_score > best.auc_score {
            r
        } else {
            best
        }
    })
}
