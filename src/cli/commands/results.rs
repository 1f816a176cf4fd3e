//! Results command: inspect a persisted results file

use crate::config::{OutputFormat, ResultsArgs};
use crate::store::{ResultRecord, ResultStore};

pub fn run_results(args: ResultsArgs) -> Result<(), String> {
    let store = ResultStore::load(&args.path)
        .map_err(|e| format!("Failed to load results: {e}"))?;

    if store.is_empty() {
        eprintln!("No records in {}", args.path.display());
        return Ok(());
    }

    let mut records: Vec<&ResultRecord> = store.records().iter().collect();
    if let Some(n) = args.best {
        records.sort_by(|a, b| {
            b.auc_score
                .partial_cmp(&a.auc_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        records.truncate(n);
    }

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&records)
                .map_err(|e| format!("JSON serialization failed: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Table => {
            println!(
                "{:<7} {:<6} {:<7} {:<6} {:<10} {:<8} {:<8}",
                "LAYERS", "BIDIR", "HIDDEN", "BATCH", "LR", "DROPOUT", "AUC"
            );
            println!("{}", "-".repeat(58));
            for r in &records {
                println!(
                    "{:<7} {:<6} {:<7} {:<6} {:<10} {:<8} {:<8.4}",
                    r.num_layers,
                    r.bidirectional,
                    r.hidden_size,
                    r.batch_size,
                    r.learning_rate,
                    r.dropout,
                    r.auc_score,
                );
            }
            println!("\n{} record(s)", records.len());
        }
    }

    Ok(())
}
