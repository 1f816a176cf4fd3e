//! Durable result store for sweep records
//!
//! One CSV file per (log type, addendum) sweep identity. The column set is
//! the resume contract and must round-trip exactly; rows are append-only
//! across sweep invocations and every flush rewrites the file through a
//! temp-file-plus-rename so a reader never observes a partial file.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::search::Combination;

/// Column order and names of the persisted file. Changing these breaks
/// resume against previously written stores.
pub const RESULT_COLUMNS: [&str; 7] = [
    "num_layers",
    "bidirectional",
    "lstm_size",
    "batch_size",
    "learning_rate",
    "dropout",
    "auc_score",
];

/// Errors from result store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed results file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("failed to persist results file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Result alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// One completed combination and its validation metric.
///
/// Immutable once written; the store never updates a record in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub num_layers: u32,
    pub bidirectional: bool,
    #[serde(rename = "lstm_size")]
    pub hidden_size: u32,
    pub batch_size: u32,
    pub learning_rate: f64,
    pub dropout: f64,
    pub auc_score: f64,
}

impl ResultRecord {
    /// Build a record from a combination and its validation AUC.
    #[must_use]
    pub fn new(combination: &Combination, auc_score: f64) -> Self {
        Self {
            num_layers: combination.num_layers,
            bidirectional: combination.bidirectional,
            hidden_size: combination.hidden_size,
            batch_size: combination.batch_size,
            learning_rate: combination.learning_rate,
            dropout: combination.dropout,
            auc_score,
        }
    }

    /// The hyperparameter tuple this record belongs to.
    #[must_use]
    pub fn combination(&self) -> Combination {
        Combination {
            num_layers: self.num_layers,
            bidirectional: self.bidirectional,
            hidden_size: self.hidden_size,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            dropout: self.dropout,
        }
    }
}

/// Ordered, durably backed collection of [`ResultRecord`]s.
///
/// Loaded (or initialized empty) at sweep start, appended to and flushed
/// after every combination. Owned exclusively by one sweep invocation; no
/// external writer may touch the file concurrently.
#[derive(Debug)]
pub struct ResultStore {
    path: PathBuf,
    records: Vec<ResultRecord>,
}

impl ResultStore {
    /// Conventional store path for a sweep identity.
    #[must_use]
    pub fn conventional_path(results_dir: &Path, log_type: &str, addendum: &str) -> PathBuf {
        results_dir.join(format!(
            "{log_type}_{addendum}_hyperparameter_tuning_results.csv"
        ))
    }

    /// Load the store at `path`, or initialize an empty one if no file
    /// exists yet. A missing file is the normal first-run case and never an
    /// error; an existing file with unexpected columns or malformed rows is.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                records: Vec::new(),
            });
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let headers = reader.headers()?.clone();
        if headers.iter().ne(RESULT_COLUMNS) {
            return Err(StoreError::Parse {
                path,
                reason: format!(
                    "expected columns {:?}, found {:?}",
                    RESULT_COLUMNS,
                    headers.iter().collect::<Vec<_>>()
                ),
            });
        }

        let mut records = Vec::new();
        for row in reader.deserialize() {
            let record: ResultRecord = row?;
            records.push(record);
        }
        Ok(Self { path, records })
    }

    /// Resume keys of every combination already recorded, ignoring metrics.
    #[must_use]
    pub fn completed_keys(&self) -> HashSet<String> {
        self.records
            .iter()
            .map(|r| r.combination().resume_key())
            .collect()
    }

    /// Append one record and durably rewrite the whole file.
    ///
    /// Called once after every combination. Existing records keep their
    /// relative order; the new record lands strictly after them.
    pub fn append_and_flush(&mut self, record: ResultRecord) -> Result<()> {
        self.records.push(record);
        self.flush()
    }

    /// Durably write the accumulated record list.
    ///
    /// Serializes everything into memory, writes a temp file in the target
    /// directory, fsyncs it, then renames it over the store path.
    pub fn flush(&self) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.records.is_empty() {
            // serde only emits headers alongside the first row; an empty
            // store still needs the column contract on disk.
            writer.write_record(RESULT_COLUMNS)?;
        }
        for record in &self.records {
            writer.serialize(record)?;
        }
        let buf = writer
            .into_inner()
            .map_err(|e| StoreError::Io(e.into_error()))?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&buf)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        Ok(())
    }

    /// All records, existing-then-new order.
    #[must_use]
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    /// Consume the store, returning its records.
    #[must_use]
    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
