//! Sweep controller: the resumable orchestration core
//!
//! One invocation prepares data once, filters the grid against the result
//! store's completed set, then trains and evaluates each pending combination
//! strictly sequentially, appending and durably flushing the store after
//! every single one. Recovery from interruption is restart-and-resume; there
//! is no catch-and-continue across combinations.

use std::path::PathBuf;

use crate::data::{LogPreparer, PrepError, PrepRequest, PreparedData};
use crate::eval::{evaluate, Device, EvalError};
use crate::search::{Combination, SweepGrid};
use crate::store::{ResultRecord, ResultStore, StoreError};
use crate::train::{ModelTrainer, TrainError, TrainSettings};

/// Errors that halt a sweep
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("data preparation failed: {0}")]
    Prep(#[from] PrepError),

    #[error("result store failure: {0}")]
    Store(#[from] StoreError),

    #[error("training failed: {0}")]
    Train(#[from] TrainError),

    #[error("evaluation failed: {0}")]
    Eval(#[from] EvalError),
}

/// Result alias for sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Identity of one sweep: which dataset, and which results file.
#[derive(Debug, Clone)]
pub struct SweepIdentity {
    /// Path to the encoded dataset file
    pub dataset: PathBuf,
    /// Log type (selects preprocessing, names the results file)
    pub log_type: String,
    /// Run identifier appended to the results file name
    pub addendum: String,
}

/// Full sweep configuration: identity, grid, and the fixed training knobs.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub identity: SweepIdentity,
    pub grid: SweepGrid,
    /// Requested maximum prefix length (resolution is data-driven)
    pub max_prefix_len: usize,
    /// Directory holding result stores
    pub results_dir: PathBuf,
    /// Epoch cap for every combination
    pub max_epochs: usize,
    /// Early-stopping patience for every combination
    pub patience: usize,
    /// Compute device for evaluation
    pub device: Device,
    /// Attempts per combination before a transient training failure halts
    /// the sweep
    pub max_train_attempts: usize,
}

impl SweepConfig {
    /// Sweep over the default grid with the original study's fixed knobs.
    #[must_use]
    pub fn new(identity: SweepIdentity, max_prefix_len: usize, results_dir: PathBuf) -> Self {
        Self {
            identity,
            grid: SweepGrid::default(),
            max_prefix_len,
            results_dir,
            // Patience is kept low relative to the epoch cap; the sweep only
            // ranks setups, it does not produce the final model.
            max_epochs: 300,
            patience: 20,
            device: Device::Cpu,
            max_train_attempts: 2,
        }
    }

    /// Path of this sweep's result store.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        ResultStore::conventional_path(
            &self.results_dir,
            &self.identity.log_type,
            &self.identity.addendum,
        )
    }

    fn prep_request(&self) -> PrepRequest {
        PrepRequest {
            dataset: self.identity.dataset.clone(),
            log_type: self.identity.log_type.clone(),
            max_prefix_len: self.max_prefix_len,
            drop_sensitive: false,
            sensitive_column: "case:gender".to_string(),
        }
    }
}

/// Progress callback: (finished index, pending total, combination, AUC).
pub type ProgressFn<'a> = dyn FnMut(usize, usize, &Combination, f64) + 'a;

/// The sweep controller.
///
/// Generic over the training and preprocessing collaborators; evaluation is
/// fixed to validation AUC. Owns the result store exclusively for the
/// duration of one [`run`](SweepRunner::run).
pub struct SweepRunner<'a, T, P> {
    trainer: T,
    preparer: P,
    config: SweepConfig,
    progress: Option<Box<ProgressFn<'a>>>,
}

impl<'a, T, P> SweepRunner<'a, T, P>
where
    T: ModelTrainer,
    P: LogPreparer,
{
    pub fn new(trainer: T, preparer: P, config: SweepConfig) -> Self {
        Self {
            trainer,
            preparer,
            config,
            progress: None,
        }
    }

    /// Install a per-combination progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: impl FnMut(usize, usize, &Combination, f64) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    #[must_use]
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Run the sweep to completion, returning every record in the store
    /// (pre-existing then newly computed, in enumeration order).
    pub fn run(&mut self) -> Result<Vec<ResultRecord>> {
        // Init: prepared data is loaded exactly once per invocation.
        let data = self.preparer.prepare(&self.config.prep_request())?;

        // Resume filter: exact set difference on canonical resume keys,
        // preserving enumeration order.
        let mut store = ResultStore::load(self.config.store_path())?;
        let completed = store.completed_keys();
        let pending: Vec<Combination> = self
            .config
            .grid
            .combinations()
            .filter(|c| !completed.contains(&c.resume_key()))
            .collect();
        let total = pending.len();

        for (index, combination) in pending.into_iter().enumerate() {
            let settings = TrainSettings::for_combination(
                &combination,
                data.max_prefix_len,
                self.config.max_epochs,
                self.config.patience,
            );
            let artifact = self.train_with_retry(&settings, &data)?;
            let auc = evaluate(&artifact, &data.val, self.config.device)?;

            // Flush after every combination; a crash loses at most the
            // in-flight one.
            store.append_and_flush(ResultRecord::new(&combination, auc))?;

            if let Some(progress) = self.progress.as_mut() {
                progress(index + 1, total, &combination, auc);
            }
        }

        // Redundant with the last per-combination flush, but covers the
        // empty-pending case.
        store.flush()?;
        Ok(store.into_records())
    }

    /// Bounded retry around the training call.
    ///
    /// Only transient failures are retried; anything else, or exhaustion of
    /// the attempt budget, halts the sweep.
    fn train_with_retry(
        &mut self,
        settings: &TrainSettings,
        data: &PreparedData,
    ) -> std::result::Result<T::Artifact, TrainError> {
        let attempts = self.config.max_train_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.trainer.train(settings, data) {
                Ok(artifact) => return Ok(artifact),
                Err(e) if e.is_transient() && attempt < attempts => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }
}
