//! Training collaborator: configuration, early stopping, and the default
//! readout trainer
//!
//! The sweep controller only sees the [`ModelTrainer`] trait; [`EsnTrainer`]
//! is the default implementation, fitting a logistic readout on top of a
//! seeded reservoir stack with mini-batch gradient descent, input dropout,
//! and validation-loss early stopping.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::PreparedData;
use crate::model::{sigmoid, EsnClassifier, SequenceScorer};
use crate::search::Combination;

/// Errors from model training
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("training diverged at epoch {epoch} (loss {loss})")]
    Divergence { epoch: usize, loss: f64 },

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("invalid training settings: {0}")]
    InvalidSettings(String),

    #[error("training split is empty")]
    EmptyTrainingData,
}

impl TrainError {
    /// Whether a retry has any chance of succeeding.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, TrainError::ResourceExhausted(_))
    }
}

/// Result alias for training operations
pub type Result<T> = std::result::Result<T, TrainError>;

/// Loss selector. The sweep fixes this to binary cross-entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LossKind {
    /// Binary cross-entropy on the readout probability
    #[default]
    Bce,
}

/// Full configuration handed to the training collaborator for one
/// combination: the swept axes plus the sweep-fixed training knobs.
#[derive(Debug, Clone)]
pub struct TrainSettings {
    pub loss: LossKind,
    pub num_layers: u32,
    pub bidirectional: bool,
    pub hidden_size: u32,
    pub batch_size: u32,
    pub learning_rate: f64,
    pub dropout: f64,
    /// Resolved maximum sequence length of the prepared data
    pub max_seq_len: usize,
    /// Fixed epoch cap
    pub max_epochs: usize,
    /// Fixed early-stopping patience, in epochs
    pub patience: usize,
    /// Collect per-epoch history (off during sweeps)
    pub collect_history: bool,
}

impl TrainSettings {
    /// Settings for one sweep combination with the sweep-fixed knobs.
    #[must_use]
    pub fn for_combination(
        combination: &Combination,
        max_seq_len: usize,
        max_epochs: usize,
        patience: usize,
    ) -> Self {
        Self {
            loss: LossKind::Bce,
            num_layers: combination.num_layers,
            bidirectional: combination.bidirectional,
            hidden_size: combination.hidden_size,
            batch_size: combination.batch_size,
            learning_rate: combination.learning_rate,
            dropout: combination.dropout,
            max_seq_len,
            max_epochs,
            patience,
            collect_history: false,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.num_layers == 0 || self.hidden_size == 0 || self.batch_size == 0 {
            return Err(TrainError::InvalidSettings(
                "layers, hidden size, and batch size must be positive".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(TrainError::InvalidSettings(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(TrainError::InvalidSettings(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }
}

/// Training collaborator: configuration + prepared data → trained artifact.
pub trait ModelTrainer {
    type Artifact: SequenceScorer;

    fn train(&mut self, settings: &TrainSettings, data: &PreparedData) -> Result<Self::Artifact>;
}

/// Validation-loss early stopping.
///
/// Stops after `patience` epochs without improvement of at least
/// `min_delta`.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    min_delta: f64,
    best_loss: f64,
    epochs_without_improvement: usize,
}

impl EarlyStopping {
    #[must_use]
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self {
            patience,
            min_delta,
            best_loss: f64::INFINITY,
            epochs_without_improvement: 0,
        }
    }

    /// Record this epoch's loss; returns true when training should stop.
    pub fn should_stop(&mut self, loss: f64) -> bool {
        if loss < self.best_loss - self.min_delta {
            self.best_loss = loss;
            self.epochs_without_improvement = 0;
        } else {
            self.epochs_without_improvement += 1;
        }
        self.epochs_without_improvement >= self.patience
    }

    #[must_use]
    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }
}

/// Default training collaborator.
///
/// Embeds every case once through the seeded reservoir stack, then runs
/// mini-batch logistic-regression SGD on the readout with per-batch dropout
/// masks. Fully deterministic for a given seed and settings.
#[derive(Debug, Clone)]
pub struct EsnTrainer {
    seed: u64,
    /// Minimum validation-loss improvement that resets patience
    min_delta: f64,
}

impl EsnTrainer {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            min_delta: 1e-4,
        }
    }

    /// Override the minimum validation-loss improvement that resets
    /// early-stopping patience.
    #[must_use]
    pub fn with_min_delta(mut self, min_delta: f64) -> Self {
        self.min_delta = min_delta;
        self
    }

    /// Derive a per-combination seed, so every grid point gets its own
    /// reservoir but reruns of the same point are identical.
    fn combination_seed(&self, settings: &TrainSettings) -> u64 {
        let mut s = self.seed;
        for part in [
            u64::from(settings.num_layers),
            u64::from(settings.bidirectional),
            u64::from(settings.hidden_size),
            u64::from(settings.batch_size),
            settings.learning_rate.to_bits(),
            settings.dropout.to_bits(),
        ] {
            s = s.wrapping_mul(0x100000001b3).wrapping_add(part);
        }
        s
    }

    fn bce(prob: f64, label: f64) -> f64 {
        let p = prob.clamp(1e-12, 1.0 - 1e-12);
        -(label * p.ln() + (1.0 - label) * (1.0 - p).ln())
    }
}

impl ModelTrainer for EsnTrainer {
    type Artifact = EsnClassifier;

    fn train(&mut self, settings: &TrainSettings, data: &PreparedData) -> Result<EsnClassifier> {
        settings.validate()?;
        if data.train.is_empty() {
            return Err(TrainError::EmptyTrainingData);
        }

        let seed = self.combination_seed(settings);
        let mut model = EsnClassifier::new(
            data.feature_dim,
            settings.hidden_size as usize,
            settings.num_layers as usize,
            settings.bidirectional,
            seed,
        );

        // Reservoirs are fixed, so representations can be computed once.
        let train_repr: Vec<Vec<f64>> =
            data.train.features.iter().map(|c| model.embed(c)).collect();
        let val_repr: Vec<Vec<f64>> = data.val.features.iter().map(|c| model.embed(c)).collect();

        let dim = model.repr_dim();
        let mut weights = vec![0.0; dim];
        let mut bias = 0.0;
        let mut best = (weights.clone(), bias);
        let mut rng = StdRng::seed_from_u64(seed ^ 0x9e3779b97f4a7c15);
        let mut stopper = EarlyStopping::new(settings.patience, self.min_delta);
        let batch = settings.batch_size as usize;
        let keep = 1.0 - settings.dropout;

        for epoch in 0..settings.max_epochs {
            for (chunk_repr, chunk_labels) in train_repr
                .chunks(batch)
                .zip(data.train.labels.chunks(batch))
            {
                let mut grad_w = vec![0.0; dim];
                let mut grad_b = 0.0;
                for (repr, &label) in chunk_repr.iter().zip(chunk_labels.iter()) {
                    // Inverted dropout on the readout input.
                    let mut z = bias;
                    let mask: Vec<f64> = repr
                        .iter()
                        .map(|_| {
                            if settings.dropout == 0.0 || rng.random::<f64>() < keep {
                                1.0 / keep
                            } else {
                                0.0
                            }
                        })
                        .collect();
                    for ((w, x), m) in weights.iter().zip(repr.iter()).zip(mask.iter()) {
                        z += w * x * m;
                    }
                    let err = sigmoid(z) - label;
                    for ((g, x), m) in grad_w.iter_mut().zip(repr.iter()).zip(mask.iter()) {
                        *g += err * x * m;
                    }
                    grad_b += err;
                }
                let scale = settings.learning_rate / chunk_repr.len() as f64;
                for (w, g) in weights.iter_mut().zip(grad_w.iter()) {
                    *w -= scale * g;
                }
                bias -= scale * grad_b;
            }

            // Validation loss without dropout.
            let mut val_loss = 0.0;
            for (repr, &label) in val_repr.iter().zip(data.val.labels.iter()) {
                let mut z = bias;
                for (w, x) in weights.iter().zip(repr.iter()) {
                    z += w * x;
                }
                val_loss += Self::bce(sigmoid(z), label);
            }
            if !val_repr.is_empty() {
                val_loss /= val_repr.len() as f64;
            }

            if !val_loss.is_finite() {
                return Err(TrainError::Divergence {
                    epoch,
                    loss: val_loss,
                });
            }

            // Snapshot before the stop check: an epoch that improves by less
            // than min_delta can be the one that exhausts patience, and its
            // weights still win.
            if val_loss < stopper.best_loss() {
                best = (weights.clone(), bias);
            }
            if stopper.should_stop(val_loss) {
                break;
            }
        }

        model.set_readout(best.0, best.1);
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PreparedSplit;

    fn toy_data(n_train: usize, n_val: usize) -> PreparedData {
        // Separable toy task: positive cases carry large feature values.
        let make = |n: usize| {
            let mut split = PreparedSplit::default();
            for i in 0..n {
                let label = (i % 2) as f64;
                let fill = if label > 0.5 { 0.9 } else { -0.9 };
                split.features.push(vec![vec![fill, fill * 0.5]; 4]);
                split.seq_len.push(4);
                split.labels.push(label);
                split.sensitive.push(0.0);
            }
            split
        };
        PreparedData {
            train: make(n_train),
            val: make(n_val),
            vocab_sizes: vec![],
            num_numeric: 2,
            feature_dim: 2,
            max_prefix_len: 4,
        }
    }

    fn settings() -> TrainSettings {
        TrainSettings {
            loss: LossKind::Bce,
            num_layers: 1,
            bidirectional: false,
            hidden_size: 8,
            batch_size: 8,
            learning_rate: 0.5,
            dropout: 0.0,
            max_seq_len: 4,
            max_epochs: 60,
            patience: 10,
            collect_history: false,
        }
    }

    #[test]
    fn test_learns_separable_task() {
        let data = toy_data(32, 8);
        let model = EsnTrainer::new(42).train(&settings(), &data).expect("train");
        let scores = model.scores(&data.val);
        for (score, &label) in scores.iter().zip(&data.val.labels) {
            if label > 0.5 {
                assert!(*score > 0.5, "positive case scored {score}");
            } else {
                assert!(*score < 0.5, "negative case scored {score}");
            }
        }
    }

    #[test]
    fn test_training_is_deterministic() {
        let data = toy_data(16, 4);
        let a = EsnTrainer::new(7).train(&settings(), &data).expect("train");
        let b = EsnTrainer::new(7).train(&settings(), &data).expect("train");
        assert_eq!(a.scores(&data.val), b.scores(&data.val));
    }

    #[test]
    fn test_empty_training_data_fails() {
        let mut data = toy_data(4, 2);
        data.train = PreparedSplit::default();
        let err = EsnTrainer::new(1).train(&settings(), &data).expect_err("fail");
        assert!(matches!(err, TrainError::EmptyTrainingData));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let data = toy_data(4, 2);
        let mut bad = settings();
        bad.dropout = 1.0;
        let err = EsnTrainer::new(1).train(&bad, &data).expect_err("fail");
        assert!(matches!(err, TrainError::InvalidSettings(_)));

        let mut bad = settings();
        bad.hidden_size = 0;
        assert!(EsnTrainer::new(1).train(&bad, &data).is_err());
    }

    #[test]
    fn test_dropout_training_still_converges() {
        let data = toy_data(32, 8);
        let mut with_dropout = settings();
        with_dropout.dropout = 0.2;
        let model = EsnTrainer::new(42).train(&with_dropout, &data).expect("train");
        let scores = model.scores(&data.val);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_patience_exhausting_epoch_keeps_its_weights() {
        let data = toy_data(32, 8);

        // Baseline: exactly one epoch of readout SGD.
        let mut one_epoch = settings();
        one_epoch.max_epochs = 1;
        one_epoch.patience = 50;
        let baseline = EsnTrainer::new(42).train(&one_epoch, &data).expect("train");

        // A huge min_delta means the second epoch exhausts patience even
        // though its loss still improves; its weights must be the ones
        // returned, not the first epoch's.
        let mut stopped_early = settings();
        stopped_early.max_epochs = 10;
        stopped_early.patience = 1;
        let model = EsnTrainer::new(42)
            .with_min_delta(1e9)
            .train(&stopped_early, &data)
            .expect("train");

        assert_ne!(baseline.scores(&data.val), model.scores(&data.val));
    }

    #[test]
    fn test_early_stopping_counts_patience() {
        let mut es = EarlyStopping::new(3, 0.001);
        assert!(!es.should_stop(1.0));
        assert!(!es.should_stop(0.5)); // improvement resets
        assert!(!es.should_stop(0.5));
        assert!(!es.should_stop(0.5));
        assert!(es.should_stop(0.5)); // third epoch without improvement
    }

    #[test]
    fn test_transient_classification() {
        assert!(TrainError::ResourceExhausted("oom".to_string()).is_transient());
        assert!(!TrainError::Divergence { epoch: 3, loss: f64::NAN }.is_transient());
        assert!(!TrainError::EmptyTrainingData.is_transient());
    }

    #[test]
    fn test_settings_for_combination_fixes_loss_and_history() {
        let c = Combination {
            num_layers: 2,
            bidirectional: true,
            hidden_size: 32,
            batch_size: 256,
            learning_rate: 0.001,
            dropout: 0.4,
        };
        let s = TrainSettings::for_combination(&c, 6, 300, 20);
        assert_eq!(s.loss, LossKind::Bce);
        assert!(!s.collect_history);
        assert_eq!(s.max_epochs, 300);
        assert_eq!(s.patience, 20);
        assert_eq!(s.hidden_size, 32);
    }
}
