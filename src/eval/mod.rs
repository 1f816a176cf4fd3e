//! Evaluation collaborator: validation AUC for a trained artifact
//!
//! One forward pass over the validation split on an explicitly configured
//! device, then area under the ROC curve between flattened ground truth and
//! predictions. The metric is undefined when the labels are degenerate.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::data::PreparedSplit;
use crate::model::SequenceScorer;

/// Errors from metric evaluation
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("AUC undefined: validation labels contain fewer than two classes")]
    DegenerateLabels,

    #[error("labels ({labels}) and scores ({scores}) differ in length")]
    LengthMismatch { labels: usize, scores: usize },

    #[error("no {0} backend compiled into this build")]
    DeviceUnavailable(Device),
}

/// Result alias for evaluation operations
pub type Result<T> = std::result::Result<T, EvalError>;

/// Compute device for the forward pass.
///
/// Explicit configuration rather than a global availability probe, so the
/// device a sweep runs on is decided once, up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    /// GPU/NPU offload; requires an accelerator backend in the build
    Accelerator,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Accelerator => write!(f, "accelerator"),
        }
    }
}

/// Area under the ROC curve via the rank statistic, with average ranks for
/// tied scores.
///
/// # Errors
///
/// [`EvalError::DegenerateLabels`] when labels contain fewer than two
/// classes; [`EvalError::LengthMismatch`] when inputs differ in length.
pub fn roc_auc(labels: &[f64], scores: &[f64]) -> Result<f64> {
    if labels.len() != scores.len() {
        return Err(EvalError::LengthMismatch {
            labels: labels.len(),
            scores: scores.len(),
        });
    }

    let n_pos = labels.iter().filter(|&&y| y > 0.5).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(EvalError::DegenerateLabels);
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Sum of positive-class ranks, averaging ranks within tied score runs.
    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if labels[idx] > 0.5 {
                rank_sum += avg_rank;
            }
        }
        i = j + 1;
    }

    let auc = (rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0) / (n_pos * n_neg) as f64;
    Ok(auc)
}

/// Evaluate a trained artifact on the validation split.
///
/// Runs the artifact's forward pass on `device` and returns the AUC between
/// the split's labels and the predicted probabilities.
pub fn evaluate<A: SequenceScorer>(
    artifact: &A,
    val: &PreparedSplit,
    device: Device,
) -> Result<f64> {
    if device != Device::Cpu {
        return Err(EvalError::DeviceUnavailable(device));
    }
    let scores = artifact.scores(val);
    roc_auc(&val.labels, &scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct FixedScorer(Vec<f64>);

    impl SequenceScorer for FixedScorer {
        fn scores(&self, _split: &PreparedSplit) -> Vec<f64> {
            self.0.clone()
        }
    }

    fn split(labels: Vec<f64>) -> PreparedSplit {
        let n = labels.len();
        PreparedSplit {
            features: vec![vec![vec![0.0]]; n],
            seq_len: vec![1; n],
            labels,
            sensitive: vec![0.0; n],
        }
    }

    #[test]
    fn test_perfect_ranking() {
        let auc = roc_auc(&[0.0, 0.0, 1.0, 1.0], &[0.1, 0.2, 0.8, 0.9]).expect("auc");
        assert_relative_eq!(auc, 1.0);
    }

    #[test]
    fn test_inverted_ranking() {
        let auc = roc_auc(&[0.0, 0.0, 1.0, 1.0], &[0.9, 0.8, 0.2, 0.1]).expect("auc");
        assert_relative_eq!(auc, 0.0);
    }

    #[test]
    fn test_random_ranking_is_half() {
        let auc = roc_auc(&[1.0, 0.0, 1.0, 0.0], &[0.7, 0.7, 0.3, 0.3]).expect("auc");
        assert_relative_eq!(auc, 0.5);
    }

    #[test]
    fn test_ties_use_average_rank() {
        // One swap among four: 1 of 4 positive-negative pairs misordered,
        // none tied.
        let auc = roc_auc(&[0.0, 1.0, 0.0, 1.0], &[0.1, 0.4, 0.6, 0.9]).expect("auc");
        assert_relative_eq!(auc, 0.75);

        // All scores identical: every pair is a tie.
        let auc = roc_auc(&[0.0, 1.0, 0.0, 1.0], &[0.5, 0.5, 0.5, 0.5]).expect("auc");
        assert_relative_eq!(auc, 0.5);
    }

    #[test]
    fn test_degenerate_labels() {
        let err = roc_auc(&[1.0, 1.0], &[0.5, 0.6]).expect_err("fail");
        assert!(matches!(err, EvalError::DegenerateLabels));
        let err = roc_auc(&[0.0, 0.0], &[0.5, 0.6]).expect_err("fail");
        assert!(matches!(err, EvalError::DegenerateLabels));
    }

    #[test]
    fn test_length_mismatch() {
        let err = roc_auc(&[1.0, 0.0], &[0.5]).expect_err("fail");
        assert!(matches!(err, EvalError::LengthMismatch { labels: 2, scores: 1 }));
    }

    #[test]
    fn test_auc_in_unit_interval() {
        let labels = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        let scores = [0.3, 0.1, 0.9, 0.8, 0.55, 0.2, 0.85, 0.4];
        let auc = roc_auc(&labels, &scores).expect("auc");
        assert!((0.0..=1.0).contains(&auc));
    }

    #[test]
    fn test_evaluate_on_cpu() {
        let val = split(vec![0.0, 1.0, 0.0, 1.0]);
        let scorer = FixedScorer(vec![0.2, 0.9, 0.1, 0.8]);
        let auc = evaluate(&scorer, &val, Device::Cpu).expect("auc");
        assert_relative_eq!(auc, 1.0);
    }

    #[test]
    fn test_evaluate_rejects_missing_accelerator() {
        let val = split(vec![0.0, 1.0]);
        let scorer = FixedScorer(vec![0.2, 0.9]);
        let err = evaluate(&scorer, &val, Device::Accelerator).expect_err("fail");
        assert!(matches!(err, EvalError::DeviceUnavailable(Device::Accelerator)));
    }
}
