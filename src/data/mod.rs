//! Prepared event-log data and the preprocessing collaborator interface
//!
//! Feature engineering and raw XES parsing live upstream; the sweep consumes
//! already-encoded logs through the narrow [`LogPreparer`] trait. The default
//! implementation, [`EncodedLogPreparer`], loads a JSON-encoded log, one-hot
//! encodes its categorical streams, truncates cases to the prefix cap, and
//! splits deterministically into train/validation.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Errors from data preparation
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid encoded log {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("encoded log contains no cases")]
    EmptyLog,

    #[error("case {case}: {reason}")]
    MalformedCase { case: usize, reason: String },
}

/// Result alias for preparation operations
pub type Result<T> = std::result::Result<T, PrepError>;

/// What the sweep asks the preprocessing collaborator for.
#[derive(Debug, Clone)]
pub struct PrepRequest {
    /// Path to the encoded dataset file
    pub dataset: PathBuf,
    /// Log type, for preprocessing steps that depend on it
    pub log_type: String,
    /// Requested maximum prefix length
    pub max_prefix_len: usize,
    /// Whether the sensitive column should be excluded from features
    pub drop_sensitive: bool,
    /// Name of the sensitive column in the upstream log
    pub sensitive_column: String,
}

/// One split of prepared cases.
///
/// Cases are ragged: `features[i]` holds exactly `seq_len[i]` per-step
/// feature vectors. Labels are binary; the sensitive column is carried
/// through untouched for downstream fairness analysis.
#[derive(Debug, Clone, Default)]
pub struct PreparedSplit {
    /// Per-case sequences of per-step feature vectors
    pub features: Vec<Vec<Vec<f64>>>,
    /// Per-case sequence lengths
    pub seq_len: Vec<usize>,
    /// Binary ground-truth labels
    pub labels: Vec<f64>,
    /// Sensitive-attribute column (pass-through)
    pub sensitive: Vec<f64>,
}

impl PreparedSplit {
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Everything the sweep needs from preprocessing, loaded exactly once.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub train: PreparedSplit,
    pub val: PreparedSplit,
    /// Vocabulary size per categorical feature stream
    pub vocab_sizes: Vec<usize>,
    /// Number of numeric features per step
    pub num_numeric: usize,
    /// Width of one step's encoded feature vector
    pub feature_dim: usize,
    /// Resolved maximum prefix length (≤ requested, data-driven)
    pub max_prefix_len: usize,
}

/// Preprocessing collaborator: dataset file → prepared tensors.
pub trait LogPreparer {
    fn prepare(&self, request: &PrepRequest) -> Result<PreparedData>;
}

/// On-disk schema of an encoded event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedLog {
    /// Vocabulary size per categorical stream
    pub vocab_sizes: Vec<usize>,
    /// Numeric features per step
    pub num_numeric: usize,
    pub cases: Vec<EncodedCase>,
}

/// One case: parallel per-step categorical indices and numeric features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedCase {
    /// `categoricals[step][stream]` — index into the stream's vocabulary
    pub categoricals: Vec<Vec<u32>>,
    /// `numeric[step]` — numeric feature values
    pub numeric: Vec<Vec<f64>>,
    /// Binary outcome label
    pub label: f64,
    /// Sensitive-attribute value
    pub sensitive: f64,
}

/// Loads a JSON-encoded event log and prepares train/validation splits.
///
/// The split is deterministic by case index (every fifth case validates), so
/// repeated sweep invocations see identical data.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodedLogPreparer;

impl EncodedLogPreparer {
    const VAL_STRIDE: usize = 5;

    fn encode_case(
        case: &EncodedCase,
        index: usize,
        log: &EncodedLog,
        max_prefix_len: usize,
    ) -> Result<(Vec<Vec<f64>>, usize)> {
        if case.categoricals.len() != case.numeric.len() {
            return Err(PrepError::MalformedCase {
                case: index,
                reason: format!(
                    "categorical steps ({}) != numeric steps ({})",
                    case.categoricals.len(),
                    case.numeric.len()
                ),
            });
        }
        if case.categoricals.is_empty() {
            return Err(PrepError::MalformedCase {
                case: index,
                reason: "case has no events".to_string(),
            });
        }

        let seq_len = case.categoricals.len().min(max_prefix_len);
        let one_hot_dim: usize = log.vocab_sizes.iter().sum();
        let mut steps = Vec::with_capacity(seq_len);

        for (step, (cats, nums)) in case
            .categoricals
            .iter()
            .zip(case.numeric.iter())
            .take(seq_len)
            .enumerate()
        {
            if cats.len() != log.vocab_sizes.len() {
                return Err(PrepError::MalformedCase {
                    case: index,
                    reason: format!(
                        "step {step}: {} categorical values, expected {}",
                        cats.len(),
                        log.vocab_sizes.len()
                    ),
                });
            }
            if nums.len() != log.num_numeric {
                return Err(PrepError::MalformedCase {
                    case: index,
                    reason: format!(
                        "step {step}: {} numeric values, expected {}",
                        nums.len(),
                        log.num_numeric
                    ),
                });
            }

            let mut vec = vec![0.0; one_hot_dim + log.num_numeric];
            let mut offset = 0;
            for (stream, (&value, &vocab)) in
                cats.iter().zip(log.vocab_sizes.iter()).enumerate()
            {
                if value as usize >= vocab {
                    return Err(PrepError::MalformedCase {
                        case: index,
                        reason: format!(
                            "step {step}: stream {stream} index {value} >= vocab {vocab}"
                        ),
                    });
                }
                vec[offset + value as usize] = 1.0;
                offset += vocab;
            }
            vec[one_hot_dim..].copy_from_slice(nums);
            steps.push(vec);
        }

        Ok((steps, seq_len))
    }
}

impl LogPreparer for EncodedLogPreparer {
    fn prepare(&self, request: &PrepRequest) -> Result<PreparedData> {
        let text = fs::read_to_string(&request.dataset).map_err(|source| PrepError::Io {
            path: request.dataset.clone(),
            source,
        })?;
        let log: EncodedLog =
            serde_json::from_str(&text).map_err(|source| PrepError::Json {
                path: request.dataset.clone(),
                source,
            })?;

        if log.cases.is_empty() {
            return Err(PrepError::EmptyLog);
        }

        let longest = log
            .cases
            .iter()
            .map(|c| c.categoricals.len())
            .max()
            .unwrap_or(0);
        let max_prefix_len = request.max_prefix_len.min(longest);

        let feature_dim = log.vocab_sizes.iter().sum::<usize>() + log.num_numeric;
        let mut train = PreparedSplit::default();
        let mut val = PreparedSplit::default();

        for (index, case) in log.cases.iter().enumerate() {
            let (steps, seq_len) = Self::encode_case(case, index, &log, max_prefix_len)?;
            let split = if index % Self::VAL_STRIDE == Self::VAL_STRIDE - 1 {
                &mut val
            } else {
                &mut train
            };
            split.features.push(steps);
            split.seq_len.push(seq_len);
            split.labels.push(case.label);
            split.sensitive.push(case.sensitive);
        }

        Ok(PreparedData {
            train,
            val,
            vocab_sizes: log.vocab_sizes,
            num_numeric: log.num_numeric,
            feature_dim,
            max_prefix_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_log(dir: &TempDir, log: &EncodedLog) -> PathBuf {
        let path = dir.path().join("log.json");
        fs::write(&path, serde_json::to_string(log).expect("json")).expect("write");
        path
    }

    fn small_log(n_cases: usize) -> EncodedLog {
        EncodedLog {
            vocab_sizes: vec![3],
            num_numeric: 1,
            cases: (0..n_cases)
                .map(|i| EncodedCase {
                    categoricals: vec![vec![(i % 3) as u32]; 4 + i % 3],
                    numeric: vec![vec![i as f64]; 4 + i % 3],
                    label: (i % 2) as f64,
                    sensitive: 0.0,
                })
                .collect(),
        }
    }

    fn request(dataset: PathBuf, max_prefix_len: usize) -> PrepRequest {
        PrepRequest {
            dataset,
            log_type: "lending".to_string(),
            max_prefix_len,
            drop_sensitive: false,
            sensitive_column: "case:gender".to_string(),
        }
    }

    #[test]
    fn test_prepare_splits_and_dims() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_log(&dir, &small_log(10));

        let data = EncodedLogPreparer.prepare(&request(path, 6)).expect("prepare");
        assert_eq!(data.train.len() + data.val.len(), 10);
        assert_eq!(data.val.len(), 2); // every fifth case
        assert_eq!(data.feature_dim, 4); // 3 one-hot + 1 numeric
        for (case, &len) in data.train.features.iter().zip(&data.train.seq_len) {
            assert_eq!(case.len(), len);
            assert!(len <= data.max_prefix_len);
        }
    }

    #[test]
    fn test_resolved_prefix_len_is_data_driven() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_log(&dir, &small_log(5));

        // Longest case in small_log(5) has 6 steps; requesting more caps out.
        let data = EncodedLogPreparer.prepare(&request(path, 50)).expect("prepare");
        assert_eq!(data.max_prefix_len, 6);
    }

    #[test]
    fn test_truncation_to_requested_prefix() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_log(&dir, &small_log(5));

        let data = EncodedLogPreparer.prepare(&request(path, 2)).expect("prepare");
        assert_eq!(data.max_prefix_len, 2);
        assert!(data.train.seq_len.iter().all(|&l| l <= 2));
    }

    #[test]
    fn test_one_hot_encoding() {
        let dir = TempDir::new().expect("tempdir");
        let log = EncodedLog {
            vocab_sizes: vec![3],
            num_numeric: 1,
            cases: vec![EncodedCase {
                categoricals: vec![vec![2]],
                numeric: vec![vec![0.5]],
                label: 1.0,
                sensitive: 1.0,
            }],
        };
        let path = write_log(&dir, &log);

        let data = EncodedLogPreparer.prepare(&request(path, 6)).expect("prepare");
        assert_eq!(data.train.features[0][0], vec![0.0, 0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_out_of_vocab_index_fails() {
        let dir = TempDir::new().expect("tempdir");
        let log = EncodedLog {
            vocab_sizes: vec![2],
            num_numeric: 0,
            cases: vec![EncodedCase {
                categoricals: vec![vec![7]],
                numeric: vec![vec![]],
                label: 0.0,
                sensitive: 0.0,
            }],
        };
        let path = write_log(&dir, &log);

        let err = EncodedLogPreparer.prepare(&request(path, 6)).expect_err("fail");
        assert!(matches!(err, PrepError::MalformedCase { case: 0, .. }));
    }

    #[test]
    fn test_empty_log_fails() {
        let dir = TempDir::new().expect("tempdir");
        let log = EncodedLog {
            vocab_sizes: vec![2],
            num_numeric: 0,
            cases: vec![],
        };
        let path = write_log(&dir, &log);

        let err = EncodedLogPreparer.prepare(&request(path, 6)).expect_err("fail");
        assert!(matches!(err, PrepError::EmptyLog));
    }

    #[test]
    fn test_missing_file_fails() {
        let err = EncodedLogPreparer
            .prepare(&request(PathBuf::from("/nonexistent/log.json"), 6))
            .expect_err("fail");
        assert!(matches!(err, PrepError::Io { .. }));
    }
}
