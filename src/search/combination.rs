//! Hyperparameter combinations and their resume identity

use std::fmt;

use serde::{Deserialize, Serialize};

/// Decimal precision used when rendering floats into a resume key.
///
/// Ten significant digits is far coarser than f64 round-trip precision, so
/// any representation drift introduced by serializing a learning rate or
/// dropout value and reading it back collapses onto the same key.
const KEY_FLOAT_PRECISION: usize = 10;

/// One concrete assignment of values to every hyperparameter axis.
///
/// Field order is the axis order of the sweep; two combinations are the same
/// sweep point iff their [`resume_key`](Combination::resume_key)s are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    /// Number of recurrent layers
    pub num_layers: u32,
    /// Whether the top layer also consumes the reversed sequence
    pub bidirectional: bool,
    /// Hidden state size per layer
    pub hidden_size: u32,
    /// Mini-batch size for readout training
    pub batch_size: u32,
    /// Readout learning rate
    pub learning_rate: f64,
    /// Dropout rate applied to the readout input during training
    pub dropout: f64,
}

impl Combination {
    /// Canonical identity of this combination for resume filtering.
    ///
    /// Integer axes are rendered verbatim; float axes are rendered in
    /// scientific notation at a fixed precision, so the key is stable across
    /// CSV round-trips even if the raw bit pattern is not.
    #[must_use]
    pub fn resume_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{:.prec$e}|{:.prec$e}",
            self.num_layers,
            self.bidirectional,
            self.hidden_size,
            self.batch_size,
            self.learning_rate,
            self.dropout,
            prec = KEY_FLOAT_PRECISION,
        )
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "layers={} bidirectional={} hidden={} batch={} lr={} dropout={}",
            self.num_layers,
            self.bidirectional,
            self.hidden_size,
            self.batch_size,
            self.learning_rate,
            self.dropout
        )
    }
}
