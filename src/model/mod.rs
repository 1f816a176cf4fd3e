//! Recurrent sequence classifier used as the default trained artifact
//!
//! A stack of fixed echo-state reservoirs feeds a trained logistic readout.
//! Reservoir weights are drawn once from a seeded RNG and never updated;
//! only the readout learns. The top layer can additionally consume the
//! reversed prefix (bidirectional), doubling the readout input.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::PreparedSplit;

/// Leak rate of the reservoir state update.
const LEAK: f64 = 0.5;

/// Anything that can score a prepared split with per-case probabilities.
///
/// The sweep controller is generic over this, so tests can evaluate mock
/// artifacts without training anything.
pub trait SequenceScorer {
    /// One probability in [0, 1] per case, aligned with the split's cases.
    fn scores(&self, split: &PreparedSplit) -> Vec<f64>;
}

/// One fixed reservoir layer.
#[derive(Debug, Clone)]
pub struct ReservoirLayer {
    /// Input weights, row-major `hidden x input_dim`
    w_in: Vec<f64>,
    /// Recurrent weights, row-major `hidden x hidden`
    w_rec: Vec<f64>,
    input_dim: usize,
    hidden: usize,
}

impl ReservoirLayer {
    fn new(input_dim: usize, hidden: usize, rng: &mut StdRng) -> Self {
        let in_scale = 1.0 / (input_dim.max(1) as f64).sqrt();
        let rec_scale = 0.9 / (hidden as f64).sqrt();
        let w_in = (0..hidden * input_dim)
            .map(|_| (rng.random::<f64>() * 2.0 - 1.0) * in_scale)
            .collect();
        let w_rec = (0..hidden * hidden)
            .map(|_| (rng.random::<f64>() * 2.0 - 1.0) * rec_scale)
            .collect();
        Self {
            w_in,
            w_rec,
            input_dim,
            hidden,
        }
    }

    /// Run the reservoir over a sequence, returning the state at each step.
    fn run(&self, seq: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let mut states = Vec::with_capacity(seq.len());
        let mut state = vec![0.0; self.hidden];
        for input in seq {
            let mut next = vec![0.0; self.hidden];
            for (h, slot) in next.iter_mut().enumerate() {
                let mut acc = 0.0;
                let in_row = &self.w_in[h * self.input_dim..(h + 1) * self.input_dim];
                for (w, x) in in_row.iter().zip(input.iter()) {
                    acc += w * x;
                }
                let rec_row = &self.w_rec[h * self.hidden..(h + 1) * self.hidden];
                for (w, x) in rec_row.iter().zip(state.iter()) {
                    acc += w * x;
                }
                *slot = (1.0 - LEAK) * state[h] + LEAK * acc.tanh();
            }
            state = next;
            states.push(state.clone());
        }
        states
    }
}

/// Trained sequence classifier: fixed reservoir stack + logistic readout.
#[derive(Debug, Clone)]
pub struct EsnClassifier {
    layers: Vec<ReservoirLayer>,
    bidirectional: bool,
    /// Readout weights over the case representation
    readout_w: Vec<f64>,
    readout_b: f64,
}

impl EsnClassifier {
    /// Build an untrained classifier with zeroed readout.
    ///
    /// Reservoir weights are fully determined by `seed`, so the same
    /// configuration always yields the same network.
    #[must_use]
    pub fn new(
        input_dim: usize,
        hidden: usize,
        num_layers: usize,
        bidirectional: bool,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut layers = Vec::with_capacity(num_layers);
        let mut dim = input_dim;
        for _ in 0..num_layers {
            layers.push(ReservoirLayer::new(dim, hidden, &mut rng));
            dim = hidden;
        }
        let repr = if bidirectional { 2 * hidden } else { hidden };
        Self {
            layers,
            bidirectional,
            readout_w: vec![0.0; repr],
            readout_b: 0.0,
        }
    }

    /// Width of the case representation fed to the readout.
    #[must_use]
    pub fn repr_dim(&self) -> usize {
        self.readout_w.len()
    }

    /// Fixed-size representation of one case: the top layer's final state,
    /// concatenated with the final state over the reversed prefix when
    /// bidirectional.
    #[must_use]
    pub fn embed(&self, case: &[Vec<f64>]) -> Vec<f64> {
        let mut seq: Vec<Vec<f64>> = case.to_vec();
        for layer in &self.layers {
            seq = layer.run(&seq);
        }
        let mut repr = seq.last().cloned().unwrap_or_default();

        if self.bidirectional {
            let mut rev: Vec<Vec<f64>> = case.to_vec();
            rev.reverse();
            for layer in &self.layers {
                rev = layer.run(&rev);
            }
            repr.extend(rev.last().cloned().unwrap_or_default());
        }
        repr
    }

    /// Readout logit for a representation.
    #[must_use]
    pub fn logit(&self, repr: &[f64]) -> f64 {
        let mut z = self.readout_b;
        for (w, x) in self.readout_w.iter().zip(repr.iter()) {
            z += w * x;
        }
        z
    }

    /// Replace the readout after training.
    pub fn set_readout(&mut self, weights: Vec<f64>, bias: f64) {
        debug_assert_eq!(weights.len(), self.readout_w.len());
        self.readout_w = weights;
        self.readout_b = bias;
    }
}

impl SequenceScorer for EsnClassifier {
    fn scores(&self, split: &PreparedSplit) -> Vec<f64> {
        split
            .features
            .iter()
            .map(|case| sigmoid(self.logit(&self.embed(case))))
            .collect()
    }
}

/// Numerically safe logistic function.
#[must_use]
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn case(steps: usize, dim: usize, fill: f64) -> Vec<Vec<f64>> {
        vec![vec![fill; dim]; steps]
    }

    #[test]
    fn test_same_seed_same_network() {
        let a = EsnClassifier::new(4, 8, 2, false, 42);
        let b = EsnClassifier::new(4, 8, 2, false, 42);
        let input = case(5, 4, 0.3);
        assert_eq!(a.embed(&input), b.embed(&input));
    }

    #[test]
    fn test_different_seed_different_network() {
        let a = EsnClassifier::new(4, 8, 1, false, 1);
        let b = EsnClassifier::new(4, 8, 1, false, 2);
        let input = case(5, 4, 0.3);
        assert_ne!(a.embed(&input), b.embed(&input));
    }

    #[test]
    fn test_repr_dim_doubles_when_bidirectional() {
        let uni = EsnClassifier::new(4, 8, 1, false, 7);
        let bi = EsnClassifier::new(4, 8, 1, true, 7);
        assert_eq!(uni.repr_dim(), 8);
        assert_eq!(bi.repr_dim(), 16);
        assert_eq!(bi.embed(&case(3, 4, 0.5)).len(), 16);
    }

    #[test]
    fn test_states_stay_bounded() {
        let model = EsnClassifier::new(4, 16, 2, true, 9);
        let repr = model.embed(&case(50, 4, 1.0));
        assert!(repr.iter().all(|v| v.abs() <= 1.0));
    }

    #[test]
    fn test_zero_readout_scores_half() {
        let model = EsnClassifier::new(3, 4, 1, false, 11);
        let split = PreparedSplit {
            features: vec![case(2, 3, 0.1)],
            seq_len: vec![2],
            labels: vec![1.0],
            sensitive: vec![0.0],
        };
        let scores = model.scores(&split);
        assert_relative_eq!(scores[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_sigmoid_extremes() {
        assert_relative_eq!(sigmoid(0.0), 0.5, epsilon = 1e-12);
        assert!(sigmoid(40.0) > 0.999_999);
        assert!(sigmoid(-40.0) < 1e-6);
        assert!(sigmoid(-800.0) >= 0.0);
    }
}
