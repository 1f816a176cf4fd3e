//! Exhaustive grid enumeration over the fixed hyperparameter axes

use serde::{Deserialize, Serialize};

use super::combination::Combination;

/// The ordered hyperparameter axes of one sweep.
///
/// Axis order is fixed: layers, bidirectional, hidden size, batch size,
/// learning rate, dropout. Candidate lists are immutable once the sweep
/// starts; enumeration is the Cartesian product in nested-loop order with
/// the last axis (dropout) varying fastest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepGrid {
    pub num_layers: Vec<u32>,
    pub bidirectional: Vec<bool>,
    pub hidden_size: Vec<u32>,
    pub batch_size: Vec<u32>,
    pub learning_rate: Vec<f64>,
    pub dropout: Vec<f64>,
}

impl Default for SweepGrid {
    /// The grid of the original tuning study.
    fn default() -> Self {
        Self {
            num_layers: vec![1, 2],
            bidirectional: vec![false, true],
            hidden_size: vec![16, 32, 64],
            batch_size: vec![128, 256, 512],
            learning_rate: vec![0.0001, 0.001],
            dropout: vec![0.2, 0.4],
        }
    }
}

impl SweepGrid {
    /// Total number of combinations in the product.
    #[must_use]
    pub fn len(&self) -> usize {
        self.num_layers.len()
            * self.bidirectional.len()
            * self.hidden_size.len()
            * self.batch_size.len()
            * self.learning_rate.len()
            * self.dropout.len()
    }

    /// Whether any axis has no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazily enumerate the full Cartesian product.
    ///
    /// Deterministic and restartable: every call yields the identical
    /// sequence. No randomness, no side effects.
    #[must_use]
    pub fn combinations(&self) -> Combinations<'_> {
        Combinations {
            grid: self,
            cursor: 0,
            total: self.len(),
        }
    }
}

/// Lazy iterator over a [`SweepGrid`]'s Cartesian product.
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    grid: &'a SweepGrid,
    cursor: usize,
    total: usize,
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        if self.cursor >= self.total {
            return None;
        }
        // Mixed-radix decode of the cursor, least significant digit last,
        // which gives nested-loop order with dropout varying fastest.
        let g = self.grid;
        let mut idx = self.cursor;
        self.cursor += 1;

        let di = idx % g.dropout.len();
        idx /= g.dropout.len();
        let li = idx % g.learning_rate.len();
        idx /= g.learning_rate.len();
        let bi = idx % g.batch_size.len();
        idx /= g.batch_size.len();
        let hi = idx % g.hidden_size.len();
        idx /= g.hidden_size.len();
        let fi = idx % g.bidirectional.len();
        idx /= g.bidirectional.len();
        let ni = idx % g.num_layers.len();

        Some(Combination {
            num_layers: g.num_layers[ni],
            bidirectional: g.bidirectional[fi],
            hidden_size: g.hidden_size[hi],
            batch_size: g.batch_size[bi],
            learning_rate: g.learning_rate[li],
            dropout: g.dropout[di],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Combinations<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_grid_size() {
        let grid = SweepGrid::default();
        assert_eq!(grid.len(), 2 * 2 * 3 * 3 * 2 * 2);
        assert_eq!(grid.combinations().count(), 144);
    }

    #[test]
    fn test_last_axis_varies_fastest() {
        let grid = SweepGrid::default();
        let combos: Vec<Combination> = grid.combinations().collect();
        assert_eq!(combos[0].dropout, 0.2);
        assert_eq!(combos[1].dropout, 0.4);
        // Both share every other axis value.
        assert_eq!(combos[0].learning_rate, combos[1].learning_rate);
        assert_eq!(combos[0].num_layers, combos[1].num_layers);
        // First axis changes only at the halfway point.
        assert_eq!(combos[71].num_layers, 1);
        assert_eq!(combos[72].num_layers, 2);
    }

    #[test]
    fn test_no_duplicates() {
        let grid = SweepGrid::default();
        let keys: HashSet<String> = grid.combinations().map(|c| c.resume_key()).collect();
        assert_eq!(keys.len(), grid.len());
    }

    #[test]
    fn test_re_enumeration_is_identical() {
        let grid = SweepGrid::default();
        let first: Vec<Combination> = grid.combinations().collect();
        let second: Vec<Combination> = grid.combinations().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_axis_yields_nothing() {
        let grid = SweepGrid {
            hidden_size: vec![],
            ..SweepGrid::default()
        };
        assert!(grid.is_empty());
        assert_eq!(grid.combinations().count(), 0);
    }

    #[test]
    fn test_exact_size_hint() {
        let grid = SweepGrid::default();
        let mut iter = grid.combinations();
        assert_eq!(iter.len(), 144);
        iter.next();
        assert_eq!(iter.len(), 143);
    }
}
