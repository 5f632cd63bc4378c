use ffs_core::errors::{ErrorInfo, FfsError};
use ffs_core::{Configuration, OrderClassifier};
use serde::{Deserialize, Serialize};

use crate::adjacency::check_cutoff;

/// Coordination-number classifier: a particle counts as ordered when at
/// least `min_neighbours` other particles sit within `cutoff`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinationClassifier {
    cutoff: f64,
    min_neighbours: usize,
}

impl CoordinationClassifier {
    /// Creates a classifier after validating its parameters.
    pub fn new(cutoff: f64, min_neighbours: usize) -> Result<Self, FfsError> {
        check_cutoff(cutoff)?;
        if min_neighbours == 0 {
            return Err(FfsError::Config(
                ErrorInfo::new("min-neighbours", "neighbour threshold must be at least one")
                    .with_hint("a zero threshold marks every particle as ordered"),
            ));
        }
        Ok(Self {
            cutoff,
            min_neighbours,
        })
    }

    /// Neighbour search radius.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Neighbour count required to be ordered.
    pub fn min_neighbours(&self) -> usize {
        self.min_neighbours
    }

    /// Neighbour counts of every particle.
    pub fn coordination_numbers(&self, config: &Configuration) -> Vec<usize> {
        let positions = &config.positions;
        let mut counts = vec![0usize; positions.len()];
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                if config
                    .sim_box
                    .within_cutoff(&positions[i], &positions[j], self.cutoff)
                    .is_some()
                {
                    counts[i] += 1;
                    counts[j] += 1;
                }
            }
        }
        counts
    }
}

impl OrderClassifier for CoordinationClassifier {
    fn ordered_indices(&self, config: &Configuration) -> Result<Vec<usize>, FfsError> {
        Ok(self
            .coordination_numbers(config)
            .into_iter()
            .enumerate()
            .filter(|&(_, count)| count >= self.min_neighbours)
            .map(|(idx, _)| idx)
            .collect())
    }
}
