use ffs_core::errors::{ErrorInfo, FfsError};
use ffs_core::{Configuration, Position};
use serde::{Deserialize, Serialize};

/// Truncated Lennard-Jones pair potential.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LennardJones {
    /// Well depth.
    pub epsilon: f64,
    /// Particle diameter.
    pub sigma: f64,
    /// Interaction range; pairs at or beyond it do not interact.
    pub cutoff: f64,
}

impl Default for LennardJones {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            sigma: 1.0,
            cutoff: 2.5,
        }
    }
}

impl LennardJones {
    /// Checks that every parameter is finite and positive.
    pub fn validate(&self) -> Result<(), FfsError> {
        for (name, value) in [
            ("epsilon", self.epsilon),
            ("sigma", self.sigma),
            ("cutoff", self.cutoff),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(FfsError::Config(
                    ErrorInfo::new("potential", "potential parameters must be finite and positive")
                        .with_context("parameter", name)
                        .with_context("value", value),
                ));
            }
        }
        Ok(())
    }

    /// Pair energy at squared separation `r_sq`.
    #[inline]
    pub fn pair_energy(&self, r_sq: f64) -> f64 {
        let s2 = self.sigma * self.sigma / r_sq;
        let s6 = s2 * s2 * s2;
        4.0 * self.epsilon * (s6 * s6 - s6)
    }

    /// Total potential energy of a configuration.
    pub fn total_energy(&self, config: &Configuration) -> f64 {
        let positions = &config.positions;
        let mut total = 0.0;
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                if let Some(r_sq) =
                    config.sim_box.within_cutoff(&positions[i], &positions[j], self.cutoff)
                {
                    total += self.pair_energy(r_sq);
                }
            }
        }
        total
    }

    /// Energy of particle `index` placed at `position` with every other particle.
    pub fn particle_energy(&self, config: &Configuration, index: usize, position: &Position) -> f64 {
        config
            .positions
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != index)
            .filter_map(|(_, other)| config.sim_box.within_cutoff(position, other, self.cutoff))
            .map(|r_sq| self.pair_energy(r_sq))
            .sum()
    }
}
