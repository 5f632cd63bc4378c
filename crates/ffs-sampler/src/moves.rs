use ffs_core::errors::{ErrorInfo, FfsError};
use ffs_core::{Configuration, CycleRunner, RngHandle};
use serde::{Deserialize, Serialize};

use crate::energy::LennardJones;

/// Single-particle displacement Metropolis Monte Carlo in the NVT ensemble.
///
/// One cycle is as many trial moves as there are particles. Moves that take
/// a particle outside `[0, Lz)` on a non-periodic z axis are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetropolisRunner {
    /// Pair potential.
    pub potential: LennardJones,
    /// Reduced temperature.
    pub temperature: f64,
    /// Half-width of the uniform trial displacement per axis.
    pub max_displacement: f64,
}

impl MetropolisRunner {
    /// Creates a runner after validating its parameters.
    pub fn new(
        potential: LennardJones,
        temperature: f64,
        max_displacement: f64,
    ) -> Result<Self, FfsError> {
        let runner = Self {
            potential,
            temperature,
            max_displacement,
        };
        runner.validate()?;
        Ok(runner)
    }

    /// Checks the potential, temperature and displacement.
    pub fn validate(&self) -> Result<(), FfsError> {
        self.potential.validate()?;
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(FfsError::Config(
                ErrorInfo::new("temperature", "temperature must be finite and positive")
                    .with_context("temperature", self.temperature),
            ));
        }
        if !(self.max_displacement.is_finite() && self.max_displacement > 0.0) {
            return Err(FfsError::Config(
                ErrorInfo::new("max-displacement", "trial displacement must be finite and positive")
                    .with_context("max_displacement", self.max_displacement),
            ));
        }
        Ok(())
    }

    /// Attempts one trial move, returning the energy change when accepted.
    fn trial_move(&self, config: &mut Configuration, rng: &mut RngHandle) -> Option<f64> {
        let index = rng.index(config.len());
        let old = config.positions[index];
        let mut trial = [
            old[0] + rng.symmetric(self.max_displacement),
            old[1] + rng.symmetric(self.max_displacement),
            old[2] + rng.symmetric(self.max_displacement),
        ];
        config.sim_box.wrap(&mut trial);
        if !config.sim_box.contains_z(&trial) {
            return None;
        }

        let delta = self.potential.particle_energy(config, index, &trial)
            - self.potential.particle_energy(config, index, &old);
        if delta <= 0.0 || rng.uniform() < (-delta / self.temperature).exp() {
            config.positions[index] = trial;
            Some(delta)
        } else {
            None
        }
    }
}

impl CycleRunner for MetropolisRunner {
    fn energy(&self, config: &Configuration) -> Result<f64, FfsError> {
        Ok(self.potential.total_energy(config))
    }

    fn run_cycles(
        &self,
        mut config: Configuration,
        mut energy: f64,
        cycles: usize,
        rng: &mut RngHandle,
    ) -> Result<(Configuration, f64), FfsError> {
        if config.is_empty() {
            return Ok((config, energy));
        }
        let trials = cycles * config.len();
        for _ in 0..trials {
            if let Some(delta) = self.trial_move(&mut config, rng) {
                energy += delta;
            }
        }
        Ok((config, energy))
    }
}
