use ffs_core::errors::{ErrorInfo, FfsError};
use ffs_core::{Configuration, RngHandle, SimBox};
use tracing::debug;

use crate::config::SystemConfig;

const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

impl SystemConfig {
    /// Simulation box implied by the explicit volume or by particle count
    /// and number density.
    pub fn sim_box(&self) -> Result<SimBox, FfsError> {
        let volume = match self.box_volume {
            Some(volume) => volume,
            None => self.particles as f64 / self.number_density,
        };
        if !(volume.is_finite() && volume > 0.0) {
            return Err(FfsError::Config(
                ErrorInfo::new("box-volume", "box volume must be finite and positive")
                    .with_context("volume", volume),
            ));
        }
        SimBox::new([volume.cbrt(); 3], self.periodic_z)
    }
}

/// Places `system.particles` particles uniformly at random, keeping every
/// pair at least `system.min_separation` apart.
pub fn random_fluid(system: &SystemConfig, rng: &mut RngHandle) -> Result<Configuration, FfsError> {
    let sim_box = system.sim_box()?;
    let min_sq = system.min_separation * system.min_separation;
    let mut positions = Vec::with_capacity(system.particles);

    for placed in 0..system.particles {
        let mut attempts = 0;
        let candidate = loop {
            if attempts == MAX_PLACEMENT_ATTEMPTS {
                return Err(FfsError::Geometry(
                    ErrorInfo::new("placement-exhausted", "could not place particle without overlap")
                        .with_context("placed", placed)
                        .with_context("attempts", attempts)
                        .with_hint("lower the density or the minimum separation"),
                ));
            }
            attempts += 1;
            let candidate = [
                rng.uniform() * sim_box.lengths[0],
                rng.uniform() * sim_box.lengths[1],
                rng.uniform() * sim_box.lengths[2],
            ];
            if positions
                .iter()
                .all(|other| sim_box.distance_sq(&candidate, other) >= min_sq)
            {
                break candidate;
            }
        };
        positions.push(candidate);
    }

    debug!(
        particles = positions.len(),
        box_length = sim_box.lengths[0],
        "initialised random fluid"
    );
    Configuration::new(positions, sim_box)
}
