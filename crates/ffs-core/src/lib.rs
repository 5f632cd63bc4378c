#![deny(missing_docs)]

//! Core traits and data types for forward flux sampling of nucleation.
//!
//! The sampler in `ffs-sampler` only ever talks to the outside world through
//! the three collaborator traits defined here: an [`OrderClassifier`] that
//! decides which particles are locally ordered, an [`OrderParameter`] that
//! reduces a configuration to the scalar tracked across interfaces, and a
//! [`CycleRunner`] that advances a configuration by a batch of elementary
//! moves. All of them are `Send + Sync` so independent shots can share one
//! instance across worker threads.

pub mod errors;
pub mod geometry;
pub mod provenance;
pub mod rng;

pub use errors::{ErrorInfo, FfsError};
pub use geometry::{Configuration, Position, SimBox};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle};

/// Local-order classifier: returns the indices of particles judged ordered.
pub trait OrderClassifier: Send + Sync {
    /// Returns the indices of the locally ordered particles in `config`.
    fn ordered_indices(&self, config: &Configuration) -> Result<Vec<usize>, FfsError>;
}

/// Scalar order parameter tracked along a trajectory.
pub trait OrderParameter: Send + Sync {
    /// Evaluates the order parameter for a configuration.
    fn evaluate(&self, config: &Configuration) -> Result<f64, FfsError>;
}

/// Elementary move generator advancing a configuration by whole cycles.
pub trait CycleRunner: Send + Sync {
    /// Potential energy of a configuration, used to seed the running energy.
    fn energy(&self, config: &Configuration) -> Result<f64, FfsError>;

    /// Runs `cycles` cycles starting from `config` with running energy
    /// `energy`, returning the new configuration and its energy.
    fn run_cycles(
        &self,
        config: Configuration,
        energy: f64,
        cycles: usize,
        rng: &mut RngHandle,
    ) -> Result<(Configuration, f64), FfsError>;
}
