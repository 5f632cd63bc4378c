#![deny(missing_docs)]

//! Forward flux sampling of crystal nucleation.
//!
//! A run first measures the flux of trajectories leaving the fluid basin
//! through λ0, then fires shots interface by interface. Each shot is a pure
//! function of its starting configuration, its request and an explicitly
//! seeded RNG handle, so a round of shots runs in parallel and reproduces
//! bit for bit regardless of thread count.

/// Interface archives collected at each ladder rung.
pub mod archive;
/// YAML configuration schema and defaults.
pub mod config;
/// Deterministic seed derivation helpers.
pub mod determinism;
/// Flux stage, interface stages and the public `run`/`resume` entry points.
pub mod driver;
/// Lennard-Jones pair potential.
pub mod energy;
/// Random fluid initialisation.
pub mod init;
/// Basin threshold and interface thresholds.
pub mod ladder;
/// Run manifest serialization helpers.
pub mod manifest;
/// Shot log records and per-stage statistics.
pub mod metrics;
/// Metropolis cycle runner.
pub mod moves;
/// Single-shot state machine with pruning.
pub mod shot;
/// XYZ configuration files.
pub mod xyz;

pub use archive::{ArchivedConfiguration, InterfaceArchive};
pub use config::{RunConfig, SeedPolicy};
pub use driver::{resume, run, RunSummary};
pub use energy::LennardJones;
pub use init::random_fluid;
pub use ladder::InterfaceLadder;
pub use manifest::{RunManifest, RunStatus};
pub use metrics::{FluxStats, InterfaceStats, ShotRecord};
pub use moves::MetropolisRunner;
pub use shot::{run_shot, PruningPolicy, ShotOutcome, ShotRequest, ShotResult};
