use std::fs;
use std::path::{Path, PathBuf};

use ffs_cluster::{ClusterDetector, CoordinationClassifier};
use ffs_core::errors::{ErrorInfo, FfsError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::energy::LennardJones;
use crate::ladder::InterfaceLadder;
use crate::moves::MetropolisRunner;
use crate::shot::PruningPolicy;

/// YAML-configurable parameters of a forward flux sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Basin threshold and interface ladder.
    #[serde(default)]
    pub ladder: LadderConfig,
    /// Batch sizes, stage lengths and stopping rules.
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Pruning of shots that fall back through interfaces.
    #[serde(default)]
    pub pruning: PruningConfig,
    /// Linking distance of crystalline clusters.
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Local-order classifier.
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Pair potential and Metropolis parameters.
    #[serde(default)]
    pub potential: PotentialConfig,
    /// Particle count and box used to build an initial fluid.
    #[serde(default)]
    pub system: SystemConfig,
    /// Master seed and shared-seed debugging switch.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// Worker pool settings.
    #[serde(default)]
    pub parallel: ParallelConfig,
    /// Output directory layout.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ladder: LadderConfig::default(),
            sampling: SamplingConfig::default(),
            pruning: PruningConfig::default(),
            cluster: ClusterConfig::default(),
            classifier: ClassifierConfig::default(),
            potential: PotentialConfig::default(),
            system: SystemConfig::default(),
            seed_policy: SeedPolicy::default(),
            parallel: ParallelConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parses a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, FfsError> {
        serde_yaml::from_str(text)
            .map_err(|err| FfsError::Serde(ErrorInfo::new("config-parse", err.to_string())))
    }

    /// Loads and parses a YAML file.
    pub fn load(path: &Path) -> Result<Self, FfsError> {
        let text = fs::read_to_string(path).map_err(|err| FfsError::io("config-read", err, path))?;
        serde_yaml::from_str(&text).map_err(|err| FfsError::io("config-parse", err, path))
    }

    /// Checks every parameter before any shot is fired.
    pub fn validate(&self) -> Result<(), FfsError> {
        self.ladder()?;
        self.sampling.validate()?;
        self.pruning_policy()?;
        self.detector()?;
        self.runner()?;
        self.system.sim_box()?;
        if self.parallel.threads == 0 {
            return Err(FfsError::config("threads", "worker pool needs at least one thread"));
        }
        Ok(())
    }

    /// Validated interface ladder.
    pub fn ladder(&self) -> Result<InterfaceLadder, FfsError> {
        InterfaceLadder::new(self.ladder.basin, self.ladder.interfaces.clone())
    }

    /// Pruning policy, or `None` when pruning is switched off.
    pub fn pruning_policy(&self) -> Result<Option<PruningPolicy>, FfsError> {
        if self.pruning.enabled {
            PruningPolicy::new(self.pruning.probability).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Largest-cluster order parameter built from the classifier and
    /// cluster sections.
    pub fn detector(&self) -> Result<ClusterDetector<CoordinationClassifier>, FfsError> {
        let classifier =
            CoordinationClassifier::new(self.classifier.cutoff, self.classifier.min_neighbours)?;
        ClusterDetector::new(classifier, self.cluster.cutoff)
    }

    /// Metropolis cycle runner built from the potential section.
    pub fn runner(&self) -> Result<MetropolisRunner, FfsError> {
        let potential = &self.potential;
        MetropolisRunner::new(
            LennardJones {
                epsilon: potential.epsilon,
                sigma: potential.sigma,
                cutoff: potential.cutoff,
            },
            potential.temperature,
            potential.max_displacement,
        )
    }

    /// SHA-256 of the JSON rendering of the configuration.
    pub fn hash(&self) -> Result<String, FfsError> {
        let bytes = serde_json::to_vec(self)
            .map_err(|err| FfsError::Serde(ErrorInfo::new("config-serialize", err.to_string())))?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// Interface ladder section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Basin threshold λ_A.
    #[serde(default = "default_basin")]
    pub basin: f64,
    /// Interface thresholds λ0 < λ1 < … < λN.
    #[serde(default = "default_interfaces")]
    pub interfaces: Vec<f64>,
}

fn default_basin() -> f64 {
    6.0
}

fn default_interfaces() -> Vec<f64> {
    vec![10.0, 15.0, 25.0, 40.0, 60.0, 100.0]
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            basin: default_basin(),
            interfaces: default_interfaces(),
        }
    }
}

/// Batch sizes and stopping rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Cycles between order-parameter evaluations.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// λ0 crossings collected by the flux stage.
    #[serde(default = "default_lambda0_hits")]
    pub lambda0_hits: usize,
    /// Flux-stage cycle budget.
    #[serde(default = "default_max_flux_cycles")]
    pub max_flux_cycles: usize,
    /// Shots fired per parallel round.
    #[serde(default = "default_shots_per_batch")]
    pub shots_per_batch: usize,
    /// Successes after which an interface stage stops.
    #[serde(default = "default_min_successes")]
    pub min_successes: usize,
    /// Hard cap on shots per interface stage.
    #[serde(default = "default_max_shots")]
    pub max_shots: usize,
    /// Optional cap on the duration of a single shot, in cycles.
    #[serde(default)]
    pub max_duration: Option<usize>,
}

fn default_batch_size() -> usize {
    10
}

fn default_lambda0_hits() -> usize {
    20
}

fn default_max_flux_cycles() -> usize {
    1_000_000
}

fn default_shots_per_batch() -> usize {
    16
}

fn default_min_successes() -> usize {
    10
}

fn default_max_shots() -> usize {
    1_000
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            lambda0_hits: default_lambda0_hits(),
            max_flux_cycles: default_max_flux_cycles(),
            shots_per_batch: default_shots_per_batch(),
            min_successes: default_min_successes(),
            max_shots: default_max_shots(),
            max_duration: None,
        }
    }
}

impl SamplingConfig {
    fn validate(&self) -> Result<(), FfsError> {
        for (name, value) in [
            ("batch_size", self.batch_size),
            ("lambda0_hits", self.lambda0_hits),
            ("max_flux_cycles", self.max_flux_cycles),
            ("shots_per_batch", self.shots_per_batch),
            ("min_successes", self.min_successes),
            ("max_shots", self.max_shots),
        ] {
            if value == 0 {
                return Err(FfsError::Config(
                    ErrorInfo::new("sampling", "sampling counts must be positive")
                        .with_context("parameter", name),
                ));
            }
        }
        if self.max_duration == Some(0) {
            return Err(FfsError::config(
                "max-duration",
                "maximum duration must be positive when set",
            ));
        }
        Ok(())
    }
}

/// Pruning section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruningConfig {
    /// Whether shots are pruned at all.
    #[serde(default)]
    pub enabled: bool,
    /// Kill probability per trial.
    #[serde(default = "default_prune_probability")]
    pub probability: f64,
}

fn default_prune_probability() -> f64 {
    0.5
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            probability: default_prune_probability(),
        }
    }
}

/// Cluster section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Linking distance between ordered particles.
    #[serde(default = "default_neighbour_cutoff")]
    pub cutoff: f64,
}

fn default_neighbour_cutoff() -> f64 {
    1.5
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            cutoff: default_neighbour_cutoff(),
        }
    }
}

/// Coordination classifier section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Neighbour search radius.
    #[serde(default = "default_neighbour_cutoff")]
    pub cutoff: f64,
    /// Neighbours needed for a particle to count as ordered.
    #[serde(default = "default_min_neighbours")]
    pub min_neighbours: usize,
}

fn default_min_neighbours() -> usize {
    10
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            cutoff: default_neighbour_cutoff(),
            min_neighbours: default_min_neighbours(),
        }
    }
}

/// Potential and Metropolis section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialConfig {
    /// Lennard-Jones well depth.
    #[serde(default = "default_unit")]
    pub epsilon: f64,
    /// Lennard-Jones diameter.
    #[serde(default = "default_unit")]
    pub sigma: f64,
    /// Potential truncation radius.
    #[serde(default = "default_potential_cutoff")]
    pub cutoff: f64,
    /// Reduced temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Trial displacement half-width.
    #[serde(default = "default_max_displacement")]
    pub max_displacement: f64,
}

fn default_unit() -> f64 {
    1.0
}

fn default_potential_cutoff() -> f64 {
    2.5
}

fn default_temperature() -> f64 {
    0.6
}

fn default_max_displacement() -> f64 {
    0.1
}

impl Default for PotentialConfig {
    fn default() -> Self {
        Self {
            epsilon: default_unit(),
            sigma: default_unit(),
            cutoff: default_potential_cutoff(),
            temperature: default_temperature(),
            max_displacement: default_max_displacement(),
        }
    }
}

/// System section used by random fluid initialisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Number of particles.
    #[serde(default = "default_particles")]
    pub particles: usize,
    /// Number density; ignored when `box_volume` is set.
    #[serde(default = "default_number_density")]
    pub number_density: f64,
    /// Explicit box volume.
    #[serde(default)]
    pub box_volume: Option<f64>,
    /// Smallest allowed separation between initial particles.
    #[serde(default = "default_min_separation")]
    pub min_separation: f64,
    /// Whether the z axis wraps around.
    #[serde(default = "default_periodic_z")]
    pub periodic_z: bool,
}

fn default_particles() -> usize {
    256
}

fn default_number_density() -> f64 {
    0.95
}

fn default_min_separation() -> f64 {
    0.8
}

fn default_periodic_z() -> bool {
    true
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            particles: default_particles(),
            number_density: default_number_density(),
            box_volume: None,
            min_separation: default_min_separation(),
            periodic_z: default_periodic_z(),
        }
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed for every stream of the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Replays the master seed in every shot instead of deriving substreams.
    #[serde(default)]
    pub same_seed: bool,
}

fn default_master_seed() -> u64 {
    0x0F1F_F5EE_D5EE_D00D_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            same_seed: false,
        }
    }
}

/// Worker pool section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Threads running shots concurrently.
    #[serde(default = "default_threads")]
    pub threads: usize,
}

fn default_threads() -> usize {
    1
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
        }
    }
}

/// Output directory layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for run artefacts; nothing is written when unset.
    #[serde(default)]
    pub run_directory: Option<PathBuf>,
    /// Shot log filename relative to `run_directory`.
    #[serde(default = "default_shots_filename")]
    pub shots_file: PathBuf,
    /// Manifest filename relative to `run_directory`.
    #[serde(default = "default_manifest_filename")]
    pub manifest_file: PathBuf,
    /// Subdirectory holding interface archives.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,
}

fn default_shots_filename() -> PathBuf {
    PathBuf::from("shots.csv")
}

fn default_manifest_filename() -> PathBuf {
    PathBuf::from("manifest.json")
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("interfaces")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            run_directory: None,
            shots_file: default_shots_filename(),
            manifest_file: default_manifest_filename(),
            archive_dir: default_archive_dir(),
        }
    }
}
