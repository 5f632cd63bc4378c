use std::fs;
use std::path::{Path, PathBuf};

use ffs_core::errors::FfsError;
use ffs_core::RunProvenance;
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::metrics::{FluxStats, InterfaceStats};

/// Progress of a run as recorded in its manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    /// Stages remain to be sampled.
    InProgress,
    /// Every interface has been sampled.
    Complete,
    /// An interface stage produced no success; the rate estimate is zero.
    Exhausted,
}

/// Structured manifest describing a completed or running FFS run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Configuration used for the run.
    pub config: RunConfig,
    /// Hash, seed and tool versions.
    pub provenance: RunProvenance,
    /// Where the run stands.
    pub status: RunStatus,
    /// Flux-stage summary.
    pub flux: FluxStats,
    /// Completed interface stages in ladder order.
    pub interfaces: Vec<InterfaceStats>,
    /// Flux times the product of the completed crossing probabilities.
    pub rate: f64,
    /// Shot log, relative to the run directory.
    pub shots_file: PathBuf,
    /// Interface archives relative to the run directory, starting at λ0.
    pub archives: Vec<PathBuf>,
}

impl RunManifest {
    /// Writes the manifest to a JSON file.
    pub fn write(&self, path: &Path) -> Result<(), FfsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| FfsError::io("manifest-mkdir", err, parent))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| FfsError::io("manifest-serialize", err, path))?;
        fs::write(path, json).map_err(|err| FfsError::io("manifest-write", err, path))
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, FfsError> {
        let contents =
            fs::read_to_string(path).map_err(|err| FfsError::io("manifest-read", err, path))?;
        serde_json::from_str(&contents).map_err(|err| FfsError::io("manifest-parse", err, path))
    }
}
