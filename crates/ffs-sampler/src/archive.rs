use std::fs;
use std::path::{Path, PathBuf};

use ffs_core::errors::{ErrorInfo, FfsError};
use ffs_core::{Configuration, RngHandle, RunProvenance};
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};

/// One configuration stored at an interface, with the weight of the shot
/// that delivered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedConfiguration {
    /// Order parameter at the time of archiving.
    pub order_parameter: f64,
    /// Statistical weight of the delivering shot (1 for flux crossings).
    pub weight: f64,
    /// Cycle count at which the configuration was reached.
    pub duration: usize,
    /// Particle configuration.
    pub configuration: Configuration,
}

/// Set of configurations collected at one interface, used as starting
/// points for shots toward the next interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceArchive {
    /// Interface index the configurations reached.
    pub interface: usize,
    /// Threshold of that interface.
    pub threshold: f64,
    /// Stored configurations in collection order.
    pub entries: Vec<ArchivedConfiguration>,
    /// Run provenance.
    pub provenance: RunProvenance,
}

impl InterfaceArchive {
    /// Empty archive for an interface.
    pub fn new(interface: usize, threshold: f64, provenance: RunProvenance) -> Self {
        Self {
            interface,
            threshold,
            entries: Vec::new(),
            provenance,
        }
    }

    /// Number of stored configurations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing has been archived.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of stored weights.
    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|entry| entry.weight).sum()
    }

    /// Picks a stored configuration with probability proportional to its
    /// weight. Returns its index too.
    ///
    /// A configuration that survived pruning trials stands for several
    /// unpruned paths, so it has to be drawn that much more often.
    pub fn pick(&self, rng: &mut RngHandle) -> Result<(usize, &ArchivedConfiguration), FfsError> {
        if self.entries.is_empty() {
            return Err(FfsError::Config(
                ErrorInfo::new("empty-archive", "no configuration to start shots from")
                    .with_context("interface", self.interface),
            ));
        }
        let weights = WeightedIndex::new(self.entries.iter().map(|entry| entry.weight))
            .map_err(|err| {
                FfsError::Config(
                    ErrorInfo::new("archive-weights", err.to_string())
                        .with_context("interface", self.interface),
                )
            })?;
        let index = weights.sample(rng);
        Ok((index, &self.entries[index]))
    }

    /// Restores an archive from disk.
    pub fn load(path: &Path) -> Result<Self, FfsError> {
        let contents =
            fs::read_to_string(path).map_err(|err| FfsError::io("archive-read", err, path))?;
        serde_json::from_str(&contents).map_err(|err| FfsError::io("archive-parse", err, path))
    }

    /// Writes the archive to disk.
    pub fn store(&self, path: &Path) -> Result<(), FfsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| FfsError::io("archive-mkdir", err, parent))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| FfsError::io("archive-serialize", err, path))?;
        fs::write(path, json).map_err(|err| FfsError::io("archive-write", err, path))
    }
}

/// Archive file path for an interface.
pub fn archive_path(root: &Path, interface: usize) -> PathBuf {
    root.join(format!("interface_{interface:03}.json"))
}
