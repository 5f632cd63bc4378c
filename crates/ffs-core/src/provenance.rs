//! Run provenance stamped on every FFS artefact.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Layout version of archives and manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Bumped when older readers can no longer load the artefact.
    pub major: u32,
    /// Bumped for additive fields.
    pub minor: u32,
}

impl SchemaVersion {
    /// Layout written by this build.
    pub const CURRENT: SchemaVersion = SchemaVersion::new(1, 0);

    /// Creates a schema version.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Returns true when an artefact written with `other` can be read by a
    /// build writing `self`.
    pub fn reads(&self, other: &SchemaVersion) -> bool {
        self.major == other.major && other.minor <= self.minor
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// Seed, configuration hash and tool versions of the run that wrote an
/// archive or manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Artefact layout version.
    #[serde(default)]
    pub schema_version: SchemaVersion,
    /// SHA-256 of the run configuration, hex encoded.
    pub config_hash: String,
    /// Master seed.
    pub seed: u64,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// Crate name to version.
    pub tool_versions: BTreeMap<String, String>,
}
