#![deny(missing_docs)]

//! Largest crystalline cluster detection under periodic boundaries.
//!
//! Ordered particles are joined whenever their minimum-image separation is
//! strictly below a cutoff; the size of the largest connected component is
//! the order parameter tracked by the sampler.

/// Periodic neighbour graph over ordered particles.
pub mod adjacency;
/// Coordination-number local order classifier.
pub mod classifier;
/// Union-find and the resulting cluster partition.
pub mod components;
/// Largest-cluster order parameter.
pub mod detector;

pub use adjacency::AdjacencyGraph;
pub use classifier::CoordinationClassifier;
pub use components::{connected_components, ClusterPartition, DisjointSet};
pub use detector::{cluster_partition, largest_cluster, ClusterDetector};
