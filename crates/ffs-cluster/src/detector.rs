use std::collections::BTreeMap;

use ffs_core::{Configuration, FfsError, OrderClassifier, OrderParameter, Position, SimBox};
use tracing::trace;

use crate::adjacency::{check_cutoff, AdjacencyGraph};
use crate::components::{connected_components, ClusterPartition};

/// Partitions the `ordered` particles into clusters of neighbours closer
/// than `cutoff` under the box's periodic boundaries.
pub fn cluster_partition(
    positions: &[Position],
    ordered: &[usize],
    sim_box: &SimBox,
    cutoff: f64,
) -> Result<ClusterPartition, FfsError> {
    let graph = AdjacencyGraph::build(positions, ordered, sim_box, cutoff)?;
    let partition = connected_components(&graph);
    trace!(
        ordered = graph.node_count(),
        edges = graph.edge_count(),
        clusters = partition.cluster_count(),
        largest = partition.largest(),
        "clustered ordered particles"
    );
    Ok(partition)
}

/// Size of the largest cluster and the particle to cluster-id membership.
///
/// An empty `ordered` slice yields `(0, {})`.
pub fn largest_cluster(
    positions: &[Position],
    ordered: &[usize],
    sim_box: &SimBox,
    cutoff: f64,
) -> Result<(usize, BTreeMap<usize, usize>), FfsError> {
    let partition = cluster_partition(positions, ordered, sim_box, cutoff)?;
    Ok((partition.largest(), partition.into_membership()))
}

/// Order parameter equal to the size of the largest cluster of ordered
/// particles, as judged by the wrapped classifier.
#[derive(Debug, Clone)]
pub struct ClusterDetector<C> {
    classifier: C,
    cutoff: f64,
}

impl<C: OrderClassifier> ClusterDetector<C> {
    /// Creates a detector joining ordered particles closer than `cutoff`.
    pub fn new(classifier: C, cutoff: f64) -> Result<Self, FfsError> {
        check_cutoff(cutoff)?;
        Ok(Self { classifier, cutoff })
    }

    /// Cluster linking distance.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Wrapped classifier.
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Full cluster partition of a configuration.
    pub fn analyse(&self, config: &Configuration) -> Result<ClusterPartition, FfsError> {
        let ordered = self.classifier.ordered_indices(config)?;
        cluster_partition(&config.positions, &ordered, &config.sim_box, self.cutoff)
    }
}

impl<C: OrderClassifier> OrderParameter for ClusterDetector<C> {
    fn evaluate(&self, config: &Configuration) -> Result<f64, FfsError> {
        Ok(self.analyse(config)?.largest() as f64)
    }
}
