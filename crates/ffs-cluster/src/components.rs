use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::adjacency::AdjacencyGraph;

/// Union-find forest over node slots, with path halving and union by size.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    /// Creates `len` singleton sets.
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    /// Returns the representative of the set holding `idx`.
    pub fn find(&mut self, mut idx: usize) -> usize {
        while self.parent[idx] != idx {
            let grandparent = self.parent[self.parent[idx]];
            self.parent[idx] = grandparent;
            idx = grandparent;
        }
        idx
    }

    /// Merges the sets holding `a` and `b`. Returns false when already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        true
    }

    /// Size of the set holding `idx`.
    pub fn set_size(&mut self, idx: usize) -> usize {
        let root = self.find(idx);
        self.size[root]
    }
}

/// Partition of the ordered particles into clusters.
///
/// Cluster ids are dense, starting at zero, and assigned in order of each
/// cluster's smallest particle index. They are only meaningful within one
/// partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterPartition {
    membership: BTreeMap<usize, usize>,
    sizes: Vec<usize>,
}

impl ClusterPartition {
    /// Size of the largest cluster, zero for an empty partition.
    pub fn largest(&self) -> usize {
        self.sizes.iter().copied().max().unwrap_or(0)
    }

    /// Cluster sizes indexed by cluster id.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Particle index to cluster id.
    pub fn membership(&self) -> &BTreeMap<usize, usize> {
        &self.membership
    }

    /// Consumes the partition, returning the membership map.
    pub fn into_membership(self) -> BTreeMap<usize, usize> {
        self.membership
    }

    /// Cluster id of a particle, if it is ordered.
    pub fn cluster_of(&self, particle: usize) -> Option<usize> {
        self.membership.get(&particle).copied()
    }

    /// Sorted particle indices of a cluster.
    pub fn members(&self, cluster_id: usize) -> Vec<usize> {
        self.membership
            .iter()
            .filter(|&(_, &id)| id == cluster_id)
            .map(|(&particle, _)| particle)
            .collect()
    }

    /// Id of a largest cluster; ties resolve to the smallest id.
    pub fn largest_id(&self) -> Option<usize> {
        let largest = self.largest();
        self.sizes.iter().position(|&size| size == largest && size > 0)
    }

    /// Number of clusters.
    pub fn cluster_count(&self) -> usize {
        self.sizes.len()
    }

    /// Returns true when no particle is ordered.
    pub fn is_empty(&self) -> bool {
        self.membership.is_empty()
    }
}

/// Splits an adjacency graph into connected components.
pub fn connected_components(graph: &AdjacencyGraph) -> ClusterPartition {
    let mut forest = DisjointSet::new(graph.node_count());
    for &(a, b) in graph.edge_slots() {
        forest.union(a, b);
    }

    let mut root_to_id: BTreeMap<usize, usize> = BTreeMap::new();
    let mut membership = BTreeMap::new();
    let mut sizes = Vec::new();
    for (slot, &particle) in graph.nodes().iter().enumerate() {
        let root = forest.find(slot);
        let id = *root_to_id.entry(root).or_insert_with(|| {
            sizes.push(0);
            sizes.len() - 1
        });
        sizes[id] += 1;
        membership.insert(particle, id);
    }
    ClusterPartition { membership, sizes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_by_size_tracks_sizes() {
        let mut set = DisjointSet::new(5);
        assert!(set.union(0, 1));
        assert!(set.union(2, 3));
        assert!(set.union(1, 3));
        assert!(!set.union(0, 2));
        assert_eq!(set.set_size(3), 4);
        assert_eq!(set.set_size(4), 1);
        assert_eq!(set.find(0), set.find(2));
    }

    #[test]
    fn ids_follow_smallest_member() {
        let sim_box = ffs_core::SimBox::cubic(20.0).unwrap();
        let positions = vec![
            [10.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [10.5, 0.0, 0.0],
            [0.5, 0.0, 0.0],
            [1.0, 0.0, 0.0],
        ];
        let graph = AdjacencyGraph::build(&positions, &[0, 1, 2, 3, 4], &sim_box, 0.6).unwrap();
        let partition = connected_components(&graph);
        assert_eq!(partition.sizes(), &[2, 3]);
        assert_eq!(partition.members(0), vec![0, 2]);
        assert_eq!(partition.members(1), vec![1, 3, 4]);
        assert_eq!(partition.largest(), 3);
        assert_eq!(partition.largest_id(), Some(1));
    }
}
