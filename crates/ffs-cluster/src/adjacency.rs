use ffs_core::errors::{ErrorInfo, FfsError};
use ffs_core::{Position, SimBox};

/// Neighbour graph over the ordered particles of one configuration.
///
/// Nodes are particle indices; edges join pairs whose minimum-image distance
/// is strictly below the cutoff. The graph is rebuilt for every evaluation
/// and never refers back into the position buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyGraph {
    nodes: Vec<usize>,
    edges: Vec<(usize, usize)>,
}

impl AdjacencyGraph {
    /// Builds the graph for `ordered` particles of `positions`.
    ///
    /// `ordered` is canonicalised (sorted, duplicates removed) first. Indices
    /// that do not address a particle are rejected.
    pub fn build(
        positions: &[Position],
        ordered: &[usize],
        sim_box: &SimBox,
        cutoff: f64,
    ) -> Result<Self, FfsError> {
        check_cutoff(cutoff)?;
        let nodes = canonicalize_indices(ordered);
        if let Some(&last) = nodes.last() {
            if last >= positions.len() {
                return Err(FfsError::Geometry(
                    ErrorInfo::new("index-out-of-range", "ordered index has no particle")
                        .with_context("index", last)
                        .with_context("particles", positions.len()),
                ));
            }
        }

        let mut edges = Vec::new();
        for (slot_a, &i) in nodes.iter().enumerate() {
            let pos_i = &positions[i];
            for (offset, &j) in nodes[slot_a + 1..].iter().enumerate() {
                if sim_box.within_cutoff(pos_i, &positions[j], cutoff).is_some() {
                    edges.push((slot_a, slot_a + 1 + offset));
                }
            }
        }
        Ok(Self { nodes, edges })
    }

    /// Particle indices of the graph nodes, sorted ascending.
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// Edges as pairs of node slots (positions within [`Self::nodes`]).
    pub fn edge_slots(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Edges as pairs of particle indices.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges
            .iter()
            .map(|&(a, b)| (self.nodes[a], self.nodes[b]))
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns true when the particles `a` and `b` share an edge.
    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        let (Ok(slot_a), Ok(slot_b)) = (self.nodes.binary_search(&a), self.nodes.binary_search(&b))
        else {
            return false;
        };
        let key = (slot_a.min(slot_b), slot_a.max(slot_b));
        self.edges.contains(&key)
    }
}

pub(crate) fn check_cutoff(cutoff: f64) -> Result<(), FfsError> {
    if cutoff.is_finite() && cutoff > 0.0 {
        Ok(())
    } else {
        Err(FfsError::Config(
            ErrorInfo::new("cutoff", "neighbour cutoff must be finite and positive")
                .with_context("cutoff", cutoff),
        ))
    }
}

/// Sorts indices and removes duplicates.
pub(crate) fn canonicalize_indices(indices: &[usize]) -> Vec<usize> {
    let mut nodes = indices.to_vec();
    nodes.sort_unstable();
    nodes.dedup();
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_indices_collapse() {
        let sim_box = SimBox::cubic(10.0).unwrap();
        let positions = vec![[0.0; 3], [0.5, 0.0, 0.0], [5.0; 3]];
        let graph = AdjacencyGraph::build(&positions, &[1, 0, 1, 2], &sim_box, 1.0).unwrap();
        assert_eq!(graph.nodes(), &[0, 1, 2]);
        assert_eq!(graph.edges().collect::<Vec<_>>(), vec![(0, 1)]);
        assert!(graph.are_adjacent(1, 0));
        assert!(!graph.are_adjacent(0, 2));
    }

    #[test]
    fn rejects_bad_cutoff_and_index() {
        let sim_box = SimBox::cubic(10.0).unwrap();
        let positions = vec![[0.0; 3]];
        assert!(matches!(
            AdjacencyGraph::build(&positions, &[0], &sim_box, 0.0),
            Err(FfsError::Config(_))
        ));
        assert!(matches!(
            AdjacencyGraph::build(&positions, &[3], &sim_box, 1.0),
            Err(FfsError::Geometry(info)) if info.code == "index-out-of-range"
        ));
    }
}
