use ahash::AHashSet;

use crate::{
    error::{ChainError, Result},
    partition::{Partition, SwapSet},
};

/// Check whether the endpoints of edge `id` lie in different parts.
#[inline]
fn is_cut(partition: &Partition, id: usize) -> bool {
    let edge = partition.graph().edge(id);
    partition.assignment(edge.u) != partition.assignment(edge.v)
}

/// Ids of the edges incident to a node that actually moved, each listed once.
pub(super) fn touched_edges(partition: &Partition) -> Vec<usize> {
    let mut seen = AHashSet::new();
    partition.flips().iter()
        .filter(|flip| flip.is_move())
        .flat_map(|flip| partition.graph().incident(flip.node).map(|(_, id)| id))
        .filter(|&id| seen.insert(id))
        .collect()
}

pub(super) fn compute(partition: &Partition) -> SwapSet {
    (0..partition.graph().edge_count()).filter(|&id| is_cut(partition, id)).collect()
}

pub(super) fn update(partition: &Partition, previous: &SwapSet) -> SwapSet {
    let mut edges = previous.clone();
    for id in touched_edges(partition) {
        if is_cut(partition, id) { edges.insert(id); } else { edges.remove(id); }
    }
    edges
}

pub(super) fn compute_by_part(partition: &Partition) -> Vec<SwapSet> {
    let mut edges = vec![SwapSet::new(); partition.num_parts() as usize];
    for (id, edge) in partition.graph().all_edges().iter().enumerate() {
        let (a, b) = (partition.assignment(edge.u), partition.assignment(edge.v));
        if a != b {
            edges[a as usize].insert(id);
            edges[b as usize].insert(id);
        }
    }
    edges
}

pub(super) fn update_by_part(partition: &Partition, previous: &[SwapSet]) -> Vec<SwapSet> {
    let mut edges = previous.to_vec();
    for id in touched_edges(partition) {
        let edge = partition.graph().edge(id);

        let (a, b) = (partition.previous_part(edge.u), partition.previous_part(edge.v));
        if a != b {
            edges[a as usize].remove(id);
            edges[b as usize].remove(id);
        }

        let (a, b) = (partition.assignment(edge.u), partition.assignment(edge.v));
        if a != b {
            edges[a as usize].insert(id);
            edges[b as usize].insert(id);
        }
    }
    edges
}

impl Partition {
    /// Get the ids of the cut edges between parts `a` and `b`, ascending.
    ///
    /// Requires the `cut_edges_by_part` updater.
    pub fn cut_edges_between(&self, a: u32, b: u32) -> Result<Vec<usize>> {
        for part in [a, b] {
            assert!(part < self.num_parts(), "part {} out of range [0, {})", part, self.num_parts());
        }

        let by_part = self.get("cut_edges_by_part")?.as_edges_by_part()
            .ok_or_else(|| ChainError::config("statistic 'cut_edges_by_part' is not a per-part edge set"))?;

        let mut edges = by_part[a as usize].iter()
            .filter(|&id| {
                let edge = self.graph().edge(id);
                let parts = (self.assignment(edge.u), self.assignment(edge.v));
                parts == (a, b) || parts == (b, a)
            })
            .collect::<Vec<_>>();
        edges.sort_unstable();
        Ok(edges)
    }
}
