use crate::{partition::{Partition, SwapSet}, updaters::cut_edges::touched_edges};

/// Shared boundary length of every cut edge, credited to both parts it separates.
pub(super) fn interior(partition: &Partition) -> Vec<f64> {
    let mut lengths = vec![0.0; partition.num_parts() as usize];
    for edge in partition.graph().all_edges() {
        let (a, b) = (partition.assignment(edge.u), partition.assignment(edge.v));
        if a != b {
            lengths[a as usize] += edge.weight;
            lengths[b as usize] += edge.weight;
        }
    }
    lengths
}

pub(super) fn update_interior(partition: &Partition, previous: &[f64]) -> Vec<f64> {
    let mut lengths = previous.to_vec();
    for id in touched_edges(partition) {
        let edge = partition.graph().edge(id);

        let (a, b) = (partition.previous_part(edge.u), partition.previous_part(edge.v));
        if a != b {
            lengths[a as usize] -= edge.weight;
            lengths[b as usize] -= edge.weight;
        }

        let (a, b) = (partition.assignment(edge.u), partition.assignment(edge.v));
        if a != b {
            lengths[a as usize] += edge.weight;
            lengths[b as usize] += edge.weight;
        }
    }
    lengths
}

/// Nodes of each part with a nonzero outer boundary contribution.
pub(super) fn nodes(partition: &Partition, column: &[f64]) -> Vec<SwapSet> {
    let mut nodes = vec![SwapSet::new(); partition.num_parts() as usize];
    for node in (0..partition.num_nodes()).filter(|&node| column[node] != 0.0) {
        nodes[partition.assignment(node) as usize].insert(node);
    }
    nodes
}

pub(super) fn update_nodes(partition: &Partition, previous: &[SwapSet], column: &[f64]) -> Vec<SwapSet> {
    let mut nodes = previous.to_vec();
    for flip in partition.flips().iter().filter(|flip| flip.is_move() && column[flip.node] != 0.0) {
        nodes[flip.from as usize].remove(flip.node);
        nodes[flip.to as usize].insert(flip.node);
    }
    nodes
}

/// Outer boundary plus shared boundary, per part.
pub(super) fn perimeters(exterior: &[f64], interior: &[f64]) -> Vec<f64> {
    exterior.iter().zip(interior).map(|(e, i)| e + i).collect()
}
