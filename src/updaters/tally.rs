use crate::partition::Partition;

/// Sum `column` over the nodes of each part.
pub(super) fn compute(partition: &Partition, column: &[f64]) -> Vec<f64> {
    let mut totals = vec![0.0; partition.num_parts() as usize];
    (0..partition.num_nodes()).for_each(|node| totals[partition.assignment(node) as usize] += column[node]);
    totals
}

/// Move each flipped node's value from its previous part to its new one.
pub(super) fn update(partition: &Partition, previous: &[f64], column: &[f64]) -> Vec<f64> {
    let mut totals = previous.to_vec();
    for flip in partition.flips().iter().filter(|flip| flip.is_move()) {
        totals[flip.from as usize] -= column[flip.node];
        totals[flip.to as usize] += column[flip.node];
    }
    totals
}

#[cfg(test)]
mod tests {
    use crate::{graph::Grid, partition::Partition, updaters::UpdaterSet};

    #[test]
    fn tally_follows_flips() {
        let grid = Grid::new(3, 1);
        let mut graph = grid.graph();
        graph.set_numeric("votes", vec![10.0, 20.0, 5.0]).unwrap();

        let root = Partition::new(graph, &[1, 1, 2], UpdaterSet::new().tally("votes", "votes")).unwrap();
        assert_eq!(root.per_part("votes").unwrap(), &[30.0, 5.0]);

        let child = root.flip_node(1, 1);
        assert_eq!(child.per_part("votes").unwrap(), &[10.0, 25.0]);
        assert_eq!(root.per_part("votes").unwrap(), &[30.0, 5.0]);
    }
}
