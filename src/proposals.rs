use rand::{Rng, RngCore};

use crate::{
    error::{ChainError, Result},
    partition::Partition,
    updaters::StatId,
};

/// Produces a candidate next state from the current one.
pub trait Proposal {
    fn propose(&self, partition: &Partition, rng: &mut dyn RngCore) -> Result<Partition>;

    /// Check that `partition` registers every statistic this proposal reads.
    fn ensure_supported(&self, _partition: &Partition) -> Result<()> { Ok(()) }
}

impl<P: Proposal + ?Sized> Proposal for Box<P> {
    fn propose(&self, partition: &Partition, rng: &mut dyn RngCore) -> Result<Partition> {
        (**self).propose(partition, rng)
    }

    fn ensure_supported(&self, partition: &Partition) -> Result<()> { (**self).ensure_supported(partition) }
}

/// Move one endpoint of a uniformly chosen cut edge into the part of the other endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomFlip {
    cut_edges: StatId,
}

impl RandomFlip {
    /// Bind the proposal to the `cut_edges` statistic of a partition lineage.
    pub fn new(partition: &Partition) -> Result<Self> {
        let cut_edges = partition.require("cut_edges")
            .map_err(|_| ChainError::config("random flip proposals need a 'cut_edges' updater"))?;
        Ok(Self { cut_edges })
    }
}

impl Proposal for RandomFlip {
    fn propose(&self, partition: &Partition, rng: &mut dyn RngCore) -> Result<Partition> {
        let edges = partition.stat(self.cut_edges).as_edges()
            .ok_or_else(|| ChainError::config("statistic 'cut_edges' is not an edge set"))?;
        if edges.is_empty() { return Err(ChainError::EmptyCutEdges) }

        let edge = partition.graph().edge(edges.as_slice()[rng.random_range(0..edges.len())]);
        let (node, other) = if rng.random_bool(0.5) { (edge.u, edge.v) } else { (edge.v, edge.u) };

        Ok(partition.flip_node(node, partition.assignment(other)))
    }

    fn ensure_supported(&self, partition: &Partition) -> Result<()> {
        match partition.updaters().id("cut_edges") {
            Some(id) if id == self.cut_edges => Ok(()),
            _ => Err(ChainError::config("random flip proposal is bound to a different partition lineage")),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{graph::Grid, updaters::UpdaterSet};

    #[test]
    fn flips_cross_a_cut_edge() {
        let grid = Grid::new(3, 3);
        let root = Partition::new(grid.graph(), &grid.row_stripes(3), UpdaterSet::new().cut_edges()).unwrap();
        let proposal = RandomFlip::new(&root).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let candidate = proposal.propose(&root, &mut rng).unwrap();
            let [flip] = candidate.flips() else { panic!("expected a single flip") };
            assert!(flip.is_move());
            assert!(root.node_borders_part(flip.node, flip.to));
            assert!(candidate.parent().unwrap().ptr_eq(&root));
        }
    }

    #[test]
    fn single_part_partitions_have_no_cut_edges() {
        let root = Partition::new(Grid::new(2, 2).graph(), &[1; 4], UpdaterSet::new().cut_edges()).unwrap();
        let proposal = RandomFlip::new(&root).unwrap();
        let err = proposal.propose(&root, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, ChainError::EmptyCutEdges);
    }

    #[test]
    fn cut_edges_updater_is_required() {
        let root = Partition::new(Grid::new(2, 2).graph(), &[1, 1, 2, 2], UpdaterSet::new()).unwrap();
        assert!(matches!(RandomFlip::new(&root), Err(ChainError::Configuration(_))));
    }
}
