use std::cell::RefCell;

use smallvec::SmallVec;

use crate::partition::{Partition, partition::{Inner, empty_cache}};

/// A single node reassignment relative to a parent partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Flip {
    pub node: usize,
    pub from: u32,
    pub to: u32,
}

impl Flip {
    /// Check whether this flip actually changes the node's part.
    #[inline] pub fn is_move(&self) -> bool { self.from != self.to }
}

/// Flips applied by one proposal; almost always a single node.
pub(crate) type Flips = SmallVec<[Flip; 1]>;

impl Partition {
    /// Derive a new partition with the given `(node, part)` reassignments applied.
    ///
    /// The parent is left untouched. Statistics on the child are not computed
    /// until they are read. A node listed more than once takes its last part.
    pub fn flip(&self, changes: &[(usize, u32)]) -> Partition {
        let mut flips = Flips::with_capacity(changes.len());
        for &(node, part) in changes {
            assert!(node < self.num_nodes(), "node {} out of range", node);
            assert!(part < self.num_parts(), "part {} out of range [0, {})", part, self.num_parts());

            match flips.iter_mut().find(|flip| flip.node == node) {
                Some(flip) => flip.to = part,
                None => flips.push(Flip { node, from: self.assignment(node), to: part }),
            }
        }

        let inner = self.inner();
        let mut sizes = inner.sizes.clone();
        for flip in flips.iter().filter(|flip| flip.is_move()) {
            sizes[flip.from as usize] -= 1;
            sizes[flip.to as usize] += 1;
        }

        Partition::from_inner(Inner {
            graph: inner.graph.clone(),
            updaters: inner.updaters.clone(),
            labels: inner.labels.clone(),
            assignment: inner.assignment.with_changes(flips.iter().map(|flip| (flip.node, flip.to))),
            sizes,
            flips,
            generation: inner.generation + 1,
            parent: RefCell::new(Some(self.clone())),
            cache: empty_cache(inner.updaters.len()),
        })
    }

    /// Derive a new partition with a single node moved to `part`.
    #[inline] pub fn flip_node(&self, node: usize, part: u32) -> Partition { self.flip(&[(node, part)]) }
}
