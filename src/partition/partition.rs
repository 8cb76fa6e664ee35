use std::{cell::{OnceCell, RefCell}, fmt, rc::Rc, sync::Arc};

use crate::{
    error::{ChainError, Result},
    graph::Graph,
    partition::{Flip, Flips, SwapSet, structures::Assignment},
    updaters::{StatId, UpdaterSet, Updaters, Value},
};

/// Relative tolerance used when checking cached statistics against fresh ones.
const VERIFY_TOLERANCE: f64 = 1e-9;

/// A partition of a graph into parts (districts), with lazily computed statistics.
///
/// Partitions are cheap reference-counted handles: cloning one shares the same
/// state and statistic cache. A partition derived with [`Partition::flip`]
/// keeps a link to its parent so statistics can be updated incrementally; the
/// link is dropped as soon as every incremental statistic has been cached.
#[derive(Clone)]
pub struct Partition(Rc<Inner>);

pub(super) struct Inner {
    pub(super) graph: Arc<Graph>,
    pub(super) updaters: Arc<Updaters>,
    pub(super) labels: Rc<[u32]>,         // labels[part] = district label from the source assignment
    pub(super) assignment: Assignment,
    pub(super) sizes: Vec<u32>,           // sizes[part] = number of nodes in part
    pub(super) flips: Flips,
    pub(super) generation: u64,
    pub(super) parent: RefCell<Option<Partition>>,
    pub(super) cache: Box<[OnceCell<Value>]>,
}

impl Drop for Inner {
    // Unlink long parent chains iteratively instead of recursing through nested drops.
    fn drop(&mut self) {
        let mut parent = self.parent.get_mut().take();
        while let Some(Partition(rc)) = parent {
            parent = match Rc::try_unwrap(rc) {
                Ok(mut inner) => inner.parent.get_mut().take(),
                Err(_) => None,
            };
        }
    }
}

impl Partition {
    /// Construct a root partition from district labels, one per node.
    ///
    /// Labels may be any `u32`s; parts are numbered `0..k` in ascending label order.
    pub fn new(graph: impl Into<Arc<Graph>>, assignment: &[u32], updaters: UpdaterSet) -> Result<Self> {
        let graph: Arc<Graph> = graph.into();
        if graph.node_count() == 0 {
            return Err(ChainError::config("cannot partition an empty graph"));
        }
        if assignment.len() != graph.node_count() {
            return Err(ChainError::config(format!(
                "assignment has {} entries but the graph has {} nodes", assignment.len(), graph.node_count(),
            )));
        }

        let updaters = Arc::new(updaters.resolve(&graph)?);

        let mut labels = assignment.to_vec();
        labels.sort_unstable();
        labels.dedup();

        let parts = assignment.iter()
            .map(|label| labels.partition_point(|l| l < label) as u32)
            .collect::<Vec<_>>();

        let mut sizes = vec![0u32; labels.len()];
        parts.iter().for_each(|&part| sizes[part as usize] += 1);

        Ok(Self::from_inner(Inner {
            cache: empty_cache(updaters.len()),
            graph,
            updaters,
            labels: labels.into(),
            assignment: Assignment::new(parts),
            sizes,
            flips: Flips::new(),
            generation: 0,
            parent: RefCell::new(None),
        }))
    }

    #[inline] pub(super) fn from_inner(inner: Inner) -> Self { Self(Rc::new(inner)) }

    #[inline] pub(super) fn inner(&self) -> &Inner { &self.0 }

    /// Get a reference to the underlying graph.
    #[inline] pub fn graph(&self) -> &Graph { &self.0.graph }

    /// Get the resolved statistic registry.
    #[inline] pub fn updaters(&self) -> &Updaters { &self.0.updaters }

    /// Get the number of nodes in the underlying graph.
    #[inline] pub fn num_nodes(&self) -> usize { self.0.graph.node_count() }

    /// Get the number of parts in this partition.
    #[inline] pub fn num_parts(&self) -> u32 { self.0.labels.len() as u32 }

    /// Get the part assignment of a given node.
    #[inline] pub fn assignment(&self, node: usize) -> u32 { self.0.assignment.get(node) }

    /// Get a complete vector of assignments for each node.
    #[inline] pub fn assignments(&self) -> Vec<u32> { self.0.assignment.to_vec() }

    /// Get the source district label of each part.
    #[inline] pub fn labels(&self) -> &[u32] { &self.0.labels }

    /// Get the source district label of a given part.
    #[inline] pub fn label(&self, part: u32) -> u32 { self.0.labels[part as usize] }

    /// Get the number of nodes in a given part.
    #[inline] pub fn part_size(&self, part: u32) -> usize { self.0.sizes[part as usize] as usize }

    /// Get the number of nodes in each part.
    #[inline] pub fn part_sizes(&self) -> &[u32] { &self.0.sizes }

    /// Check if a part has no assigned nodes.
    #[inline] pub fn part_is_empty(&self, part: u32) -> bool { self.part_size(part) == 0 }

    /// Get the nodes currently assigned to a given part.
    pub fn nodes(&self, part: u32) -> Vec<usize> {
        (0..self.num_nodes()).filter(|&node| self.assignment(node) == part).collect()
    }

    /// Get the reassignments applied relative to the parent (empty for a root partition).
    #[inline] pub fn flips(&self) -> &[Flip] { &self.0.flips }

    /// Get the number of flips between this partition and its lineage root.
    #[inline] pub fn generation(&self) -> u64 { self.0.generation }

    /// Get the parent partition, if it is still linked.
    #[inline] pub fn parent(&self) -> Option<Partition> { self.0.parent.borrow().clone() }

    /// Get the part a node held before this partition's flips were applied.
    pub fn previous_part(&self, node: usize) -> u32 {
        self.0.flips.iter()
            .find(|flip| flip.node == node)
            .map_or_else(|| self.assignment(node), |flip| flip.from)
    }

    /// Check whether two handles share the same underlying partition.
    #[inline] pub fn ptr_eq(&self, other: &Partition) -> bool { Rc::ptr_eq(&self.0, &other.0) }

    /// Resolve a statistic name to its id.
    #[inline] pub fn stat_id(&self, name: &str) -> Option<StatId> { self.0.updaters.id(name) }

    /// Resolve a statistic name to its id, failing if no such updater is registered.
    pub fn require(&self, name: &str) -> Result<StatId> {
        self.stat_id(name).ok_or_else(|| ChainError::config(format!("no updater named '{name}' is registered")))
    }

    /// Look up a statistic by name.
    pub fn get(&self, name: &str) -> Result<&Value> {
        Ok(self.stat(self.require(name)?))
    }

    /// Look up a per-part statistic (tallies, boundaries, perimeters, scores) by name.
    pub fn per_part(&self, name: &str) -> Result<&[f64]> {
        self.get(name)?.as_per_part()
            .ok_or_else(|| ChainError::config(format!("statistic '{name}' is not a per-part value")))
    }

    /// Look up the `cut_edges` statistic.
    pub fn cut_edges(&self) -> Result<&SwapSet> {
        self.get("cut_edges")?.as_edges()
            .ok_or_else(|| ChainError::config("statistic 'cut_edges' is not an edge set"))
    }

    /// Check whether a statistic is already cached on this partition.
    #[inline] pub fn is_cached(&self, id: StatId) -> bool { self.0.cache[id.index()].get().is_some() }

    /// Look up a statistic by id, computing and caching it on first access.
    ///
    /// Incremental statistics are derived from the nearest ancestor that holds
    /// them (or computed at the lineage root) and then updated flip by flip.
    pub fn stat(&self, id: StatId) -> &Value {
        let cell = &self.0.cache[id.index()];
        if let Some(value) = cell.get() { return value }

        let updater = self.0.updaters.kind(id);
        let value = if updater.is_incremental() {
            // Walk up to the nearest ancestor holding this statistic, or the root.
            let mut lineage = Vec::new();
            let mut cursor = self.parent();
            while let Some(partition) = cursor {
                cursor = if partition.is_cached(id) { None } else { partition.parent() };
                lineage.push(partition);
            }

            match lineage.split_last() {
                None => cell.get_or_init(|| updater.compute(self)),
                Some((top, rest)) => {
                    let mut previous = top.0.cache[id.index()].get_or_init(|| updater.compute(top));
                    for partition in rest.iter().rev() {
                        previous = partition.0.cache[id.index()].get_or_init(|| updater.update(partition, previous));
                        partition.release_parent_if_settled();
                    }
                    cell.get_or_init(|| updater.update(self, previous))
                }
            }
        } else {
            cell.get_or_init(|| updater.compute(self))
        };

        self.release_parent_if_settled();
        value
    }

    /// Recompute a statistic from scratch, bypassing (and not touching) the cache.
    pub fn fresh(&self, id: StatId) -> Value {
        self.0.updaters.kind(id).compute(self)
    }

    /// Force every incremental statistic, then drop the parent link.
    pub fn settle(&self) {
        for id in self.0.updaters.incremental() { self.stat(id); }
        self.0.parent.borrow_mut().take();
    }

    /// Check every cached incremental statistic against a fresh recomputation.
    pub fn verify_incremental(&self) -> Result<()> {
        for id in self.0.updaters.incremental() {
            let Some(cached) = self.0.cache[id.index()].get() else { continue };
            if !cached.approx_eq(&self.fresh(id), VERIFY_TOLERANCE) {
                return Err(ChainError::StaleStatistic { name: self.0.updaters.name(id).to_string() });
            }
        }
        Ok(())
    }

    /// Drop the parent link once nothing on this partition can still need it.
    fn release_parent_if_settled(&self) {
        if self.0.parent.borrow().is_none() { return }
        if self.0.updaters.incremental().all(|id| self.is_cached(id)) {
            self.0.parent.borrow_mut().take();
        }
    }
}

/// One empty cache slot per registered statistic.
pub(super) fn empty_cache(len: usize) -> Box<[OnceCell<Value>]> {
    (0..len).map(|_| OnceCell::new()).collect()
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partition")
            .field("generation", &self.0.generation)
            .field("labels", &self.0.labels)
            .field("sizes", &self.0.sizes)
            .field("flips", &self.0.flips)
            .field("linked", &self.0.parent.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Grid;

    fn grid_partition(updaters: UpdaterSet) -> Partition {
        let grid = Grid::new(2, 2);
        Partition::new(grid.graph(), &[3, 3, 7, 7], updaters).unwrap()
    }

    #[test]
    fn labels_are_compacted_in_order() {
        let partition = grid_partition(UpdaterSet::new());
        assert_eq!(partition.num_parts(), 2);
        assert_eq!(partition.labels(), &[3, 7]);
        assert_eq!(partition.assignments(), vec![0, 0, 1, 1]);
        assert_eq!(partition.part_sizes(), &[2, 2]);
        assert_eq!(partition.nodes(1), vec![2, 3]);
        assert_eq!(partition.generation(), 0);
    }

    #[test]
    fn assignment_length_mismatch_is_a_configuration_error() {
        let err = Partition::new(Grid::new(2, 2).graph(), &[1, 1, 2], UpdaterSet::new()).unwrap_err();
        assert_eq!(err, ChainError::config("assignment has 3 entries but the graph has 4 nodes"));
    }

    #[test]
    fn empty_graph_is_a_configuration_error() {
        let err = Partition::new(Graph::new(0, &[]), &[], UpdaterSet::new()).unwrap_err();
        assert!(matches!(err, ChainError::Configuration(_)));
    }

    #[test]
    fn unknown_statistic_is_a_configuration_error() {
        let partition = grid_partition(UpdaterSet::new());
        assert!(matches!(partition.get("population"), Err(ChainError::Configuration(_))));
    }

    #[test]
    fn statistics_are_memoized() {
        let partition = grid_partition(UpdaterSet::new().tally("population", "population"));
        let id = partition.stat_id("population").unwrap();
        assert!(!partition.is_cached(id));

        let first = partition.stat(id) as *const Value;
        assert!(partition.is_cached(id));
        assert_eq!(first, partition.stat(id) as *const Value);
        assert_eq!(partition.per_part("population").unwrap(), &[2.0, 2.0]);
    }

    #[test]
    fn parent_is_released_once_incremental_statistics_are_cached() {
        let root = grid_partition(UpdaterSet::new().tally("population", "population").cut_edges());
        let child = root.flip(&[(1, 1)]);
        assert!(child.parent().is_some());

        child.per_part("population").unwrap();
        assert!(child.parent().is_some());

        child.cut_edges().unwrap();
        assert!(child.parent().is_none());
        assert_eq!(child.cut_edges().unwrap().sorted(), vec![0, 1]);
    }

    #[test]
    fn deep_lineages_are_resolved_iteratively() {
        let root = grid_partition(UpdaterSet::new().tally("population", "population"));
        let mut partition = root.clone();
        for i in 0..10_000 {
            partition = partition.flip(&[(1, (i % 2 == 0) as u32)]);
        }
        assert_eq!(partition.generation(), 10_000);
        assert_eq!(partition.per_part("population").unwrap(), &[2.0, 2.0]);
        assert!(partition.parent().is_none());
    }

    #[test]
    fn settle_drops_the_parent() {
        let root = grid_partition(UpdaterSet::new().cut_edges());
        let child = root.flip(&[(0, 1)]);
        child.settle();
        assert!(child.parent().is_none());
        assert!(child.is_cached(child.stat_id("cut_edges").unwrap()));
        assert!(child.verify_incremental().is_ok());
    }

    #[test]
    fn previous_part_reports_the_pre_flip_assignment() {
        let root = grid_partition(UpdaterSet::new());
        let child = root.flip(&[(2, 0)]);
        assert_eq!(child.previous_part(2), 1);
        assert_eq!(child.previous_part(3), 1);
        assert_eq!(child.assignment(2), 0);
    }
}
