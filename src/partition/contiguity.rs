use std::collections::VecDeque;

use ahash::AHashSet;

use crate::partition::Partition;

impl Partition {
    /// Check if a node borders a given part.
    pub fn node_borders_part(&self, node: usize, part: u32) -> bool {
        assert!(node < self.num_nodes(), "node {} out of range", node);
        assert!(part < self.num_parts(), "part must be in range [0, {})", self.num_parts());

        self.graph().edges(node).any(|v| self.assignment(v) == part)
    }

    /// Find all connected components (as node lists) inside part `part`.
    pub fn find_components(&self, part: u32) -> Vec<Vec<usize>> {
        let mut components = Vec::new();

        let mut visited = vec![false; self.num_nodes()];
        for u in (0..self.num_nodes()).filter(|&u| self.assignment(u) == part) {
            if !visited[u] {
                visited[u] = true;
                let mut component = Vec::new();
                let mut queue = VecDeque::from([u]);
                while let Some(v) = queue.pop_front() {
                    component.push(v);
                    for w in self.graph().edges(v) {
                        if self.assignment(w) == part && !visited[w] {
                            visited[w] = true;
                            queue.push_back(w);
                        }
                    }
                }
                components.push(component);
            }
        }
        components
    }

    /// Check if every part induces a connected subgraph (an empty part counts as contiguous).
    pub fn is_contiguous(&self) -> bool {
        (0..self.num_parts()).all(|part| self.find_components(part).len() <= 1)
    }

    /// Check that the flips applied to this partition kept every touched part connected.
    ///
    /// Only the parts named by the flips are searched, and each search stops
    /// once the nodes that could have been separated are reached again. A
    /// partition with no flips is checked globally.
    pub fn flips_preserve_contiguity(&self) -> bool {
        let moves = self.flips().iter().filter(|flip| flip.is_move()).collect::<Vec<_>>();
        if self.flips().is_empty() { return self.is_contiguous() }
        if moves.is_empty() { return true }

        let moved = moves.iter().map(|flip| flip.node).collect::<AHashSet<_>>();

        let mut parts = moves.iter().flat_map(|flip| [flip.from, flip.to]).collect::<Vec<_>>();
        parts.sort_unstable();
        parts.dedup();

        parts.into_iter().all(|part| {
            // Nodes that moved into this part must be reachable from each other...
            let gained = moves.iter()
                .filter(|flip| flip.to == part)
                .map(|flip| flip.node)
                .collect::<Vec<_>>();

            // ...and from every untouched member bordering a moved node.
            let mut anchors = gained.clone();
            for &node in &moved {
                for v in self.graph().edges(node) {
                    if !moved.contains(&v) && self.assignment(v) == part && !anchors.contains(&v) {
                        anchors.push(v);
                    }
                }
            }

            // A part that kept members of its own has to touch them from the gained nodes.
            let kept = self.part_size(part) - gained.len();
            if kept > 0 && !gained.is_empty() && anchors.len() == gained.len() { return false }

            self.anchors_connected(part, &anchors)
        })
    }

    /// BFS inside `part` from the first anchor, exiting early once every anchor is seen.
    fn anchors_connected(&self, part: u32, anchors: &[usize]) -> bool {
        if anchors.len() <= 1 { return true }

        let targets = anchors.iter().copied().collect::<AHashSet<_>>();
        let mut visited = AHashSet::from_iter([anchors[0]]);
        let mut remaining = targets.len() - 1;

        let mut queue = VecDeque::from([anchors[0]]);
        while let Some(u) = queue.pop_front() {
            for v in self.graph().edges(u) {
                if self.assignment(v) == part && visited.insert(v) {
                    queue.push_back(v);
                    if targets.contains(&v) { remaining -= 1; if remaining == 0 { return true } }
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use crate::{graph::Grid, partition::Partition, updaters::UpdaterSet};

    fn columns(width: usize, height: usize, parts: usize) -> Partition {
        let grid = Grid::new(width, height);
        Partition::new(grid.graph(), &grid.column_stripes(parts), UpdaterSet::new()).unwrap()
    }

    #[test]
    fn stripes_are_contiguous() {
        let partition = columns(4, 3, 2);
        assert!(partition.is_contiguous());
        assert!(partition.flips_preserve_contiguity());
        assert_eq!(partition.find_components(0).len(), 1);
    }

    #[test]
    fn moving_a_bridge_node_disconnects_the_donor() {
        // Path 0-1-2-3 with parts [0, 0, 0, 1]; node 1 holds part 0 together.
        let root = Partition::new(Grid::new(4, 1).graph(), &[1, 1, 1, 2], UpdaterSet::new()).unwrap();
        let child = root.flip_node(1, 1);
        assert!(!child.flips_preserve_contiguity());
        assert!(!child.is_contiguous());
    }

    #[test]
    fn moving_a_leaf_node_keeps_both_parts_connected() {
        let root = columns(4, 2, 2);
        // Node 1 sits in the first column pair, adjacent to node 2 in the second.
        let child = root.flip_node(1, 1);
        assert!(child.flips_preserve_contiguity());
        assert!(child.is_contiguous());
    }

    #[test]
    fn a_detached_receiver_is_rejected() {
        // Path 0-1-2-3-4 with parts [0, 0, 1, 1, 0]: node 0 does not touch part 1.
        let root = Partition::new(Grid::new(5, 1).graph(), &[0, 0, 1, 1, 0], UpdaterSet::new()).unwrap();
        let child = root.flip_node(0, 1);
        assert!(!child.flips_preserve_contiguity());
        assert!(!child.is_contiguous());
    }

    #[test]
    fn swapping_nodes_across_the_border_keeps_both_parts_connected() {
        // 4x2 grid split into two 2x2 blocks; nodes 1 and 6 trade places.
        let root = columns(4, 2, 2);
        let child = root.flip(&[(1, 1), (6, 0)]);
        assert_eq!(child.nodes(0), vec![0, 4, 5, 6]);
        assert!(child.flips_preserve_contiguity());
        assert!(child.is_contiguous());
    }

    #[test]
    fn a_swap_that_splits_both_parts_is_rejected() {
        // Path 0-1-2-3 with parts [0, 0, 1, 1]; trading 1 and 2 interleaves them.
        let root = Partition::new(Grid::new(4, 1).graph(), &[1, 1, 2, 2], UpdaterSet::new()).unwrap();
        let child = root.flip(&[(1, 1), (2, 0)]);
        assert!(!child.flips_preserve_contiguity());
        assert!(!child.is_contiguous());
    }

    #[test]
    fn a_run_of_gained_nodes_may_reach_the_part_through_each_other() {
        // Path 0-1-2-3-4 with parts [0, 0, 0, 1, 1]; only node 2 touches part 1.
        let root = Partition::new(Grid::new(5, 1).graph(), &[1, 1, 1, 2, 2], UpdaterSet::new()).unwrap();

        let attached = root.flip(&[(1, 1), (2, 1)]);
        assert!(attached.flips_preserve_contiguity());
        assert!(attached.is_contiguous());

        let detached = root.flip(&[(0, 1), (1, 1)]);
        assert!(!detached.flips_preserve_contiguity());
        assert!(!detached.is_contiguous());
    }

    #[test]
    fn unmoved_flips_are_trivially_contiguous() {
        let root = columns(2, 2, 2);
        let child = root.flip_node(0, root.assignment(0));
        assert!(child.flips_preserve_contiguity());
    }
}
