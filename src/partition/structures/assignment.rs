use std::rc::Rc;

use ahash::AHashMap;

/// Node-to-part assignment stored as a shared base vector plus a small overlay of changes.
///
/// Deriving a new assignment clones only the overlay; once the overlay grows
/// past `compaction_threshold` it is folded into a fresh base.
#[derive(Clone, Debug)]
pub(crate) struct Assignment {
    base: Rc<[u32]>,
    delta: AHashMap<usize, u32>,
}

/// Overlay size at which a derived assignment is materialized.
fn compaction_threshold(num_nodes: usize) -> usize { num_nodes.isqrt().max(64) }

impl Assignment {
    pub(crate) fn new(parts: Vec<u32>) -> Self {
        Self { base: parts.into(), delta: AHashMap::new() }
    }

    #[inline] pub(crate) fn len(&self) -> usize { self.base.len() }

    /// Get the part of a given node.
    #[inline]
    pub(crate) fn get(&self, node: usize) -> u32 {
        self.delta.get(&node).copied().unwrap_or(self.base[node])
    }

    /// Get a complete vector of parts for each node.
    pub(crate) fn to_vec(&self) -> Vec<u32> {
        let mut parts = self.base.to_vec();
        self.delta.iter().for_each(|(&node, &part)| parts[node] = part);
        parts
    }

    /// Derive a new assignment with the given `(node, part)` changes applied.
    pub(crate) fn with_changes(&self, changes: impl IntoIterator<Item = (usize, u32)>) -> Self {
        let mut next = self.clone();
        for (node, part) in changes {
            if self.base[node] == part { next.delta.remove(&node); } else { next.delta.insert(node, part); }
        }

        if next.delta.len() > compaction_threshold(self.len()) { Self::new(next.to_vec()) } else { next }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_do_not_touch_the_original() {
        let base = Assignment::new(vec![0, 0, 1, 1]);
        let next = base.with_changes([(1, 1)]);
        assert_eq!(base.to_vec(), vec![0, 0, 1, 1]);
        assert_eq!(next.to_vec(), vec![0, 1, 1, 1]);
        assert_eq!(next.get(1), 1);
    }

    #[test]
    fn reverting_a_change_clears_the_overlay() {
        let next = Assignment::new(vec![0, 1]).with_changes([(0, 1)]).with_changes([(0, 0)]);
        assert!(next.delta.is_empty());
        assert_eq!(next.to_vec(), vec![0, 1]);
    }

    #[test]
    fn large_overlays_are_compacted() {
        let mut assignment = Assignment::new(vec![0; 100]);
        for node in 0..65 {
            assignment = assignment.with_changes([(node, 1)]);
        }
        assert!(assignment.delta.is_empty());
        assert_eq!(assignment.to_vec().iter().filter(|&&p| p == 1).count(), 65);
    }
}
