use ahash::AHashMap;

/// An unordered set of indices with O(1) insert, remove, contains, and positional access.
///
/// Removal is swap-remove, so element order depends on the history of
/// operations (but never on hashing); equality ignores order.
#[derive(Clone, Debug, Default)]
pub struct SwapSet {
    items: Vec<usize>,
    position: AHashMap<usize, usize>, // position[e] = i when items[i] is e
}

impl SwapSet {
    pub fn new() -> Self { Self::default() }

    #[inline] pub fn len(&self) -> usize { self.items.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.items.is_empty() }

    #[inline] pub fn contains(&self, item: usize) -> bool { self.position.contains_key(&item) }

    /// Elements in storage order (suitable for uniform sampling by index).
    #[inline] pub fn as_slice(&self) -> &[usize] { &self.items }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ { self.items.iter().copied() }

    /// Elements in ascending order.
    pub fn sorted(&self) -> Vec<usize> {
        let mut items = self.items.clone();
        items.sort_unstable();
        items
    }

    /// Insert `item`, returning false if it was already present.
    pub fn insert(&mut self, item: usize) -> bool {
        if self.position.contains_key(&item) { return false }
        self.position.insert(item, self.items.len());
        self.items.push(item);
        true
    }

    /// Remove `item` by swapping in the last element, returning false if it was absent.
    pub fn remove(&mut self, item: usize) -> bool {
        let Some(pos) = self.position.remove(&item) else { return false };
        self.items.swap_remove(pos);
        if let Some(&moved) = self.items.get(pos) { self.position.insert(moved, pos); }
        true
    }
}

impl FromIterator<usize> for SwapSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::new();
        iter.into_iter().for_each(|item| { set.insert(item); });
        set
    }
}

impl PartialEq for SwapSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|item| other.contains(item))
    }
}

impl Eq for SwapSet {}
