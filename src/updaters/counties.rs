use std::{collections::BTreeMap, sync::Arc};

use crate::{
    error::{ChainError, Result},
    graph::Graph,
    partition::Partition,
    updaters::Updater,
};

/// For each county, the parts its nodes are assigned to and how many nodes each holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountySplits {
    names: Arc<[String]>,
    parts: Vec<BTreeMap<u32, u32>>, // parts[county][part] = node count
}

impl CountySplits {
    #[inline] pub fn num_counties(&self) -> usize { self.names.len() }

    #[inline] pub fn name(&self, county: usize) -> &str { &self.names[county] }

    /// Look up a county index by its column value.
    pub fn county(&self, name: &str) -> Option<usize> { self.names.iter().position(|n| n == name) }

    /// Get the parts a county's nodes fall in, ascending.
    pub fn parts(&self, county: usize) -> impl Iterator<Item = u32> + '_ { self.parts[county].keys().copied() }

    /// Get the number of a county's nodes assigned to `part`.
    pub fn node_count(&self, county: usize, part: u32) -> u32 { self.parts[county].get(&part).copied().unwrap_or(0) }

    /// Check if a county's nodes fall in more than one part.
    #[inline] pub fn is_split(&self, county: usize) -> bool { self.parts[county].len() > 1 }

    /// Get the names of every split county.
    pub fn split_counties(&self) -> Vec<&str> {
        (0..self.num_counties()).filter(|&c| self.is_split(c)).map(|c| self.name(c)).collect()
    }

    /// Get the total number of extra parts counties are split into (zero when no county is split).
    pub fn num_splits(&self) -> usize {
        self.parts.iter().map(|parts| parts.len().saturating_sub(1)).sum()
    }
}

/// Bind a county column, categorical or numeric, to dense county indices.
pub(super) fn resolve(graph: &Graph, name: &str, column: &str) -> Result<Updater> {
    let values = if let Some(values) = graph.categorical(column) {
        values.to_vec()
    } else if let Some(values) = graph.numeric(column) {
        values.iter().map(|value| value.to_string()).collect()
    } else {
        return Err(ChainError::config(format!("updater '{name}' needs missing county column '{column}'")));
    };

    let mut names = values.clone();
    names.sort_unstable();
    names.dedup();

    let counties = values.iter()
        .map(|value| names.partition_point(|n| n < value) as u32)
        .collect::<Arc<[u32]>>();

    Ok(Updater::CountySplits { counties, names: names.into() })
}

pub(super) fn compute(partition: &Partition, counties: &[u32], names: Arc<[String]>) -> CountySplits {
    let mut parts = vec![BTreeMap::new(); names.len()];
    for node in 0..partition.num_nodes() {
        *parts[counties[node] as usize].entry(partition.assignment(node)).or_insert(0) += 1;
    }
    CountySplits { names, parts }
}

pub(super) fn update(partition: &Partition, previous: &CountySplits, counties: &[u32]) -> CountySplits {
    let mut splits = previous.clone();
    for flip in partition.flips().iter().filter(|flip| flip.is_move()) {
        let parts = &mut splits.parts[counties[flip.node] as usize];
        if let Some(count) = parts.get_mut(&flip.from) {
            *count -= 1;
            if *count == 0 { parts.remove(&flip.from); }
        }
        *parts.entry(flip.to).or_insert(0) += 1;
    }
    splits
}
