use crate::{partition::SwapSet, updaters::CountySplits};

/// A computed statistic.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// One number per part (tallies, boundary lengths, scores).
    PerPart(Vec<f64>),
    /// A set of edge ids.
    Edges(SwapSet),
    /// One edge set per part.
    EdgesByPart(Vec<SwapSet>),
    /// One node set per part.
    NodesByPart(Vec<SwapSet>),
    CountySplits(CountySplits),
}

impl Value {
    #[inline]
    pub fn as_per_part(&self) -> Option<&[f64]> {
        match self { Value::PerPart(values) => Some(values), _ => None }
    }

    #[inline]
    pub fn as_edges(&self) -> Option<&SwapSet> {
        match self { Value::Edges(edges) => Some(edges), _ => None }
    }

    #[inline]
    pub fn as_edges_by_part(&self) -> Option<&[SwapSet]> {
        match self { Value::EdgesByPart(edges) => Some(edges), _ => None }
    }

    #[inline]
    pub fn as_nodes_by_part(&self) -> Option<&[SwapSet]> {
        match self { Value::NodesByPart(nodes) => Some(nodes), _ => None }
    }

    #[inline]
    pub fn as_county_splits(&self) -> Option<&CountySplits> {
        match self { Value::CountySplits(splits) => Some(splits), _ => None }
    }

    /// Compare two values, allowing a relative tolerance on floating point entries.
    pub fn approx_eq(&self, other: &Value, tolerance: f64) -> bool {
        match (self, other) {
            (Value::PerPart(a), Value::PerPart(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| {
                    (x - y).abs() <= tolerance * x.abs().max(y.abs()).max(1.0)
                })
            }
            _ => self == other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_part_comparison_is_relative() {
        let a = Value::PerPart(vec![1e9, 0.5]);
        let b = Value::PerPart(vec![1e9 + 1e-2, 0.5]);
        assert!(a.approx_eq(&b, 1e-9));
        assert!(!a.approx_eq(&Value::PerPart(vec![1e9 + 10.0, 0.5]), 1e-9));
        assert!(!a.approx_eq(&Value::PerPart(vec![1e9]), 1e-9));
    }

    #[test]
    fn set_comparison_ignores_order() {
        let a = Value::Edges([1, 2, 3].into_iter().collect());
        let b = Value::Edges([3, 2, 1].into_iter().collect());
        assert!(a.approx_eq(&b, 0.0));
        assert!(a.as_per_part().is_none());
        assert_eq!(a.as_edges().map(SwapSet::len), Some(3));
    }
}
