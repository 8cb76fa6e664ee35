use std::{collections::HashMap, sync::Arc};

use ahash::AHashSet;
use anyhow::{Context, Result, ensure};

/// An undirected edge, weighted by the length of the boundary its endpoints share.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub u: usize,
    pub v: usize,
    pub weight: f64,
}

impl Edge {
    /// Get the endpoint of this edge opposite `node`.
    #[inline] pub fn other(&self, node: usize) -> usize { if node == self.u { self.v } else { self.u } }
}

/// A weighted, undirected graph in compressed sparse row format,
/// with named numeric and categorical node columns.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    size: usize,
    offsets: Vec<u32>,
    neighbors: Vec<u32>,
    edge_ids: Vec<u32>,                        // edge_ids[i] = undirected edge behind half-edge i
    edges: Vec<Edge>,
    numeric: HashMap<String, Arc<[f64]>>,
    categorical: HashMap<String, Arc<[String]>>,
    labels: Vec<String>,
}

impl Graph {
    /// Construct a graph from a list of undirected `(u, v, weight)` edges.
    ///
    /// Each node pair may appear at most once, in either orientation.
    pub fn new(num_nodes: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut seen = AHashSet::with_capacity(edges.len());
        edges.iter().enumerate().for_each(|(i, &(u, v, _))| {
            assert!(u < num_nodes && v < num_nodes, "edges[{i}] endpoint out of range [0, {num_nodes})");
            assert!(u != v, "edges[{i}] is a self-loop on node {u}");
            assert!(seen.insert((u.min(v), u.max(v))), "edges[{i}] repeats edge {{{}, {}}}", u.min(v), u.max(v));
        });

        let mut degrees = vec![0u32; num_nodes];
        for &(u, v, _) in edges { degrees[u] += 1; degrees[v] += 1; }

        let offsets = std::iter::once(0u32).chain(
            degrees.iter().scan(0u32, |acc, &len| { *acc += len; Some(*acc) })
        ).collect::<Vec<u32>>();

        // Fill both half-edges of every undirected edge, in edge order.
        let mut cursor = offsets[..num_nodes].to_vec();
        let mut neighbors = vec![0u32; 2 * edges.len()];
        let mut edge_ids = vec![0u32; 2 * edges.len()];
        for (id, &(u, v, _)) in edges.iter().enumerate() {
            for (a, b) in [(u, v), (v, u)] {
                let slot = cursor[a] as usize;
                neighbors[slot] = b as u32;
                edge_ids[slot] = id as u32;
                cursor[a] += 1;
            }
        }

        Self {
            size: num_nodes,
            offsets,
            neighbors,
            edge_ids,
            edges: edges.iter().map(|&(u, v, weight)| Edge { u: u.min(v), v: u.max(v), weight }).collect(),
            numeric: HashMap::new(),
            categorical: HashMap::new(),
            labels: (0..num_nodes).map(|node| node.to_string()).collect(),
        }
    }

    /// Get the number of nodes in the graph.
    #[inline] pub fn node_count(&self) -> usize { self.size }

    /// Get the number of undirected edges in the graph.
    #[inline] pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Get the range of half-edges for a given node.
    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize .. self.offsets[node + 1] as usize
    }

    /// Get the degree (number of neighbors) of a given node.
    #[inline] pub fn degree(&self, node: usize) -> usize { self.range(node).len() }

    /// Get an iterator over the neighbors of a given node.
    #[inline]
    pub fn edges(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.range(node).map(move |i| self.neighbors[i] as usize)
    }

    /// Get an iterator over the neighbors and edge weights of a given node.
    #[inline]
    pub fn edges_with_weights(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.range(node).map(move |i| (self.neighbors[i] as usize, self.edges[self.edge_ids[i] as usize].weight))
    }

    /// Get an iterator over the neighbors of a given node with the ids of the connecting edges.
    #[inline]
    pub fn incident(&self, node: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.range(node).map(move |i| (self.neighbors[i] as usize, self.edge_ids[i] as usize))
    }

    /// Get an undirected edge by id.
    #[inline] pub fn edge(&self, id: usize) -> &Edge { &self.edges[id] }

    /// Get all undirected edges, indexed by edge id.
    #[inline] pub fn all_edges(&self) -> &[Edge] { &self.edges }

    /// Get the source label of a node (defaults to its index).
    #[inline] pub fn label(&self, node: usize) -> &str { &self.labels[node] }

    /// Replace the source labels of all nodes.
    pub fn set_labels(&mut self, labels: Vec<String>) -> Result<()> {
        ensure!(labels.len() == self.size, "[Graph.set_labels] expected {} labels, got {}", self.size, labels.len());
        self.labels = labels;
        Ok(())
    }

    /// Attach (or replace) a numeric node column.
    pub fn set_numeric(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        ensure!(values.len() == self.size,
            "[Graph.set_numeric] column '{name}' has {} values for {} nodes", values.len(), self.size);
        self.categorical.remove(name);
        self.numeric.insert(name.to_string(), values.into());
        Ok(())
    }

    /// Attach (or replace) a categorical node column.
    pub fn set_categorical(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        ensure!(values.len() == self.size,
            "[Graph.set_categorical] column '{name}' has {} values for {} nodes", values.len(), self.size);
        self.numeric.remove(name);
        self.categorical.insert(name.to_string(), values.into());
        Ok(())
    }

    /// Get a numeric node column by name.
    #[inline] pub fn numeric(&self, name: &str) -> Option<&[f64]> { self.numeric.get(name).map(|c| &c[..]) }

    /// Get a categorical node column by name.
    #[inline] pub fn categorical(&self, name: &str) -> Option<&[String]> { self.categorical.get(name).map(|c| &c[..]) }

    /// Shared handle to a numeric column, for statistics that outlive a borrow of the graph.
    #[inline]
    pub(crate) fn numeric_handle(&self, name: &str) -> Option<Arc<[f64]>> { self.numeric.get(name).cloned() }

    /// Names of all numeric and categorical columns.
    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.numeric.keys().chain(self.categorical.keys()).map(String::as_str)
    }

    /// Sum of a numeric column over all nodes.
    pub fn total(&self, name: &str) -> Option<f64> { self.numeric(name).map(|c| c.iter().sum()) }

    /// Read a districting assignment from a numeric column of integer district labels.
    pub fn assignment_from(&self, name: &str) -> Result<Vec<u32>> {
        let column = self.numeric(name)
            .with_context(|| format!("[Graph.assignment_from] missing numeric column '{name}'"))?;

        column.iter().enumerate().map(|(node, &value)| {
            ensure!(value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64,
                "[Graph.assignment_from] node {node} has non-integer district label {value}");
            Ok(value as u32)
        }).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_graph() -> Graph {
        Graph::new(4, &[(0, 1, 1.5), (0, 2, 2.0), (1, 2, 3.5), (2, 3, 0.5)])
    }

    #[test]
    fn csr_graph_construction() {
        let graph = make_test_graph();

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);

        // Offsets are cumulative neighbor counts, len = nodes + 1
        assert_eq!(graph.offsets, vec![0, 2, 4, 7, 8]);
        assert_eq!(graph.neighbors, vec![1, 2, 0, 2, 0, 1, 3, 2]);
        assert_eq!(graph.edge_ids, vec![0, 1, 0, 2, 1, 2, 3, 3]);

        // Offsets must be non-decreasing
        for window in graph.offsets.windows(2) { assert!(window[0] <= window[1]) }
    }

    #[test]
    fn degree_matches_offsets() {
        let graph = make_test_graph();
        assert_eq!(graph.degree(0), 2);
        assert_eq!(graph.degree(1), 2);
        assert_eq!(graph.degree(2), 3);
        assert_eq!(graph.degree(3), 1);
    }

    #[test]
    fn edge_iterators() {
        let graph = make_test_graph();
        assert_eq!(graph.edges(2).collect::<Vec<_>>(), vec![0, 1, 3]);
        assert_eq!(graph.edges_with_weights(2).collect::<Vec<_>>(), vec![(0, 2.0), (1, 3.5), (3, 0.5)]);
        assert_eq!(graph.incident(2).collect::<Vec<_>>(), vec![(0, 1), (1, 2), (3, 3)]);
    }

    #[test]
    fn edges_are_stored_with_ordered_endpoints() {
        let graph = Graph::new(3, &[(2, 0, 1.0), (1, 2, 2.0)]);
        assert_eq!(graph.edge(0), &Edge { u: 0, v: 2, weight: 1.0 });
        assert_eq!(graph.edge(1).other(2), 1);
        assert_eq!(graph.edge(1).other(1), 2);
    }

    #[test]
    fn isolated_nodes_have_zero_degree_and_no_edges() {
        let graph = Graph::new(3, &[]);
        assert_eq!(graph.offsets, vec![0, 0, 0, 0]);
        for n in 0..3 {
            assert_eq!(graph.degree(n), 0);
            assert!(graph.edges(n).next().is_none());
        }
    }

    #[test]
    #[should_panic(expected = "edges[0] endpoint out of range [0, 2)")]
    fn new_panics_on_out_of_range_endpoint() {
        Graph::new(2, &[(0, 2, 1.0)]);
    }

    #[test]
    #[should_panic(expected = "edges[1] is a self-loop on node 1")]
    fn new_panics_on_self_loop() {
        Graph::new(2, &[(0, 1, 1.0), (1, 1, 1.0)]);
    }

    #[test]
    #[should_panic(expected = "edges[1] repeats edge {0, 1}")]
    fn new_panics_on_repeated_edge() {
        Graph::new(2, &[(0, 1, 1.0), (1, 0, 1.0)]);
    }

    #[test]
    fn columns_round_trip() {
        let mut graph = make_test_graph();
        graph.set_numeric("population", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        graph.set_categorical("county", vec!["a".into(), "a".into(), "b".into(), "b".into()]).unwrap();

        assert_eq!(graph.total("population"), Some(10.0));
        assert_eq!(graph.categorical("county").unwrap()[2], "b");
        assert!(graph.numeric("county").is_none());

        let mut names = graph.columns().collect::<Vec<_>>();
        names.sort_unstable();
        assert_eq!(names, vec!["county", "population"]);
    }

    #[test]
    fn set_numeric_rejects_wrong_length() {
        let mut graph = make_test_graph();
        let err = graph.set_numeric("population", vec![1.0]).unwrap_err();
        assert!(err.to_string().contains("has 1 values for 4 nodes"));
    }

    #[test]
    fn assignment_from_reads_integer_labels() {
        let mut graph = make_test_graph();
        graph.set_numeric("CD", vec![1.0, 1.0, 2.0, 2.0]).unwrap();
        assert_eq!(graph.assignment_from("CD").unwrap(), vec![1, 1, 2, 2]);

        graph.set_numeric("CD", vec![1.0, 1.5, 2.0, 2.0]).unwrap();
        assert!(graph.assignment_from("CD").is_err());
        assert!(graph.assignment_from("missing").is_err());
    }
}
