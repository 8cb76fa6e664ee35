use anyhow::Result;

use crate::graph::{Graph, GraphSource};

/// A `width x height` rook-adjacency lattice of unit squares.
///
/// Node `y * width + x` is the square in column `x` and row `y`. Every square
/// has unit `population` and `area`; shared sides have unit `shared_perim`;
/// squares on the lattice border carry their exposed side count in
/// `boundary_perim` and a `boundary_node` flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        Self { width, height }
    }

    /// Get the node index of the square at `(x, y)`.
    #[inline] pub fn node(&self, x: usize, y: usize) -> usize { y * self.width + x }

    /// Build the lattice graph with its standard columns.
    pub fn graph(&self) -> Graph {
        let (w, h) = (self.width, self.height);

        let mut edges = Vec::with_capacity(2 * w * h);
        for y in 0..h {
            for x in 0..w {
                if x + 1 < w { edges.push((self.node(x, y), self.node(x + 1, y), 1.0)) }
                if y + 1 < h { edges.push((self.node(x, y), self.node(x, y + 1), 1.0)) }
            }
        }

        let exposed = (0..h).flat_map(|y| (0..w).map(move |x| {
            [x == 0, x + 1 == w, y == 0, y + 1 == h].iter().filter(|&&side| side).count() as f64
        })).collect::<Vec<_>>();

        let mut graph = Graph::new(w * h, &edges);
        let unit = vec![1.0; w * h];
        let columns = [
            ("population", unit.clone()),
            ("area", unit),
            ("boundary_node", exposed.iter().map(|&e| (e > 0.0) as u8 as f64).collect()),
            ("boundary_perim", exposed),
        ];
        for (name, values) in columns {
            graph.set_numeric(name, values).expect("grid columns match the node count");
        }
        graph
    }

    /// District labels splitting the rows into `num_parts` horizontal bands (labels start at 1).
    pub fn row_stripes(&self, num_parts: usize) -> Vec<u32> {
        assert!(num_parts > 0 && num_parts <= self.height, "need 1..={} row stripes", self.height);
        (0..self.height * self.width)
            .map(|node| (node / self.width * num_parts / self.height) as u32 + 1)
            .collect()
    }

    /// District labels splitting the columns into `num_parts` vertical bands (labels start at 1).
    pub fn column_stripes(&self, num_parts: usize) -> Vec<u32> {
        assert!(num_parts > 0 && num_parts <= self.width, "need 1..={} column stripes", self.width);
        (0..self.height * self.width)
            .map(|node| (node % self.width * num_parts / self.width) as u32 + 1)
            .collect()
    }
}

impl GraphSource for Grid {
    fn load(&self) -> Result<Graph> { Ok(self.graph()) }
}
