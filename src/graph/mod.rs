mod graph;
mod grid;
mod source;

pub use graph::{Edge, Graph};
pub use grid::Grid;
pub use source::{AdjacencyJson, GraphSource};
