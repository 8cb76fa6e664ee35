use std::{collections::{BTreeMap, HashMap, HashSet}, fs, path::PathBuf};

use anyhow::{Context, Result, bail, ensure};
use serde_json::Value;

use crate::graph::Graph;

/// Anything that can produce the graph a chain runs on.
///
/// Geometry (adjacency detection, projections, column joins) is the source's
/// business; the chain only ever sees the finished [`Graph`].
pub trait GraphSource {
    fn load(&self) -> Result<Graph>;
}

impl GraphSource for Graph {
    fn load(&self) -> Result<Graph> { Ok(self.clone()) }
}

/// Where the adjacency JSON is read from.
#[derive(Clone, Debug)]
enum Input {
    Path(PathBuf),
    Text(String),
}

/// Graph data in the NetworkX `adjacency_data` JSON layout.
///
/// Expects a top-level `nodes` array of attribute objects (each with an `id`)
/// and a parallel `adjacency` array of neighbor lists whose entries carry the
/// neighbor `id` and an edge weight. Numeric and boolean node attributes become
/// numeric columns; anything else scalar becomes a categorical column. Missing
/// numeric values read as `0`, missing categorical values as `""`.
#[derive(Clone, Debug)]
pub struct AdjacencyJson {
    input: Input,
    weight_key: String,
}

impl AdjacencyJson {
    /// Read the graph from a file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { input: Input::Path(path.into()), weight_key: "shared_perim".to_string() }
    }

    /// Read the graph from an in-memory JSON document.
    pub fn from_json(text: impl Into<String>) -> Self {
        Self { input: Input::Text(text.into()), weight_key: "shared_perim".to_string() }
    }

    /// Use a different adjacency attribute as the edge weight (default `shared_perim`).
    pub fn weight_key(mut self, key: &str) -> Self {
        self.weight_key = key.to_string();
        self
    }

    fn read(&self) -> Result<Value> {
        let raw = match &self.input {
            Input::Path(path) => fs::read_to_string(path)
                .with_context(|| format!("Could not read graph file {}", path.display()))?,
            Input::Text(text) => text.clone(),
        };
        serde_json::from_str(&raw).context("Could not parse graph JSON")
    }
}

/// Render a node id as a label, without the quotes JSON strings carry.
fn id_label(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl GraphSource for AdjacencyJson {
    fn load(&self) -> Result<Graph> {
        let data = self.read()?;
        let raw_nodes = data["nodes"].as_array().context("Could not find `nodes`")?;
        let raw_adj = data["adjacency"].as_array().context("Could not find `adjacency`")?;
        ensure!(raw_nodes.len() == raw_adj.len(),
            "`nodes` has {} entries but `adjacency` has {}", raw_nodes.len(), raw_adj.len());

        // Map source ids to dense node indices.
        let labels = raw_nodes.iter().enumerate()
            .map(|(i, node)| node.get("id").map(id_label).with_context(|| format!("node {i} has no `id`")))
            .collect::<Result<Vec<_>>>()?;
        let mut index = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            ensure!(index.insert(label.clone(), i).is_none(), "duplicate node id '{label}'");
        }

        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for (u, adj) in raw_adj.iter().enumerate() {
            let adj = adj.as_array().with_context(|| format!("adjacency of node '{}' is not a list", labels[u]))?;
            for entry in adj {
                let id = entry.get("id").map(id_label)
                    .with_context(|| format!("neighbor of node '{}' has no `id`", labels[u]))?;
                let v = *index.get(&id).with_context(|| format!("node '{}' neighbors unknown node '{id}'", labels[u]))?;
                if u == v || !seen.insert((u.min(v), u.max(v))) { continue }
                let weight = entry.get(&self.weight_key).and_then(Value::as_f64).unwrap_or(0.0);
                edges.push((u, v, weight));
            }
        }

        // Gather attribute values column by column, skipping the id and non-scalar values.
        let mut columns: BTreeMap<&str, Vec<Option<&Value>>> = BTreeMap::new();
        for (i, node) in raw_nodes.iter().enumerate() {
            let Some(attrs) = node.as_object() else { bail!("node '{}' is not an object", labels[i]) };
            for (key, value) in attrs.iter().filter(|(key, _)| key.as_str() != "id") {
                columns.entry(key.as_str()).or_insert_with(|| vec![None; raw_nodes.len()])[i] = Some(value);
            }
        }

        let mut graph = Graph::new(raw_nodes.len(), &edges);
        graph.set_labels(labels)?;
        for (name, values) in columns {
            let present = values.iter().flatten().filter(|v| !v.is_null());
            if present.clone().any(|v| v.is_array() || v.is_object()) { continue }

            if present.clone().all(|v| v.is_number() || v.is_boolean()) {
                graph.set_numeric(name, values.iter().map(|v| match v {
                    Some(Value::Bool(b)) => *b as u8 as f64,
                    Some(v) => v.as_f64().unwrap_or(0.0),
                    None => 0.0,
                }).collect())?;
            } else {
                graph.set_categorical(name, values.iter().map(|v| match v {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(v) => v.to_string(),
                }).collect())?;
            }
        }

        Ok(graph)
    }
}
