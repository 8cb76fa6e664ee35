use std::{collections::BTreeSet, sync::Arc};

use ahash::AHashMap;

use crate::{
    error::{ChainError, Result},
    graph::Graph,
    partition::Partition,
    updaters::{Value, boundaries, compactness, counties, cut_edges, election, tally},
};

/// Statistic names that collide with partition fields.
pub const RESERVED_NAMES: [&str; 6] = ["assignment", "parent", "flips", "graph", "parts", "updaters"];

/// Index of a registered statistic within a partition's cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatId(u32);

impl StatId {
    #[inline] pub fn index(self) -> usize { self.0 as usize }
}

/// An updater as requested by the caller, with columns and dependencies still referenced by name.
#[derive(Clone, Debug)]
enum Request {
    Tally { column: String },
    CutEdges,
    CutEdgesByPart,
    ExteriorBoundaries { column: String },
    InteriorBoundaries,
    BoundaryNodes { column: String },
    Perimeters { exterior: String, interior: String },
    PolsbyPopper { perimeters: String, areas: String },
    VoteShare { column: String, columns: Vec<String> },
    CountySplits { column: String },
}

/// Builder for the statistics a partition lineage maintains.
///
/// Updaters that other updaters depend on use fixed default names
/// (`cut_edges`, `exterior_boundaries`, `interior_boundaries`, `perimeters`,
/// `areas`, ...). Nothing is checked until the set is handed to
/// [`Partition::new`], which rejects reserved or duplicate names, missing
/// graph columns, and missing dependencies.
#[derive(Clone, Debug, Default)]
pub struct UpdaterSet {
    requests: Vec<(String, Request)>,
}

impl UpdaterSet {
    pub fn new() -> Self { Self::default() }

    #[inline] pub fn len(&self) -> usize { self.requests.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.requests.is_empty() }

    /// Get the registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ { self.requests.iter().map(|(name, _)| name.as_str()) }

    fn with(mut self, name: &str, request: Request) -> Self {
        self.requests.push((name.to_string(), request));
        self
    }

    /// Per-part sum of a numeric node column.
    pub fn tally(self, name: &str, column: &str) -> Self {
        self.with(name, Request::Tally { column: column.to_string() })
    }

    /// The set of edges whose endpoints lie in different parts, as `cut_edges`.
    pub fn cut_edges(self) -> Self { self.with("cut_edges", Request::CutEdges) }

    /// For each part, the cut edges touching it, as `cut_edges_by_part`.
    pub fn cut_edges_by_part(self) -> Self { self.with("cut_edges_by_part", Request::CutEdgesByPart) }

    /// Per-part length of the outer graph boundary, as `exterior_boundaries`.
    pub fn exterior_boundaries(self, column: &str) -> Self {
        self.with("exterior_boundaries", Request::ExteriorBoundaries { column: column.to_string() })
    }

    /// Per-part length of boundary shared with other parts, as `interior_boundaries`.
    pub fn interior_boundaries(self) -> Self { self.with("interior_boundaries", Request::InteriorBoundaries) }

    /// For each part, the nodes with a nonzero outer boundary contribution, as `boundary_nodes`.
    pub fn boundary_nodes(self, column: &str) -> Self {
        self.with("boundary_nodes", Request::BoundaryNodes { column: column.to_string() })
    }

    /// Per-part perimeter, as `perimeters`.
    pub fn perimeters(self) -> Self {
        self.with("perimeters", Request::Perimeters {
            exterior: "exterior_boundaries".to_string(),
            interior: "interior_boundaries".to_string(),
        })
    }

    /// Per-part Polsby-Popper score, as `polsby_popper`.
    pub fn polsby_popper(self) -> Self {
        self.with("polsby_popper", Request::PolsbyPopper {
            perimeters: "perimeters".to_string(),
            areas: "areas".to_string(),
        })
    }

    /// Everything `polsby_popper` needs: an `areas` tally, both boundary
    /// lengths, boundary nodes, and perimeters.
    pub fn geometry(self, area_column: &str, boundary_column: &str) -> Self {
        self.tally("areas", area_column)
            .exterior_boundaries(boundary_column)
            .interior_boundaries()
            .boundary_nodes(boundary_column)
            .perimeters()
            .polsby_popper()
    }

    /// One tally per vote column, plus each column's share of the votes cast in a part.
    ///
    /// Tallies are named after their column. Shares are named `"{column}%"`,
    /// or `"{election}: {column}%"` when an election name is given.
    pub fn votes(mut self, columns: &[&str], election: Option<&str>) -> Self {
        for &column in columns {
            self = self.tally(column, column);
        }
        for &column in columns {
            let name = election::share_name(column, election);
            self = self.with(&name, Request::VoteShare {
                column: column.to_string(),
                columns: columns.iter().map(|c| c.to_string()).collect(),
            });
        }
        self
    }

    /// For each county (value of a categorical or numeric node column), the parts its nodes fall in.
    pub fn county_splits(self, name: &str, column: &str) -> Self {
        self.with(name, Request::CountySplits { column: column.to_string() })
    }

    /// Check names and references against `graph` and fix every updater to a [`StatId`].
    pub(crate) fn resolve(self, graph: &Graph) -> Result<Updaters> {
        let mut index = AHashMap::with_capacity(self.requests.len());
        for (i, (name, _)) in self.requests.iter().enumerate() {
            if RESERVED_NAMES.contains(&name.as_str()) {
                return Err(ChainError::config(format!("updater name '{name}' is reserved")));
            }
            if index.insert(name.clone(), StatId(i as u32)).is_some() {
                return Err(ChainError::config(format!("updater '{name}' is registered twice")));
            }
        }

        let numeric = |name: &str, column: &str| graph.numeric_handle(column)
            .ok_or_else(|| ChainError::config(format!("updater '{name}' needs missing numeric column '{column}'")));

        let mut kinds: Vec<Option<Updater>> = vec![None; self.requests.len()];
        let mut names = Vec::with_capacity(self.requests.len());

        // Dependencies can be registered after their dependents; resolve those in a second pass.
        for (i, (name, request)) in self.requests.iter().enumerate() {
            kinds[i] = match request {
                Request::Tally { column } => Some(Updater::Tally { column: numeric(name, column)? }),
                Request::CutEdges => Some(Updater::CutEdges),
                Request::CutEdgesByPart => Some(Updater::CutEdgesByPart),
                Request::ExteriorBoundaries { column } => Some(Updater::ExteriorBoundaries { column: numeric(name, column)? }),
                Request::InteriorBoundaries => Some(Updater::InteriorBoundaries),
                Request::BoundaryNodes { column } => Some(Updater::BoundaryNodes { column: numeric(name, column)? }),
                Request::CountySplits { column } => Some(counties::resolve(graph, name, column)?),
                _ => None,
            };
            names.push(name.clone());
        }

        for (i, (name, request)) in self.requests.iter().enumerate() {
            if let Request::Perimeters { exterior, interior } = request {
                let kind = Updater::Perimeters {
                    exterior: dependency(&index, &kinds, name, exterior, |k| matches!(k, Updater::ExteriorBoundaries { .. }), "an exterior boundary")?,
                    interior: dependency(&index, &kinds, name, interior, |k| matches!(k, Updater::InteriorBoundaries), "an interior boundary")?,
                };
                kinds[i] = Some(kind);
            }
            if let Request::VoteShare { column, columns } = request {
                let kind = Updater::VoteShare {
                    column: dependency(&index, &kinds, name, column, is_tally, "a tally")?,
                    columns: columns.iter()
                        .map(|c| dependency(&index, &kinds, name, c, is_tally, "a tally"))
                        .collect::<Result<_>>()?,
                };
                kinds[i] = Some(kind);
            }
        }

        for (i, (name, request)) in self.requests.iter().enumerate() {
            if let Request::PolsbyPopper { perimeters, areas } = request {
                let kind = Updater::PolsbyPopper {
                    perimeters: dependency(&index, &kinds, name, perimeters, |k| matches!(k, Updater::Perimeters { .. }), "a perimeter")?,
                    areas: dependency(&index, &kinds, name, areas, is_tally, "a tally")?,
                };
                kinds[i] = Some(kind);
            }
        }

        let kinds = kinds.into_iter().collect::<Option<Vec<_>>>()
            .ok_or_else(|| ChainError::config("updater left unresolved"))?;

        Ok(Updaters { names, kinds, index })
    }
}

fn is_tally(kind: &Updater) -> bool { matches!(kind, Updater::Tally { .. }) }

/// Look up the updater `name` depends on, checking that it was resolved to an acceptable kind.
fn dependency(
    index: &AHashMap<String, StatId>,
    kinds: &[Option<Updater>],
    name: &str,
    on: &str,
    accept: fn(&Updater) -> bool,
    what: &str,
) -> Result<StatId> {
    let id = *index.get(on)
        .ok_or_else(|| ChainError::config(format!("updater '{name}' depends on missing updater '{on}'")))?;
    match &kinds[id.index()] {
        Some(kind) if accept(kind) => Ok(id),
        Some(_) => Err(ChainError::config(format!("updater '{name}' needs '{on}' to be {what}"))),
        None => Err(ChainError::config(format!("updater '{name}' cannot depend on derived updater '{on}'"))),
    }
}

/// A resolved statistic: what it computes, with its columns and dependencies bound.
#[derive(Clone, Debug)]
pub enum Updater {
    Tally { column: Arc<[f64]> },
    CutEdges,
    CutEdgesByPart,
    ExteriorBoundaries { column: Arc<[f64]> },
    InteriorBoundaries,
    BoundaryNodes { column: Arc<[f64]> },
    Perimeters { exterior: StatId, interior: StatId },
    PolsbyPopper { perimeters: StatId, areas: StatId },
    VoteShare { column: StatId, columns: Vec<StatId> },
    CountySplits { counties: Arc<[u32]>, names: Arc<[String]> },
}

impl Updater {
    /// Check whether this statistic can be derived from the parent's value and the flips.
    pub fn is_incremental(&self) -> bool {
        !matches!(self, Updater::Perimeters { .. } | Updater::PolsbyPopper { .. } | Updater::VoteShare { .. })
    }

    /// Compute the statistic from scratch.
    pub fn compute(&self, partition: &Partition) -> Value {
        match self {
            Updater::Tally { column } | Updater::ExteriorBoundaries { column } =>
                Value::PerPart(tally::compute(partition, column)),
            Updater::CutEdges => Value::Edges(cut_edges::compute(partition)),
            Updater::CutEdgesByPart => Value::EdgesByPart(cut_edges::compute_by_part(partition)),
            Updater::InteriorBoundaries => Value::PerPart(boundaries::interior(partition)),
            Updater::BoundaryNodes { column } => Value::NodesByPart(boundaries::nodes(partition, column)),
            Updater::Perimeters { exterior, interior } =>
                Value::PerPart(boundaries::perimeters(per_part(partition, *exterior), per_part(partition, *interior))),
            Updater::PolsbyPopper { perimeters, areas } =>
                Value::PerPart(compactness::polsby_popper(per_part(partition, *areas), per_part(partition, *perimeters))),
            Updater::VoteShare { column, columns } => {
                let tallies = columns.iter().map(|&id| per_part(partition, id)).collect::<Vec<_>>();
                Value::PerPart(election::shares(per_part(partition, *column), &tallies))
            }
            Updater::CountySplits { counties, names } =>
                Value::CountySplits(counties::compute(partition, counties, names.clone())),
        }
    }

    /// Derive the statistic from the parent's value and the partition's flips.
    ///
    /// Falls back to [`Updater::compute`] for statistics that are not incremental.
    pub fn update(&self, partition: &Partition, previous: &Value) -> Value {
        match (self, previous) {
            (Updater::Tally { column } | Updater::ExteriorBoundaries { column }, Value::PerPart(totals)) =>
                Value::PerPart(tally::update(partition, totals, column)),
            (Updater::CutEdges, Value::Edges(edges)) =>
                Value::Edges(cut_edges::update(partition, edges)),
            (Updater::CutEdgesByPart, Value::EdgesByPart(edges)) =>
                Value::EdgesByPart(cut_edges::update_by_part(partition, edges)),
            (Updater::InteriorBoundaries, Value::PerPart(lengths)) =>
                Value::PerPart(boundaries::update_interior(partition, lengths)),
            (Updater::BoundaryNodes { column }, Value::NodesByPart(nodes)) =>
                Value::NodesByPart(boundaries::update_nodes(partition, nodes, column)),
            (Updater::CountySplits { counties, .. }, Value::CountySplits(splits)) =>
                Value::CountySplits(counties::update(partition, splits, counties)),
            _ => self.compute(partition),
        }
    }
}

/// Read a per-part dependency; resolution guarantees its kind.
fn per_part(partition: &Partition, id: StatId) -> &[f64] {
    partition.stat(id).as_per_part()
        .expect("dependencies are resolved to per-part statistics")
}

/// The resolved statistics shared by every partition in a lineage.
#[derive(Debug)]
pub struct Updaters {
    names: Vec<String>,
    kinds: Vec<Updater>,
    index: AHashMap<String, StatId>,
}

impl Updaters {
    #[inline] pub fn len(&self) -> usize { self.kinds.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.kinds.is_empty() }

    #[inline] pub fn id(&self, name: &str) -> Option<StatId> { self.index.get(name).copied() }

    #[inline] pub fn name(&self, id: StatId) -> &str { &self.names[id.index()] }

    #[inline] pub fn kind(&self, id: StatId) -> &Updater { &self.kinds[id.index()] }

    /// Get every registered statistic id, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = StatId> + '_ { (0..self.len() as u32).map(StatId) }

    /// Get the ids of the statistics maintained incrementally.
    pub fn incremental(&self) -> impl Iterator<Item = StatId> + '_ {
        self.ids().filter(|&id| self.kind(id).is_incremental())
    }

    /// Get the registered names, sorted.
    pub fn names(&self) -> BTreeSet<&str> { self.names.iter().map(String::as_str).collect() }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::graph::Grid;

    fn resolve(updaters: UpdaterSet) -> Result<Updaters> {
        updaters.resolve(&Grid::new(2, 2).graph())
    }

    fn message(err: ChainError) -> String {
        match err { ChainError::Configuration(message) => message, other => panic!("unexpected {other:?}") }
    }

    #[rstest]
    #[case("assignment")]
    #[case("parent")]
    #[case("flips")]
    #[case("graph")]
    #[case("parts")]
    #[case("updaters")]
    fn reserved_names_are_rejected(#[case] name: &str) {
        let err = resolve(UpdaterSet::new().tally(name, "population")).unwrap_err();
        assert_eq!(message(err), format!("updater name '{name}' is reserved"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = resolve(UpdaterSet::new().cut_edges().cut_edges()).unwrap_err();
        assert_eq!(message(err), "updater 'cut_edges' is registered twice");
    }

    #[test]
    fn missing_columns_are_rejected() {
        let err = resolve(UpdaterSet::new().tally("votes", "VOTES")).unwrap_err();
        assert_eq!(message(err), "updater 'votes' needs missing numeric column 'VOTES'");
    }

    #[test]
    fn missing_dependencies_are_rejected() {
        let err = resolve(UpdaterSet::new().polsby_popper()).unwrap_err();
        assert_eq!(message(err), "updater 'polsby_popper' depends on missing updater 'perimeters'");
    }

    #[test]
    fn dependencies_must_have_the_right_kind() {
        let err = resolve(UpdaterSet::new().tally("exterior_boundaries", "area").interior_boundaries().perimeters())
            .unwrap_err();
        assert_eq!(message(err), "updater 'perimeters' needs 'exterior_boundaries' to be an exterior boundary");
    }

    #[test]
    fn dependencies_may_follow_their_dependents() {
        let updaters = resolve(
            UpdaterSet::new().polsby_popper().perimeters().interior_boundaries()
                .exterior_boundaries("boundary_perim").tally("areas", "area"),
        ).unwrap();
        assert_eq!(updaters.len(), 5);
        assert!(matches!(updaters.kind(updaters.id("polsby_popper").unwrap()), Updater::PolsbyPopper { .. }));
    }

    #[test]
    fn geometry_registers_the_full_compactness_stack() {
        let updaters = resolve(UpdaterSet::new().geometry("area", "boundary_perim")).unwrap();
        assert_eq!(
            updaters.names().into_iter().collect::<Vec<_>>(),
            vec!["areas", "boundary_nodes", "exterior_boundaries", "interior_boundaries", "perimeters", "polsby_popper"],
        );
        assert_eq!(updaters.incremental().count(), 4);
    }

    #[test]
    fn derived_statistics_read_their_dependencies() {
        let grid = Grid::new(2, 2);
        let partition = Partition::new(grid.graph(), &grid.column_stripes(2), UpdaterSet::new().geometry("area", "boundary_perim"))
            .unwrap();
        let perimeters = partition.updaters().kind(partition.require("perimeters").unwrap());
        assert_eq!(perimeters.compute(&partition), Value::PerPart(vec![6.0, 6.0]));
        assert_eq!(partition.per_part("polsby_popper").unwrap().len(), 2);
    }

    #[test]
    fn votes_register_tallies_and_shares() {
        let mut graph = Grid::new(2, 2).graph();
        graph.set_numeric("D", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        graph.set_numeric("R", vec![4.0, 3.0, 2.0, 1.0]).unwrap();

        let updaters = UpdaterSet::new().votes(&["D", "R"], Some("08")).resolve(&graph).unwrap();
        assert_eq!(
            updaters.names().into_iter().collect::<Vec<_>>(),
            vec!["08: D%", "08: R%", "D", "R"],
        );
    }
}
