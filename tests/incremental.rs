// Incrementally maintained statistics must agree with a fresh recomputation.
use openmander_chain::{Graph, Grid, Partition, UpdaterSet, Value};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rstest::rstest;

const TOLERANCE: f64 = 1e-9;

/// A grid with vote and county columns, so every updater has something to read.
fn annotated_grid(width: usize, height: usize) -> Graph {
    let mut graph = Grid::new(width, height).graph();
    let n = width * height;
    graph.set_numeric("VoteA", (0..n).map(|i| (i * 7 % 11) as f64).collect()).unwrap();
    graph.set_numeric("VoteB", (0..n).map(|i| (i * 5 % 13) as f64 + 0.5).collect()).unwrap();
    graph.set_categorical("COUNTY", (0..n).map(|i| format!("{:03}", i % width / 2)).collect()).unwrap();
    graph
}

fn all_updaters() -> UpdaterSet {
    UpdaterSet::new()
        .tally("population", "population")
        .cut_edges()
        .cut_edges_by_part()
        .geometry("area", "boundary_perim")
        .votes(&["VoteA", "VoteB"], Some("2024"))
        .county_splits("counties", "COUNTY")
}

fn assert_matches_fresh(partition: &Partition) {
    for id in partition.updaters().ids() {
        let cached = partition.stat(id);
        let fresh = partition.fresh(id);
        assert!(
            cached.approx_eq(&fresh, TOLERANCE),
            "statistic '{}' drifted at generation {}: {cached:?} != {fresh:?}",
            partition.updaters().name(id), partition.generation(),
        );
    }
}

#[rstest]
fn random_flip_sequences_agree_with_fresh_values(
    #[values(1, 2, 3)] seed: u64,
    #[values(1, 3)] flips_per_step: usize,
) {
    let grid = Grid::new(6, 5);
    let mut partition = Partition::new(annotated_grid(6, 5), &grid.column_stripes(3), all_updaters()).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);

    for step in 0..200 {
        let changes = (0..flips_per_step)
            .map(|_| (rng.random_range(0..partition.num_nodes()), rng.random_range(0..partition.num_parts())))
            .collect::<Vec<_>>();
        partition = partition.flip(&changes);

        // Leave some states unread so later reads walk several generations at once.
        if step % 3 == 0 { assert_matches_fresh(&partition) }
    }
    assert_matches_fresh(&partition);
    assert!(partition.verify_incremental().is_ok());
}

#[test]
fn empty_flip_keeps_every_statistic() {
    let grid = Grid::new(5, 4);
    let partition = Partition::new(annotated_grid(5, 4), &grid.row_stripes(2), all_updaters()).unwrap();
    let child = partition.flip(&[]);

    for id in partition.updaters().ids() {
        assert!(partition.stat(id).approx_eq(child.stat(id), TOLERANCE), "'{}' changed", partition.updaters().name(id));
    }
}

#[test]
fn reading_an_old_state_does_not_disturb_newer_ones() {
    let grid = Grid::new(4, 4);
    let root = Partition::new(annotated_grid(4, 4), &grid.row_stripes(2), all_updaters()).unwrap();
    let a = root.flip_node(4, 1);
    let b = a.flip_node(5, 1);

    // Read the grandchild first, then the intermediate state.
    assert_matches_fresh(&b);
    assert_matches_fresh(&a);
    assert_matches_fresh(&root);

    let shares = b.per_part("2024: VoteA%").unwrap();
    let tallies = (b.per_part("VoteA").unwrap(), b.per_part("VoteB").unwrap());
    for part in 0..2 {
        let total = tallies.0[part] + tallies.1[part];
        assert!((shares[part] - tallies.0[part] / total).abs() < TOLERANCE);
    }
}

#[test]
fn cached_values_are_shared_between_handles() {
    let grid = Grid::new(3, 3);
    let partition = Partition::new(annotated_grid(3, 3), &grid.column_stripes(3), all_updaters()).unwrap();
    let handle = partition.clone();

    let id = partition.stat_id("cut_edges").unwrap();
    let value = partition.stat(id) as *const Value;
    assert!(handle.is_cached(id));
    assert_eq!(value, handle.stat(id) as *const Value);
}
