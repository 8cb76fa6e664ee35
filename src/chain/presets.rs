use crate::{
    accept::AlwaysAccept,
    chain::MarkovChain,
    constraints::{Constraint, Score, Validator, upper_bound_from, within_percent_of_ideal_population},
    error::{ChainError, Result},
    partition::Partition,
    proposals::RandomFlip,
};

/// Random flips accepted whenever they pass `constraints`.
pub fn default_chain(initial: Partition, constraints: Vec<Constraint>, total_steps: usize) -> Result<MarkovChain<RandomFlip, AlwaysAccept>> {
    let proposal = RandomFlip::new(&initial)?;
    MarkovChain::new(proposal, Validator::new(constraints), AlwaysAccept, initial, total_steps)
}

/// Random flips that keep every district connected and nonempty.
pub fn grid_chain(initial: Partition, total_steps: usize) -> Result<MarkovChain<RandomFlip, AlwaysAccept>> {
    default_chain(initial, vec![Constraint::SingleFlipContiguous, Constraint::NoVanishingDistricts], total_steps)
}

/// The standard flip walk: connected, nonempty districts within 1% of the
/// ideal population, no less compact (by summed reciprocal Polsby-Popper
/// score) than the initial plan.
///
/// Needs `cut_edges`, `population`, and `polsby_popper` updaters.
pub fn basic_chain(initial: Partition, total_steps: usize) -> Result<MarkovChain<RandomFlip, AlwaysAccept>> {
    for name in ["cut_edges", "population", "polsby_popper"] {
        if initial.stat_id(name).is_none() {
            return Err(ChainError::config(format!("basic chain needs the partition to have a '{name}' updater")));
        }
    }

    let population = within_percent_of_ideal_population(&initial, 0.01)?;
    let compactness = upper_bound_from(Score::L1ReciprocalPolsbyPopper, &initial)?;

    default_chain(initial, vec![
        Constraint::SingleFlipContiguous,
        Constraint::NoVanishingDistricts,
        population,
        compactness,
    ], total_steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constraints::ConstraintKind, graph::Grid, updaters::UpdaterSet};

    fn grid_partition(updaters: UpdaterSet) -> Partition {
        let grid = Grid::new(4, 4);
        Partition::new(grid.graph(), &grid.row_stripes(2), updaters).unwrap()
    }

    #[test]
    fn grid_chain_needs_cut_edges() {
        let result = grid_chain(grid_partition(UpdaterSet::new()), 10);
        assert!(matches!(result, Err(ChainError::Configuration(_))));
    }

    #[test]
    fn basic_chain_lists_its_missing_updater() {
        let result = basic_chain(grid_partition(UpdaterSet::new().cut_edges()), 10);
        assert_eq!(
            result.err(),
            Some(ChainError::config("basic chain needs the partition to have a 'population' updater")),
        );
    }

    #[test]
    fn basic_chain_captures_its_bounds_from_the_initial_plan() {
        let updaters = UpdaterSet::new()
            .cut_edges()
            .tally("population", "population")
            .geometry("area", "boundary_perim");
        let chain = basic_chain(grid_partition(updaters), 10).unwrap();

        let kinds = chain.validator().constraints().iter().map(Constraint::kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec![
            ConstraintKind::SingleFlipContiguous,
            ConstraintKind::NoVanishingDistricts,
            ConstraintKind::PopulationBalance,
            ConstraintKind::UpperBound,
        ]);
        assert_eq!(chain.validator().constraints()[2], Constraint::PopulationBalance { ideal: 8.0, percent: 0.01 });
    }
}
