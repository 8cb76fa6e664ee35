use crate::{constraints::Constraint, error::Result, partition::Partition};

/// An ordered conjunction of constraints, checked first to last.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Validator {
    constraints: Vec<Constraint>,
}

impl Validator {
    pub fn new(constraints: Vec<Constraint>) -> Self { Self { constraints } }

    #[inline] pub fn constraints(&self) -> &[Constraint] { &self.constraints }

    #[inline] pub fn len(&self) -> usize { self.constraints.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.constraints.is_empty() }

    /// Check if every constraint holds, stopping at the first failure.
    #[inline] pub fn validate(&self, partition: &Partition) -> bool { self.check(partition).is_none() }

    /// Get the first constraint `partition` fails, if any.
    pub fn check(&self, partition: &Partition) -> Option<&Constraint> {
        self.constraints.iter().find(|constraint| !constraint.is_satisfied(partition))
    }

    /// Check that `partition` registers every statistic the constraints read.
    pub fn ensure_supported(&self, partition: &Partition) -> Result<()> {
        self.constraints.iter().try_for_each(|constraint| constraint.ensure_supported(partition))
    }
}

impl FromIterator<Constraint> for Validator {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self { Self::new(iter.into_iter().collect()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constraints::{Score, upper_bound}, graph::Grid, updaters::UpdaterSet};

    #[test]
    fn check_reports_the_first_failure() {
        // Path 0-1-2 with parts [0, 0, 1]; moving node 0 into part 1 cuts both edges.
        let root = Partition::new(Grid::new(3, 1).graph(), &[1, 1, 2], UpdaterSet::new().cut_edges()).unwrap();
        let child = root.flip_node(0, 1);

        let validator = Validator::new(vec![
            Constraint::NoVanishingDistricts,
            upper_bound(Score::CutEdgeCount, 1.0),
            Constraint::SingleFlipContiguous,
        ]);
        assert!(validator.validate(&root));
        assert_eq!(validator.check(&child).map(Constraint::name), Some("upper_bound"));
    }

    #[test]
    fn empty_validator_accepts_everything() {
        let root = Partition::new(Grid::new(2, 1).graph(), &[1, 2], UpdaterSet::new()).unwrap();
        assert!(Validator::default().validate(&root.flip_node(0, 1)));
    }
}
