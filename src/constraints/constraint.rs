use serde::{Deserialize, Serialize};

use crate::{
    constraints::Score,
    error::{ChainError, Result},
    partition::Partition,
};

/// The family a constraint belongs to, without its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    SingleFlipContiguous,
    Contiguous,
    NoVanishingDistricts,
    PopulationBalance,
    UpperBound,
    LowerBound,
}

impl ConstraintKind {
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::SingleFlipContiguous => "single_flip_contiguous",
            ConstraintKind::Contiguous => "contiguous",
            ConstraintKind::NoVanishingDistricts => "no_vanishing_districts",
            ConstraintKind::PopulationBalance => "within_percent_of_ideal_population",
            ConstraintKind::UpperBound => "upper_bound",
            ConstraintKind::LowerBound => "lower_bound",
        }
    }
}

/// A predicate every state of the chain must satisfy, with its parameters fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    /// The parts touched by the latest flips are still connected.
    SingleFlipContiguous,
    /// Every part is connected.
    Contiguous,
    /// No part has lost its last node.
    NoVanishingDistricts,
    /// Every part's `population` lies within `[(1 - percent)·ideal, (1 + percent)·ideal]`.
    PopulationBalance { ideal: f64, percent: f64 },
    /// The score does not exceed `bound`.
    UpperBound { score: Score, bound: f64 },
    /// The score is at least `bound`.
    LowerBound { score: Score, bound: f64 },
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::SingleFlipContiguous => ConstraintKind::SingleFlipContiguous,
            Constraint::Contiguous => ConstraintKind::Contiguous,
            Constraint::NoVanishingDistricts => ConstraintKind::NoVanishingDistricts,
            Constraint::PopulationBalance { .. } => ConstraintKind::PopulationBalance,
            Constraint::UpperBound { .. } => ConstraintKind::UpperBound,
            Constraint::LowerBound { .. } => ConstraintKind::LowerBound,
        }
    }

    #[inline] pub fn name(&self) -> &'static str { self.kind().name() }

    /// Check that `partition` registers every statistic this constraint reads.
    pub fn ensure_supported(&self, partition: &Partition) -> Result<()> {
        let required = match self {
            Constraint::PopulationBalance { .. } => "population",
            Constraint::UpperBound { score, .. } | Constraint::LowerBound { score, .. } => score.requires(),
            _ => return Ok(()),
        };
        partition.require(required).map(|_| ()).map_err(|_| ChainError::config(format!(
            "constraint `{}` needs a '{required}' updater", self.name(),
        )))
    }

    /// Check the constraint on a partition.
    pub fn is_satisfied(&self, partition: &Partition) -> bool {
        match self {
            Constraint::SingleFlipContiguous => partition.flips_preserve_contiguity(),
            Constraint::Contiguous => partition.is_contiguous(),
            Constraint::NoVanishingDistricts => no_vanishing_districts(partition),
            Constraint::PopulationBalance { ideal, percent } => {
                let (min, max) = ((1.0 - percent) * ideal, (1.0 + percent) * ideal);
                partition.per_part("population")
                    .is_ok_and(|population| population.iter().all(|&p| min <= p && p <= max))
            }
            Constraint::UpperBound { score, bound } => score.evaluate(partition).is_ok_and(|value| value <= *bound),
            Constraint::LowerBound { score, bound } => score.evaluate(partition).is_ok_and(|value| value >= *bound),
        }
    }
}

/// Every part that gave up a node still holds one; a root partition has no empty part.
fn no_vanishing_districts(partition: &Partition) -> bool {
    if partition.flips().is_empty() {
        return (0..partition.num_parts()).all(|part| !partition.part_is_empty(part));
    }
    partition.flips().iter().all(|flip| !partition.part_is_empty(flip.from))
}

/// Keep every part within `percent` of the ideal population of `reference`
/// (its total `population` divided by its number of parts).
pub fn within_percent_of_ideal_population(reference: &Partition, percent: f64) -> Result<Constraint> {
    if !(percent.is_finite() && percent >= 0.0) {
        return Err(ChainError::config(format!("population tolerance must be a non-negative number, got {percent}")));
    }
    let population = reference.per_part("population").map_err(|_| ChainError::config(
        "constraint `within_percent_of_ideal_population` needs a 'population' updater",
    ))?;
    let ideal = population.iter().sum::<f64>() / reference.num_parts() as f64;
    Ok(Constraint::PopulationBalance { ideal, percent })
}

#[inline]
pub fn upper_bound(score: Score, bound: f64) -> Constraint { Constraint::UpperBound { score, bound } }

#[inline]
pub fn lower_bound(score: Score, bound: f64) -> Constraint { Constraint::LowerBound { score, bound } }

/// Bound `score` from above by its value on `reference`.
pub fn upper_bound_from(score: Score, reference: &Partition) -> Result<Constraint> {
    let bound = score.evaluate(reference).map_err(|_| ChainError::config(format!(
        "score `{}` needs a '{}' updater", score.name(), score.requires(),
    )))?;
    Ok(upper_bound(score, bound))
}
