use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    accept::{Acceptance, AlwaysAccept, Metropolis},
    chain::MarkovChain,
    constraints::{Constraint, Score, Validator, lower_bound, upper_bound, upper_bound_from, within_percent_of_ideal_population},
    error::Result,
    partition::Partition,
    proposals::RandomFlip,
};

/// A constraint as written in a chain configuration.
///
/// Parameters that depend on the plan (ideal population, omitted bounds) are
/// captured from the initial partition when the chain is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintConfig {
    SingleFlipContiguous,
    Contiguous,
    NoVanishingDistricts,
    WithinPercentOfIdealPopulation { percent: f64 },
    UpperBound { score: Score, #[serde(default)] bound: Option<f64> },
    LowerBound { score: Score, bound: f64 },
}

impl ConstraintConfig {
    fn build(&self, initial: &Partition) -> Result<Constraint> {
        Ok(match self {
            ConstraintConfig::SingleFlipContiguous => Constraint::SingleFlipContiguous,
            ConstraintConfig::Contiguous => Constraint::Contiguous,
            ConstraintConfig::NoVanishingDistricts => Constraint::NoVanishingDistricts,
            ConstraintConfig::WithinPercentOfIdealPopulation { percent } => within_percent_of_ideal_population(initial, *percent)?,
            ConstraintConfig::UpperBound { score, bound: Some(bound) } => upper_bound(*score, *bound),
            ConstraintConfig::UpperBound { score, bound: None } => upper_bound_from(*score, initial)?,
            ConstraintConfig::LowerBound { score, bound } => lower_bound(*score, *bound),
        })
    }
}

/// The acceptance rule as written in a chain configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AcceptanceConfig {
    #[default]
    AlwaysAccept,
    Metropolis { beta: f64, energy: Score },
}

impl AcceptanceConfig {
    fn build(&self) -> Result<Box<dyn Acceptance>> {
        let acceptance: Box<dyn Acceptance> = match self {
            AcceptanceConfig::AlwaysAccept => Box::new(AlwaysAccept),
            AcceptanceConfig::Metropolis { beta, energy } => Box::new(Metropolis::new(*beta, *energy)?),
        };
        Ok(acceptance)
    }
}

/// A serializable description of a random-flip chain.
///
/// ```json
/// {
///   "total_steps": 1000,
///   "seed": 2018,
///   "constraints": [
///     { "kind": "single_flip_contiguous" },
///     { "kind": "no_vanishing_districts" },
///     { "kind": "within_percent_of_ideal_population", "percent": 0.01 }
///   ],
///   "acceptance": { "kind": "always_accept" }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub total_steps: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub constraints: Vec<ConstraintConfig>,
    #[serde(default)]
    pub acceptance: AcceptanceConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_every: Option<usize>,
}

impl ChainConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("Could not parse chain configuration")
    }

    /// Read a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read chain configuration {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Build the chain this configuration describes, starting from `initial`.
    pub fn build(&self, initial: Partition) -> Result<MarkovChain<RandomFlip, Box<dyn Acceptance>>> {
        let validator = self.constraints.iter()
            .map(|constraint| constraint.build(&initial))
            .collect::<Result<Validator>>()?;
        let proposal = RandomFlip::new(&initial)?;

        let mut chain = MarkovChain::new(proposal, validator, self.acceptance.build()?, initial, self.total_steps)?;
        if let Some(seed) = self.seed { chain = chain.with_seed(seed) }
        if let Some(every) = self.audit_every { chain = chain.with_audit(every) }
        Ok(chain)
    }
}
