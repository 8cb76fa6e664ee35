use rand::{Rng, RngCore};

use crate::{
    constraints::Score,
    error::{ChainError, Result},
    partition::Partition,
};

/// Decides whether a valid candidate replaces the current state.
pub trait Acceptance {
    fn accept(&mut self, current: &Partition, candidate: &Partition, rng: &mut dyn RngCore) -> bool;

    /// Check that `partition` registers every statistic this rule reads.
    fn ensure_supported(&self, _partition: &Partition) -> Result<()> { Ok(()) }
}

impl<A: Acceptance + ?Sized> Acceptance for Box<A> {
    fn accept(&mut self, current: &Partition, candidate: &Partition, rng: &mut dyn RngCore) -> bool {
        (**self).accept(current, candidate, rng)
    }

    fn ensure_supported(&self, partition: &Partition) -> Result<()> { (**self).ensure_supported(partition) }
}

/// Accept every valid candidate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlwaysAccept;

impl Acceptance for AlwaysAccept {
    #[inline]
    fn accept(&mut self, _current: &Partition, _candidate: &Partition, _rng: &mut dyn RngCore) -> bool { true }
}

/// Metropolis filter on an energy score at inverse temperature `beta`.
///
/// A candidate that lowers the energy is always accepted; otherwise it is
/// accepted with probability `exp(-beta * ΔE)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metropolis {
    beta: f64,
    energy: Score,
}

impl Metropolis {
    pub fn new(beta: f64, energy: Score) -> Result<Self> {
        if !(beta.is_finite() && beta >= 0.0) {
            return Err(ChainError::config(format!("metropolis beta must be a non-negative number, got {beta}")));
        }
        Ok(Self { beta, energy })
    }

    #[inline] pub fn beta(&self) -> f64 { self.beta }

    #[inline] pub fn energy(&self) -> Score { self.energy }

    /// Probability of accepting a move that changes the energy by `delta`.
    pub fn acceptance_probability(&self, delta: f64) -> f64 {
        if delta <= 0.0 { 1.0 } else { (-self.beta * delta).exp() }
    }
}

impl Acceptance for Metropolis {
    fn accept(&mut self, current: &Partition, candidate: &Partition, rng: &mut dyn RngCore) -> bool {
        let (Ok(before), Ok(after)) = (self.energy.evaluate(current), self.energy.evaluate(candidate)) else {
            return false;
        };
        let probability = self.acceptance_probability(after - before);
        probability >= 1.0 || rng.random::<f64>() < probability
    }

    fn ensure_supported(&self, partition: &Partition) -> Result<()> {
        partition.require(self.energy.requires()).map(|_| ()).map_err(|_| ChainError::config(format!(
            "metropolis energy `{}` needs a '{}' updater", self.energy.name(), self.energy.requires(),
        )))
    }
}
