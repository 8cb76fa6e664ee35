//! Chain self-loop statistics.
use std::{collections::BTreeMap, ops::Add};

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::constraints::ConstraintKind;

/// Reasons why a step of the chain re-emitted the current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SelfLoopReason {
    /// The candidate failed a constraint.
    Invalid(ConstraintKind),
    /// The candidate was valid but the acceptance rule turned it down.
    Rejected,
}

impl SelfLoopReason {
    pub fn name(&self) -> &'static str {
        match self {
            SelfLoopReason::Invalid(kind) => kind.name(),
            SelfLoopReason::Rejected => "rejected",
        }
    }
}

/// Self-loop counts by reason, plus the number of accepted moves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelfLoopCounts {
    counts: BTreeMap<SelfLoopReason, usize>,
    accepted: usize,
}

impl Add for SelfLoopCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let mut union = self.counts;
        for (reason, count) in other.counts {
            *union.entry(reason).or_insert(0) += count;
        }
        SelfLoopCounts { counts: union, accepted: self.accepted + other.accepted }
    }
}

impl SelfLoopCounts {
    /// Increment the self-loop count for a reason.
    pub fn inc(&mut self, reason: SelfLoopReason) {
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    /// Record an accepted move.
    pub fn inc_accepted(&mut self) { self.accepted += 1 }

    /// Get the self-loop count for a reason.
    pub fn get(&self, reason: SelfLoopReason) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    /// Get the total self-loop count over all reasons.
    pub fn sum(&self) -> usize { self.counts.values().sum() }

    /// Get the number of accepted moves.
    #[inline] pub fn accepted(&self) -> usize { self.accepted }

    /// Get the number of steps taken (accepted moves plus self-loops).
    #[inline] pub fn steps(&self) -> usize { self.accepted + self.sum() }

    /// Iterate over the nonzero counts by reason.
    pub fn iter(&self) -> impl Iterator<Item = (SelfLoopReason, usize)> + '_ {
        self.counts.iter().map(|(&reason, &count)| (reason, count))
    }
}

impl Serialize for SelfLoopCounts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("SelfLoopCounts", self.counts.len() + 1)?;
        state.serialize_field("accepted", &self.accepted)?;
        for (reason, count) in self.iter() {
            state.serialize_field(reason.name(), &count)?;
        }
        state.end()
    }
}
